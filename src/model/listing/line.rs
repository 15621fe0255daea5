//! This module includes the logic that reconstructs displayable rows
//! from the tokens of a grid.

use std::collections::btree_map;

use crate::model::addr;
use crate::model::listing::position;
use crate::model::listing::token;

/// The tokens of one row, from some starting column up to (not including)
/// the newline that terminates the row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Line {
    pub tokens: Vec<token::Token>,
}

impl Line {
    /// Collects tokens until the first newline or the end of the iterator.
    pub fn from_tokens<'a>(tokens: impl Iterator<Item = &'a token::Token>) -> Self {
        Line {
            tokens: tokens.take_while(|t| !t.is_newline()).cloned().collect(),
        }
    }

    /// Plain text of the row.
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// Text of the row with the host's color markup around every token.
    pub fn markup(&self) -> String {
        let mut out = String::new();
        for t in &self.tokens {
            t.write_markup(&mut out);
        }
        out
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for t in &self.tokens {
            write!(f, "{}", t.text)?;
        }
        Ok(())
    }
}

/// Iterates over the physical rows of a grid, yielding the plain text of
/// each row together with the first non-null address on the row (null only
/// if every token on the row is unaddressed). A clone
/// replays the remaining rows from the point it was taken.
#[derive(Clone)]
pub struct Lines<'a> {
    tokens: btree_map::Iter<'a, position::Position, token::Token>,
}

impl<'a> Lines<'a> {
    pub(crate) fn new(tokens: btree_map::Iter<'a, position::Position, token::Token>) -> Self {
        Lines { tokens }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = (String, addr::Address);

    fn next(&mut self) -> Option<Self::Item> {
        let mut text = String::new();
        let mut address = None;

        for (_, t) in self.tokens.by_ref() {
            /* leading indentation usually has no address */
            if address.map_or(true, |a: addr::Address| a.is_null()) {
                address = Some(t.address);
            }

            if t.is_newline() {
                return address.map(|a| (text, a));
            }

            text.push_str(&t.text);
        }

        /* a last row without a terminating newline is still a row */
        address.map(|a| (text, a))
    }
}

impl<'a> std::iter::FusedIterator for Lines<'a> {
}
