//! This module includes the logic that lays a decompiled unit's token
//! stream out as a grid of rows and columns and answers lookups in
//! both directions between grid positions and source addresses.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync;

use crate::model::addr;
use crate::model::listing::line;
use crate::model::listing::position::Position;
use crate::model::listing::token;
use crate::model::unit;

/// Tokens of one decompiled unit, addressable by [Position]. Immutable once
/// built; anything that changes token text builds a new grid.
pub struct TokenGrid {
    unit: unit::Unit,
    tokens: BTreeMap<Position, token::Token>,
    /// First position observed for each address, in stream order.
    addresses: BTreeMap<addr::Address, Position>,
    generation: u64,
}

static NEXT_GENERATION: sync::atomic::AtomicU64 = sync::atomic::AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, sync::atomic::Ordering::Relaxed)
}

impl TokenGrid {
    pub fn new(unit: unit::Unit, stream: impl IntoIterator<Item = token::Token>) -> TokenGrid {
        let mut tokens = BTreeMap::new();
        let mut addresses = BTreeMap::new();

        let mut row = Position::START.row;
        let mut col = Position::START.col;

        for t in stream {
            let pos = Position::new(row, col);

            /* first-seen wins; the null address is not a source address and never gets indexed */
            if !t.address.is_null() {
                addresses.entry(t.address).or_insert(pos);
            }

            if t.is_newline() {
                row+= 1;
                col = Position::START.col;
            } else {
                col+= t.width();
            }

            tokens.insert(pos, t);
        }

        TokenGrid {
            unit,
            tokens,
            addresses,
            generation: next_generation(),
        }
    }

    pub fn unit(&self) -> &unit::Unit {
        &self.unit
    }

    pub fn name(&self) -> &str {
        &self.unit.name
    }

    pub fn start(&self) -> addr::Address {
        self.unit.start()
    }

    pub fn end(&self) -> addr::Address {
        self.unit.end()
    }

    /// Unique across every grid built by this process. Two grids for the same
    /// unit (before and after a rebuild) have different generations.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Tokens in stream order.
    pub fn tokens(&self) -> impl Iterator<Item = &token::Token> + '_ {
        self.tokens.values()
    }

    pub fn token_at(&self, pos: Position) -> Option<&token::Token> {
        self.tokens.get(&self.adjust(pos))
    }

    pub fn min_position(&self) -> Position {
        self.tokens.keys().next().copied().unwrap_or(Position::START)
    }

    pub fn max_position(&self) -> Position {
        self.tokens.keys().next_back().copied().unwrap_or(Position::START)
    }

    /// Resolves an arbitrary position to the nearest existing position at or
    /// before it, clamped to the ends of the grid.
    pub fn adjust(&self, pos: Position) -> Position {
        if self.tokens.is_empty() || self.tokens.contains_key(&pos) {
            return pos;
        }

        let min = self.min_position();
        let max = self.max_position();

        if pos <= min {
            min
        } else if pos >= max {
            max
        } else {
            self.tokens.range(..pos).next_back().map_or(min, |(p, _)| *p)
        }
    }

    /// One step back in position order. Returns `pos` unchanged when there is
    /// nowhere to go.
    pub fn predecessor(&self, pos: Position) -> Position {
        let adjusted = self.adjust(pos);
        if !self.tokens.contains_key(&adjusted) {
            return pos;
        }

        self.tokens.range(..adjusted).next_back().map_or(pos, |(p, _)| *p)
    }

    /// One step forward in position order. Returns `pos` unchanged when there
    /// is nowhere to go.
    pub fn successor(&self, pos: Position) -> Position {
        let adjusted = self.adjust(pos);
        if !self.tokens.contains_key(&adjusted) {
            return pos;
        }

        self.tokens.range((Bound::Excluded(adjusted), Bound::Unbounded)).next().map_or(pos, |(p, _)| *p)
    }

    /// Reconstructs the row containing `adjust(pos)`, starting at that token
    /// and ending before the row's newline.
    pub fn line_at(&self, pos: Position) -> line::Line {
        let adjusted = self.adjust(pos);

        line::Line::from_tokens(self.tokens
            .range(adjusted..)
            .take_while(|(p, _)| p.row == adjusted.row)
            .map(|(_, t)| t))
    }

    pub fn address_at(&self, pos: Position) -> addr::Address {
        self.token_at(pos).map_or(addr::Address::NULL, |t| t.address)
    }

    /// Distinct addresses of the tokens on a row. A row can mix several
    /// addresses when statements are merged or inlined.
    pub fn addresses_on_row(&self, row: usize) -> BTreeSet<addr::Address> {
        self.tokens
            .range(Position::row_start(row)..Position::row_start(row + 1))
            .map(|(_, t)| t.address)
            .filter(|a| !a.is_null())
            .collect()
    }

    /// Position of the greatest indexed address at or below `addr`. Falls back
    /// to [Position::START] when nothing is indexed or `addr` lies outside the
    /// indexed range.
    pub fn position_for_address(&self, addr: addr::Address) -> Position {
        let (first, last) = match (self.addresses.keys().next(), self.addresses.keys().next_back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Position::START,
        };

        if addr < first || last < addr {
            return Position::START;
        }

        if addr == last {
            return self.max_position();
        }

        self.addresses.range(..=addr).next_back().map_or(Position::START, |(_, p)| *p)
    }

    pub fn contains_address(&self, addr: addr::Address) -> bool {
        self.unit.extent.contains(addr)
    }

    pub fn to_lines(&self) -> line::Lines<'_> {
        line::Lines::new(self.tokens.iter())
    }

    /// Builds a new grid in which every token of `kind` whose text is exactly
    /// `old` reads `new` instead. Returns None if no token matched. Columns
    /// depend on token widths, so the new grid is laid out from scratch.
    pub fn substitute(&self, kind: token::TokenKind, old: &str, new: &str) -> Option<TokenGrid> {
        let mut matched = false;

        let stream: Vec<token::Token> = self.tokens.values().map(|t| {
            if t.kind == kind && t.text == old {
                matched = true;
                t.with_text(new)
            } else {
                t.clone()
            }
        }).collect();

        if matched {
            Some(TokenGrid::new(self.unit.clone(), stream))
        } else {
            None
        }
    }
}

impl std::fmt::Display for TokenGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.unit)
    }
}

impl std::fmt::Debug for TokenGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrid")
            .field("unit", &self.unit)
            .field("generation", &self.generation)
            .field("tokens", &self.tokens.len())
            .finish_non_exhaustive()
    }
}
