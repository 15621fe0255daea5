//! Parsing of the decompiler's tokenized output.

use serde_derive::Deserialize;
use tracing::{event, Level};

use crate::model::addr;
use crate::model::listing::token;

/// Turns decompiler output into a token stream. An empty stream means the
/// output could not be used.
pub trait TokenParser {
    fn parse(&self, text: &str, base: addr::Address) -> Vec<token::Token>;
}

/// Parser for the decompiler's JSON output:
///
/// ```json
/// {"language": "C", "tokens": [{"addr": "0x401000"}, {"kind": "i_fnc", "val": "main"}, {"kind": "nl", "val": "\n"}]}
/// ```
///
/// An `addr` entry sets the address of every token after it. Tokens before
/// the first `addr` entry belong to `base`; an empty `addr` means the
/// following tokens have no address.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTokenParser;

#[derive(Deserialize)]
struct Output {
    tokens: Vec<Entry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Entry {
    Address {
        addr: String,
    },
    Token {
        kind: String,
        #[serde(default)]
        val: String,
    },
}

impl TokenParser for JsonTokenParser {
    fn parse(&self, text: &str, base: addr::Address) -> Vec<token::Token> {
        let output: Output = match serde_json::from_str(text) {
            Ok(output) => output,
            Err(e) => {
                event!(Level::WARN, "failed to parse decompiler output: {}", e);
                return Vec::new();
            }
        };

        let mut current = base;
        let mut tokens = Vec::with_capacity(output.tokens.len());

        for entry in output.tokens {
            match entry {
                Entry::Address { addr } if addr.is_empty() => current = addr::Address::NULL,
                Entry::Address { addr } => current = match addr::Address::parse(&addr, true) {
                    Ok(a) => a,
                    Err(e) => {
                        event!(Level::WARN, "bad token address {:?}: {:?}", addr, e);
                        addr::Address::NULL
                    }
                },
                Entry::Token { kind, val } => match token::TokenKind::from_json_name(&kind) {
                    Some(kind) => tokens.push(token::Token::new(kind, current, val)),
                    None => {
                        event!(Level::WARN, "unknown token kind {:?}", kind);
                        return Vec::new();
                    }
                },
            }
        }

        tokens
    }
}
