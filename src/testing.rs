//! Fake collaborators shared by the unit tests.

use std::cell;
use std::collections::HashMap;

use crate::config;
use crate::logic::decompiler;
use crate::logic::parser;
use crate::model::addr;
use crate::model::listing::grid;
use crate::model::listing::token;
use crate::model::registry;
use crate::model::unit;

/// Builds a grid for unit 1 ("fnc") covering `[start, end)`.
pub fn grid(start: u64, end: u64, tokens: &[(token::TokenKind, u64, &str)]) -> grid::TokenGrid {
    grid::TokenGrid::new(unit::Unit {
        id: unit::UnitId(1),
        extent: addr::Extent::between(start, end),
        name: "fnc".to_string(),
    }, tokens.iter().map(|(kind, address, text)| token::Token::new(*kind, addr::Address(*address), *text)))
}

/// Renders tokens as decompiler JSON output, emitting an `addr` entry
/// whenever the address changes.
pub fn json(tokens: &[(u64, &str, &str)]) -> String {
    let mut entries = Vec::new();
    let mut current = None;

    for (address, kind, val) in tokens {
        if current != Some(*address) {
            entries.push(serde_json::json!({ "addr": format!("{:#x}", address) }));
            current = Some(*address);
        }
        entries.push(serde_json::json!({ "kind": kind, "val": val }));
    }

    serde_json::json!({ "language": "C", "tokens": entries }).to_string()
}

/// An analysis database with two functions:
/// `main` at `[0x1000, 0x1010)` calling `helper` at `[0x2000, 0x2010)`.
pub struct FakeAnalysis {
    pub units: Vec<unit::Unit>,
    pub image: unit::ImageInfo,
    pub comments: HashMap<unit::UnitId, String>,
    pub finished: bool,
}

impl FakeAnalysis {
    pub fn new() -> FakeAnalysis {
        FakeAnalysis {
            units: vec![
                unit::Unit { id: unit::UnitId(1), extent: addr::Extent::between(0x1000u64, 0x1010), name: "main".to_string() },
                unit::Unit { id: unit::UnitId(2), extent: addr::Extent::between(0x2000u64, 0x2010), name: "helper".to_string() },
            ],
            image: unit::ImageInfo {
                input_path: "/work/prog".into(),
                ..unit::ImageInfo::default()
            },
            comments: HashMap::new(),
            finished: true,
        }
    }

    pub fn unit(&self, id: u64) -> unit::Unit {
        self.units.iter().find(|u| u.id == unit::UnitId(id)).cloned().unwrap()
    }
}

impl unit::Analysis for FakeAnalysis {
    fn function_containing(&self, addr: addr::Address) -> Option<unit::UnitId> {
        self.units.iter().find(|u| u.extent.contains(addr)).map(|u| u.id)
    }

    fn unit_extent(&self, unit: unit::UnitId) -> Option<addr::Extent> {
        self.units.iter().find(|u| u.id == unit).map(|u| u.extent)
    }

    fn unit_name(&self, unit: unit::UnitId) -> String {
        self.units.iter().find(|u| u.id == unit).map_or_else(String::new, |u| u.name.clone())
    }

    fn units(&self) -> Vec<unit::UnitId> {
        self.units.iter().map(|u| u.id).collect()
    }

    fn image(&self) -> unit::ImageInfo {
        self.image.clone()
    }

    fn analysis_finished(&self) -> bool {
        self.finished
    }

    fn unit_comment(&self, unit: unit::UnitId) -> Option<String> {
        self.comments.get(&unit).cloned()
    }
}

/// Answers with canned tokens keyed by the start of the last selected range,
/// or with a fixed C text for any other output format.
pub struct FakeDecompiler {
    pub outputs: HashMap<addr::Address, String>,
    pub calls: cell::Cell<usize>,
    pub fail: cell::RefCell<Option<decompiler::DecompileError>>,
    pub last_config: cell::RefCell<Option<config::Config>>,
}

impl FakeDecompiler {
    pub fn new() -> FakeDecompiler {
        let mut outputs = HashMap::new();

        outputs.insert(addr::Address(0x1000), json(&[
            (0x1000, "type", "int"),
            (0x1000, "ws", " "),
            (0x1000, "i_fnc", "main"),
            (0x1000, "punc", "()"),
            (0x1000, "nl", "\n"),
            (0x1004, "i_var", "g_count"),
            (0x1004, "ws", " "),
            (0x1004, "op", "="),
            (0x1004, "ws", " "),
            (0x1008, "i_fnc", "helper"),
            (0x1008, "punc", "();"),
            (0x1008, "nl", "\n"),
            (0x100c, "keyw", "return"),
            (0x100c, "ws", " "),
            (0x100c, "i_var", "g_count"),
            (0x100c, "punc", ";"),
            (0x100c, "nl", "\n"),
        ]));

        outputs.insert(addr::Address(0x2000), json(&[
            (0x2000, "type", "int"),
            (0x2000, "ws", " "),
            (0x2000, "i_fnc", "helper"),
            (0x2000, "punc", "()"),
            (0x2000, "nl", "\n"),
            (0x2008, "keyw", "return"),
            (0x2008, "ws", " "),
            (0x2008, "i_var", "g_count"),
            (0x2008, "punc", ";"),
            (0x2008, "nl", "\n"),
        ]));

        FakeDecompiler {
            outputs,
            calls: cell::Cell::new(0),
            fail: cell::RefCell::new(None),
            last_config: cell::RefCell::new(None),
        }
    }

    pub fn fail_with(&self, error: decompiler::DecompileError) {
        *self.fail.borrow_mut() = Some(error);
    }
}

impl decompiler::Decompiler for FakeDecompiler {
    fn decompile(&self, config: &config::Config) -> Result<String, decompiler::DecompileError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_config.borrow_mut() = Some(config.clone());

        if let Some(error) = self.fail.borrow().clone() {
            return Err(error);
        }

        if config.output_format != config::OutputFormat::Json {
            return Ok("int main() { return helper(); }\n".to_string());
        }

        config.selected_ranges.last()
            .and_then(|range| self.outputs.get(&range.begin))
            .cloned()
            .ok_or(decompiler::DecompileError::Failed { code: 1, diagnostic: "nothing to decompile".to_string() })
    }
}

pub fn backend<'a>(analysis: &'a FakeAnalysis, decompiler: &'a FakeDecompiler, config: &'a config::Config) -> registry::Backend<'a> {
    registry::Backend {
        analysis,
        decompiler,
        parser: &parser::JsonTokenParser,
        config,
    }
}
