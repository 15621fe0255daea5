//! Name lookups and following tokens to what they refer to.

use tracing::{event, Level};

use crate::config;
use crate::model::addr;
use crate::model::listing::place;
use crate::model::listing::token;
use crate::model::registry;

/// Address of the function called `name`. The decompiler's own function
/// table wins over the analysis database.
pub fn function_address(backend: &registry::Backend, name: &str) -> Option<addr::Address> {
    if let Some(address) = backend.config.function_by_name(name) {
        return Some(address);
    }

    let analysis = backend.analysis;
    analysis.units().into_iter()
        .find(|unit| analysis.unit_name(*unit) == name)
        .and_then(|unit| analysis.unit_extent(unit))
        .map(|extent| extent.begin)
}

pub fn global_variable_address(config: &config::Config, name: &str) -> Option<addr::Address> {
    config.global_by_name(name)
}

/// Where following the token under `source` leads. A function name opens
/// that function's pseudocode; a global variable jumps the address view to
/// it. Anything else, or a name nobody knows, goes nowhere.
pub fn jump_target(source: &place::GridPlace, registry: &registry::Registry, backend: &registry::Backend) -> Result<Option<place::Place>, registry::ResolveError> {
    let token = match source.token() {
        Some(token) => token,
        None => return Ok(None),
    };

    match token.kind {
        token::TokenKind::Function => match function_address(backend, &token.text) {
            Some(address) => {
                let grid = registry.resolve_address(backend, address, false)?;
                Ok(Some(place::GridPlace::at_address(grid, address).into()))
            },
            None => {
                event!(Level::INFO, name = %token.text, "unknown function");
                Ok(None)
            },
        },
        token::TokenKind::GlobalVariable => Ok(global_variable_address(backend.config, &token.text)
            .map(|address| place::LinearPlace::jump(address).into())),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;

    use crate::model::listing::position::Position;
    use crate::model::unit;
    use crate::testing;

    #[test]
    fn function_lookup_prefers_config() {
        let analysis = testing::FakeAnalysis::new();
        let decompiler = testing::FakeDecompiler::new();
        let mut config = config::Config::default();

        assert_eq!(function_address(&testing::backend(&analysis, &decompiler, &config), "helper"), Some(addr::Address(0x2000)));
        assert_eq!(function_address(&testing::backend(&analysis, &decompiler, &config), "missing"), None);

        config.functions.push(config::NamedAddress { name: "helper".to_string(), address: addr::Address(0x2004) });
        assert_eq!(function_address(&testing::backend(&analysis, &decompiler, &config), "helper"), Some(addr::Address(0x2004)));
    }

    #[test]
    fn follow_function_token() {
        let analysis = testing::FakeAnalysis::new();
        let decompiler = testing::FakeDecompiler::new();
        let config = config::Config::default();
        let backend = testing::backend(&analysis, &decompiler, &config);
        let registry = registry::Registry::new();

        let main = registry.resolve(&backend, unit::UnitId(1), false).unwrap();

        /* "helper" in "g_count = helper();" */
        let source = place::GridPlace::new(main.clone(), Position::new(1, 10));
        let target = jump_target(&source, &registry, &backend).unwrap();
        assert_matches!(target, Some(place::Place::Grid(gp)) => {
            assert_eq!(gp.grid().unwrap().name(), "helper");
            assert_eq!(gp.position(), Position::START);
        });

        /* keywords lead nowhere */
        let keyword = place::GridPlace::new(main, Position::row_start(2));
        assert_matches!(jump_target(&keyword, &registry, &backend), Ok(None));
    }

    #[test]
    fn follow_global_token() {
        let analysis = testing::FakeAnalysis::new();
        let decompiler = testing::FakeDecompiler::new();
        let mut config = config::Config::default();
        config.globals.push(config::NamedAddress { name: "g_count".to_string(), address: addr::Address(0x4000) });
        let backend = testing::backend(&analysis, &decompiler, &config);
        let registry = registry::Registry::new();

        let main = registry.resolve(&backend, unit::UnitId(1), false).unwrap();
        let source = place::GridPlace::new(main, Position::new(1, 0));

        assert_matches!(jump_target(&source, &registry, &backend),
                        Ok(Some(place::Place::Linear(lp))) if lp.address == addr::Address(0x4000) && lp.is_jump());
    }
}
