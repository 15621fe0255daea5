//! This module includes the registry of decompiled units. Each unit the
//! user has looked at maps to the grid built from its most recent
//! decompilation. Grids are handed out reference counted, so replacing a
//! unit's grid never invalidates a place that still points at the old one.

use std::collections::HashMap;
use std::sync;

use once_cell::sync::Lazy;
use tracing::{event, instrument, Level};

use crate::config;
use crate::logic::decompiler;
use crate::logic::parser;
use crate::model::addr;
use crate::model::listing::grid;
use crate::model::listing::token;
use crate::model::unit;

/// The collaborators needed to (re)build a grid.
#[derive(Clone, Copy)]
pub struct Backend<'a> {
    pub analysis: &'a dyn unit::Analysis,
    pub decompiler: &'a dyn decompiler::Decompiler,
    pub parser: &'a dyn parser::TokenParser,
    pub config: &'a config::Config,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("function must be selected")]
    UnitUnresolved,

    #[error("selective decompilation needs the input loaded at address zero, but it is based at {0}; use full decompilation instead")]
    RelocatableNotAtZero(addr::Address),

    #[error(transparent)]
    Decompilation(#[from] decompiler::DecompileError),

    #[error("decompiler output for {0} has no tokens")]
    EmptyTokenStream(String),
}

pub struct Registry {
    grids: parking_lot::Mutex<HashMap<unit::UnitId, sync::Arc<grid::TokenGrid>>>,
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// The process-wide registry.
pub fn global() -> &'static Registry {
    &GLOBAL
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            grids: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, unit: unit::UnitId) -> Option<sync::Arc<grid::TokenGrid>> {
        self.grids.lock().get(&unit).cloned()
    }

    /// Installs a grid under its own unit, replacing whatever was there.
    pub fn install(&self, grid: grid::TokenGrid) -> sync::Arc<grid::TokenGrid> {
        let grid = sync::Arc::new(grid);
        self.grids.lock().insert(grid.unit().id, grid.clone());
        grid
    }

    pub fn len(&self) -> usize {
        self.grids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.lock().is_empty()
    }

    pub fn units(&self) -> Vec<unit::UnitId> {
        let mut units: Vec<unit::UnitId> = self.grids.lock().keys().copied().collect();
        units.sort();
        units
    }

    /// Returns the live grid for `unit`, decompiling it first if there is none
    /// or if `force_rebuild` is set. On failure the registry is left as it was.
    #[instrument(skip(self, backend))]
    pub fn resolve(&self, backend: &Backend, unit: unit::UnitId, force_rebuild: bool) -> Result<sync::Arc<grid::TokenGrid>, ResolveError> {
        let mut grids = self.grids.lock();

        if !force_rebuild {
            if let Some(grid) = grids.get(&unit) {
                return Ok(grid.clone());
            }
        }

        let grid = sync::Arc::new(build(backend, unit)?);
        event!(Level::DEBUG, %grid, generation = grid.generation(), "installed grid");
        grids.insert(unit, grid.clone());

        Ok(grid)
    }

    /// Same as [Self::resolve], for the unit containing `addr`.
    #[instrument(skip(self, backend))]
    pub fn resolve_address(&self, backend: &Backend, addr: addr::Address, force_rebuild: bool) -> Result<sync::Arc<grid::TokenGrid>, ResolveError> {
        match backend.analysis.function_containing(addr) {
            Some(unit) => self.resolve(backend, unit, force_rebuild),
            None => {
                event!(Level::WARN, "no function contains {}", addr);
                Err(ResolveError::UnitUnresolved)
            }
        }
    }

    /// Substitutes token text in one unit's grid. Returns the new grid, or
    /// None if the unit has no grid or nothing in it matched.
    pub fn rebuild_unit(&self, unit: unit::UnitId, kind: token::TokenKind, old: &str, new: &str) -> Option<sync::Arc<grid::TokenGrid>> {
        let mut grids = self.grids.lock();

        let rebuilt = sync::Arc::new(grids.get(&unit)?.substitute(kind, old, new)?);
        grids.insert(unit, rebuilt.clone());

        Some(rebuilt)
    }

    /// Substitutes token text in every registered grid in one pass. Returns
    /// how many grids were replaced.
    pub fn rebuild_all(&self, kind: token::TokenKind, old: &str, new: &str) -> usize {
        let mut grids = self.grids.lock();
        let mut replaced = 0;

        for grid in grids.values_mut() {
            if let Some(rebuilt) = grid.substitute(kind, old, new) {
                *grid = sync::Arc::new(rebuilt);
                replaced+= 1;
            }
        }

        event!(Level::DEBUG, ?kind, old, new, replaced, "rebuilt grids");
        replaced
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("units", &self.units())
            .finish()
    }
}

/// Checks that `id` can be decompiled selectively and takes a snapshot of
/// it from the analysis database.
pub fn selectable_unit(backend: &Backend, id: unit::UnitId) -> Result<unit::Unit, ResolveError> {
    let image = backend.analysis.image();
    if image.is_relocatable && image.min_address != addr::Address::ZERO {
        event!(Level::WARN, min_address = %image.min_address, "refusing selective decompilation");
        return Err(ResolveError::RelocatableNotAtZero(image.min_address));
    }

    backend.analysis.describe_unit(id).ok_or_else(|| {
        event!(Level::WARN, ?id, "host has no extent for unit");
        ResolveError::UnitUnresolved
    })
}

fn build(backend: &Backend, id: unit::UnitId) -> Result<grid::TokenGrid, ResolveError> {
    let unit = selectable_unit(backend, id)?;
    let config = backend.config.selective(&backend.analysis.image().input_path, unit.extent);

    let text = decompiler::run_decompilation(backend.decompiler, &config)?;

    let stream = backend.parser.parse(&text, unit.start());
    if stream.is_empty() {
        event!(Level::WARN, %unit, "decompiler output has no tokens");
        return Err(ResolveError::EmptyTokenStream(unit.name));
    }

    Ok(grid::TokenGrid::new(unit, stream))
}
