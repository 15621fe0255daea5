//! Conversion of places between the address view and the pseudocode view.

use tracing::{event, Level};

use crate::model::addr;
use crate::model::listing::place;
use crate::model::registry;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("pseudocode place is not attached to any function")]
    Detached,

    #[error("no address at pseudocode place {0}")]
    NoAddress(String),

    #[error(transparent)]
    Unresolved(#[from] registry::ResolveError),
}

/// Converts `source` into the other view's kind of place. `current` is the
/// pseudocode view's current place, if it has one. An address inside the
/// current grid stays in that grid; any other address goes through the
/// registry, which may decompile the function containing it.
pub fn convert(source: &place::Place, current: Option<&place::GridPlace>, registry: &registry::Registry, backend: &registry::Backend) -> Result<place::Place, ConvertError> {
    match source {
        place::Place::Grid(gp) => grid_to_linear(gp).map(place::Place::from),
        place::Place::Linear(lp) => linear_to_grid(lp, current, registry, backend).map(place::Place::from),
    }
}

pub fn grid_to_linear(source: &place::GridPlace) -> Result<place::LinearPlace, ConvertError> {
    if source.is_detached() {
        return Err(ConvertError::Detached);
    }

    let address = source.resolve_address();
    if address.is_null() {
        return Err(ConvertError::NoAddress(source.to_string()));
    }

    Ok(place::LinearPlace::new(address))
}

pub fn linear_to_grid(source: &place::LinearPlace, current: Option<&place::GridPlace>, registry: &registry::Registry, backend: &registry::Backend) -> Result<place::GridPlace, ConvertError> {
    let address: addr::Address = source.address;

    if let Some(grid) = current.and_then(|c| c.grid()).filter(|g| g.contains_address(address)) {
        return Ok(place::GridPlace::at_address(grid.clone(), address));
    }

    event!(Level::DEBUG, %address, "address is outside the displayed function");
    let grid = registry.resolve_address(backend, address, false)?;

    Ok(place::GridPlace::at_address(grid, address))
}
