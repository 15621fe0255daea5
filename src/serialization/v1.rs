use crate::model::addr;
use crate::model::listing::place;
use crate::model::listing::position;
use crate::model::registry;

use serde_derive::Serialize;
use serde_derive::Deserialize;

/* /===============================\
 * | Struct definitions.           |
 * \===============================/
 *
 * Copied here so that changing the model elsewhere does not change the saved format.
 */

#[derive(Serialize, Deserialize)]
pub struct Layout {
    places: Vec<Place>,
}

#[derive(Serialize, Deserialize)]
struct Place {
    /// Start of the unit, or u64::MAX for a detached place.
    unit_start: u64,
    row: u64,
    col: u64,
    lnnum: i32,
}

/* /===============================\
 * | Conversion from model.        |
 * \===============================/
 */

impl From<&[place::GridPlace]> for Layout {
    fn from(places: &[place::GridPlace]) -> Layout {
        Layout {
            places: places.iter().map(Place::from).collect(),
        }
    }
}

impl From<&place::GridPlace> for Place {
    fn from(place: &place::GridPlace) -> Place {
        Place {
            unit_start: place.unit_start().value(),
            row: place.position().row as u64,
            col: place.position().col as u64,
            lnnum: place.lnnum,
        }
    }
}

/* /===============================\
 * | Conversion to model.          |
 * \===============================/
 *
 * Grids are not saved, so converting back needs the registry.
 */

impl Layout {
    pub fn restore(self, registry: &registry::Registry, backend: &registry::Backend) -> Vec<place::GridPlace> {
        self.places.into_iter().map(|p| place::GridPlace::restore(
            addr::Address(p.unit_start),
            position::Position::new(p.row as usize, p.col as usize),
            p.lnnum,
            registry,
            backend)).collect()
    }
}
