use std::cmp;
use std::sync;

use enum_dispatch::enum_dispatch;

use crate::model::addr;
use crate::model::listing::grid;
use crate::model::listing::position::Position;
use crate::model::listing::token;
use crate::model::registry;
use crate::serialization::packed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementResult {
    Ok,
    HitStart,
    HitEnd,
    /// The place is not attached to any grid.
    Detached,
}

/// What the host asks of any place, whichever view it belongs to.
#[enum_dispatch]
pub trait PlaceExt {
    fn name(&self) -> &'static str;
    fn to_address(&self) -> addr::Address;
    /// Line number the host uses to keep the cursor's screen row.
    fn line_hint(&self) -> i32;
    fn describe(&self) -> String;
}

#[enum_dispatch(PlaceExt)]
#[derive(Debug, Clone)]
pub enum Place {
    Linear(LinearPlace),
    Grid(GridPlace),
}

/// Cursor of the host's address-oriented view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearPlace {
    pub address: addr::Address,
    pub lnnum: i32,
}

impl LinearPlace {
    pub fn new(address: addr::Address) -> LinearPlace {
        LinearPlace {
            address,
            lnnum: 0,
        }
    }

    /// An explicit jump request rather than a view synchronization.
    pub fn jump(address: addr::Address) -> LinearPlace {
        LinearPlace {
            address,
            lnnum: -1,
        }
    }

    pub fn is_jump(&self) -> bool {
        self.lnnum == -1
    }
}

impl PlaceExt for LinearPlace {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn to_address(&self) -> addr::Address {
        self.address
    }

    fn line_hint(&self) -> i32 {
        self.lnnum
    }

    fn describe(&self) -> String {
        self.address.to_string()
    }
}

/// Cursor into a [grid::TokenGrid]. The cursor moves a row at a time in
/// practice, because the host normalizes every externally supplied place to
/// column zero and only ever renders whole rows.
///
/// A place with no grid is detached. Every operation on a detached place
/// succeeds as a no-op or reports that it is detached.
#[derive(Clone)]
pub struct GridPlace {
    grid: Option<sync::Arc<grid::TokenGrid>>,
    position: Position,
    pub lnnum: i32,
}

impl GridPlace {
    pub fn new(grid: sync::Arc<grid::TokenGrid>, position: Position) -> GridPlace {
        GridPlace {
            grid: Some(grid),
            position,
            lnnum: 0,
        }
    }

    /// Place at the position `addr` maps to in `grid`.
    pub fn at_address(grid: sync::Arc<grid::TokenGrid>, addr: addr::Address) -> GridPlace {
        let position = grid.position_for_address(addr);
        GridPlace::new(grid, position)
    }

    pub fn detached(position: Position) -> GridPlace {
        GridPlace {
            grid: None,
            position,
            lnnum: 0,
        }
    }

    pub fn grid(&self) -> Option<&sync::Arc<grid::TokenGrid>> {
        self.grid.as_ref()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_detached(&self) -> bool {
        self.grid.is_none()
    }

    pub fn step_backward(&mut self) -> MovementResult {
        let grid = match &self.grid {
            Some(grid) => grid,
            None => return MovementResult::Detached,
        };

        if self.position <= grid.min_position() {
            return MovementResult::HitStart;
        }

        let prev = grid.predecessor(self.position);
        if prev == self.position {
            return MovementResult::HitStart;
        }

        self.position = prev;
        MovementResult::Ok
    }

    pub fn step_forward(&mut self) -> MovementResult {
        let grid = match &self.grid {
            Some(grid) => grid,
            None => return MovementResult::Detached,
        };

        if self.position >= grid.max_position() {
            return MovementResult::HitEnd;
        }

        let next = grid.successor(self.position);
        if next == self.position {
            return MovementResult::HitEnd;
        }

        self.position = next;
        MovementResult::Ok
    }

    /// A detached place cannot move in either direction, so it is at both ends.
    pub fn is_at_start(&self) -> bool {
        self.grid.as_ref().map_or(true, |g| self.position == g.min_position())
    }

    pub fn is_at_end(&self) -> bool {
        self.grid.as_ref().map_or(true, |g| self.position == g.max_position())
    }

    /// Forces the column to zero. Clamping to the nearest token instead
    /// leaves the host drawing partial rows.
    pub fn normalize(&mut self) {
        self.position.col = 0;
    }

    /// Same grid: by position. Different grids: by the start address of
    /// their units, then by grid generation so that two grids of the same
    /// unit still order consistently. Detached places sort before attached ones.
    pub fn compare(&self, other: &GridPlace) -> cmp::Ordering {
        match (&self.grid, &other.grid) {
            (Some(a), Some(b)) if sync::Arc::ptr_eq(a, b) => self.position.cmp(&other.position),
            (Some(a), Some(b)) => a.start().cmp(&b.start()).then(a.generation().cmp(&b.generation())),
            (Some(_), None) => cmp::Ordering::Greater,
            (None, Some(_)) => cmp::Ordering::Less,
            (None, None) => self.position.cmp(&other.position),
        }
    }

    /// Colored text of the row this place is on. Only whole rows are
    /// rendered, so a place off column zero renders nothing.
    pub fn render_row(&self) -> Option<String> {
        if !self.position.is_row_start() {
            return None;
        }

        self.grid.as_ref().map(|g| g.line_at(self.position).markup())
    }

    pub fn resolve_address(&self) -> addr::Address {
        self.grid.as_ref().map_or(addr::Address::NULL, |g| g.address_at(self.position))
    }

    /// Place at the start of `row` in the same grid.
    pub fn make_place(&self, row: usize, lnnum: i32) -> GridPlace {
        GridPlace {
            grid: self.grid.clone(),
            position: Position::row_start(row),
            lnnum,
        }
    }

    pub fn to_uval(&self) -> usize {
        self.position.row
    }

    pub fn token(&self) -> Option<&token::Token> {
        self.grid.as_ref()?.token_at(self.position)
    }

    /// Appends the persisted form of this place: line number, then the unit's
    /// start address, row and column. The grid itself is never persisted.
    pub fn serialize(&self, out: &mut Vec<u8>) {
        packed::pack_dd(out, self.lnnum as u32);
        packed::pack_ea(out, self.unit_start().value());
        packed::pack_ea(out, self.position.row as u64);
        packed::pack_ea(out, self.position.col as u64);
    }

    /// Reads a place written by [Self::serialize] off the front of `input`
    /// and re-attaches it through the registry. A unit that can no longer be
    /// resolved gives a detached place.
    pub fn deserialize(input: &mut &[u8], registry: &registry::Registry, backend: &registry::Backend) -> Result<GridPlace, packed::UnpackError> {
        let lnnum = packed::unpack_dd(input)? as i32;
        let start = addr::Address(packed::unpack_ea(input)?);
        let position = Position::new(packed::unpack_ea(input)? as usize, packed::unpack_ea(input)? as usize);

        Ok(GridPlace::restore(start, position, lnnum, registry, backend))
    }

    /// Rebuilds a persisted place from the start address of its unit.
    pub fn restore(start: addr::Address, position: Position, lnnum: i32, registry: &registry::Registry, backend: &registry::Backend) -> GridPlace {
        let mut place = match registry.resolve_address(backend, start, false) {
            Ok(grid) => GridPlace::new(grid, position),
            Err(_) => GridPlace::detached(position),
        };
        place.lnnum = lnnum;
        place
    }

    /// Start address of the unit this place belongs to.
    pub fn unit_start(&self) -> addr::Address {
        self.grid.as_ref().map_or(addr::Address::NULL, |g| g.start())
    }
}

impl PlaceExt for GridPlace {
    fn name(&self) -> &'static str {
        "pseudocode"
    }

    fn to_address(&self) -> addr::Address {
        self.resolve_address()
    }

    fn line_hint(&self) -> i32 {
        self.lnnum
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for GridPlace {
    fn eq(&self, other: &GridPlace) -> bool {
        self.compare(other) == cmp::Ordering::Equal
    }
}

impl Eq for GridPlace {
}

impl PartialOrd for GridPlace {
    fn partial_cmp(&self, other: &GridPlace) -> Option<cmp::Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for GridPlace {
    fn cmp(&self, other: &GridPlace) -> cmp::Ordering {
        self.compare(other)
    }
}

impl std::fmt::Display for GridPlace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.grid {
            Some(_) => write!(f, "{} @ {}", self.resolve_address(), self.position),
            None => write!(f, "detached @ {}", self.position),
        }
    }
}

impl std::fmt::Debug for GridPlace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridPlace")
            .field("grid", &self.grid.as_ref().map(|g| g.to_string()))
            .field("position", &self.position)
            .field("lnnum", &self.lnnum)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use crate::config;
    use crate::model::unit;
    use crate::testing;
    use token::TokenKind;

    fn scenario_a() -> sync::Arc<grid::TokenGrid> {
        sync::Arc::new(testing::grid(0x1000, 0x1010, &[
            (TokenKind::Type, 0x1000, "int"),
            (TokenKind::Whitespace, 0x1000, " "),
            (TokenKind::LocalVariable, 0x1000, "x"),
            (TokenKind::NewLine, 0x1000, ""),
            (TokenKind::Keyword, 0x1004, "return"),
            (TokenKind::Whitespace, 0x1004, " "),
            (TokenKind::LocalVariable, 0x1004, "x"),
            (TokenKind::Punctuation, 0x1004, ";"),
            (TokenKind::NewLine, 0x1004, ""),
        ]))
    }

    #[test]
    fn step_forward_at_end_does_not_move() {
        let grid = scenario_a();
        let mut place = GridPlace::new(grid.clone(), grid.max_position());

        assert!(place.is_at_end());
        assert_eq!(place.step_forward(), MovementResult::HitEnd);
        assert_eq!(place.position(), grid.max_position());
    }

    #[test]
    fn walk_the_whole_grid() {
        let grid = scenario_a();
        let mut place = GridPlace::new(grid.clone(), Position::START);

        assert!(place.is_at_start());
        assert_eq!(place.step_backward(), MovementResult::HitStart);

        let mut forward = vec![place.position()];
        while place.step_forward() == MovementResult::Ok {
            forward.push(place.position());
        }
        assert_eq!(forward.len(), grid.len());
        assert!(place.is_at_end());

        let mut backward = vec![place.position()];
        while place.step_backward() == MovementResult::Ok {
            backward.push(place.position());
        }
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn renders_whole_rows_only() {
        let grid = scenario_a();

        let place = GridPlace::new(grid.clone(), Position::new(1, 0));
        assert_eq!(place.render_row(), Some(grid.line_at(Position::new(1, 0)).markup()));
        assert!(place.render_row().unwrap().contains("return"));

        let mut partial = GridPlace::new(grid, Position::new(1, 7));
        assert_eq!(partial.render_row(), None);
        assert_eq!(partial.token().map(|t| t.text.as_str()), Some("x"));

        partial.normalize();
        assert_eq!(partial.position(), Position::new(1, 0));
        assert!(partial.render_row().is_some());
    }

    #[test]
    fn ordering() {
        let a = scenario_a();
        let b = sync::Arc::new(testing::grid(0x2000, 0x2010, &[
            (TokenKind::Keyword, 0x2000, "return"),
            (TokenKind::NewLine, 0x2000, ""),
        ]));
        let a_again = scenario_a();

        let first = GridPlace::new(a.clone(), Position::new(0, 0));
        let second = GridPlace::new(a.clone(), Position::new(1, 0));
        let other = GridPlace::new(b, Position::new(0, 0));

        assert!(first < second);
        assert_eq!(first, GridPlace::new(a.clone(), Position::new(0, 0)));
        assert!(second < other);
        assert!(GridPlace::detached(Position::new(9, 9)) < first);

        /* a rebuilt grid of the same unit is a different grid */
        let rebuilt = GridPlace::new(a_again, Position::new(0, 0));
        assert_ne!(first.compare(&rebuilt), cmp::Ordering::Equal);
        assert_eq!(first.compare(&rebuilt), rebuilt.compare(&first).reverse());
    }

    #[test]
    fn detached_place_is_inert() {
        let mut place = GridPlace::detached(Position::new(2, 0));

        assert_eq!(place.step_forward(), MovementResult::Detached);
        assert_eq!(place.step_backward(), MovementResult::Detached);
        assert!(place.is_at_start());
        assert!(place.is_at_end());
        assert_eq!(place.render_row(), None);
        assert!(place.token().is_none());
        assert!(place.resolve_address().is_null());
        assert!(place.make_place(4, 0).is_detached());
        assert_eq!(place.to_string(), "detached @ 2:0");
    }

    #[test]
    fn make_place_starts_the_row() {
        let place = GridPlace::new(scenario_a(), Position::new(0, 4));
        let made = place.make_place(1, 3);

        assert_eq!(made.position(), Position::new(1, 0));
        assert_eq!(made.to_uval(), 1);
        assert_eq!(made.lnnum, 3);
        assert_eq!(made.resolve_address(), addr::Address(0x1004));
    }

    #[test]
    fn serialization_round_trip() {
        let analysis = testing::FakeAnalysis::new();
        let decompiler = testing::FakeDecompiler::new();
        let config = config::Config::default();
        let backend = testing::backend(&analysis, &decompiler, &config);
        let registry = registry::Registry::new();

        let grid = registry.resolve(&backend, unit::UnitId(2), false).unwrap();
        let mut place = GridPlace::new(grid.clone(), Position::new(1, 0));
        place.lnnum = 2;

        let mut bytes = Vec::new();
        place.serialize(&mut bytes);

        let mut input = bytes.as_slice();
        let restored = GridPlace::deserialize(&mut input, &registry, &backend).unwrap();
        assert!(input.is_empty());
        assert_eq!(restored.resolve_address(), place.resolve_address());
        assert_eq!(restored.position(), place.position());
        assert_eq!(restored.lnnum, 2);
        assert!(sync::Arc::ptr_eq(restored.grid().unwrap(), &grid));
        assert_eq!(decompiler.calls.get(), 1);
    }

    #[test]
    fn deserialize_into_fresh_registry() {
        let analysis = testing::FakeAnalysis::new();
        let decompiler = testing::FakeDecompiler::new();
        let config = config::Config::default();
        let backend = testing::backend(&analysis, &decompiler, &config);

        let mut bytes = Vec::new();
        {
            let registry = registry::Registry::new();
            let grid = registry.resolve(&backend, unit::UnitId(1), false).unwrap();
            GridPlace::new(grid, Position::new(2, 0)).serialize(&mut bytes);
        }

        /* a later session decompiles the unit again */
        let registry = registry::Registry::new();
        let restored = GridPlace::deserialize(&mut bytes.as_slice(), &registry, &backend).unwrap();
        assert_eq!(restored.resolve_address(), addr::Address(0x100c));
        assert_eq!(decompiler.calls.get(), 2);
    }

    #[test]
    fn deserialize_unresolvable_unit_is_detached() {
        let analysis = testing::FakeAnalysis::new();
        let decompiler = testing::FakeDecompiler::new();
        let config = config::Config::default();
        let backend = testing::backend(&analysis, &decompiler, &config);
        let registry = registry::Registry::new();

        let mut bytes = Vec::new();
        GridPlace::new(sync::Arc::new(testing::grid(0x5000, 0x5010, &[])), Position::new(3, 0)).serialize(&mut bytes);

        let restored = GridPlace::deserialize(&mut bytes.as_slice(), &registry, &backend).unwrap();
        assert!(restored.is_detached());
        assert_eq!(restored.position(), Position::new(3, 0));

        assert_matches!(GridPlace::deserialize(&mut &bytes[..2], &registry, &backend), Err(packed::UnpackError::Truncated(_)));
    }

    #[test]
    fn dispatch_over_place_kinds() {
        let grid = scenario_a();
        let places: Vec<Place> = vec![
            LinearPlace::jump(addr::Address(0x1004)).into(),
            GridPlace::new(grid, Position::new(1, 0)).into(),
        ];

        assert_eq!(places.iter().map(|p| p.name()).collect::<Vec<_>>(), vec!["linear", "pseudocode"]);
        assert!(places.iter().all(|p| p.to_address() == addr::Address(0x1004)));
        assert_eq!(places[0].line_hint(), -1);
        assert_eq!(places[1].describe(), "0x1004 @ 1:0");
    }
}
