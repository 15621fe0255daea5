//! Decompilation units and the host's analysis database.

use crate::model::addr;

/// Opaque identifier the host hands out for one decompilable unit
/// (usually a function). Stable for the lifetime of the analysis
/// database, unlike any in-memory handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub u64);

/// Snapshot of what the host knew about a unit when it was decompiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    pub extent: addr::Extent,
    pub name: String,
}

/// Properties of the loaded image that gate selective decompilation.
#[derive(Debug, Clone, Default)]
pub struct ImageInfo {
    pub is_relocatable: bool,
    pub min_address: addr::Address,
    pub input_path: std::path::PathBuf,
}

/// The host's analysis database.
pub trait Analysis {
    fn function_containing(&self, addr: addr::Address) -> Option<UnitId>;
    fn unit_extent(&self, unit: UnitId) -> Option<addr::Extent>;
    fn unit_name(&self, unit: UnitId) -> String;
    /// All units known to the host, in address order.
    fn units(&self) -> Vec<UnitId>;
    fn image(&self) -> ImageInfo;
    /// False while the host's initial auto-analysis is still running.
    fn analysis_finished(&self) -> bool;
    /// The unit's user comment, if it has one.
    fn unit_comment(&self, unit: UnitId) -> Option<String>;

    fn describe_unit(&self, unit: UnitId) -> Option<Unit> {
        self.unit_extent(unit).map(|extent| Unit {
            id: unit,
            extent,
            name: self.unit_name(unit),
        })
    }
}

impl Unit {
    pub fn start(&self) -> addr::Address {
        self.extent.begin
    }

    pub fn end(&self) -> addr::Address {
        self.extent.end
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name, self.extent)
    }
}
