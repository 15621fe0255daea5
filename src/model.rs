pub mod addr;
pub mod listing;
pub mod registry;
pub mod unit;
