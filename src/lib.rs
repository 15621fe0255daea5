extern crate enum_dispatch;

pub mod config;

pub mod model;
pub mod logic;

pub mod serialization;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
