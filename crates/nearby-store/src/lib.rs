//! Nearby Store - Spatial store port and backends
//!
//! The searches in `nearby-search` only ever talk to the [`ports::SpatialStore`]
//! trait. Production uses the MySQL backend; development and tests use the
//! in-memory one.

pub mod memory;
pub mod mysql;
pub mod ports;

pub use memory::{MemorySpatialStore, Record};
pub use mysql::MySqlSpatialStore;
pub use ports::SpatialStore;
