//! Nearby Core - Domain models, geographic math, and configuration
//!
//! This crate contains the core domain types and bounding-geometry math for the
//! nearby proximity resolution engine.

pub mod config;
pub mod error;
pub mod geo;
pub mod models;

pub use error::{NearbyError, Result};
