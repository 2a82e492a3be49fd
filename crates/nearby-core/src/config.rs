//! Search tuning configuration.
//!
//! Every constant the two search strategies depend on lives here, with the
//! production defaults the platform has run with for years. Values layer as
//! defaults, then an optional TOML file, then `NEARBY_*` environment
//! variables.

use crate::error::{NearbyError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Tuning for both search strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Initial half-width, in degrees, of the postcode scan box. About two
    /// metres at UK latitudes.
    pub seed_scan: f64,
    /// The postcode scan gives up once the half-width exceeds this, in
    /// degrees. About twenty kilometres.
    pub max_scan: f64,
    /// Increment, in kilometres, between consecutive ring sizes of the quorum
    /// search ladder.
    pub ring_step: f64,
    /// Largest ring radius, in kilometres, the quorum search will query.
    pub max_radius: f64,
    /// Default number of candidates the quorum search aims for.
    pub quorum_limit: usize,
    /// Default minimum relevance score for job candidates.
    pub min_relevance: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            seed_scan: 0.000_019_531_25,
            max_scan: 0.2,
            ring_step: 2.0,
            max_radius: 64.0,
            quorum_limit: 50,
            min_relevance: 0.10,
        }
    }
}

/// Optional fields as they appear in a config file; anything absent keeps its
/// current value.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    seed_scan: Option<f64>,
    max_scan: Option<f64>,
    ring_step: Option<f64>,
    max_radius: Option<f64>,
    quorum_limit: Option<usize>,
    min_relevance: Option<f64>,
}

impl SearchConfig {
    /// Load configuration from a TOML file, overriding current values.
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| NearbyError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| NearbyError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(v) = file_config.seed_scan {
            self.seed_scan = v;
        }
        if let Some(v) = file_config.max_scan {
            self.max_scan = v;
        }
        if let Some(v) = file_config.ring_step {
            self.ring_step = v;
        }
        if let Some(v) = file_config.max_radius {
            self.max_radius = v;
        }
        if let Some(v) = file_config.quorum_limit {
            self.quorum_limit = v;
        }
        if let Some(v) = file_config.min_relevance {
            self.min_relevance = v;
        }

        self.validate()?;
        Ok(self)
    }

    /// Apply `NEARBY_*` environment overrides. Malformed values are warned
    /// about and skipped rather than failing startup.
    pub fn load_from_env(mut self) -> Self {
        if let Ok(s) = env::var("NEARBY_SEED_SCAN") {
            match s.parse::<f64>() {
                Ok(v) => self.seed_scan = v,
                Err(_) => tracing::warn!(
                    "Invalid NEARBY_SEED_SCAN value '{}': expected degrees as a float",
                    s
                ),
            }
        }

        if let Ok(s) = env::var("NEARBY_MAX_SCAN") {
            match s.parse::<f64>() {
                Ok(v) => self.max_scan = v,
                Err(_) => tracing::warn!(
                    "Invalid NEARBY_MAX_SCAN value '{}': expected degrees as a float",
                    s
                ),
            }
        }

        if let Ok(s) = env::var("NEARBY_RING_STEP") {
            match s.parse::<f64>() {
                Ok(v) => self.ring_step = v,
                Err(_) => tracing::warn!(
                    "Invalid NEARBY_RING_STEP value '{}': expected kilometres as a float",
                    s
                ),
            }
        }

        if let Ok(s) = env::var("NEARBY_MAX_RADIUS") {
            match s.parse::<f64>() {
                Ok(v) => self.max_radius = v,
                Err(_) => tracing::warn!(
                    "Invalid NEARBY_MAX_RADIUS value '{}': expected kilometres as a float",
                    s
                ),
            }
        }

        if let Ok(s) = env::var("NEARBY_QUORUM_LIMIT") {
            match s.parse::<usize>() {
                Ok(v) => self.quorum_limit = v,
                Err(_) => tracing::warn!(
                    "Invalid NEARBY_QUORUM_LIMIT value '{}': expected an integer",
                    s
                ),
            }
        }

        if let Ok(s) = env::var("NEARBY_MIN_RELEVANCE") {
            match s.parse::<f64>() {
                Ok(v) => self.min_relevance = v,
                Err(_) => tracing::warn!(
                    "Invalid NEARBY_MIN_RELEVANCE value '{}': expected a float",
                    s
                ),
            }
        }

        self
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        if !(self.seed_scan > 0.0) {
            return Err(NearbyError::ConfigInvalid {
                key: "seed_scan".to_string(),
                reason: "must be a positive number of degrees".to_string(),
            });
        }
        if self.max_scan < self.seed_scan {
            return Err(NearbyError::ConfigInvalid {
                key: "max_scan".to_string(),
                reason: "must be at least seed_scan".to_string(),
            });
        }
        if !(self.ring_step > 0.0) {
            return Err(NearbyError::ConfigInvalid {
                key: "ring_step".to_string(),
                reason: "must be a positive number of kilometres".to_string(),
            });
        }
        if self.max_radius < self.ring_step * 2.0 {
            return Err(NearbyError::ConfigInvalid {
                key: "max_radius".to_string(),
                reason: "must be at least twice ring_step".to_string(),
            });
        }
        Ok(())
    }
}
