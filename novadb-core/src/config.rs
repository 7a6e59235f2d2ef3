//! Configuration types for the HNSW index and the database facade.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::distance::DistanceMetric;

/// Tunable parameters for the HNSW graph.
///
/// Defaults follow the values established by Malkov & Yashunin's original
/// construction and reproduced across this corpus: `M = 16` keeps memory
/// bounded while `ef_construction = 200` buys enough recall at build time
/// that a much smaller `ef_search` still finds good neighbors at query
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HnswConfig {
    /// Max neighbors per node at layers above 0.
    pub m: usize,
    /// Max neighbors per node at layer 0 (conventionally `2 * m`).
    pub max_m0: usize,
    /// Candidate list size used while inserting.
    pub ef_construction: usize,
    /// Candidate list size used while searching, absent a per-query override.
    pub ef_search: usize,
    /// Level-assignment normalization factor. Independent of `m` — not
    /// derived from it.
    pub ml: f64,
    /// Hard cap on the number of layers a single node may occupy.
    pub max_level: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: 16,
            max_m0: 32,
            ef_construction: 200,
            ef_search: 50,
            ml: 1.0 / std::f64::consts::LN_2,
            max_level: 16,
        }
    }
}

/// Selects which index implementation backs a database. novadb only ships
/// the HNSW index; the field exists so `config.json` mirrors the shape
/// described for the on-disk layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    Hnsw,
}

impl Default for IndexType {
    fn default() -> Self {
        Self::Hnsw
    }
}

/// Index selection plus its parameters, as persisted in `config.json`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(rename = "type")]
    pub index_type: IndexType,
    pub parameters: HnswConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_type: IndexType::Hnsw,
            parameters: HnswConfig::default(),
        }
    }
}

/// Top-level configuration for a [`crate::database::Database`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub dimensions: usize,
    pub distance_metric: DistanceMetric,
    pub index_config: IndexConfig,
    /// Directory snapshots are written to and loaded from.
    pub persist_path: Option<String>,
    /// Whether a background task periodically calls `Save`.
    #[serde(default)]
    pub auto_save: bool,
    /// Interval between auto-save ticks, serialized in nanoseconds.
    #[serde(with = "duration_nanos", default = "default_save_interval")]
    pub save_interval: Duration,
}

fn default_save_interval() -> Duration {
    Duration::from_secs(300)
}

impl DatabaseConfig {
    /// Creates a config for the given dimensionality with all other values
    /// defaulted.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            distance_metric: DistanceMetric::default(),
            index_config: IndexConfig::default(),
            persist_path: None,
            auto_save: false,
            save_interval: default_save_interval(),
        }
    }
}

mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_nanos() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let nanos = u64::deserialize(d)?;
        Ok(Duration::from_nanos(nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hnsw_config_matches_spec_defaults() {
        let cfg = HnswConfig::default();
        assert_eq!(cfg.m, 16);
        assert_eq!(cfg.max_m0, 32);
        assert_eq!(cfg.ef_construction, 200);
        assert_eq!(cfg.ef_search, 50);
        assert!((cfg.ml - 1.0 / std::f64::consts::LN_2).abs() < 1e-12);
        assert_eq!(cfg.max_level, 16);
    }

    #[test]
    fn database_config_round_trips_through_json() {
        let cfg = DatabaseConfig::new(128);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: DatabaseConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.dimensions, 128);
        assert_eq!(back.save_interval, Duration::from_secs(300));
        assert!(json.contains("300000000000"));
    }
}
