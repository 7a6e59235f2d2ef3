//! # novadb-core
//!
//! Core library for novadb — an in-memory, embedded HNSW vector database.
//!
//! This crate provides the distance kernel, the HNSW graph index, the
//! [`Database`] facade that owns vectors and their metadata, and a
//! JSON-snapshot durability layer. It carries no mandatory async runtime.
//!
//! ## Crate Features
//!
//! - `async` - enables a background auto-save task on [`Database`],
//!   driven by `tokio`.
//!
//! ## Core Types
//!
//! - [`Vector`] / [`VectorId`] - owned vector data and its opaque string id
//! - [`VectorMetadata`] - timestamp and optional tags attached to a vector
//! - [`DistanceMetric`] - Cosine, Euclidean, DotProduct, Manhattan
//! - [`HnswIndex`] - the approximate nearest-neighbor graph
//! - [`Database`] - the facade: insert/search/delete/get/list/stats/save/load

pub mod config;
pub mod database;
pub mod distance;
pub mod error;
pub mod index;
pub mod metadata;
pub mod persistence;
pub mod stats;
pub mod vector;

pub use config::{DatabaseConfig, HnswConfig, IndexConfig, IndexType};
pub use database::{Database, DatabaseStats, SearchHit, StoredVector};
pub use distance::{optimal_ef, Distance, DistanceMetric};
pub use error::{Error, Result};
pub use index::hnsw::HnswIndex;
pub use metadata::VectorMetadata;
pub use stats::{Stats, StatsSnapshot};
pub use vector::{Vector, VectorId};

/// Re-exports the commonly used types for convenience.
///
/// # Example
///
/// ```
/// use novadb_core::prelude::*;
///
/// let config = DatabaseConfig::new(3);
/// let db = Database::new(config).unwrap();
/// db.insert("a".to_string(), Vector::new(&[1.0, 0.0, 0.0]), None).unwrap();
/// ```
pub mod prelude {
    pub use crate::{
        Database, DatabaseConfig, DatabaseStats, Distance, DistanceMetric, Error, HnswConfig,
        HnswIndex, IndexConfig, Result, SearchHit, Stats, StoredVector, Vector, VectorId,
        VectorMetadata,
    };
}
