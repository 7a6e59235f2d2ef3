//! # novadb
//!
//! **An embedded, in-memory HNSW vector database.**
//!
//! novadb provides fast, in-process approximate nearest neighbor search
//! over fixed-dimension embeddings:
//!
//! - **RAG applications** — semantic retrieval for LLM context
//! - **Semantic search** — find similar documents, images, or audio
//! - **Recommendations** — embedding-based content similarity
//! - **Edge AI** — local inference without cloud dependencies
//!
//! ## Quick Start
//!
//! ```rust
//! use novadb::prelude::*;
//!
//! // Create a 384-dimensional database (a common embedding size).
//! let config = DatabaseConfig::new(384);
//! let db = Database::new(config).unwrap();
//!
//! db.insert("doc-1".to_string(), Vector::from_vec(vec![0.1; 384]), None).unwrap();
//!
//! let query = vec![0.1; 384];
//! let results = db.search(&query, 10, None, None).unwrap();
//! assert!(!results.is_empty());
//! ```
//!
//! ## Persistence
//!
//! ```no_run
//! use novadb::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut config = DatabaseConfig::new(384);
//!     config.persist_path = Some("./my_vectors".to_string());
//!     let db = Database::new(config)?;
//!
//!     db.insert("doc-1".to_string(), Vector::from_vec(vec![0.1; 384]), None)?;
//!     db.save()?;
//!
//!     let db2 = Database::new({
//!         let mut c = DatabaseConfig::new(384);
//!         c.persist_path = Some("./my_vectors".to_string());
//!         c
//!     })?;
//!     db2.load()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Crate Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | Enables a background auto-save task on [`Database`] |
//!
//! ```toml
//! [dependencies]
//! novadb = { version = "0.1", features = ["async"] }
//! ```
//!
//! ## Architecture
//!
//! novadb is organized into two crates:
//!
//! - **`novadb-core`** — core library with no mandatory async runtime
//! - **`novadb`** — this crate, which re-exports everything
//!
//! ### Core Components
//!
//! - [`HnswIndex`] — the approximate nearest-neighbor graph
//! - [`Database`] — the facade: insert/search/delete/get/list/stats/save/load
//! - [`VectorMetadata`] — timestamp and optional tags attached to a vector
//!
//! ## Thread Safety
//!
//! [`Database`] guards its metadata map and index behind `parking_lot`
//! `RwLock`s and is safe to share across threads (wrap in `Arc` to do so);
//! [`HnswIndex`] itself is not thread-safe on its own and expects external
//! synchronization, which `Database` provides.

pub use novadb_core::*;
