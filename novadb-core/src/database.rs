//! The `Database` facade: owns the HNSW index and vector metadata, and
//! drives snapshot durability.
//!
//! Two locks guard state, one per concern: a facade-level lock around
//! the id -> metadata map, and an index-level lock (inside [`HnswIndex`]'s
//! owner here) around the graph itself. Insert/Delete/Load take both
//! write locks; Search/Get/List/GetStats/GetConfig/Save take both read
//! locks. Stats counters live behind their own atomics so a reader never
//! blocks on them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::distance::{optimal_ef, DistanceMetric};
use crate::error::{Error, Result};
use crate::index::hnsw::HnswIndex;
use crate::metadata::VectorMetadata;
use crate::persistence;
use crate::stats::{Stats, StatsSnapshot};
use crate::vector::{Vector, VectorId};

/// A single match returned by [`Database::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: VectorId,
    pub distance: f32,
    pub metadata: VectorMetadata,
}

/// A stored vector plus its metadata, as returned by [`Database::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVector {
    pub vector: Vector,
    pub metadata: VectorMetadata,
}

/// Aggregate view returned by [`Database::get_stats`]: the raw operation
/// counters plus derived index-level metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatabaseStats {
    pub counters: StatsSnapshot,
    pub vector_count: usize,
    pub dimensions: usize,
    pub estimated_memory_bytes: u64,
}

/// In-memory HNSW vector database with optional snapshot persistence.
pub struct Database {
    config: DatabaseConfig,
    metadata: RwLock<HashMap<VectorId, VectorMetadata>>,
    index: RwLock<HnswIndex>,
    stats: Stats,
    #[cfg(feature = "async")]
    auto_save: parking_lot::Mutex<Option<AutoSaveTask>>,
}

/// `done` is flipped and the waiting `close()` call notified from inside
/// the spawned task itself, right after it observes the stop signal and
/// breaks its loop — so `close()` can block on plain `parking_lot`
/// primitives instead of needing a `Handle::current().block_on(..)` (which
/// panics when `close()` isn't called from a multi-threaded Tokio runtime).
#[cfg(feature = "async")]
struct AutoSaveTask {
    stop: tokio::sync::watch::Sender<bool>,
    done: Arc<(parking_lot::Mutex<bool>, parking_lot::Condvar)>,
}

impl Database {
    /// Creates a new, empty database from the given configuration. Does
    /// not start an auto-save task; use [`Database::open`] for that.
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        if config.dimensions == 0 {
            return Err(Error::InvalidConfig {
                field: "dimensions".to_string(),
                value: "0".to_string(),
                reason: "dimensions must be positive".to_string(),
            });
        }

        let hnsw_config = config.index_config.parameters;
        let index = HnswIndex::new(config.distance_metric, config.dimensions, hnsw_config);

        Ok(Self {
            config,
            metadata: RwLock::new(HashMap::new()),
            index: RwLock::new(index),
            stats: Stats::new(),
            #[cfg(feature = "async")]
            auto_save: parking_lot::Mutex::new(None),
        })
    }

    /// Creates a database and, if `config.auto_save` is set and the
    /// `async` feature is enabled, starts its background auto-save task.
    pub fn open(config: DatabaseConfig) -> Result<Arc<Self>> {
        let auto_save_requested = config.auto_save;
        let db = Arc::new(Self::new(config)?);

        if auto_save_requested {
            #[cfg(feature = "async")]
            {
                db.clone().start_auto_save();
            }
            #[cfg(not(feature = "async"))]
            {
                warn!("auto_save requested but the `async` feature is not enabled; no background task will run");
            }
        }

        Ok(db)
    }

    #[cfg(feature = "async")]
    fn start_auto_save(self: Arc<Self>) {
        let (stop_tx, mut stop_rx) = tokio::sync::watch::channel(false);
        let interval = self.config.save_interval;
        let done = Arc::new((parking_lot::Mutex::new(false), parking_lot::Condvar::new()));
        let task_done = Arc::clone(&done);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        debug!("auto-save tick");
                        if let Err(err) = self.save() {
                            warn!(error = %err, "auto-save failed; will retry on next tick");
                        }
                    }
                    _ = stop_rx.changed() => {
                        break;
                    }
                }
            }
            let (finished, cvar) = &*task_done;
            *finished.lock() = true;
            cvar.notify_all();
        });

        *self.auto_save.lock() = Some(AutoSaveTask {
            stop: stop_tx,
            done,
        });
    }

    /// Inserts a vector under `id` with the given metadata (or freshly
    /// stamped default metadata if `None`).
    pub fn insert(
        &self,
        id: VectorId,
        vector: Vector,
        metadata: Option<VectorMetadata>,
    ) -> Result<()> {
        let metadata = metadata.unwrap_or_default();

        let mut meta_guard = self.metadata.write();
        let mut index_guard = self.index.write();

        match index_guard.insert(id.clone(), vector) {
            Ok(()) => {
                meta_guard.insert(id.clone(), metadata);
                drop(index_guard);
                drop(meta_guard);
                self.stats.record_insert();
                info!(id = %id, "inserted vector");
                Ok(())
            }
            Err(err) => {
                drop(index_guard);
                drop(meta_guard);
                self.stats.record_insert_error();
                Err(err)
            }
        }
    }

    /// Searches for the `k` nearest neighbors of `query`.
    ///
    /// `metric` optionally overrides the configured distance metric; a
    /// value that differs from the configured one is rejected rather than
    /// silently honored, since the graph was built for a single metric.
    ///
    /// `k == 0` returns an empty result rather than falling back to a
    /// default `k`, matching the "search with k=0 returns an empty
    /// ordered sequence" law; `usize` has no negative values for a
    /// `k <= 0` default to apply to.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef: Option<usize>,
        metric: Option<DistanceMetric>,
    ) -> Result<Vec<SearchHit>> {
        if let Some(requested) = metric {
            if requested != self.config.distance_metric {
                self.stats.record_search_error();
                return Err(Error::InvalidConfig {
                    field: "metric".to_string(),
                    value: format!("{requested:?}"),
                    reason: format!(
                        "search-time metric override does not match the configured metric {:?}",
                        self.config.distance_metric
                    ),
                });
            }
        }

        if query.len() != self.config.dimensions {
            self.stats.record_search_error();
            return Err(Error::DimensionMismatch {
                expected: self.config.dimensions,
                actual: query.len(),
            });
        }

        let effective_ef = optimal_ef(k, ef.unwrap_or(self.config.index_config.parameters.ef_search));

        let meta_guard = self.metadata.read();
        let index_guard = self.index.read();
        let matches = index_guard.search(query, k, Some(effective_ef));
        let hits = matches
            .into_iter()
            .filter_map(|m| {
                meta_guard.get(&m.id).map(|meta| SearchHit {
                    id: m.id,
                    distance: m.distance,
                    metadata: meta.clone(),
                })
            })
            .collect();
        drop(index_guard);
        drop(meta_guard);

        self.stats.record_search();
        Ok(hits)
    }

    /// Deletes the vector stored under `id`. Propagates `NotFound` if no
    /// such id exists, without mutating any state (a second `delete` call
    /// for an already-removed id is idempotent in its failure, not its
    /// effect).
    pub fn delete(&self, id: &VectorId) -> Result<()> {
        let mut meta_guard = self.metadata.write();
        let mut index_guard = self.index.write();

        let removed = index_guard.delete(id);
        if removed {
            meta_guard.remove(id);
        }
        drop(index_guard);
        drop(meta_guard);

        if removed {
            self.stats.record_delete();
            info!(id = %id, "deleted vector");
            Ok(())
        } else {
            self.stats.record_delete_error();
            Err(Error::NotFound(id.clone()))
        }
    }

    /// Returns the vector and metadata stored under `id`, if any.
    pub fn get(&self, id: &VectorId) -> Option<StoredVector> {
        let meta_guard = self.metadata.read();
        let index_guard = self.index.read();
        let vector = index_guard.get(id)?.clone();
        let metadata = meta_guard.get(id)?.clone();
        Some(StoredVector { vector, metadata })
    }

    /// Lists up to `limit` vector ids, skipping the first `offset`.
    ///
    /// Order is unspecified by the underlying map but stable within a
    /// snapshot: this implementation exposes ids sorted lexicographically,
    /// so the same database state always paginates identically.
    pub fn list(&self, offset: usize, limit: usize) -> Vec<VectorId> {
        let guard = self.metadata.read();
        let mut ids: Vec<&VectorId> = guard.keys().collect();
        ids.sort();
        ids.into_iter().skip(offset).take(limit).cloned().collect()
    }

    /// Returns a point-in-time view of operation counters and index
    /// metrics.
    pub fn get_stats(&self) -> DatabaseStats {
        let counters = self.stats.snapshot();
        let index_guard = self.index.read();
        let vector_count = index_guard.len();
        let dimensions = index_guard.dimension();
        drop(index_guard);

        DatabaseStats {
            counters,
            vector_count,
            dimensions,
            estimated_memory_bytes: crate::stats::estimate_memory_bytes(vector_count, dimensions),
        }
    }

    /// Returns a copy of the database's configuration.
    pub fn get_config(&self) -> DatabaseConfig {
        self.config.clone()
    }

    /// Checks the underlying graph's symmetric-edge and degree-cap
    /// invariants. Exposed for tests and operational diagnostics.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        self.index.read().check_invariants()
    }

    /// Writes a snapshot to `config.persist_path`.
    pub fn save(&self) -> Result<()> {
        let dir = self.snapshot_dir()?;

        let meta_guard = self.metadata.read();
        let index_guard = self.index.read();

        let mut vectors = HashMap::with_capacity(meta_guard.len());
        for (id, metadata) in meta_guard.iter() {
            if let Some(vector) = index_guard.get(id) {
                vectors.insert(id.clone(), (vector.clone(), metadata.clone()));
            }
        }
        let nodes = index_guard.node_snapshots();

        persistence::save(&dir, &self.config, &vectors, &nodes)?;
        drop(index_guard);
        drop(meta_guard);

        info!(path = %dir.display(), count = vectors.len(), "saved snapshot");
        Ok(())
    }

    /// Replaces the database's contents with the snapshot at
    /// `config.persist_path`, rebuilding the graph by replaying every
    /// record through `HnswIndex::insert`.
    ///
    /// A missing `vectors.json` is not an error: it means no snapshot was
    /// ever written, so `load` is a no-op on an already-fresh database.
    pub fn load(&self) -> Result<()> {
        let dir = self.snapshot_dir()?;
        if !persistence::vectors_file_exists(&dir) {
            return Ok(());
        }
        let (_loaded_config, records) = persistence::load(&dir)?;

        let mut meta_guard = self.metadata.write();
        let mut index_guard = self.index.write();

        index_guard.clear();
        meta_guard.clear();

        for (id, record) in records {
            let vector = Vector::from_vec(record.vector);
            index_guard.insert(id.clone(), vector)?;
            meta_guard.insert(id, record.metadata);
        }

        info!(path = %dir.display(), count = meta_guard.len(), "loaded snapshot");
        Ok(())
    }

    /// Shuts the database down: cancels the auto-save task (if running),
    /// waits for it to actually exit its loop, and performs one final
    /// `Save` if auto-save was configured.
    ///
    /// The wait matters: without it a `Save` already in flight on the
    /// background task could race with the final `save()` below. Signaling
    /// `stop` and blocking until the task observes it (rather than
    /// `abort()`ing it) guarantees the two never overlap.
    pub fn close(&self) -> Result<()> {
        #[cfg(feature = "async")]
        {
            if let Some(task) = self.auto_save.lock().take() {
                let _ = task.stop.send(true);
                let (finished, cvar) = &*task.done;
                let mut finished = finished.lock();
                while !*finished {
                    cvar.wait(&mut finished);
                }
            }
        }

        if self.config.auto_save {
            self.save()?;
        }

        Ok(())
    }

    fn snapshot_dir(&self) -> Result<PathBuf> {
        self.config
            .persist_path
            .as_ref()
            .map(|p| persistence::resolve_dir(p))
            .ok_or_else(|| Error::DatabaseError {
                operation: "save_or_load".to_string(),
                cause: "no persist_path configured".to_string(),
            })
    }
}
