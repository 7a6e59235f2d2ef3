//! Snapshot durability: saving and loading a database to/from a directory
//! of JSON files.
//!
//! A snapshot is three files: `config.json` (the `DatabaseConfig`),
//! `vectors.json` (an id -> `{vector, metadata}` object), and `index.json`
//! (an id -> `{id, vector, connections, level, metadata}` object dumping
//! the graph structure, written for inspectability but never consulted on
//! load — loading always rebuilds the graph by replaying `vectors.json`
//! through `HnswIndex::insert`). Each file is written to a temp path in
//! the same directory and then atomically renamed into place, so a crash
//! mid-save leaves the previous snapshot intact; there is no cross-file
//! atomicity guarantee across the three files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::index::hnsw::NodeSnapshot;
use crate::metadata::VectorMetadata;
use crate::vector::{Vector, VectorId};

const CONFIG_FILE: &str = "config.json";
const VECTORS_FILE: &str = "vectors.json";
const INDEX_FILE: &str = "index.json";

/// One persisted vector record, as stored under its id in `vectors.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub vector: Vec<f32>,
    pub metadata: VectorMetadata,
}

/// One persisted graph node, as stored under its id in `index.json`.
/// `connections[layer]` is a set of neighbor ids, represented the way the
/// reference implementation does: a map from neighbor id to `true`.
/// Write-only — never read back, since loading always rebuilds the graph
/// by replaying `vectors.json` through `HnswIndex::insert`.
#[derive(Debug, Clone, Serialize)]
pub struct IndexNodeDump {
    pub id: VectorId,
    pub vector: Vec<f32>,
    pub connections: Vec<HashMap<VectorId, bool>>,
    pub level: usize,
    pub metadata: Option<VectorMetadata>,
}

fn persistence_err(operation: &str, path: &Path, cause: impl std::fmt::Display) -> Error {
    Error::PersistenceError {
        operation: operation.to_string(),
        path: path.display().to_string(),
        cause: cause.to_string(),
    }
}

/// Writes `contents` to `path` by first writing a sibling temp file and
/// then renaming it into place, so readers never observe a partially
/// written file.
fn write_atomic(path: &Path, contents: &[u8], operation: &str) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, contents).map_err(|e| persistence_err(operation, &temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| persistence_err(operation, path, e))?;
    Ok(())
}

/// Writes `config.json`, `vectors.json`, and `index.json` into `dir`,
/// creating the directory if it doesn't exist.
pub fn save(
    dir: &Path,
    config: &DatabaseConfig,
    vectors: &HashMap<VectorId, (Vector, VectorMetadata)>,
    nodes: &[NodeSnapshot],
) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| persistence_err("save", dir, e))?;

    let config_path = dir.join(CONFIG_FILE);
    let config_json =
        serde_json::to_vec_pretty(config).map_err(|e| persistence_err("save", &config_path, e))?;
    write_atomic(&config_path, &config_json, "save")?;

    let records: HashMap<VectorId, VectorRecord> = vectors
        .iter()
        .map(|(id, (vector, metadata))| {
            (
                id.clone(),
                VectorRecord {
                    vector: vector.as_slice().to_vec(),
                    metadata: metadata.clone(),
                },
            )
        })
        .collect();
    let vectors_path = dir.join(VECTORS_FILE);
    let vectors_json =
        serde_json::to_vec_pretty(&records).map_err(|e| persistence_err("save", &vectors_path, e))?;
    write_atomic(&vectors_path, &vectors_json, "save")?;

    let dump: HashMap<VectorId, IndexNodeDump> = nodes
        .iter()
        .map(|node| {
            let connections = node
                .connections
                .iter()
                .map(|layer| layer.iter().map(|nid| (nid.clone(), true)).collect())
                .collect();
            (
                node.id.clone(),
                IndexNodeDump {
                    id: node.id.clone(),
                    vector: node.vector.clone(),
                    connections,
                    level: node.level,
                    metadata: vectors.get(&node.id).map(|(_, meta)| meta.clone()),
                },
            )
        })
        .collect();
    let index_path = dir.join(INDEX_FILE);
    let index_json =
        serde_json::to_vec_pretty(&dump).map_err(|e| persistence_err("save", &index_path, e))?;
    write_atomic(&index_path, &index_json, "save")?;

    Ok(())
}

/// Reads `config.json` and `vectors.json` from `dir`. `index.json` is
/// ignored on load — callers rebuild the graph from the returned records.
pub fn load(dir: &Path) -> Result<(DatabaseConfig, HashMap<VectorId, VectorRecord>)> {
    let config_path = dir.join(CONFIG_FILE);
    let config_bytes =
        fs::read(&config_path).map_err(|e| persistence_err("load", &config_path, e))?;
    let config: DatabaseConfig = serde_json::from_slice(&config_bytes)
        .map_err(|e| persistence_err("load", &config_path, e))?;

    let vectors_path = dir.join(VECTORS_FILE);
    let vectors_bytes =
        fs::read(&vectors_path).map_err(|e| persistence_err("load", &vectors_path, e))?;
    let records: HashMap<VectorId, VectorRecord> = serde_json::from_slice(&vectors_bytes)
        .map_err(|e| persistence_err("load", &vectors_path, e))?;

    Ok((config, records))
}

/// Returns true if `dir` looks like it holds a snapshot (has at least
/// `config.json`).
pub fn snapshot_exists(dir: &Path) -> bool {
    dir.join(CONFIG_FILE).exists()
}

/// Returns true if `dir` has a `vectors.json`. `Database::load` treats a
/// missing `vectors.json` as "no snapshot was ever written" rather than
/// an error.
pub fn vectors_file_exists(dir: &Path) -> bool {
    dir.join(VECTORS_FILE).exists()
}

/// Convenience alias used by the facade when resolving `persist_path`.
pub fn resolve_dir(path: &str) -> PathBuf {
    PathBuf::from(path)
}
