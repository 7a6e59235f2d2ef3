//! Persistence demonstration for novadb.
//!
//! This example shows how to:
//! 1. Create a database with a `persist_path` and insert vectors
//! 2. Save a snapshot
//! 3. Open a fresh `Database` and `Load` the snapshot
//! 4. Confirm data inserted without a `Save` does not survive

use std::collections::HashMap;
use std::fs;

use novadb::prelude::*;
use serde_json::Value;

fn make_config(path: &str) -> DatabaseConfig {
    let mut config = DatabaseConfig::new(8);
    config.persist_path = Some(path.to_string());
    config
}

fn main() -> Result<()> {
    let snapshot_path = "./demo_snapshot";
    let _ = fs::remove_dir_all(snapshot_path);

    println!("🌟 novadb Persistence Demo\n");

    println!("📥 Phase 1: Creating a database and inserting vectors...");
    {
        let db = Database::new(make_config(snapshot_path))?;

        let docs = [
            (
                "doc-1",
                "Rust programming basics",
                [0.9, 0.8, 0.1, 0.0, 0.1, 0.0, 0.2, 0.1],
            ),
            (
                "doc-2",
                "Advanced Rust patterns",
                [0.85, 0.9, 0.15, 0.05, 0.1, 0.0, 0.25, 0.15],
            ),
            (
                "doc-3",
                "Python data science",
                [0.1, 0.2, 0.9, 0.85, 0.0, 0.1, 0.0, 0.2],
            ),
        ];

        for (id, title, embedding) in &docs {
            let mut tags = HashMap::new();
            tags.insert("title".to_string(), Value::String(title.to_string()));
            db.insert(
                id.to_string(),
                Vector::new(embedding),
                Some(VectorMetadata::with_tags(tags)),
            )?;
        }

        println!("   ✅ Inserted {} vectors", db.list(0, usize::MAX).len());
        println!("   💾 Saving snapshot...");
        db.save()?;
        println!("   ✅ Snapshot written to {snapshot_path}\n");
        // db is dropped here, simulating process shutdown.
    }

    println!("🔄 Phase 2: Opening a fresh Database and loading the snapshot...");
    {
        let db = Database::new(make_config(snapshot_path))?;
        db.load()?;
        println!("   ✅ Loaded {} vectors\n", db.list(0, usize::MAX).len());

        println!("📊 Verifying loaded data:");
        for id in ["doc-1", "doc-2", "doc-3"] {
            if let Some(stored) = db.get(&id.to_string()) {
                let title = stored
                    .metadata
                    .tags
                    .as_ref()
                    .and_then(|t| t.get("title"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                println!("   {id}: {title}");
            }
        }
        println!();

        println!("🔍 Searching for 'Rust programming'...");
        let query = [0.88, 0.85, 0.12, 0.03, 0.12, 0.02, 0.22, 0.12];
        let results = db.search(&query, 3, None, None)?;
        for hit in &results {
            println!("   [ID: {}] distance: {:.4}", hit.id, hit.distance);
        }
        println!();
    }

    println!("💥 Phase 3: Inserting without calling Save...");
    {
        let db = Database::new(make_config(snapshot_path))?;
        db.load()?;
        db.insert(
            "doc-4".to_string(),
            Vector::new(&[0.5; 8]),
            Some(VectorMetadata::new()),
        )?;
        println!("   ✅ Inserted doc-4 WITHOUT calling Save()");
        println!("   📝 Simulating process exit without a final save...\n");
        // No Save() call: doc-4 only exists in this process's memory.
    }

    println!("🔄 Phase 4: Reopening without a prior Save of doc-4...");
    {
        let db = Database::new(make_config(snapshot_path))?;
        db.load()?;
        println!("   ✅ Reopened with {} vectors", db.list(0, usize::MAX).len());
        if db.get(&"doc-4".to_string()).is_some() {
            println!("   ❌ doc-4 unexpectedly present");
        } else {
            println!("   ✅ doc-4 absent, as expected without a Save()");
        }
    }

    let _ = fs::remove_dir_all(snapshot_path);
    println!("\n✨ Demo complete! novadb snapshot persistence is working correctly.");
    Ok(())
}
