//! Quick start example for novadb.
//!
//! This example demonstrates basic usage of novadb for semantic search
//! over a small set of documents.

use std::collections::HashMap;

use novadb::prelude::*;
use serde_json::Value;

fn main() -> Result<()> {
    println!("🌟 novadb Quick Start Example\n");

    // 8-dimensional vectors for demonstration; real embeddings are usually
    // 384-1536 dimensions.
    let config = DatabaseConfig::new(8);
    let db = Database::new(config)?;

    let documents = vec![
        (
            "doc-1",
            "Introduction to Rust programming",
            [0.9, 0.8, 0.1, 0.0, 0.1, 0.0, 0.2, 0.1],
        ),
        (
            "doc-2",
            "Advanced Rust patterns and idioms",
            [0.85, 0.9, 0.15, 0.05, 0.1, 0.0, 0.25, 0.15],
        ),
        (
            "doc-3",
            "Python for data science",
            [0.1, 0.2, 0.9, 0.85, 0.0, 0.1, 0.0, 0.2],
        ),
        (
            "doc-4",
            "Machine learning fundamentals",
            [0.2, 0.1, 0.7, 0.8, 0.6, 0.7, 0.1, 0.3],
        ),
        (
            "doc-5",
            "Systems programming with Rust",
            [0.8, 0.7, 0.2, 0.1, 0.15, 0.05, 0.3, 0.2],
        ),
    ];

    println!("📥 Inserting {} documents...", documents.len());
    for (id, title, embedding) in &documents {
        let mut tags = HashMap::new();
        tags.insert("title".to_string(), Value::String(title.to_string()));
        let metadata = VectorMetadata::with_tags(tags);
        db.insert(id.to_string(), Vector::new(embedding), Some(metadata))?;
    }
    println!("✅ Database contains {} vectors\n", db.list(0, usize::MAX).len());

    let query = [0.88, 0.85, 0.12, 0.03, 0.12, 0.02, 0.22, 0.12];
    println!("🔍 Searching for documents similar to 'Rust programming'...\n");

    let results = db.search(&query, 3, None, None)?;

    println!("📊 Top 3 Results:");
    println!("{:-<60}", "");
    for (rank, hit) in results.iter().enumerate() {
        let title = hit
            .metadata
            .tags
            .as_ref()
            .and_then(|t| t.get("title"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        println!(
            "  {}. [ID: {}] {} (distance: {:.4})",
            rank + 1,
            hit.id,
            title,
            hit.distance
        );
    }
    println!("{:-<60}\n", "");

    println!("✨ Done! novadb is working correctly.");
    Ok(())
}
