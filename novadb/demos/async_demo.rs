//! Async API demo using `Database`'s background auto-save task.
//!
//! Run with: cargo run --example async_demo --features async

use novadb::prelude::*;

#[cfg(feature = "async")]
#[tokio::main]
async fn main() {
    use std::sync::Arc;
    use std::time::Duration;

    println!("Async novadb Demo\n");

    let temp_dir = std::env::temp_dir().join("novadb_async_demo");
    let _ = std::fs::remove_dir_all(&temp_dir);

    let mut config = DatabaseConfig::new(128);
    config.persist_path = Some(temp_dir.to_string_lossy().to_string());
    config.auto_save = true;
    config.save_interval = Duration::from_secs(5);

    let db = Database::open(config).expect("failed to open database");

    println!("Opened database with auto-save enabled\n");

    println!("⏳ Inserting 1000 vectors concurrently via spawn_blocking...");
    let start = std::time::Instant::now();

    let mut handles = vec![];
    for i in 0..1000 {
        let db: Arc<Database> = db.clone();
        let handle = tokio::spawn(async move {
            let vector: Vec<f32> = (0..128).map(|j| ((i * 128 + j) as f32).sin()).collect();
            tokio::task::spawn_blocking(move || {
                db.insert(i.to_string(), Vector::from_vec(vector), None)
            })
            .await
            .unwrap()
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    println!("   [OK] Inserted in {:?}", start.elapsed());
    println!("   Total vectors: {}\n", db.list(0, usize::MAX).len());

    println!("Searching...");
    let query: Vec<f32> = (0..128).map(|i| (i as f32 * 0.1).cos()).collect();
    let results = db.search(&query, 5, None, None).unwrap();

    println!("   Top 5 results:");
    for (i, hit) in results.iter().enumerate() {
        println!("     {}. ID {} (distance: {:.4})", i + 1, hit.id, hit.distance);
    }

    db.close().unwrap();
    let _ = std::fs::remove_dir_all(&temp_dir);

    println!("\nAsync demo complete!");
}

#[cfg(not(feature = "async"))]
fn main() {
    println!("Run with: cargo run --example async_demo --features async");
}
