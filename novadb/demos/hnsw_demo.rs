//! HNSW demo - comparing approximate search at two different `ef_search`
//! budgets against brute-force ground truth.
//!
//! This example demonstrates the speed/recall tradeoff that `ef_search`
//! controls: a small beam width is fast but approximate, a large one
//! approaches brute-force recall at brute-force-ish cost.

use std::collections::HashSet;
use std::time::Instant;

use novadb::prelude::*;

fn main() {
    println!("🚀 HNSW Performance Demo\n");

    let num_vectors = 10_000;
    let dimension = 128;
    let k = 10;

    println!("📊 Setup: {} vectors, {} dimensions", num_vectors, dimension);
    println!();

    println!("⏳ Generating {} random vectors...", num_vectors);
    let vectors: Vec<(String, Vec<f32>)> = (0..num_vectors)
        .map(|i| {
            let v = (0..dimension)
                .map(|j| ((i * dimension + j) as f32 * 0.1).sin())
                .collect();
            (i.to_string(), v)
        })
        .collect();

    println!("🔨 Building HNSW index...");
    let config = HnswConfig {
        m: 16,
        max_m0: 32,
        ef_construction: 200,
        ef_search: 100,
        ml: 1.0 / std::f64::consts::LN_2,
        max_level: 16,
    };
    let start = Instant::now();
    let mut index = HnswIndex::new(DistanceMetric::Euclidean, dimension, config);
    for (id, v) in &vectors {
        index.insert(id.clone(), Vector::from_vec(v.clone())).unwrap();
    }
    println!("   ✅ Built in {:?}", start.elapsed());
    println!();

    let query: Vec<f32> = (0..dimension).map(|j| (j as f32 * 0.15).cos()).collect();

    println!("🔍 Brute-force search (exact k={})...", k);
    let start = Instant::now();
    let mut distances: Vec<_> = vectors
        .iter()
        .map(|(id, v)| (id.clone(), index.metric().compute(&query, v)))
        .collect();
    distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    let bf_time = start.elapsed();
    let bf_ids: HashSet<_> = distances.iter().take(k).map(|(id, _)| id.clone()).collect();
    println!("   ⏱️  Time: {:?}", bf_time);

    for (label, ef) in [("low ef_search", 20usize), ("high ef_search", 200)] {
        println!("🔍 HNSW search ({label}, ef={ef}, k={k})...");
        let start = Instant::now();
        let results = index.search(&query, k, Some(ef));
        let elapsed = start.elapsed();
        let hnsw_ids: HashSet<_> = results.iter().map(|r| r.id.clone()).collect();
        let recall = bf_ids.intersection(&hnsw_ids).count() as f64 / k as f64;

        println!("   ⏱️  Time:   {:?}", elapsed);
        println!(
            "   ⚡ Speedup: {:.1}x",
            bf_time.as_nanos() as f64 / elapsed.as_nanos().max(1) as f64
        );
        println!("   📈 Recall@{k}: {:.0}%", recall * 100.0);
        println!();
    }

    println!("✨ HNSW provides fast approximate search with tunable recall!");
}
