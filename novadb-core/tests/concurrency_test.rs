//! Concurrent access against a single shared `Database`.

use std::sync::Arc;
use std::thread;

use novadb_core::{Database, DatabaseConfig, DistanceMetric, Vector};

const THREADS: usize = 8;
const OPS_PER_THREAD: usize = 1000;

#[test]
fn eight_threads_mixed_insert_search_delete_leave_a_consistent_graph() {
    let mut config = DatabaseConfig::new(8);
    config.distance_metric = DistanceMetric::Euclidean;
    let db = Arc::new(Database::new(config).unwrap());

    let handles: Vec<_> = (0..THREADS)
        .map(|thread_idx| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                for op in 0..OPS_PER_THREAD {
                    let id = format!("t{thread_idx}-{op}");
                    let vector: Vec<f32> = (0..8)
                        .map(|d| ((thread_idx * OPS_PER_THREAD + op + d) as f32).sin())
                        .collect();

                    match op % 10 {
                        // Most ops insert a fresh vector.
                        0..=6 => {
                            db.insert(id, Vector::from_vec(vector), None).unwrap();
                        }
                        // Some ops search using whatever is already present.
                        7..=8 => {
                            let _ = db.search(&vector, 5, None, None).unwrap();
                        }
                        // The rest delete an id this thread inserted earlier,
                        // or — too early in the run for that — an id that
                        // was never inserted. Either way `delete` is
                        // dispatched and recorded (as a success or a
                        // `NotFound` user error), so every iteration counts
                        // toward the stats total below.
                        _ => {
                            let victim = if op >= 20 {
                                format!("t{thread_idx}-{}", op - 20)
                            } else {
                                format!("t{thread_idx}-unseen-{op}")
                            };
                            let _ = db.delete(&victim);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    db.check_invariants().unwrap();

    let stats = db.get_stats();
    let expected_total = (THREADS * OPS_PER_THREAD) as u64;
    let accounted = stats.counters.inserts
        + stats.counters.insert_errors
        + stats.counters.searches
        + stats.counters.search_errors
        + stats.counters.deletes
        + stats.counters.delete_errors;
    assert_eq!(accounted, expected_total);

    assert_eq!(stats.vector_count, db.list(0, usize::MAX).len());
}
