//! Property tests for the distance kernel and the HNSW graph invariants.

use novadb_core::distance::{cosine_distance, dot_product, euclidean_distance_squared};
use novadb_core::{DistanceMetric, HnswConfig, HnswIndex, Vector};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_dot_product_matches_naive(
        a in proptest::collection::vec(-1.0f32..1.0f32, 0..100),
        b in proptest::collection::vec(-1.0f32..1.0f32, 0..100)
    ) {
        let len = std::cmp::min(a.len(), b.len());
        let a = &a[..len];
        let b = &b[..len];

        let optim = dot_product(a, b);
        let naive: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();

        prop_assert!((optim - naive).abs() < 1e-4);
    }

    #[test]
    fn test_euclidean_matches_naive(
        a in proptest::collection::vec(-1.0f32..1.0f32, 0..100),
        b in proptest::collection::vec(-1.0f32..1.0f32, 0..100)
    ) {
        let len = std::cmp::min(a.len(), b.len());
        let a = &a[..len];
        let b = &b[..len];

        let optim = euclidean_distance_squared(a, b);
        let naive: f32 = a.iter()
            .zip(b.iter())
            .map(|(x, y)| {
                let diff = x - y;
                diff * diff
            })
            .sum();

        prop_assert!((optim - naive).abs() < 1e-3);
    }

    #[test]
    fn test_cosine_distance_is_bounded(
        a in proptest::collection::vec(-1.0f32..1.0f32, 1..50),
        b in proptest::collection::vec(-1.0f32..1.0f32, 1..50)
    ) {
        let len = std::cmp::min(a.len(), b.len());
        let a = &a[..len];
        let b = &b[..len];

        let d = cosine_distance(a, b);
        prop_assert!((0.0..=2.0).contains(&d) || d.is_nan() == false && d >= 0.0);
    }

    #[test]
    fn test_hnsw_preserves_symmetric_edges_and_degree_caps(
        // Small vectors and small graphs keep proptest shrinking fast while
        // still exercising pruning-on-overflow.
        vectors in proptest::collection::vec(
            proptest::collection::vec(-1.0f32..1.0f32, 4),
            1..40
        )
    ) {
        let config = HnswConfig {
            m: 4,
            max_m0: 8,
            ef_construction: 50,
            ef_search: 20,
            ml: 1.0 / (4.0_f64).ln(),
            max_level: 8,
        };
        let mut index = HnswIndex::new(DistanceMetric::Euclidean, 4, config);

        for (i, v) in vectors.into_iter().enumerate() {
            index.insert(i.to_string(), Vector::from_vec(v)).unwrap();
        }

        prop_assert!(index.check_invariants().is_ok());
    }

    #[test]
    fn test_hnsw_survives_interleaved_insert_delete(
        vectors in proptest::collection::vec(
            proptest::collection::vec(-1.0f32..1.0f32, 4),
            1..40
        )
    ) {
        let config = HnswConfig {
            m: 4,
            max_m0: 8,
            ef_construction: 50,
            ef_search: 20,
            ml: 1.0 / (4.0_f64).ln(),
            max_level: 8,
        };
        let mut index = HnswIndex::new(DistanceMetric::Euclidean, 4, config);

        for (i, v) in vectors.into_iter().enumerate() {
            let id = i.to_string();
            index.insert(id.clone(), Vector::from_vec(v)).unwrap();
            if i % 3 == 0 && i > 0 {
                let victim = (i - 1).to_string();
                index.delete(&victim);
            }
            prop_assert!(index.check_invariants().is_ok());
        }
    }
}
