//! Distance metrics for vector similarity computations.
//!
//! Every metric is reduced to a single ordering convention: smaller values
//! mean "more similar". `DotProduct` is negated internally to fit that
//! convention; the other three are naturally smaller-is-closer.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Supported distance metrics for vector similarity.
///
/// Serializes as its integer wire code (0-3) rather than its variant name,
/// matching the external `config.json` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceMetric {
    /// Euclidean distance (L2 norm). Lower is more similar.
    Euclidean,
    /// Cosine distance (1 - cosine similarity). Lower is more similar.
    Cosine,
    /// Dot product (inner product). Higher is more similar.
    /// Results are negated internally so lower = more similar (consistent API).
    DotProduct,
    /// Manhattan distance (L1 norm, sum of absolute differences). Lower is more similar.
    Manhattan,
}

impl Default for DistanceMetric {
    fn default() -> Self {
        Self::Cosine
    }
}

impl DistanceMetric {
    pub fn code(&self) -> u8 {
        match self {
            DistanceMetric::Cosine => 0,
            DistanceMetric::Euclidean => 1,
            DistanceMetric::DotProduct => 2,
            DistanceMetric::Manhattan => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(DistanceMetric::Cosine),
            1 => Some(DistanceMetric::Euclidean),
            2 => Some(DistanceMetric::DotProduct),
            3 => Some(DistanceMetric::Manhattan),
            _ => None,
        }
    }
}

impl Serialize for DistanceMetric {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for DistanceMetric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        DistanceMetric::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid distance metric code {code}")))
    }
}

/// A computed distance value with its metric type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    pub value: f32,
    pub metric: DistanceMetric,
}

impl Distance {
    /// Creates a new Distance with the given value and metric.
    #[inline]
    pub fn new(value: f32, metric: DistanceMetric) -> Self {
        Self { value, metric }
    }
}

impl DistanceMetric {
    /// Computes the distance between two vectors using this metric.
    ///
    /// # Panics
    ///
    /// Panics if vectors have different dimensions.
    #[inline]
    pub fn compute(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");

        match self {
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::Cosine => cosine_distance(a, b),
            DistanceMetric::DotProduct => -dot_product(a, b),
            DistanceMetric::Manhattan => manhattan_distance(a, b),
        }
    }

    /// Returns true if lower distance values indicate more similarity.
    ///
    /// All metrics are normalized so that lower values = more similar.
    #[inline]
    pub fn lower_is_better(&self) -> bool {
        true
    }
}

/// Computes Euclidean (L2) distance between two vectors.
///
/// Formula: sqrt(sum((a[i] - b[i])^2))
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    euclidean_distance_squared(a, b).sqrt()
}

/// Computes squared Euclidean distance (avoids sqrt for comparisons).
#[inline]
pub fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Computes cosine distance between two vectors.
///
/// Formula: 1 - (a . b) / (||a|| * ||b||)
/// Range: [0, 2] where 0 = identical direction, 2 = opposite direction.
/// Defined as 0 if either vector has zero norm.
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    let denominator = norm_a * norm_b;
    if denominator == 0.0 {
        return 0.0;
    }

    1.0 - (dot / denominator)
}

/// Computes dot product (inner product) between two vectors.
///
/// Formula: sum(a[i] * b[i])
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Computes Manhattan (L1) distance between two vectors.
///
/// Formula: sum(|a[i] - b[i]|)
#[inline]
pub fn manhattan_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// Widens the search candidate list for a query so that requesting `k`
/// results with a small `ef_search` still returns good recall.
///
/// `max(ef_search, ceil(1.5 * k))`.
#[inline]
pub fn optimal_ef(k: usize, ef_search: usize) -> usize {
    let scaled = ((1.5 * k as f64).ceil()) as usize;
    ef_search.max(scaled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert!((euclidean_distance(&a, &b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_same_vector() {
        let a = [1.0, 2.0, 3.0];
        assert!(euclidean_distance(&a, &a) < 1e-10);
    }

    #[test]
    fn test_cosine_distance_identical() {
        let a = [1.0, 0.0];
        let b = [2.0, 0.0];
        assert!(cosine_distance(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_orthogonal() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_opposite() {
        let a = [1.0, 0.0];
        let b = [-1.0, 0.0];
        assert!((cosine_distance(&a, &b) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_zero_norm_is_zero() {
        let a = [0.0, 0.0];
        let b = [1.0, 0.0];
        assert_eq!(cosine_distance(&a, &b), 0.0);
    }

    #[test]
    fn test_dot_product() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        assert!((dot_product(&a, &b) - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_manhattan_distance() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 0.0, 3.0];
        // |1-4| + |2-0| + |3-3| = 3 + 2 + 0 = 5
        assert!((manhattan_distance(&a, &b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_metric_compute() {
        let a = [3.0, 4.0];
        let b = [0.0, 0.0];

        assert!((DistanceMetric::Euclidean.compute(&a, &b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_all_metrics_lower_is_better() {
        assert!(DistanceMetric::Euclidean.lower_is_better());
        assert!(DistanceMetric::Cosine.lower_is_better());
        assert!(DistanceMetric::DotProduct.lower_is_better());
        assert!(DistanceMetric::Manhattan.lower_is_better());
    }

    #[test]
    fn test_metric_code_round_trip() {
        for m in [
            DistanceMetric::Cosine,
            DistanceMetric::Euclidean,
            DistanceMetric::DotProduct,
            DistanceMetric::Manhattan,
        ] {
            assert_eq!(DistanceMetric::from_code(m.code()), Some(m));
        }
    }

    #[test]
    fn test_optimal_ef() {
        assert_eq!(optimal_ef(10, 50), 50);
        assert_eq!(optimal_ef(100, 50), 150);
        assert_eq!(optimal_ef(1, 10), 10);
    }
}
