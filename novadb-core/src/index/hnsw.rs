//! HNSW (Hierarchical Navigable Small World) graph index.
//!
//! HNSW builds a multi-layer proximity graph where layer 0 holds every
//! vector with dense connections and each higher layer holds a
//! geometrically shrinking subset with sparser connections, the way a
//! skip list trades extra structure for faster descent. Search starts at
//! the top layer and greedily descends to layer 0, then runs a
//! beam-search pass there to collect the final candidate set.
//!
//! # References
//!
//! Malkov & Yashunin (2018): "Efficient and robust approximate nearest
//! neighbor search using HNSW graphs".

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use rand::Rng;

use crate::config::HnswConfig;
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::vector::{Vector, VectorId};

/// A node in the HNSW graph.
#[derive(Debug, Clone)]
struct HnswNode {
    vector: Vector,
    /// Highest layer this node appears in.
    level: usize,
    /// Neighbors at each layer: `neighbors[layer]` is the connected node
    /// id list for that layer.
    neighbors: Vec<Vec<VectorId>>,
}

impl HnswNode {
    fn new(vector: Vector, level: usize) -> Self {
        Self {
            vector,
            level,
            neighbors: vec![Vec::new(); level + 1],
        }
    }
}

/// A candidate during search, ordered by distance (min-heap: closest first).
#[derive(Debug, Clone)]
struct Candidate {
    id: VectorId,
    distance: f32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// A candidate for a max-heap (furthest first).
#[derive(Debug, Clone)]
struct FurthestCandidate {
    id: VectorId,
    distance: f32,
}

impl PartialEq for FurthestCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl Eq for FurthestCandidate {}

impl PartialOrd for FurthestCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FurthestCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// A single match produced by [`HnswIndex::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: VectorId,
    pub distance: f32,
}

/// A read-only view of one graph node, exposed for snapshotting to
/// `index.json`. `connections[layer]` lists that layer's neighbor ids.
#[derive(Debug, Clone)]
pub struct NodeSnapshot {
    pub id: VectorId,
    pub vector: Vec<f32>,
    pub level: usize,
    pub connections: Vec<Vec<VectorId>>,
}

/// HNSW index for approximate nearest neighbor search.
///
/// The index is a two-state machine: empty (no entry point, `max_level ==
/// 0`) or populated (`entry_point` set, `max_level` the highest level any
/// node occupies). Every mutating operation restores one of these two
/// states before returning.
pub struct HnswIndex {
    dimension: usize,
    metric: DistanceMetric,
    config: HnswConfig,
    entry_point: Option<VectorId>,
    max_level: usize,
    nodes: HashMap<VectorId, HnswNode>,
    rng: rand::rngs::ThreadRng,
}

impl HnswIndex {
    /// Creates a new empty HNSW index.
    pub fn new(metric: DistanceMetric, dimension: usize, config: HnswConfig) -> Self {
        Self {
            dimension,
            metric,
            config,
            entry_point: None,
            max_level: 0,
            nodes: HashMap::new(),
            rng: rand::thread_rng(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    #[inline]
    pub fn entry_point(&self) -> Option<&VectorId> {
        self.entry_point.as_ref()
    }

    #[inline]
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Draws a random level via the standard exponential-decay assignment,
    /// capped to `config.max_level` so a single unlucky draw can't blow the
    /// layer budget.
    fn random_level(&mut self) -> usize {
        let r: f64 = self.rng.gen::<f64>().max(f64::MIN_POSITIVE);
        let level = (-r.ln() * self.config.ml).floor() as usize;
        level.min(self.config.max_level)
    }

    #[inline]
    fn distance(&self, query: &[f32], node_id: &VectorId) -> f32 {
        let node = &self.nodes[node_id];
        self.metric.compute(query, node.vector.as_slice())
    }

    /// Inserts a vector into the index under the given id.
    pub fn insert(&mut self, id: VectorId, vector: Vector) -> Result<()> {
        if vector.dimension() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: vector.dimension(),
            });
        }

        if self.nodes.contains_key(&id) {
            return Err(Error::Duplicate(id));
        }

        let query = vector.as_slice().to_vec();
        let new_level = self.random_level();

        // First node becomes the entry point with no neighbors to wire up.
        if self.entry_point.is_none() {
            let node = HnswNode::new(vector, new_level);
            self.nodes.insert(id.clone(), node);
            self.entry_point = Some(id);
            self.max_level = new_level;
            return Ok(());
        }

        let entry_point = self.entry_point.clone().unwrap();

        // Phase 1: greedily descend from the top layer to new_level + 1,
        // tracking only a single best entry point per layer.
        let mut current_ep = entry_point;
        for layer in (new_level + 1..=self.max_level).rev() {
            current_ep = self.greedy_search_single(&query, &current_ep, layer);
        }

        self.nodes.insert(id.clone(), HnswNode::new(vector, new_level));

        // Phase 2: at each layer from new_level down to 0, beam-search for
        // candidates and connect the new node bidirectionally, pruning any
        // neighbor that now exceeds its degree cap.
        let mut ep_set = vec![current_ep];
        for layer in (0..=new_level.min(self.max_level)).rev() {
            let candidates = self.search_layer(&query, &ep_set, self.config.ef_construction, layer);

            let m = if layer == 0 {
                self.config.max_m0
            } else {
                self.config.m
            };
            let selected = select_closest(&candidates, m);

            self.nodes.get_mut(&id).unwrap().neighbors[layer] = selected.clone();

            for neighbor_id in &selected {
                self.nodes.get_mut(neighbor_id).unwrap().neighbors[layer].push(id.clone());
                self.prune_layer_if_needed(neighbor_id, layer, m);
            }

            ep_set = candidates.into_iter().map(|c| c.id).collect();
        }

        if new_level > self.max_level {
            self.entry_point = Some(id);
            self.max_level = new_level;
        }

        Ok(())
    }

    /// If `node_id`'s neighbor list at `layer` exceeds `cap`, drops the
    /// furthest neighbors and removes the matching edge on the other side,
    /// preserving the symmetric-edge invariant.
    fn prune_layer_if_needed(&mut self, node_id: &VectorId, layer: usize, cap: usize) {
        let current = self.nodes[node_id].neighbors[layer].clone();
        if current.len() <= cap {
            return;
        }

        let node_vector = self.nodes[node_id].vector.as_slice().to_vec();
        let scored: Vec<Candidate> = current
            .iter()
            .map(|nid| Candidate {
                id: nid.clone(),
                distance: self.metric.compute(&node_vector, self.nodes[nid].vector.as_slice()),
            })
            .collect();

        let kept = select_closest(&scored, cap);
        let kept_set: HashSet<&VectorId> = kept.iter().collect();
        let dropped: Vec<VectorId> = current
            .into_iter()
            .filter(|nid| !kept_set.contains(nid))
            .collect();

        self.nodes.get_mut(node_id).unwrap().neighbors[layer] = kept;

        for dropped_id in dropped {
            if let Some(other) = self.nodes.get_mut(&dropped_id) {
                if layer < other.neighbors.len() {
                    other.neighbors[layer].retain(|nid| nid != node_id);
                }
            }
        }
    }

    /// Greedy single-best-neighbor descent at one layer.
    fn greedy_search_single(&self, query: &[f32], entry: &VectorId, layer: usize) -> VectorId {
        let mut current = entry.clone();
        let mut current_dist = self.distance(query, &current);

        loop {
            let mut changed = false;
            let node = &self.nodes[&current];

            if layer < node.neighbors.len() {
                for neighbor_id in &node.neighbors[layer] {
                    let dist = self.distance(query, neighbor_id);
                    if dist < current_dist {
                        current = neighbor_id.clone();
                        current_dist = dist;
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        current
    }

    /// Beam search at a single layer, returning up to `ef` candidates
    /// sorted by ascending distance.
    fn search_layer(
        &self,
        query: &[f32],
        entry_points: &[VectorId],
        ef: usize,
        layer: usize,
    ) -> Vec<Candidate> {
        debug_assert!(
            !entry_points.is_empty(),
            "search_layer requires at least one entry point"
        );
        if entry_points.is_empty() {
            return Vec::new();
        }

        let mut visited: HashSet<VectorId> = HashSet::new();
        let mut candidates: BinaryHeap<Candidate> = BinaryHeap::new();
        let mut results: BinaryHeap<FurthestCandidate> = BinaryHeap::new();

        for ep in entry_points {
            if visited.insert(ep.clone()) {
                let dist = self.distance(query, ep);
                candidates.push(Candidate {
                    id: ep.clone(),
                    distance: dist,
                });
                results.push(FurthestCandidate {
                    id: ep.clone(),
                    distance: dist,
                });
            }
        }

        while let Some(closest) = candidates.pop() {
            if let Some(furthest) = results.peek() {
                if closest.distance > furthest.distance && results.len() >= ef {
                    break;
                }
            }

            if let Some(node) = self.nodes.get(&closest.id) {
                if layer < node.neighbors.len() {
                    for neighbor_id in &node.neighbors[layer] {
                        if visited.insert(neighbor_id.clone()) {
                            let dist = self.distance(query, neighbor_id);

                            let should_add = results.len() < ef
                                || dist < results.peek().map(|f| f.distance).unwrap_or(f32::MAX);

                            if should_add {
                                candidates.push(Candidate {
                                    id: neighbor_id.clone(),
                                    distance: dist,
                                });
                                results.push(FurthestCandidate {
                                    id: neighbor_id.clone(),
                                    distance: dist,
                                });

                                while results.len() > ef {
                                    results.pop();
                                }
                            }
                        }
                    }
                }
            }
        }

        let mut result_vec: Vec<_> = results
            .into_iter()
            .map(|f| Candidate {
                id: f.id,
                distance: f.distance,
            })
            .collect();
        result_vec.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
        });
        result_vec
    }

    /// Searches for the k nearest neighbors to `query`.
    ///
    /// `ef` overrides the configured `ef_search`; the caller is expected
    /// to have already combined it with [`crate::distance::optimal_ef`] if
    /// desired. The effective beam width is never less than `k`.
    pub fn search(&self, query: &[f32], k: usize, ef: Option<usize>) -> Vec<SearchResult> {
        if self.is_empty() || query.len() != self.dimension || k == 0 {
            return Vec::new();
        }

        let ef = ef.unwrap_or(self.config.ef_search).max(k);
        let entry_point = self.entry_point.clone().unwrap();

        let mut current_ep = entry_point;
        for layer in (1..=self.max_level).rev() {
            current_ep = self.greedy_search_single(query, &current_ep, layer);
        }

        let candidates = self.search_layer(query, &[current_ep], ef, 0);

        candidates
            .into_iter()
            .take(k)
            .map(|c| SearchResult {
                id: c.id,
                distance: c.distance,
            })
            .collect()
    }

    /// Returns the stored vector for `id`, if present.
    pub fn get(&self, id: &VectorId) -> Option<&Vector> {
        self.nodes.get(id).map(|n| &n.vector)
    }

    /// Returns a snapshot of every node's level, vector, and per-layer
    /// neighbor sets, for dumping to `index.json`. Never consulted on
    /// load — the graph is always rebuilt by replaying inserts.
    pub fn node_snapshots(&self) -> Vec<NodeSnapshot> {
        self.nodes
            .iter()
            .map(|(id, node)| NodeSnapshot {
                id: id.clone(),
                vector: node.vector.as_slice().to_vec(),
                level: node.level,
                connections: node.neighbors.clone(),
            })
            .collect()
    }

    /// Removes a vector from the index, repairing neighbor edges and, if
    /// necessary, choosing a new entry point.
    ///
    /// The replacement entry point is the remaining node with the highest
    /// surviving level (ties broken arbitrarily); `max_level` is updated to
    /// that node's level. If no nodes remain, the index returns to its
    /// empty state.
    pub fn delete(&mut self, id: &VectorId) -> bool {
        let Some(node) = self.nodes.remove(id) else {
            return false;
        };

        for (layer, neighbors) in node.neighbors.iter().enumerate() {
            for neighbor_id in neighbors {
                if let Some(neighbor) = self.nodes.get_mut(neighbor_id) {
                    if layer < neighbor.neighbors.len() {
                        neighbor.neighbors[layer].retain(|nid| nid != id);
                    }
                }
            }
        }

        if self.entry_point.as_ref() == Some(id) {
            let replacement = self
                .nodes
                .iter()
                .max_by_key(|(_, n)| n.level)
                .map(|(nid, n)| (nid.clone(), n.level));

            match replacement {
                Some((nid, level)) => {
                    self.entry_point = Some(nid);
                    self.max_level = level;
                }
                None => {
                    self.entry_point = None;
                    self.max_level = 0;
                }
            }
        }

        true
    }

    /// Removes every node, returning the index to its empty state.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.entry_point = None;
        self.max_level = 0;
    }

    /// Checks the symmetric-edge and degree-cap invariants across every
    /// node and layer. Exposed for tests and operational diagnostics.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for (id, node) in &self.nodes {
            for (layer, neighbors) in node.neighbors.iter().enumerate() {
                let cap = if layer == 0 {
                    self.config.max_m0
                } else {
                    self.config.m
                };
                if neighbors.len() > cap {
                    return Err(format!(
                        "node {id:?} layer {layer} has {} neighbors, cap is {cap}",
                        neighbors.len()
                    ));
                }
                for neighbor_id in neighbors {
                    let Some(neighbor) = self.nodes.get(neighbor_id) else {
                        return Err(format!("node {id:?} points at missing node {neighbor_id:?}"));
                    };
                    let back_edge = neighbor
                        .neighbors
                        .get(layer)
                        .map(|ns| ns.contains(id))
                        .unwrap_or(false);
                    if !back_edge {
                        return Err(format!(
                            "asymmetric edge: {id:?} -> {neighbor_id:?} at layer {layer} has no back edge"
                        ));
                    }
                }
            }
        }

        if let Some(ep) = &self.entry_point {
            let ep_level = self.nodes.get(ep).map(|n| n.level);
            if ep_level != Some(self.max_level) {
                return Err(format!(
                    "entry point {ep:?} has level {ep_level:?}, expected max_level {}",
                    self.max_level
                ));
            }
        } else if !self.nodes.is_empty() {
            return Err("entry point is None but nodes exist".to_string());
        }

        Ok(())
    }
}

/// Sorts candidates by ascending distance and keeps the closest `m`.
fn select_closest(candidates: &[Candidate], m: usize) -> Vec<VectorId> {
    let mut sorted: Vec<_> = candidates.to_vec();
    sorted.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
    });
    sorted.into_iter().take(m).map(|c| c.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> HnswConfig {
        HnswConfig {
            m: 4,
            max_m0: 8,
            ef_construction: 100,
            ef_search: 50,
            ml: 1.0 / (4.0_f64).ln(),
            max_level: 16,
        }
    }

    fn create_test_index() -> HnswIndex {
        let mut index = HnswIndex::new(DistanceMetric::Euclidean, 3, small_config());

        index
            .insert("a".to_string(), Vector::new(&[1.0, 0.0, 0.0]))
            .unwrap();
        index
            .insert("b".to_string(), Vector::new(&[0.0, 1.0, 0.0]))
            .unwrap();
        index
            .insert("c".to_string(), Vector::new(&[0.0, 0.0, 1.0]))
            .unwrap();
        index
            .insert("d".to_string(), Vector::new(&[1.0, 1.0, 0.0]))
            .unwrap();
        index
            .insert("e".to_string(), Vector::new(&[1.0, 0.0, 1.0]))
            .unwrap();

        index
    }

    #[test]
    fn test_new_index() {
        let index = HnswIndex::new(DistanceMetric::Cosine, 128, HnswConfig::default());
        assert!(index.is_empty());
        assert_eq!(index.dimension(), 128);
    }

    #[test]
    fn test_insert_single() {
        let mut index = HnswIndex::new(DistanceMetric::Euclidean, 3, small_config());
        index
            .insert("x".to_string(), Vector::new(&[1.0, 2.0, 3.0]))
            .unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.entry_point.is_some());
    }

    #[test]
    fn test_insert_multiple() {
        let index = create_test_index();
        assert_eq!(index.len(), 5);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_duplicate() {
        let mut index = create_test_index();
        let result = index.insert("a".to_string(), Vector::new(&[0.0, 0.0, 0.0]));
        assert!(matches!(result, Err(Error::Duplicate(id)) if id == "a"));
    }

    #[test]
    fn test_insert_dimension_mismatch() {
        let mut index = HnswIndex::new(DistanceMetric::Euclidean, 3, small_config());
        let result = index.insert("x".to_string(), Vector::new(&[1.0, 2.0]));
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_search_exact_match() {
        let index = create_test_index();
        let results = index.search(&[1.0, 0.0, 0.0], 1, None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "a");
        assert!(results[0].distance < 1e-6);
    }

    #[test]
    fn test_search_k_results_sorted() {
        let index = create_test_index();
        let results = index.search(&[1.0, 0.0, 0.0], 3, None);
        assert_eq!(results.len(), 3);
        for i in 1..results.len() {
            assert!(results[i - 1].distance <= results[i].distance);
        }
    }

    #[test]
    fn test_search_empty_index() {
        let index = HnswIndex::new(DistanceMetric::Euclidean, 3, small_config());
        let results = index.search(&[1.0, 0.0, 0.0], 10, None);
        assert!(results.is_empty());
    }

    #[test]
    fn test_get() {
        let index = create_test_index();
        let vector = index.get(&"a".to_string()).unwrap();
        assert_eq!(vector.as_slice(), &[1.0, 0.0, 0.0]);
        assert!(index.get(&"zzz".to_string()).is_none());
    }

    #[test]
    fn test_delete_non_entry_point() {
        let mut index = create_test_index();
        assert_eq!(index.len(), 5);

        assert!(index.delete(&"b".to_string()));
        assert_eq!(index.len(), 4);
        assert!(index.get(&"b".to_string()).is_none());

        let results = index.search(&[0.0, 1.0, 0.0], 10, None);
        assert!(results.iter().all(|r| r.id != "b"));
        index.check_invariants().unwrap();

        assert!(!index.delete(&"b".to_string()));
    }

    #[test]
    fn test_delete_entry_point_reassigns_by_highest_level() {
        let mut index = create_test_index();
        let ep = index.entry_point.clone().unwrap();
        let surviving_max_level = index
            .nodes
            .iter()
            .filter(|(id, _)| **id != ep)
            .map(|(_, n)| n.level)
            .max()
            .unwrap();

        assert!(index.delete(&ep));

        assert!(index.entry_point.is_some());
        assert_eq!(index.max_level, surviving_max_level);
        let new_ep = index.entry_point.clone().unwrap();
        assert_eq!(index.nodes[&new_ep].level, surviving_max_level);
    }

    #[test]
    fn test_delete_last_node_returns_to_empty_state() {
        let mut index = HnswIndex::new(DistanceMetric::Euclidean, 3, small_config());
        index
            .insert("only".to_string(), Vector::new(&[1.0, 2.0, 3.0]))
            .unwrap();
        assert!(index.delete(&"only".to_string()));
        assert!(index.is_empty());
        assert!(index.entry_point.is_none());
        assert_eq!(index.max_level, 0);
    }

    #[test]
    fn test_clear() {
        let mut index = create_test_index();
        index.clear();
        assert!(index.is_empty());
        assert!(index.entry_point.is_none());
    }

    #[test]
    fn test_search_layer_empty_entry_points_returns_empty() {
        let index = create_test_index();
        let results = index.search_layer(&[1.0, 0.0, 0.0], &[], 10, 0);
        assert!(results.is_empty());
    }

    #[test]
    fn test_recall_vs_brute_force() {
        let config = HnswConfig {
            m: 16,
            max_m0: 32,
            ef_construction: 200,
            ef_search: 100,
            ml: 1.0 / std::f64::consts::LN_2,
            max_level: 16,
        };
        let mut index = HnswIndex::new(DistanceMetric::Euclidean, 8, config);

        let mut vectors = Vec::new();
        for i in 0..200 {
            let v: Vec<f32> = (0..8).map(|j| ((i * 8 + j) as f32).sin()).collect();
            let id = i.to_string();
            vectors.push((id.clone(), v.clone()));
            index.insert(id, Vector::from_vec(v)).unwrap();
        }

        let mut total_recall = 0.0;
        let num_queries = 10;
        let k = 10;

        for q in 0..num_queries {
            let query: Vec<f32> = (0..8).map(|j| ((q * 7 + j) as f32).cos()).collect();

            let hnsw_results: HashSet<_> = index
                .search(&query, k, Some(200))
                .iter()
                .map(|r| r.id.clone())
                .collect();

            let mut distances: Vec<_> = vectors
                .iter()
                .map(|(id, v)| (id.clone(), index.metric.compute(&query, v)))
                .collect();
            distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
            let bf_results: HashSet<_> = distances.iter().take(k).map(|(id, _)| id.clone()).collect();

            let intersection = hnsw_results.intersection(&bf_results).count();
            total_recall += intersection as f64 / k as f64;
        }

        let avg_recall = total_recall / num_queries as f64;
        assert!(
            avg_recall >= 0.7,
            "average recall {:.2} is below threshold 0.7",
            avg_recall
        );
    }
}
