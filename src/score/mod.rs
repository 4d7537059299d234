//! SATD Impact Ripple (SIR) scoring.
//!
//! Three per-node aggregates over the directed graph of merged edges:
//!
//! - `Fanout_w`: sum of outgoing edge weights.
//! - `ChainLen_w`: maximum weight-sum over simple directed paths from the
//!   node. A per-traversal visited set makes cycle back-edges contribute 0.
//! - `Reachability_w`: sum over reachable nodes of the max-bottleneck path
//!   strength (min weight along a path, maximized across paths), computed
//!   by relaxation that enqueues only on strict improvement, which
//!   guarantees termination on cyclic graphs.
//!
//! Each aggregate is min-max normalized across nodes, combined under the
//! configured weights, and the composite is min-max normalized again.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::graph::{Chain, SatdGraph, SirComponents};

/// Composite weights (α, β, γ) for fanout, chain length, and reachability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SirWeights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Default for SirWeights {
    fn default() -> Self {
        Self {
            alpha: 0.4,
            beta: 0.3,
            gamma: 0.3,
        }
    }
}

impl SirWeights {
    /// Renormalize so the weights sum to 1; non-positive sums fall back to
    /// the defaults.
    pub fn normalized(&self) -> Self {
        let sum = self.alpha + self.beta + self.gamma;
        if sum <= 0.0 || !sum.is_finite() {
            return Self::default();
        }
        Self {
            alpha: self.alpha / sum,
            beta: self.beta / sum,
            gamma: self.gamma / sum,
        }
    }
}

/// Scoring-stage statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoreSummary {
    pub nodes_scored: usize,
    pub max_sir: f64,
}

/// SIR scorer over a built graph.
pub struct SirScorer {
    weights: SirWeights,
}

impl Default for SirScorer {
    fn default() -> Self {
        Self::new(SirWeights::default())
    }
}

impl SirScorer {
    pub fn new(weights: SirWeights) -> Self {
        Self {
            weights: weights.normalized(),
        }
    }

    /// Score every node, write results back onto the items and chains.
    ///
    /// Memo caches live for this invocation only. Returns
    /// `InvariantViolation` if any component comes out non-finite.
    pub fn score(&self, graph: &mut SatdGraph, chains: &mut [Chain]) -> Result<ScoreSummary> {
        let ids: Vec<String> = graph.node_ids().map(str::to_string).collect();

        // Per-invocation caches.
        let mut chain_len_cache: HashMap<&str, f64> = HashMap::with_capacity(ids.len());
        let mut reach_cache: HashMap<&str, f64> = HashMap::with_capacity(ids.len());

        let mut fanout = Vec::with_capacity(ids.len());
        let mut chain_len = Vec::with_capacity(ids.len());
        let mut reachability = Vec::with_capacity(ids.len());

        for id in &ids {
            fanout.push(graph.outgoing(id).iter().map(|(_, w)| w).sum::<f64>());

            let len = *chain_len_cache
                .entry(id.as_str())
                .or_insert_with(|| longest_path_from(graph, id));
            chain_len.push(len);

            let reach = *reach_cache
                .entry(id.as_str())
                .or_insert_with(|| bottleneck_reachability(graph, id));
            reachability.push(reach);
        }

        for values in [&fanout, &chain_len, &reachability] {
            if values.iter().any(|v| !v.is_finite()) {
                return Err(Error::invariant("scorer", "non-finite raw component"));
            }
        }

        let fanout_norm = min_max_normalize(&fanout);
        let chain_len_norm = min_max_normalize(&chain_len);
        let reachability_norm = min_max_normalize(&reachability);

        let raw: Vec<f64> = (0..ids.len())
            .map(|i| {
                self.weights.alpha * fanout_norm[i]
                    + self.weights.beta * chain_len_norm[i]
                    + self.weights.gamma * reachability_norm[i]
            })
            .collect();
        let sir = min_max_normalize(&raw);

        if sir.iter().any(|v| !v.is_finite()) {
            return Err(Error::invariant("scorer", "non-finite SIR"));
        }

        let mut sir_of: HashMap<String, f64> = HashMap::with_capacity(ids.len());
        for (i, item) in graph.items_mut().iter_mut().enumerate() {
            item.sir_score = Some(sir[i]);
            item.sir_components = Some(SirComponents {
                fanout: fanout[i],
                chain_length: chain_len[i],
                reachability: reachability[i],
                fanout_norm: fanout_norm[i],
                chain_length_norm: chain_len_norm[i],
                reachability_norm: reachability_norm[i],
            });
            sir_of.insert(item.id.clone(), sir[i]);
        }

        // Chain score: the max member SIR, represented by its arg-max.
        for chain in chains.iter_mut() {
            let mut best: Option<(f64, &str)> = None;
            for node in &chain.nodes {
                let score = sir_of.get(node).copied().unwrap_or(0.0);
                if best.is_none_or(|(s, _)| score > s) {
                    best = Some((score, node.as_str()));
                }
            }
            if let Some((score, node)) = best {
                chain.sir_score = Some(score);
                chain.representative = Some(node.to_string());
            }
        }

        let max_sir = sir.iter().copied().fold(0.0, f64::max);
        tracing::info!("scored {} nodes, max SIR {:.3}", ids.len(), max_sir);

        Ok(ScoreSummary {
            nodes_scored: ids.len(),
            max_sir,
        })
    }
}

/// Rank items by SIR descending; stable, so equal scores preserve input
/// order.
pub fn rank_by_sir(graph: &SatdGraph) -> Vec<crate::graph::DebtItem> {
    let mut ranked = graph.items().to_vec();
    ranked.sort_by(|a, b| {
        b.sir_score
            .unwrap_or(0.0)
            .partial_cmp(&a.sir_score.unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Maximum weight-sum over simple directed paths starting at `start`.
fn longest_path_from(graph: &SatdGraph, start: &str) -> f64 {
    let mut visited = HashSet::new();
    visited.insert(start.to_string());
    dfs_longest(graph, start, &mut visited)
}

fn dfs_longest(graph: &SatdGraph, node: &str, visited: &mut HashSet<String>) -> f64 {
    let mut best = 0.0f64;
    for (target, weight) in graph.outgoing(node) {
        if visited.contains(target) {
            // Cycle back-edge: contributes 0, not a failure.
            continue;
        }
        visited.insert(target.to_string());
        let candidate = weight + dfs_longest(graph, target, visited);
        visited.remove(target);
        if candidate > best {
            best = candidate;
        }
    }
    best
}

/// Sum over nodes reachable from `start` of the widest-path strength: the
/// minimum weight along a path, maximized across paths.
fn bottleneck_reachability(graph: &SatdGraph, start: &str) -> f64 {
    let mut best: HashMap<String, f64> = HashMap::new();
    let mut queue: VecDeque<(String, f64)> = VecDeque::new();
    queue.push_back((start.to_string(), f64::INFINITY));

    while let Some((node, strength)) = queue.pop_front() {
        for (target, weight) in graph.outgoing(&node) {
            if target == start {
                continue;
            }
            let path_strength = strength.min(weight);
            let recorded = best.get(target).copied().unwrap_or(0.0);
            // Enqueue only on strict improvement; this terminates on cycles.
            if path_strength > recorded {
                best.insert(target.to_string(), path_strength);
                queue.push_back((target.to_string(), path_strength));
            }
        }
    }

    best.values().sum()
}

/// Min-max normalize to [0, 1]; a zero range is treated as 1, collapsing
/// every value to 0.
fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };
    values.iter().map(|v| (v - min) / range).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        DebtItem, DebtType, RelationshipType, SatdRelationship, WeightedEdge,
    };
    use chrono::Utc;

    fn item(id: &str) -> DebtItem {
        DebtItem {
            id: id.to_string(),
            file: "test.py".to_string(),
            line: 1,
            content: "# TODO".to_string(),
            extended_content: String::new(),
            created_commit: "untracked".to_string(),
            created_date: Utc::now(),
            debt_type: DebtType::Requirement,
            confidence: 0.9,
            sir_score: None,
            sir_components: None,
        }
    }

    fn rel(source: &str, target: &str, weight: f64) -> SatdRelationship {
        SatdRelationship::from_edge(WeightedEdge {
            source_id: source.to_string(),
            target_id: target.to_string(),
            relationship_type: RelationshipType::Call,
            weight,
            hops: 1,
            description: String::new(),
        })
    }

    fn build(items: &[&str], rels: Vec<SatdRelationship>) -> SatdGraph {
        SatdGraph::build(items.iter().map(|i| item(i)).collect(), rels).unwrap()
    }

    #[test]
    fn test_weights_renormalize() {
        let weights = SirWeights {
            alpha: 2.0,
            beta: 1.0,
            gamma: 1.0,
        }
        .normalized();
        assert!((weights.alpha - 0.5).abs() < 1e-9);
        assert!((weights.alpha + weights.beta + weights.gamma - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weights_fall_back_to_defaults() {
        let weights = SirWeights {
            alpha: 0.0,
            beta: 0.0,
            gamma: 0.0,
        }
        .normalized();
        assert!((weights.alpha - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_linear_chain_raw_components() {
        // Linear chain A→B(0.8), B→C(0.7).
        let mut graph = build(
            &["a", "b", "c"],
            vec![rel("a", "b", 0.8), rel("b", "c", 0.7)],
        );
        SirScorer::default().score(&mut graph, &mut []).unwrap();

        let a = graph.item("a").unwrap().sir_components.unwrap();
        assert!((a.fanout - 0.8).abs() < 1e-9);
        assert!((a.chain_length - 1.5).abs() < 1e-9);
        // Bottleneck sum: strength(B)=0.8, strength(C)=min(0.8,0.7)=0.7.
        assert!((a.reachability - 1.5).abs() < 1e-9);

        let a_sir = graph.item("a").unwrap().sir_score.unwrap();
        let c_sir = graph.item("c").unwrap().sir_score.unwrap();
        assert!((a_sir - 1.0).abs() < 1e-9);
        assert!((c_sir - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_diamond_chain_length() {
        // Diamond. ChainLen(A) = 0.8 + 0.9 = 1.7.
        let mut graph = build(
            &["a", "b", "c", "d"],
            vec![
                rel("a", "b", 0.8),
                rel("a", "c", 0.5),
                rel("b", "d", 0.9),
                rel("c", "d", 0.3),
            ],
        );
        SirScorer::default().score(&mut graph, &mut []).unwrap();
        let a = graph.item("a").unwrap().sir_components.unwrap();
        assert!((a.chain_length - 1.7).abs() < 1e-9);
    }

    #[test]
    fn test_triangle_terminates_with_finite_scores() {
        // Triangle cycle. cycle A→B→C→A.
        let mut graph = build(
            &["a", "b", "c"],
            vec![rel("a", "b", 0.8), rel("b", "c", 0.7), rel("c", "a", 0.6)],
        );
        SirScorer::default().score(&mut graph, &mut []).unwrap();
        for id in ["a", "b", "c"] {
            let item = graph.item(id).unwrap();
            let c = item.sir_components.unwrap();
            for v in [
                c.fanout,
                c.chain_length,
                c.reachability,
                item.sir_score.unwrap(),
            ] {
                assert!(v.is_finite(), "{id} has non-finite component {v}");
            }
        }
        // ChainLen(A): the cycle back-edge contributes 0, so A→B→C stops.
        let a = graph.item("a").unwrap().sir_components.unwrap();
        assert!((a.chain_length - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_isolated_node_scores_zero() {
        let mut graph = build(&["a"], vec![]);
        SirScorer::default().score(&mut graph, &mut []).unwrap();
        let item = graph.item("a").unwrap();
        let c = item.sir_components.unwrap();
        assert_eq!(c.fanout, 0.0);
        assert_eq!(c.chain_length, 0.0);
        assert_eq!(c.reachability, 0.0);
        assert_eq!(item.sir_score, Some(0.0));
    }

    #[test]
    fn test_all_scores_in_unit_interval() {
        let mut graph = build(
            &["a", "b", "c", "d", "e"],
            vec![
                rel("a", "b", 0.9),
                rel("b", "c", 0.8),
                rel("c", "d", 0.7),
                rel("d", "b", 0.85),
                rel("a", "e", 0.6),
            ],
        );
        SirScorer::default().score(&mut graph, &mut []).unwrap();
        for item in graph.items() {
            let c = item.sir_components.unwrap();
            for v in [
                item.sir_score.unwrap(),
                c.fanout_norm,
                c.chain_length_norm,
                c.reachability_norm,
            ] {
                assert!((0.0..=1.0).contains(&v), "{} out of range: {v}", item.id);
            }
        }
    }

    #[test]
    fn test_ranking_stable_on_ties() {
        let mut graph = build(&["a", "b", "c"], vec![]);
        SirScorer::default().score(&mut graph, &mut []).unwrap();
        let ranked = rank_by_sir(&graph);
        let ids: Vec<_> = ranked.iter().map(|i| i.id.as_str()).collect();
        // All scores equal (0); input order preserved.
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ranking_descending() {
        let mut graph = build(
            &["a", "b", "c"],
            vec![rel("a", "b", 0.8), rel("b", "c", 0.7)],
        );
        SirScorer::default().score(&mut graph, &mut []).unwrap();
        let ranked = rank_by_sir(&graph);
        assert_eq!(ranked[0].id, "a");
        assert_eq!(ranked[2].id, "c");
    }

    #[test]
    fn test_chain_score_is_max_member() {
        let mut graph = build(
            &["a", "b", "c"],
            vec![rel("a", "b", 0.8), rel("b", "c", 0.7)],
        );
        let (mut chains, _) = crate::chains::find_chains(&mut graph);
        SirScorer::default().score(&mut graph, &mut chains).unwrap();

        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].sir_score, Some(1.0));
        assert_eq!(chains[0].representative.as_deref(), Some("a"));
    }

    #[test]
    fn test_self_loop_free_two_cycle_terminates() {
        let mut graph = build(&["a", "b"], vec![rel("a", "b", 0.8), rel("b", "a", 0.7)]);
        SirScorer::default().score(&mut graph, &mut []).unwrap();
        let a = graph.item("a").unwrap().sir_components.unwrap();
        // A reaches B at 0.8; the back edge cannot improve anything.
        assert!((a.reachability - 0.8).abs() < 1e-9);
        assert!((a.chain_length - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_min_max_zero_range_collapses_to_zero() {
        assert_eq!(min_max_normalize(&[3.0, 3.0, 3.0]), vec![0.0, 0.0, 0.0]);
        assert!(min_max_normalize(&[]).is_empty());
    }
}
