//! Chain discovery: weakly connected components of the debt graph.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::graph::{Chain, SatdGraph};

/// Chain-stage statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChainSummary {
    pub chain_count: usize,
    pub chained_nodes: usize,
    pub isolated_nodes: usize,
}

/// Enumerate weakly connected components of size ≥ 2 and annotate the
/// relationships whose endpoints share a component.
///
/// The undirected adjacency covers every edge; traversal is breadth-first
/// and seeded in node input order, so chain ids and member order are
/// deterministic.
pub fn find_chains(graph: &mut SatdGraph) -> (Vec<Chain>, ChainSummary) {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for rel in graph.relationships() {
        adjacency
            .entry(rel.source_id.as_str())
            .or_default()
            .push(rel.target_id.as_str());
        adjacency
            .entry(rel.target_id.as_str())
            .or_default()
            .push(rel.source_id.as_str());
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut components: Vec<Vec<String>> = Vec::new();

    for start in graph.node_ids() {
        if visited.contains(start) || !adjacency.contains_key(start) {
            continue;
        }
        let mut component = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(node) = queue.pop_front() {
            component.push(node.to_string());
            if let Some(neighbors) = adjacency.get(node) {
                for &next in neighbors {
                    if visited.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        // Components of size 1 are isolated nodes, not chains.
        if component.len() >= 2 {
            components.push(component);
        }
    }

    let mut chain_of: HashMap<String, String> = HashMap::new();
    let mut chains = Vec::with_capacity(components.len());
    for (i, nodes) in components.into_iter().enumerate() {
        let id = format!("chain-{}", i + 1);
        for node in &nodes {
            chain_of.insert(node.clone(), id.clone());
        }
        chains.push(Chain {
            id,
            length: nodes.len(),
            nodes,
            total_weight: 0.0,
            sir_score: None,
            representative: None,
        });
    }

    // Total weight: every directed edge with both endpoints inside the
    // component, counted once. Annotate those relationships while at it.
    let mut weight_of: HashMap<&str, f64> = HashMap::new();
    for rel in graph.relationships_mut() {
        let (Some(source_chain), Some(target_chain)) =
            (chain_of.get(&rel.source_id), chain_of.get(&rel.target_id))
        else {
            continue;
        };
        if source_chain != target_chain {
            continue;
        }
        *weight_of.entry(source_chain.as_str()).or_default() += rel.strength;
        if !rel.chain_ids.contains(source_chain) {
            rel.chain_ids.push(source_chain.clone());
        }
        rel.in_chain = true;
    }
    for chain in &mut chains {
        chain.total_weight = weight_of.get(chain.id.as_str()).copied().unwrap_or(0.0);
    }

    let chained_nodes: usize = chains.iter().map(|c| c.length).sum();
    let summary = ChainSummary {
        chain_count: chains.len(),
        chained_nodes,
        isolated_nodes: graph.node_count() - chained_nodes,
    };
    tracing::info!(
        "found {} chains covering {} nodes ({} isolated)",
        summary.chain_count,
        summary.chained_nodes,
        summary.isolated_nodes,
    );

    (chains, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DebtItem, DebtType, RelationshipType, SatdRelationship, WeightedEdge};
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
    fn test_linear_chain() {
        // Linear chain A→B(0.8), B→C(0.7).
        let mut graph = build(
            &["a", "b", "c"],
            vec![rel("a", "b", 0.8), rel("b", "c", 0.7)],
        );
        let (chains, summary) = find_chains(&mut graph);

        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].length, 3);
        assert!((chains[0].total_weight - 1.5).abs() < 1e-9);
        assert_eq!(summary.isolated_nodes, 0);

        for rel in graph.relationships() {
            assert!(rel.in_chain);
            assert_eq!(rel.chain_ids, vec!["chain-1".to_string()]);
        }
    }

    #[test]
    fn test_isolated_pair_yields_zero_chains() {
        // Two nodes, no edges.
        let mut graph = build(&["a", "b"], vec![]);
        let (chains, summary) = find_chains(&mut graph);
        assert!(chains.is_empty());
        assert_eq!(summary.isolated_nodes, 2);
    }

    #[test]
    fn test_triangle_is_one_chain() {
        // Triangle cycle.
        let mut graph = build(
            &["a", "b", "c"],
            vec![rel("a", "b", 0.8), rel("b", "c", 0.7), rel("c", "a", 0.6)],
        );
        let (chains, _) = find_chains(&mut graph);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].length, 3);
        assert!((chains[0].total_weight - 2.1).abs() < 1e-9);
    }

    #[test]
    fn test_diamond_is_one_chain_of_four() {
        // Diamond.
        let mut graph = build(
            &["a", "b", "c", "d"],
            vec![
                rel("a", "b", 0.8),
                rel("a", "c", 0.5),
                rel("b", "d", 0.9),
                rel("c", "d", 0.3),
            ],
        );
        let (chains, _) = find_chains(&mut graph);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].length, 4);
    }

    #[test]
    fn test_two_disjoint_chains_partition_nodes() {
        let mut graph = build(
            &["a", "b", "c", "d", "e"],
            vec![rel("a", "b", 0.8), rel("c", "d", 0.7)],
        );
        let (chains, summary) = find_chains(&mut graph);

        assert_eq!(chains.len(), 2);
        assert_eq!(summary.isolated_nodes, 1);

        // Chains are pairwise disjoint and every non-isolated node belongs
        // to exactly one.
        let mut seen = HashSet::new();
        for chain in &chains {
            for node in &chain.nodes {
                assert!(seen.insert(node.clone()), "{node} appears in two chains");
            }
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_direction_ignored_for_connectivity() {
        // Undirected projection: b→a still joins a's component.
        let mut graph = build(&["a", "b"], vec![rel("b", "a", 0.8)]);
        let (chains, _) = find_chains(&mut graph);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].nodes, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_cross_chain_relationship_not_annotated() {
        let mut graph = build(
            &["a", "b", "c", "d"],
            vec![rel("a", "b", 0.8), rel("c", "d", 0.7)],
        );
        let (_, _) = find_chains(&mut graph);
        for rel in graph.relationships() {
            assert_eq!(rel.chain_ids.len(), 1);
        }
    }
}
