//! Directed debt graph built from merged relationships.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::core::{Error, Result};

use super::model::{DebtItem, SatdRelationship};

/// The directed graph over confirmed debt items.
///
/// One node per `DebtItem`, one directed edge per merged relationship with
/// the bundle strength as its weight. Node iteration follows item input
/// order, which keeps downstream output deterministic.
pub struct SatdGraph {
    items: Vec<DebtItem>,
    relationships: Vec<SatdRelationship>,
    graph: DiGraph<usize, f64>,
    index_of: HashMap<String, NodeIndex>,
}

impl SatdGraph {
    /// Build the graph, validating the data-model invariants.
    ///
    /// Returns `InvariantViolation` on duplicate item ids, self-loops, or
    /// relationships referencing unknown items.
    pub fn build(items: Vec<DebtItem>, relationships: Vec<SatdRelationship>) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(items.len(), relationships.len());
        let mut index_of = HashMap::with_capacity(items.len());

        for (i, item) in items.iter().enumerate() {
            let idx = graph.add_node(i);
            if index_of.insert(item.id.clone(), idx).is_some() {
                return Err(Error::invariant(
                    "graph",
                    format!("duplicate debt item id {:?}", item.id),
                ));
            }
        }

        for rel in &relationships {
            if rel.source_id == rel.target_id {
                return Err(Error::invariant(
                    "graph",
                    format!("self-loop survived merging: {:?}", rel.source_id),
                ));
            }
            let source = *index_of.get(&rel.source_id).ok_or_else(|| {
                Error::invariant("graph", format!("unknown source id {:?}", rel.source_id))
            })?;
            let target = *index_of.get(&rel.target_id).ok_or_else(|| {
                Error::invariant("graph", format!("unknown target id {:?}", rel.target_id))
            })?;
            graph.add_edge(source, target, rel.strength);
        }

        Ok(Self {
            items,
            relationships,
            graph,
            index_of,
        })
    }

    /// All debt items, in input order.
    pub fn items(&self) -> &[DebtItem] {
        &self.items
    }

    /// Mutable access for score writeback.
    pub(crate) fn items_mut(&mut self) -> &mut [DebtItem] {
        &mut self.items
    }

    /// All merged relationships.
    pub fn relationships(&self) -> &[SatdRelationship] {
        &self.relationships
    }

    pub(crate) fn relationships_mut(&mut self) -> &mut [SatdRelationship] {
        &mut self.relationships
    }

    /// Item ids in input order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.id.as_str())
    }

    pub fn node_count(&self) -> usize {
        self.items.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether an item id is present.
    pub fn contains(&self, id: &str) -> bool {
        self.index_of.contains_key(id)
    }

    /// Outgoing `(target_id, weight)` pairs for a node.
    pub fn outgoing(&self, id: &str) -> Vec<(&str, f64)> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Incoming `(source_id, weight)` pairs for a node.
    pub fn incoming(&self, id: &str) -> Vec<(&str, f64)> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, dir: Direction) -> Vec<(&str, f64)> {
        let Some(&idx) = self.index_of.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<(&str, f64)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|edge| {
                use petgraph::visit::EdgeRef;
                let other = if dir == Direction::Outgoing {
                    edge.target()
                } else {
                    edge.source()
                };
                (self.items[self.graph[other]].id.as_str(), *edge.weight())
            })
            .collect();
        // petgraph iterates edges newest-first; sort for stable traversal.
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// Look up an item by id.
    pub fn item(&self, id: &str) -> Option<&DebtItem> {
        self.index_of.get(id).map(|&idx| &self.items[self.graph[idx]])
    }
}
