//! Graph data model: debt items, weighted edges, relationships, chains.

pub mod model;
mod satd_graph;

pub use model::{
    Chain, DebtItem, DebtType, RelationshipType, SatdRelationship, SirComponents, WeightBand,
    WeightedEdge, DEFAULT_CONFIDENCE_THRESHOLD, LINES_PER_HOP, LOCALITY_RADIUS, MAX_HOPS,
    UNTRACKED,
};
pub use satd_graph::SatdGraph;
