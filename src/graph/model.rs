//! Data model for debt items, relationships, and chains.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classifier confidence admission threshold (τ).
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Maximum dependency hops; edges beyond this are discarded.
pub const MAX_HOPS: u32 = 5;

/// Source lines per hop when deriving hops from line distance.
pub const LINES_PER_HOP: u32 = 10;

/// Line radius used both for context windows and for associating AST
/// elements with debt items.
pub const LOCALITY_RADIUS: u32 = 5;

/// Sentinel commit hash for files without VCS metadata.
pub const UNTRACKED: &str = "untracked";

/// Category of technical debt acknowledged by a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtType {
    Design,
    Implementation,
    Documentation,
    Defect,
    Test,
    Requirement,
    Architecture,
    Other,
}

impl std::fmt::Display for DebtType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Design => "design",
            Self::Implementation => "implementation",
            Self::Documentation => "documentation",
            Self::Defect => "defect",
            Self::Test => "test",
            Self::Requirement => "requirement",
            Self::Architecture => "architecture",
            Self::Other => "other",
        };
        write!(f, "{name}")
    }
}

/// Kind of static dependency linking two debt items.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    Call,
    Data,
    Control,
    Module,
}

/// Closed interval in which edge weights of one relationship type must fall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightBand {
    pub min: f64,
    pub max: f64,
}

impl WeightBand {
    /// Weight for a nesting depth, linear within the band and saturating at
    /// depth 5. Monotone in depth and clamped to the band.
    pub fn weight_at(&self, depth: u32) -> f64 {
        let t = depth.min(5) as f64 / 5.0;
        (self.min + (self.max - self.min) * t).clamp(self.min, self.max)
    }

    /// Clamp an arbitrary weight into the band.
    pub fn clamp(&self, weight: f64) -> f64 {
        weight.clamp(self.min, self.max)
    }

    /// Whether a weight lies inside the band.
    pub fn contains(&self, weight: f64) -> bool {
        (self.min..=self.max).contains(&weight)
    }
}

impl RelationshipType {
    /// The fixed weight band for this relationship type.
    pub fn band(&self) -> WeightBand {
        match self {
            Self::Call => WeightBand { min: 0.7, max: 0.9 },
            Self::Data => WeightBand { min: 0.6, max: 0.8 },
            Self::Control => WeightBand { min: 0.5, max: 0.7 },
            Self::Module => WeightBand { min: 0.8, max: 1.0 },
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Call => "call",
            Self::Data => "data",
            Self::Control => "control",
            Self::Module => "module",
        };
        write!(f, "{name}")
    }
}

/// A confirmed SATD instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtItem {
    /// Deterministic identifier: `"{file}:{line}:{commit8}"`.
    pub id: String,
    /// File path relative to the workspace root.
    pub file: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Raw comment text, trimmed.
    pub content: String,
    /// Surrounding code window (±5 lines).
    pub extended_content: String,
    /// Blame commit hash, or `"untracked"`.
    pub created_commit: String,
    /// Blame commit date, or the scan time when untracked.
    pub created_date: DateTime<Utc>,
    /// Debt category from the keyword heuristic.
    pub debt_type: DebtType,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
    /// Composite impact score, populated by the scorer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sir_score: Option<f64>,
    /// Raw and normalized score components, populated by the scorer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sir_components: Option<SirComponents>,
}

impl DebtItem {
    /// Derive the deterministic item id from location and blame metadata.
    pub fn make_id(file: &str, line: u32, commit: &str) -> String {
        let short = if commit == UNTRACKED {
            UNTRACKED
        } else {
            &commit[..commit.len().min(8)]
        };
        format!("{file}:{line}:{short}")
    }
}

/// Per-node score aggregates, raw and normalized.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SirComponents {
    pub fanout: f64,
    pub chain_length: f64,
    pub reachability: f64,
    pub fanout_norm: f64,
    pub chain_length_norm: f64,
    pub reachability_norm: f64,
}

/// A single directed, typed, weighted edge between two debt items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: RelationshipType,
    /// Weight within the type's band.
    pub weight: f64,
    /// Coarse distance proxy in [1, MAX_HOPS].
    pub hops: u32,
    /// Human-readable evidence for the edge.
    pub description: String,
}

/// A merged bundle of edges over one ordered `(source, target)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatdRelationship {
    pub source_id: String,
    pub target_id: String,
    /// Relationship types present in the bundle.
    pub types: BTreeSet<RelationshipType>,
    /// Constituent edges, in merge order.
    pub edges: Vec<WeightedEdge>,
    /// Aggregate strength: max of the constituent edge weights.
    pub strength: f64,
    pub description: String,
    /// Chains containing both endpoints, populated by the chain finder.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chain_ids: Vec<String>,
    #[serde(default)]
    pub in_chain: bool,
}

impl SatdRelationship {
    /// Wrap a single edge as an unmerged relationship.
    pub fn from_edge(edge: WeightedEdge) -> Self {
        Self {
            source_id: edge.source_id.clone(),
            target_id: edge.target_id.clone(),
            types: BTreeSet::from([edge.relationship_type]),
            strength: edge.weight,
            description: edge.description.clone(),
            edges: vec![edge],
            chain_ids: Vec::new(),
            in_chain: false,
        }
    }
}

/// A weakly connected component of the debt graph, size ≥ 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub id: String,
    /// Ids of member debt items, in discovery order.
    pub nodes: Vec<String>,
    /// Number of member nodes.
    pub length: usize,
    /// Sum of weights of edges with both endpoints inside the component.
    pub total_weight: f64,
    /// Max member SIR, populated by the scorer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sir_score: Option<f64>,
    /// Id of the arg-max member.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative: Option<String>,
}
