//! Inter-SATD relationship discovery.
//!
//! Four analyzers implement one capability and run fan-out/join; adding an
//! analyzer means adding an entry to the default list. Analyzers share the
//! immutable file contents and own their local maps; per-file parse failures
//! degrade to skipping that file for that analyzer.

pub mod call;
pub mod control;
pub mod data;
pub mod locality;
pub mod merger;
pub mod module;

use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::core::SourceFile;
use crate::graph::{DebtItem, SatdRelationship};

pub use merger::merge;

/// Immutable inputs shared by all relationship analyzers.
pub struct RelationContext<'a> {
    /// Confirmed debt items, sorted by (file, line).
    pub items: &'a [DebtItem],
    /// File contents keyed by workspace-relative path, read once per run.
    pub files: &'a HashMap<String, SourceFile>,
    /// Edges with more hops than this are discarded.
    pub max_hops: u32,
}

/// Result of one analyzer over one run.
#[derive(Debug, Default)]
pub struct AnalyzerOutcome {
    pub relationships: Vec<SatdRelationship>,
    /// Files skipped because they failed to parse.
    pub parse_failures: usize,
}

/// Capability implemented by each relationship analyzer.
pub trait RelationshipAnalyzer: Send + Sync {
    /// Unique identifier for this analyzer.
    fn name(&self) -> &'static str;

    /// Discover weighted directed relationships between debt items.
    fn find_relationships(&self, ctx: &RelationContext<'_>) -> AnalyzerOutcome;
}

/// The default analyzer set: call, data, control, module.
pub fn default_analyzers() -> Vec<Box<dyn RelationshipAnalyzer>> {
    vec![
        Box::new(call::CallGraphAnalyzer::new()),
        Box::new(data::DataDependencyAnalyzer::new()),
        Box::new(control::ControlFlowAnalyzer::new()),
        Box::new(module::ModuleDependencyAnalyzer::new()),
    ]
}

/// Per-analyzer statistics for the run summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisSummary {
    pub relationships_found: usize,
    /// Suppressed parse failures keyed by analyzer name.
    pub parse_failures: HashMap<String, usize>,
}

/// Fan out the analyzers, join, and concatenate their outputs in analyzer
/// order. Each analyzer is single-threaded internally; no state is shared
/// across tasks.
pub fn run_analyzers(
    analyzers: &[Box<dyn RelationshipAnalyzer>],
    ctx: &RelationContext<'_>,
) -> (Vec<SatdRelationship>, AnalysisSummary) {
    let outcomes: Vec<(&'static str, AnalyzerOutcome)> = analyzers
        .par_iter()
        .map(|analyzer| {
            let outcome = analyzer.find_relationships(ctx);
            tracing::debug!(
                "{} analyzer found {} relationships ({} parse failures)",
                analyzer.name(),
                outcome.relationships.len(),
                outcome.parse_failures,
            );
            (analyzer.name(), outcome)
        })
        .collect();

    let mut summary = AnalysisSummary::default();
    let mut relationships = Vec::new();
    for (name, outcome) in outcomes {
        if outcome.parse_failures > 0 {
            summary
                .parse_failures
                .insert(name.to_string(), outcome.parse_failures);
        }
        relationships.extend(outcome.relationships);
    }
    summary.relationships_found = relationships.len();

    (relationships, summary)
}
