//! Ripple - SATD detection and impact ripple analysis.
//!
//! Ripple finds Self-Admitted Technical Debt (SATD) in a source repository,
//! links related instances through static-analysis-derived dependencies
//! (call, data, control, module), discovers chains of related debt, and
//! ranks every instance by a composite impact ripple (SIR) score.
//!
//! # Example
//!
//! ```no_run
//! use ripple::config::Config;
//! use ripple::pipeline::AnalysisRun;
//!
//! let run = AnalysisRun::new(".", Config::default());
//! let result = run.run().unwrap();
//! println!("{} debt items in {} chains", result.items.len(), result.chains.len());
//! ```

pub mod chains;
pub mod cli;
pub mod config;
pub mod core;
pub mod detect;
pub mod graph;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod probe;
pub mod relations;
pub mod scenario;
pub mod score;

pub use graph::{Chain, DebtItem, SatdGraph, SatdRelationship};
pub use pipeline::{AnalysisRun, RunResult, RunStage};
