//! Two-stage SATD detection: lexical candidate filtering, then
//! classifier-based confirmation.

pub mod classifier;
pub mod debt_type;
pub mod patterns;
pub mod pipeline;
pub mod remote;
pub mod scanner;

pub use classifier::{Classification, ClassifyRequest, CommentClassifier, KeywordClassifier};
pub use patterns::PatternSet;
pub use pipeline::{DetectionOptions, DetectionOutcome, DetectionPipeline, DetectionSummary};
pub use remote::RemoteClassifier;
pub use scanner::{Candidate, CandidateScanner, ScanOutcome, ScanSummary};
