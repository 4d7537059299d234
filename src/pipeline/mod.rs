//! Full analysis run: scan → classify → analyze → merge → chain → score.

mod store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::chains::{self, ChainSummary};
use crate::config::Config;
use crate::core::{CancellationToken, Result, SourceFile};
use crate::detect::{
    CandidateScanner, CommentClassifier, DetectionOptions, DetectionPipeline, DetectionSummary,
    KeywordClassifier, PatternSet, ScanSummary,
};
use crate::graph::{Chain, DebtItem, SatdGraph, SatdRelationship};
use crate::probe::{GixProbe, NullProbe, RepositoryProbe};
use crate::relations::{self, AnalysisSummary, RelationContext};
use crate::score::{rank_by_sir, ScoreSummary, SirScorer};

pub use store::{debt_store, DebtStore, DebtStoreWriter};

/// Pipeline state machine. Every stage may transition to `Failed`; only an
/// invariant violation does so in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStage {
    Idle,
    Scanning,
    Classifying,
    Analyzing,
    Merging,
    Chaining,
    Scoring,
    Done,
    Failed,
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Classifying => "classifying",
            Self::Analyzing => "analyzing",
            Self::Merging => "merging",
            Self::Chaining => "chaining",
            Self::Scoring => "scoring",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Per-stage statistics, populated as stages complete.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageSummaries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chains: Option<ChainSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreSummary>,
}

/// Result of one analysis run. Partial results of completed stages are
/// preserved even when a later stage fails.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Confirmed items, ranked by SIR descending once scoring completed.
    pub items: Vec<DebtItem>,
    /// Merged relationships.
    pub relationships: Vec<SatdRelationship>,
    pub chains: Vec<Chain>,
    pub stage: RunStage,
    pub cancelled: bool,
    /// Fatal error message when `stage` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub summaries: StageSummaries,
    pub duration_ms: u64,
}

impl RunResult {
    fn empty(stage: RunStage) -> Self {
        Self {
            items: Vec::new(),
            relationships: Vec::new(),
            chains: Vec::new(),
            stage,
            cancelled: false,
            error: None,
            summaries: StageSummaries::default(),
            duration_ms: 0,
        }
    }
}

/// One configured analysis run over a workspace root.
pub struct AnalysisRun {
    root: PathBuf,
    config: Config,
    classifier: Arc<dyn CommentClassifier>,
    cancel: CancellationToken,
    on_stage: Option<Box<dyn Fn(RunStage) + Send + Sync>>,
    store_writer: DebtStoreWriter,
    store: DebtStore,
}

impl AnalysisRun {
    /// Create a run with the deterministic offline classifier.
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self::with_classifier(root, config, Arc::new(KeywordClassifier::new()))
    }

    /// Create a run with an explicit classifier implementation.
    pub fn with_classifier(
        root: impl Into<PathBuf>,
        config: Config,
        classifier: Arc<dyn CommentClassifier>,
    ) -> Self {
        let (store_writer, store) = debt_store();
        Self {
            root: root.into(),
            config,
            classifier,
            cancel: CancellationToken::new(),
            on_stage: None,
            store_writer,
            store,
        }
    }

    /// The cancellation token propagated to all stages.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Read-only view of the current debt items, for observers.
    pub fn debt_store(&self) -> DebtStore {
        self.store.clone()
    }

    /// Register a stage-transition callback.
    pub fn on_stage<F>(mut self, f: F) -> Self
    where
        F: Fn(RunStage) + Send + Sync + 'static,
    {
        self.on_stage = Some(Box::new(f));
        self
    }

    fn enter(&self, stage: RunStage) {
        tracing::debug!("pipeline stage: {stage}");
        if let Some(f) = &self.on_stage {
            f(stage);
        }
    }

    /// Execute the pipeline. Errors are returned only for setup problems
    /// (unreadable root, bad configuration); in-run fatal errors surface as
    /// `stage == Failed` with prior stages' output preserved.
    pub fn run(&self) -> Result<RunResult> {
        let start = Instant::now();
        self.enter(RunStage::Idle);
        let mut result = RunResult::empty(RunStage::Idle);

        // Scanning.
        self.enter(RunStage::Scanning);
        let patterns = PatternSet::build(
            self.config.include_implicit,
            &self.config.custom_patterns,
            &self.config.exclude_patterns,
        )?;
        let probe: Box<dyn RepositoryProbe> = match GixProbe::open(&self.root) {
            Ok(probe) => Box::new(probe),
            Err(e) => {
                tracing::debug!("no repository for {}: {e}", self.root.display());
                Box::new(NullProbe)
            }
        };
        let scanner =
            CandidateScanner::new(&self.root, &patterns, probe.as_ref(), &self.config.exclude);
        let scan = scanner.scan()?;
        result.summaries.scan = Some(scan.summary.clone());
        if self.check_cancelled(&mut result, start) {
            return Ok(result);
        }

        // Classifying.
        self.enter(RunStage::Classifying);
        let detection = DetectionPipeline::new(
            self.classifier.clone(),
            DetectionOptions {
                threshold: self.config.confidence_threshold,
                batch_size: self.config.classifier.batch_size,
                pacing: Duration::from_millis(self.config.classifier.pacing_ms),
                max_retries: self.config.classifier.max_retries,
                backoff_base: Duration::from_millis(self.config.classifier.backoff_base_ms),
            },
        );
        let detected = detection.run(&scan.candidates, &self.cancel);
        result.items = detected.items.clone();
        result.summaries.detection = Some(detected.summary.clone());
        self.store_writer.set(detected.items.clone());
        if self.check_cancelled(&mut result, start) {
            return Ok(result);
        }

        // Analyzing: read each file once, share immutably with the four
        // analyzers, fan out, join.
        self.enter(RunStage::Analyzing);
        let files = load_item_files(&self.root, &detected.items);
        let ctx = RelationContext {
            items: &detected.items,
            files: &files,
            max_hops: self.config.max_dependency_hops,
        };
        let (found, analysis_summary) =
            relations::run_analyzers(&relations::default_analyzers(), &ctx);
        result.summaries.analysis = Some(analysis_summary);
        if self.check_cancelled(&mut result, start) {
            return Ok(result);
        }

        // Merging.
        self.enter(RunStage::Merging);
        let merged = relations::merge(found);
        result.relationships = merged.clone();

        // Graph construction validates the data-model invariants.
        let mut graph = match SatdGraph::build(detected.items, merged) {
            Ok(graph) => graph,
            Err(e) => return Ok(self.fail(result, e, start)),
        };

        // Chaining.
        self.enter(RunStage::Chaining);
        let (mut found_chains, chain_summary) = chains::find_chains(&mut graph);
        result.summaries.chains = Some(chain_summary);
        result.relationships = graph.relationships().to_vec();
        result.chains = found_chains.clone();
        if self.check_cancelled(&mut result, start) {
            return Ok(result);
        }

        // Scoring.
        self.enter(RunStage::Scoring);
        let scorer = SirScorer::new(self.config.sir_weights);
        match scorer.score(&mut graph, &mut found_chains) {
            Ok(summary) => {
                result.summaries.score = Some(summary);
            }
            Err(e) => return Ok(self.fail(result, e, start)),
        }

        self.enter(RunStage::Done);
        result.items = rank_by_sir(&graph);
        result.relationships = graph.relationships().to_vec();
        result.chains = found_chains;
        result.stage = RunStage::Done;
        result.duration_ms = start.elapsed().as_millis() as u64;
        self.store_writer.set(result.items.clone());

        tracing::info!(
            "run complete in {}ms: {} items, {} relationships, {} chains",
            result.duration_ms,
            result.items.len(),
            result.relationships.len(),
            result.chains.len(),
        );
        Ok(result)
    }

    fn check_cancelled(&self, result: &mut RunResult, start: Instant) -> bool {
        if self.cancel.is_cancelled() {
            result.cancelled = true;
            result.duration_ms = start.elapsed().as_millis() as u64;
            tracing::info!("run cancelled");
            return true;
        }
        false
    }

    fn fail(
        &self,
        mut result: RunResult,
        error: crate::core::Error,
        start: Instant,
    ) -> RunResult {
        self.enter(RunStage::Failed);
        tracing::error!("run failed: {error}");
        result.stage = RunStage::Failed;
        result.error = Some(error.to_string());
        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }
}

/// Read the files containing debt items, once, keyed by relative path.
fn load_item_files(root: &Path, items: &[DebtItem]) -> HashMap<String, SourceFile> {
    let mut files = HashMap::new();
    for item in items {
        if files.contains_key(&item.file) {
            continue;
        }
        match SourceFile::load(root.join(&item.file)) {
            Ok(source) => {
                files.insert(item.file.clone(), source);
            }
            Err(e) => {
                tracing::warn!("cannot reload {} for analysis: {e}", item.file);
            }
        }
    }
    files
}
