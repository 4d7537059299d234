//! Detection pipeline: stage two of SATD detection.

use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use serde::Serialize;

use crate::core::{CancellationToken, Error};
use crate::graph::{DebtItem, DEFAULT_CONFIDENCE_THRESHOLD};

use super::classifier::{Classification, CommentClassifier};
use super::debt_type;
use super::scanner::Candidate;

/// Tuning knobs for the classification stage.
#[derive(Debug, Clone)]
pub struct DetectionOptions {
    /// Admission threshold τ.
    pub threshold: f64,
    /// Classifier calls issued concurrently per batch.
    pub batch_size: usize,
    /// Pacing delay honored between batches.
    pub pacing: Duration,
    /// Retries on rate-limit signals.
    pub max_retries: u32,
    /// First backoff delay; doubled per retry (1s, 2s, 4s by default).
    pub backoff_base: Duration,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            batch_size: 10,
            pacing: Duration::from_millis(100),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Classification-stage statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionSummary {
    pub candidates_classified: usize,
    pub items_admitted: usize,
    /// Classifier failures degraded into negative classifications.
    pub suppressed_errors: usize,
    /// Whether the stage stopped early on cancellation.
    pub cancelled: bool,
}

/// Outcome of the detection stage.
#[derive(Debug)]
pub struct DetectionOutcome {
    /// Confirmed items, sorted by (file, line).
    pub items: Vec<DebtItem>,
    pub summary: DetectionSummary,
}

/// Orchestrates candidate confirmation through the classifier capability.
pub struct DetectionPipeline {
    classifier: Arc<dyn CommentClassifier>,
    options: DetectionOptions,
}

impl DetectionPipeline {
    pub fn new(classifier: Arc<dyn CommentClassifier>, options: DetectionOptions) -> Self {
        Self {
            classifier,
            options,
        }
    }

    /// Classify candidates in paced batches and admit those with
    /// `is_satd ∧ confidence ≥ τ`.
    pub fn run(&self, candidates: &[Candidate], cancel: &CancellationToken) -> DetectionOutcome {
        let mut classified: Vec<(&Candidate, Classification)> =
            Vec::with_capacity(candidates.len());
        let mut summary = DetectionSummary::default();

        let batches: Vec<&[Candidate]> = candidates.chunks(self.options.batch_size.max(1)).collect();
        let batch_count = batches.len();
        for (i, batch) in batches.into_iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let results: Vec<(&Candidate, Classification)> = batch
                .par_iter()
                .map(|candidate| (candidate, self.classify_with_retry(candidate)))
                .collect();
            classified.extend(results);

            if i + 1 < batch_count && !self.options.pacing.is_zero() {
                std::thread::sleep(self.options.pacing);
            }
        }

        summary.candidates_classified = classified.len();
        summary.suppressed_errors = classified
            .iter()
            .filter(|(_, c)| c.error.is_some())
            .count();

        let mut items: Vec<DebtItem> = classified
            .into_iter()
            .filter_map(|(candidate, cls)| {
                let confidence = cls.confidence.clamp(0.0, 1.0);
                (cls.is_satd && confidence >= self.options.threshold)
                    .then(|| self.admit(candidate, confidence))
            })
            .collect();
        items.sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));

        summary.items_admitted = items.len();
        tracing::info!(
            "classified {} candidates with {}: {} admitted at τ={}, {} errors suppressed",
            summary.candidates_classified,
            self.classifier.name(),
            summary.items_admitted,
            self.options.threshold,
            summary.suppressed_errors,
        );

        DetectionOutcome { items, summary }
    }

    fn classify_with_retry(&self, candidate: &Candidate) -> Classification {
        let mut attempt = 0;
        loop {
            match self
                .classifier
                .classify(&candidate.content, &candidate.extended_content)
            {
                Ok(result) => return result,
                Err(Error::ClassifierRateLimit(msg)) if attempt < self.options.max_retries => {
                    let delay = self.options.backoff_base * 2u32.pow(attempt);
                    tracing::debug!(
                        "rate limited ({msg}); retrying in {delay:?} (attempt {attempt})"
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) => return Classification::negative(e.to_string()),
            }
        }
    }

    fn admit(&self, candidate: &Candidate, confidence: f64) -> DebtItem {
        DebtItem {
            id: DebtItem::make_id(&candidate.file, candidate.line, &candidate.commit),
            file: candidate.file.clone(),
            line: candidate.line,
            content: candidate.content.clone(),
            extended_content: candidate.extended_content.clone(),
            created_commit: candidate.commit.clone(),
            created_date: candidate.date,
            debt_type: debt_type::classify(&candidate.content, &candidate.extended_content),
            confidence,
            sir_score: None,
            sir_components: None,
        }
    }
}
