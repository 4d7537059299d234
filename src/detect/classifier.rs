//! Comment classifier capability.
//!
//! The second detection stage confirms candidates through this trait. The
//! deterministic `KeywordClassifier` serves tests and offline runs; the
//! remote implementation lives in `remote.rs` and is never named by core
//! pipeline code, which only holds an `Arc<dyn CommentClassifier>`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::Result;

use super::patterns::{EXPLICIT_MARKERS, IMPLICIT_MARKERS};

/// Outcome of classifying one comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub is_satd: bool,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Recorded failure, when the result is a degraded negative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Classification {
    /// A negative classification carrying a recorded error.
    pub fn negative(error: impl Into<String>) -> Self {
        Self {
            is_satd: false,
            confidence: 0.0,
            error: Some(error.into()),
        }
    }
}

/// One item of a batch classification request.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub id: String,
    pub comment: String,
    pub context: String,
}

/// Capability confirming SATD candidates.
pub trait CommentClassifier: Send + Sync {
    /// Classify a single comment with its surrounding context.
    ///
    /// Implementations must tolerate an empty comment and return a negative
    /// classification for it.
    fn classify(&self, comment: &str, context: &str) -> Result<Classification>;

    /// Classify a batch. The default implementation classifies items one by
    /// one, folding errors into recorded negatives; `threshold` is advisory
    /// for implementations that can short-circuit.
    fn batch_classify(
        &self,
        items: &[ClassifyRequest],
        _threshold: f64,
    ) -> HashMap<String, Classification> {
        items
            .iter()
            .map(|item| {
                let result = self
                    .classify(&item.comment, &item.context)
                    .unwrap_or_else(|e| Classification::negative(e.to_string()));
                (item.id.clone(), result)
            })
            .collect()
    }

    /// Implementation name for logging.
    fn name(&self) -> &'static str;
}

/// Strong explicit markers that make a comment unambiguous debt.
const STRONG_MARKERS: &[&str] = &["FIXME", "HACK", "XXX", "BUG"];

/// Deterministic, offline classifier over the lexical marker sets.
///
/// Confidence tiers: strong explicit markers 0.95, other explicit markers
/// 0.85, implicit phrasings 0.75.
#[derive(Debug, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl CommentClassifier for KeywordClassifier {
    fn classify(&self, comment: &str, _context: &str) -> Result<Classification> {
        if comment.trim().is_empty() {
            return Ok(Classification {
                is_satd: false,
                confidence: 0.0,
                error: None,
            });
        }

        let upper = comment.to_uppercase();
        let confidence = if STRONG_MARKERS.iter().any(|m| contains_marker(&upper, m)) {
            0.95
        } else if EXPLICIT_MARKERS.iter().any(|m| contains_marker(&upper, m)) {
            0.85
        } else if IMPLICIT_MARKERS
            .iter()
            .any(|m| contains_marker(&upper, &m.to_uppercase()))
        {
            0.75
        } else {
            0.0
        };

        Ok(Classification {
            is_satd: confidence > 0.0,
            confidence,
            error: None,
        })
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

fn contains_marker(haystack: &str, marker: &str) -> bool {
    let bytes = haystack.as_bytes();
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(marker) {
        let begin = start + pos;
        let end = begin + marker.len();
        let left_ok = begin == 0 || !bytes[begin - 1].is_ascii_alphanumeric();
        let right_ok = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        if left_ok && right_ok {
            return true;
        }
        start = begin + 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_comment_is_negative() {
        let classifier = KeywordClassifier::new();
        let result = classifier.classify("", "some context").unwrap();
        assert!(!result.is_satd);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_confidence_tiers() {
        let classifier = KeywordClassifier::new();

        let strong = classifier.classify("// FIXME broken", "").unwrap();
        assert!(strong.is_satd);
        assert_eq!(strong.confidence, 0.95);

        let explicit = classifier.classify("// TODO later", "").unwrap();
        assert_eq!(explicit.confidence, 0.85);

        let implicit = classifier.classify("// temporary workaround", "").unwrap();
        assert_eq!(implicit.confidence, 0.75);

        let none = classifier.classify("// plain comment", "").unwrap();
        assert!(!none.is_satd);
    }

    #[test]
    fn test_word_boundary() {
        let classifier = KeywordClassifier::new();
        let result = classifier.classify("// mastodon handler", "").unwrap();
        assert!(!result.is_satd);
    }

    #[test]
    fn test_deterministic() {
        let classifier = KeywordClassifier::new();
        let a = classifier.classify("// TODO x", "ctx").unwrap();
        let b = classifier.classify("// TODO x", "ctx").unwrap();
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.is_satd, b.is_satd);
    }

    #[test]
    fn test_batch_classify_default_impl() {
        let classifier = KeywordClassifier::new();
        let items = vec![
            ClassifyRequest {
                id: "a".into(),
                comment: "// TODO one".into(),
                context: String::new(),
            },
            ClassifyRequest {
                id: "b".into(),
                comment: "// nothing here".into(),
                context: String::new(),
            },
        ];
        let results = classifier.batch_classify(&items, 0.7);
        assert_eq!(results.len(), 2);
        assert!(results["a"].is_satd);
        assert!(!results["b"].is_satd);
    }
}
