//! Lexical pattern set for SATD candidate filtering.

use regex::{Regex, RegexSet};

use crate::core::{Error, Result};

/// Explicit debt markers.
pub const EXPLICIT_MARKERS: &[&str] = &[
    "TODO", "FIXME", "HACK", "XXX", "BUG", "ISSUE", "DEBT", "NOTE", "WARNING", "OPTIMIZE",
    "REVIEW", "REVISIT", "REFACTOR",
];

/// Implicit debt phrasings.
pub const IMPLICIT_MARKERS: &[&str] = &[
    "workaround",
    "temporary",
    "quick fix",
    "needs refactoring",
    "hardcoded",
    "deprecated",
    "legacy",
    "race condition",
    "memory leak",
    "technical debt",
    "not implemented",
    "band-aid",
    "known issue",
    "should be fixed",
];

/// Compiled lexical pattern set P with case-insensitive word-boundary
/// semantics, plus user exclusions.
pub struct PatternSet {
    include: RegexSet,
    include_sources: Vec<String>,
    exclude: Vec<Regex>,
}

impl PatternSet {
    /// Build the pattern set.
    ///
    /// `custom` patterns are added to P; `exclude` patterns veto a line even
    /// when an include pattern matches.
    pub fn build(include_implicit: bool, custom: &[String], exclude: &[String]) -> Result<Self> {
        let mut sources: Vec<String> = EXPLICIT_MARKERS
            .iter()
            .map(|m| word_pattern(m))
            .collect();
        if include_implicit {
            sources.extend(IMPLICIT_MARKERS.iter().map(|m| word_pattern(m)));
        }
        sources.extend(custom.iter().map(|m| word_pattern(m)));

        let include = RegexSet::new(&sources)
            .map_err(|e| Error::config(format!("bad lexical pattern: {e}")))?;

        let exclude = exclude
            .iter()
            .map(|p| {
                Regex::new(&word_pattern(p))
                    .map_err(|e| Error::config(format!("bad exclude pattern {p:?}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            include,
            include_sources: sources,
            exclude,
        })
    }

    /// Build with the default lexicon only.
    pub fn default_set() -> Self {
        Self::build(true, &[], &[]).expect("default lexicon must compile")
    }

    /// Whether a line matches P and no exclusion.
    pub fn matches(&self, line: &str) -> bool {
        self.include.is_match(line) && !self.exclude.iter().any(|r| r.is_match(line))
    }

    /// The include pattern sources, for VCS-side bulk search.
    pub fn pattern_strings(&self) -> &[String] {
        &self.include_sources
    }
}

fn word_pattern(marker: &str) -> String {
    format!(r"(?i)\b{}\b", regex::escape(marker))
}
