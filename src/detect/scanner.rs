//! Candidate scanner: stage one of SATD detection.

use std::path::Path;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;

use crate::core::{is_vendored_or_hidden, FileSet, Language, Result, SourceFile};
use crate::graph::{LOCALITY_RADIUS, UNTRACKED};
use crate::probe::RepositoryProbe;

use super::patterns::PatternSet;

/// A comment line matching the lexical pattern set, not yet confirmed.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Path relative to the workspace root.
    pub file: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Trimmed line content.
    pub content: String,
    /// ±5 lines of surrounding code.
    pub extended_content: String,
    /// Blame commit hash, or `"untracked"`.
    pub commit: String,
    /// Blame commit date, or the scan time when untracked.
    pub date: DateTime<Utc>,
}

/// Scan statistics, including suppressed-error counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    pub files_scanned: usize,
    pub candidates_found: usize,
    /// Files skipped because they could not be read.
    pub unreadable_files: usize,
    /// Whether the filesystem fallback ran instead of the VCS fast path.
    pub used_fallback: bool,
}

/// Outcome of a scan.
#[derive(Debug)]
pub struct ScanOutcome {
    pub candidates: Vec<Candidate>,
    pub summary: ScanSummary,
}

/// Walks the repository and produces candidates with blame metadata.
pub struct CandidateScanner<'a> {
    root: &'a Path,
    patterns: &'a PatternSet,
    probe: &'a dyn RepositoryProbe,
    exclude_globs: &'a [String],
}

impl<'a> CandidateScanner<'a> {
    pub fn new(
        root: &'a Path,
        patterns: &'a PatternSet,
        probe: &'a dyn RepositoryProbe,
        exclude_globs: &'a [String],
    ) -> Self {
        Self {
            root,
            patterns,
            probe,
            exclude_globs,
        }
    }

    /// Run the scan: VCS-backed bulk search first, filesystem walk when the
    /// fast path yields nothing or fails. Output is sorted by (file, line)
    /// on both paths, so downstream results are identical on a fully
    /// tracked repository.
    pub fn scan(&self) -> Result<ScanOutcome> {
        let fast = self.scan_fast_path();
        let (mut candidates, mut summary) = match fast {
            Ok((candidates, summary)) if !candidates.is_empty() => (candidates, summary),
            Ok(_) => {
                tracing::debug!("VCS fast path found nothing; walking the filesystem");
                self.scan_filesystem()?
            }
            Err(e) => {
                tracing::debug!("VCS fast path unavailable ({e}); walking the filesystem");
                self.scan_filesystem()?
            }
        };

        // Blame after candidate collection: one cached blame pass per file.
        for candidate in &mut candidates {
            match self
                .probe
                .blame_line(&self.root.join(&candidate.file), candidate.line)
            {
                Some(info) => {
                    candidate.commit = info.commit;
                    candidate.date = info.date;
                }
                None => {
                    candidate.commit = UNTRACKED.to_string();
                    candidate.date = Utc::now();
                }
            }
        }

        candidates.sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
        summary.candidates_found = candidates.len();
        tracing::info!(
            "scan found {} candidates in {} files ({} unreadable, fallback: {})",
            summary.candidates_found,
            summary.files_scanned,
            summary.unreadable_files,
            summary.used_fallback,
        );

        Ok(ScanOutcome {
            candidates,
            summary,
        })
    }

    fn scan_fast_path(&self) -> Result<(Vec<Candidate>, ScanSummary)> {
        let matches = self
            .probe
            .grep(self.patterns.pattern_strings(), Language::all_extensions())?;

        let exclude = build_exclude_set(self.exclude_globs)?;
        let mut summary = ScanSummary::default();
        let mut candidates = Vec::new();
        let mut current_file: Option<(String, Option<SourceFile>)> = None;

        for m in matches {
            if is_vendored_or_hidden(&m.file) || exclude.is_match(&m.file) {
                continue;
            }
            let Some(language) = Language::detect(&m.file) else {
                continue;
            };
            if !is_candidate_line(language, &m.content, self.patterns) {
                continue;
            }

            let rel = m.file.to_string_lossy().to_string();
            // Matches arrive sorted by file; load each worktree file once.
            if current_file.as_ref().map(|(f, _)| f.as_str()) != Some(rel.as_str()) {
                summary.files_scanned += 1;
                let loaded = SourceFile::load(self.root.join(&m.file)).ok();
                if loaded.is_none() {
                    summary.unreadable_files += 1;
                    tracing::warn!("skipping unreadable file {rel}");
                }
                current_file = Some((rel.clone(), loaded));
            }
            let Some((_, Some(source))) = current_file.as_ref().map(|(f, s)| (f, s.as_ref()))
            else {
                continue;
            };

            candidates.push(Candidate {
                file: rel,
                line: m.line,
                content: m.content.trim().to_string(),
                extended_content: source.context_window(m.line, LOCALITY_RADIUS),
                commit: UNTRACKED.to_string(),
                date: Utc::now(),
            });
        }

        Ok((candidates, summary))
    }

    fn scan_filesystem(&self) -> Result<(Vec<Candidate>, ScanSummary)> {
        let files = FileSet::from_path(self.root, self.exclude_globs)?;
        let files_scanned = files.len();

        let (candidates, unreadable): (Vec<Candidate>, usize) = files
            .files()
            .par_iter()
            .map(|path| match SourceFile::load(path) {
                Ok(source) => {
                    let rel = files.relative_path(path).to_string_lossy().to_string();
                    (self.scan_file(&rel, &source), 0)
                }
                Err(_) => {
                    tracing::warn!("skipping unreadable file {}", path.display());
                    (Vec::new(), 1)
                }
            })
            .reduce(
                || (Vec::new(), 0),
                |(mut acc, errs_a), (items, errs_b)| {
                    acc.extend(items);
                    (acc, errs_a + errs_b)
                },
            );

        Ok((
            candidates,
            ScanSummary {
                files_scanned,
                candidates_found: 0,
                unreadable_files: unreadable,
                used_fallback: true,
            },
        ))
    }

    fn scan_file(&self, rel: &str, source: &SourceFile) -> Vec<Candidate> {
        let content = source.content_str();
        let mut out = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if !is_candidate_line(source.language, line, self.patterns) {
                continue;
            }
            let line_num = idx as u32 + 1;
            out.push(Candidate {
                file: rel.to_string(),
                line: line_num,
                content: line.trim().to_string(),
                extended_content: source.context_window(line_num, LOCALITY_RADIUS),
                commit: UNTRACKED.to_string(),
                date: Utc::now(),
            });
        }
        out
    }
}

/// The candidate predicate shared by both scan paths: the line carries a
/// comment marker for its language and matches the lexical pattern set.
fn is_candidate_line(language: Language, line: &str, patterns: &PatternSet) -> bool {
    language.has_comment_marker(line) && patterns.matches(line)
}

fn build_exclude_set(patterns: &[String]) -> Result<globset::GlobSet> {
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::Glob::new(pattern).map_err(|e| {
            crate::core::Error::config(format!("bad exclude pattern {pattern:?}: {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| crate::core::Error::config(e.to_string()))
}
