//! Keyword heuristic mapping comment content to a debt type.

use crate::graph::DebtType;

/// Keyword table in priority order; the first matching type wins.
const KEYWORD_TABLE: &[(DebtType, &[&str])] = &[
    (
        DebtType::Defect,
        &[
            "bug", "fixme", "broken", "crash", "error", "fails", "defect", "wrong", "incorrect",
            "race condition", "memory leak",
        ],
    ),
    (
        DebtType::Test,
        &["test", "coverage", "assert", "mock", "flaky"],
    ),
    (
        DebtType::Documentation,
        &["doc", "docs", "documentation", "undocumented", "comment"],
    ),
    (
        DebtType::Architecture,
        &["architecture", "coupling", "layering", "circular dependency"],
    ),
    (
        DebtType::Design,
        &["design", "refactor", "hack", "workaround", "smell", "cleanup", "kludge"],
    ),
    (
        DebtType::Requirement,
        &["todo", "feature", "implement", "requirement", "tbd", "missing"],
    ),
];

/// Classify a comment into a debt type.
///
/// Pure and deterministic: matches the keyword table in priority order over
/// content plus surrounding context; defaults to `Implementation`.
pub fn classify(content: &str, context: &str) -> DebtType {
    let haystack = format!("{} {}", content.to_lowercase(), context.to_lowercase());
    for (debt_type, keywords) in KEYWORD_TABLE {
        if keywords.iter().any(|k| contains_word(&haystack, k)) {
            return *debt_type;
        }
    }
    DebtType::Implementation
}

/// Word-boundary containment check without compiling a regex per call.
fn contains_word(haystack: &str, needle: &str) -> bool {
    let bytes = haystack.as_bytes();
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let begin = start + pos;
        let end = begin + needle.len();
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
    fn test_defect_wins_over_requirement() {
        // "fixme" (defect) outranks "todo" (requirement).
        assert_eq!(classify("# TODO fixme later", ""), DebtType::Defect);
    }

    #[test]
    fn test_each_category() {
        assert_eq!(classify("// BUG: crash on empty input", ""), DebtType::Defect);
        assert_eq!(classify("// TODO add test coverage", ""), DebtType::Test);
        assert_eq!(classify("// docs are stale", ""), DebtType::Documentation);
        assert_eq!(
            classify("// tight coupling with the renderer", ""),
            DebtType::Architecture
        );
        assert_eq!(classify("// HACK around the cache", ""), DebtType::Design);
        assert_eq!(classify("// TODO ship the thing", ""), DebtType::Requirement);
    }

    #[test]
    fn test_default_is_implementation() {
        assert_eq!(classify("// revisit this block", ""), DebtType::Implementation);
    }

    #[test]
    fn test_context_contributes() {
        assert_eq!(
            classify("// temporary", "def test_helper(): pass"),
            DebtType::Test
        );
    }

    #[test]
    fn test_word_boundaries() {
        // "mastodon" must not trigger on "todo".
        assert_eq!(classify("// mastodon client", ""), DebtType::Implementation);
        // "buggy" must not trigger on "bug"... it starts with bug followed by 'g'.
        assert_eq!(classify("// sluggish path", ""), DebtType::Implementation);
    }

    #[test]
    fn test_deterministic() {
        let a = classify("// HACK temporary workaround", "ctx");
        let b = classify("// HACK temporary workaround", "ctx");
        assert_eq!(a, b);
    }
}
