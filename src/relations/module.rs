//! Module-dependency relationship analyzer.

use std::collections::BTreeMap;
use std::path::Path;

use crate::graph::{RelationshipType, SatdRelationship, WeightedEdge};
use crate::parser::{self, Parser};

use super::locality::items_by_file;
use super::{AnalyzerOutcome, RelationContext, RelationshipAnalyzer};

/// Weight for a direct import edge, the middle of the MODULE band.
const DIRECT_IMPORT_WEIGHT: f64 = 0.9;

/// Emits A → B when the file containing SATD A imports the file containing
/// SATD B.
#[derive(Default)]
pub struct ModuleDependencyAnalyzer {
    parser: Parser,
}

impl ModuleDependencyAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelationshipAnalyzer for ModuleDependencyAnalyzer {
    fn name(&self) -> &'static str {
        "module"
    }

    fn find_relationships(&self, ctx: &RelationContext<'_>) -> AnalyzerOutcome {
        let by_file = items_by_file(ctx.items);
        let mut parse_failures = 0;
        let mut edges: BTreeMap<(usize, usize), WeightedEdge> = BTreeMap::new();

        let mut files: Vec<&String> = ctx.files.keys().collect();
        files.sort();

        for file in &files {
            let Some(source_items) = by_file.get(file.as_str()) else {
                continue;
            };
            let Ok(parsed) = self.parser.parse_source(&ctx.files[*file]) else {
                parse_failures += 1;
                continue;
            };

            for import in parser::collect_imports(&parsed) {
                // Resolve the import to another scanned file carrying debt.
                let Some(target_file) =
                    resolve_import(&import.path, file.as_str(), &files)
                else {
                    continue;
                };
                let Some(target_items) = by_file.get(target_file.as_str()) else {
                    continue;
                };

                for &(a_idx, _) in source_items {
                    for &(b_idx, _) in target_items {
                        if a_idx == b_idx {
                            continue;
                        }
                        let source = &ctx.items[a_idx];
                        let target = &ctx.items[b_idx];
                        let edge = WeightedEdge {
                            source_id: source.id.clone(),
                            target_id: target.id.clone(),
                            relationship_type: RelationshipType::Module,
                            weight: DIRECT_IMPORT_WEIGHT,
                            hops: 1,
                            description: format!(
                                "{} imports {} ({})",
                                file, target_file, import.path
                            ),
                        };
                        edges.entry((a_idx, b_idx)).or_insert(edge);
                    }
                }
            }
        }

        AnalyzerOutcome {
            relationships: edges
                .into_values()
                .map(SatdRelationship::from_edge)
                .collect(),
            parse_failures,
        }
    }
}

/// Match an import path against the scanned files by final path segment.
///
/// `"./util"`, `"pkg.util"`, `"util.h"` and `"com.example.Util"` all resolve
/// to a file whose stem equals the last segment. The importing file itself
/// never matches.
fn resolve_import<'a>(
    import_path: &str,
    importing_file: &str,
    files: &[&'a String],
) -> Option<&'a String> {
    let base = import_segment(import_path)?;
    files
        .iter()
        .find(|f| {
            f.as_str() != importing_file
                && Path::new(f.as_str())
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|stem| stem == base)
        })
        .copied()
}

fn import_segment(import_path: &str) -> Option<String> {
    let cleaned = import_path
        .trim()
        .trim_start_matches("./")
        .trim_start_matches("../");
    let last = cleaned
        .rsplit(|c| c == '/' || c == ':' || c == '\\')
        .find(|s| !s.is_empty())?;
    // Dots either separate module segments ("pkg.util") or a file extension
    // ("util.h"); in both cases the stem is the second-to-last component.
    let mut parts = last.rsplit('.').filter(|s| !s.is_empty());
    let tail = parts.next()?;
    if crate::core::Language::from_extension(tail).is_some() {
        parts.next().map(|s| s.to_string())
    } else {
        Some(tail.to_string())
    }
}
