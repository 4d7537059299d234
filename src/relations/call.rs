//! Call-graph relationship analyzer.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::graph::{RelationshipType, SatdRelationship, WeightedEdge};
use crate::parser::{self, Parser};

use super::locality::{associate, intra_file_hops, items_by_file};
use super::{AnalyzerOutcome, RelationContext, RelationshipAnalyzer};

/// Emits A → B when a function associated with SATD A directly calls a
/// function associated with SATD B.
#[derive(Default)]
pub struct CallGraphAnalyzer {
    parser: Parser,
}

impl CallGraphAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A function definition associated with a debt item.
struct Def {
    file: String,
    item_idx: usize,
}

/// A call site associated with a debt item.
struct CallSite {
    file: String,
    item_idx: usize,
    callee: String,
    depth: u32,
}

impl RelationshipAnalyzer for CallGraphAnalyzer {
    fn name(&self) -> &'static str {
        "call"
    }

    fn find_relationships(&self, ctx: &RelationContext<'_>) -> AnalyzerOutcome {
        let by_file = items_by_file(ctx.items);
        let mut parse_failures = 0;

        // First pass: definitions and call sites per file, each associated
        // with its nearest debt item.
        let mut defs: BTreeMap<String, Vec<Def>> = BTreeMap::new();
        let mut calls: Vec<CallSite> = Vec::new();

        let mut files: Vec<&String> = ctx.files.keys().collect();
        files.sort();
        for file in files {
            let Some(file_items) = by_file.get(file.as_str()) else {
                continue;
            };
            let source = &ctx.files[file];

            let (functions, sites) = match self.parser.parse_source(source) {
                Ok(parsed) => {
                    let functions = parser::collect_functions(&parsed)
                        .into_iter()
                        .map(|f| (f.name, f.start_line))
                        .collect::<Vec<_>>();
                    let sites = parser::collect_calls(&parsed)
                        .into_iter()
                        .map(|c| (c.callee, c.line, c.depth))
                        .collect::<Vec<_>>();
                    (functions, sites)
                }
                Err(_) => {
                    // Regex fallback over def/function/func headers and
                    // NAME( call sites.
                    parse_failures += 1;
                    fallback_extract(&source.content_str())
                }
            };

            for (name, line) in functions {
                if let Some(item_idx) = associate(file_items, line) {
                    defs.entry(name).or_default().push(Def {
                        file: file.clone(),
                        item_idx,
                    });
                }
            }
            for (callee, line, depth) in sites {
                if let Some(item_idx) = associate(file_items, line) {
                    calls.push(CallSite {
                        file: file.clone(),
                        item_idx,
                        callee,
                        depth,
                    });
                }
            }
        }

        // Second pass: resolve call sites to definitions and assemble edges.
        let band = RelationshipType::Call.band();
        let mut edges: BTreeMap<(usize, usize), WeightedEdge> = BTreeMap::new();
        for call in &calls {
            let Some(candidates) = defs.get(&call.callee) else {
                continue;
            };
            // Prefer a definition in the calling file; otherwise the first
            // in file order.
            let def = candidates
                .iter()
                .find(|d| d.file == call.file)
                .or_else(|| candidates.first());
            let Some(def) = def else { continue };
            if def.item_idx == call.item_idx {
                continue;
            }

            let source = &ctx.items[call.item_idx];
            let target = &ctx.items[def.item_idx];
            let hops = if source.file == target.file {
                intra_file_hops(source.line, target.line)
            } else {
                1
            };
            if hops > ctx.max_hops {
                continue;
            }

            let edge = WeightedEdge {
                source_id: source.id.clone(),
                target_id: target.id.clone(),
                relationship_type: RelationshipType::Call,
                weight: band.weight_at(call.depth),
                hops,
                description: format!(
                    "call to {} at {}:{} reaches debt near {}",
                    call.callee, call.file, target.line, target.file
                ),
            };
            edges
                .entry((call.item_idx, def.item_idx))
                .and_modify(|e| {
                    if edge.weight > e.weight {
                        *e = edge.clone();
                    }
                })
                .or_insert(edge);
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

static FALLBACK_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:def|function|func)\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap()
});
static FALLBACK_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());

const CALL_KEYWORDS: &[&str] = &[
    "if", "while", "for", "switch", "catch", "return", "def", "function", "func", "new", "elif",
    "foreach",
];

/// Line-oriented extraction for files the parser cannot handle.
fn fallback_extract(content: &str) -> (Vec<(String, u32)>, Vec<(String, u32, u32)>) {
    let mut functions = Vec::new();
    let mut calls = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_num = idx as u32 + 1;
        if let Some(cap) = FALLBACK_DEF.captures(line) {
            functions.push((cap[1].to_string(), line_num));
            continue;
        }
        for cap in FALLBACK_CALL.captures_iter(line) {
            let name = &cap[1];
            if !CALL_KEYWORDS.contains(&name) {
                calls.push((name.to_string(), line_num, 0));
            }
        }
    }
    (functions, calls)
}
