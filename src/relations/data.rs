//! Data-dependency relationship analyzer.

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::{RelationshipType, SatdRelationship, WeightedEdge, LOCALITY_RADIUS};
use crate::parser::{self, Parser};

use super::locality::{intra_file_hops, items_by_file};
use super::{AnalyzerOutcome, RelationContext, RelationshipAnalyzer};

/// Emits A → B when an identifier defined or assigned in the neighborhood of
/// SATD A is read in the neighborhood of SATD B.
///
/// Declarator targets and assignment LHS count as definitions; every other
/// identifier occurrence is a use. Matching stays within a file, where
/// identifier scope makes the def/use pairing trustworthy.
#[derive(Default)]
pub struct DataDependencyAnalyzer {
    parser: Parser,
}

impl DataDependencyAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelationshipAnalyzer for DataDependencyAnalyzer {
    fn name(&self) -> &'static str {
        "data"
    }

    fn find_relationships(&self, ctx: &RelationContext<'_>) -> AnalyzerOutcome {
        let by_file = items_by_file(ctx.items);
        let band = RelationshipType::Data.band();
        let mut parse_failures = 0;
        let mut edges: BTreeMap<(usize, usize), (BTreeSet<String>, WeightedEdge)> =
            BTreeMap::new();

        let mut files: Vec<&String> = ctx.files.keys().collect();
        files.sort();
        for file in files {
            let Some(file_items) = by_file.get(file.as_str()) else {
                continue;
            };
            if file_items.len() < 2 {
                continue;
            }
            let Ok(parsed) = self.parser.parse_source(&ctx.files[file]) else {
                parse_failures += 1;
                continue;
            };
            let idents = parser::collect_identifiers(&parsed);

            // Definitions and uses in each item's ±5 neighborhood.
            let mut defs_near: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); file_items.len()];
            let mut uses_near: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); file_items.len()];
            for ident in &idents {
                for (slot, &(_, item_line)) in file_items.iter().enumerate() {
                    if ident.line.abs_diff(item_line) > LOCALITY_RADIUS {
                        continue;
                    }
                    if ident.is_definition {
                        defs_near[slot].insert(ident.name.as_str());
                    } else {
                        uses_near[slot].insert(ident.name.as_str());
                    }
                }
            }

            for (a_slot, &(a_idx, a_line)) in file_items.iter().enumerate() {
                for (b_slot, &(b_idx, b_line)) in file_items.iter().enumerate() {
                    if a_idx == b_idx {
                        continue;
                    }
                    let shared: Vec<&&str> =
                        defs_near[a_slot].intersection(&uses_near[b_slot]).collect();
                    if shared.is_empty() {
                        continue;
                    }
                    let hops = intra_file_hops(a_line, b_line);
                    if hops > ctx.max_hops {
                        continue;
                    }

                    let names: BTreeSet<String> =
                        shared.iter().map(|s| s.to_string()).collect();
                    let weight = band.weight_at(names.len() as u32 - 1);
                    let source = &ctx.items[a_idx];
                    let target = &ctx.items[b_idx];
                    let edge = WeightedEdge {
                        source_id: source.id.clone(),
                        target_id: target.id.clone(),
                        relationship_type: RelationshipType::Data,
                        weight,
                        hops,
                        description: format!(
                            "{} defined near {}:{} and read near line {}",
                            join_names(&names),
                            file,
                            source.line,
                            target.line
                        ),
                    };
                    edges
                        .entry((a_idx, b_idx))
                        .and_modify(|(existing_names, existing)| {
                            existing_names.extend(names.iter().cloned());
                            let merged =
                                band.weight_at(existing_names.len() as u32 - 1);
                            if merged > existing.weight {
                                existing.weight = merged;
                            }
                        })
                        .or_insert((names, edge));
                }
            }
        }

        AnalyzerOutcome {
            relationships: edges
                .into_values()
                .map(|(_, edge)| SatdRelationship::from_edge(edge))
                .collect(),
            parse_failures,
        }
    }
}

fn join_names(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}
