//! Control-flow relationship analyzer.

use std::collections::BTreeMap;

use crate::graph::{RelationshipType, SatdRelationship, WeightedEdge, LOCALITY_RADIUS};
use crate::parser::{self, Parser};

use super::locality::{intra_file_hops, items_by_file};
use super::{AnalyzerOutcome, RelationContext, RelationshipAnalyzer};

/// Emits A → B when a control structure anchored in the ±5 neighborhood of
/// SATD A contains SATD B's line in its reach.
#[derive(Default)]
pub struct ControlFlowAnalyzer {
    parser: Parser,
}

impl ControlFlowAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelationshipAnalyzer for ControlFlowAnalyzer {
    fn name(&self) -> &'static str {
        "control"
    }

    fn find_relationships(&self, ctx: &RelationContext<'_>) -> AnalyzerOutcome {
        let by_file = items_by_file(ctx.items);
        let band = RelationshipType::Control.band();
        let mut parse_failures = 0;
        let mut edges: BTreeMap<(usize, usize), WeightedEdge> = BTreeMap::new();

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

            for control in parser::collect_controls(&parsed) {
                // The structure anchors to items near its opening line.
                for &(a_idx, a_line) in file_items {
                    if control.start_line.abs_diff(a_line) > LOCALITY_RADIUS {
                        continue;
                    }
                    for &(b_idx, b_line) in file_items {
                        if b_idx == a_idx {
                            continue;
                        }
                        // Reach: the lines inside the structure.
                        if b_line < control.start_line || b_line > control.end_line {
                            continue;
                        }
                        let hops = intra_file_hops(a_line, b_line);
                        if hops > ctx.max_hops {
                            continue;
                        }

                        let source = &ctx.items[a_idx];
                        let target = &ctx.items[b_idx];
                        let edge = WeightedEdge {
                            source_id: source.id.clone(),
                            target_id: target.id.clone(),
                            relationship_type: RelationshipType::Control,
                            weight: band.weight_at(control.depth),
                            hops,
                            description: format!(
                                "{} at {}:{} spans debt at line {}",
                                control.kind, file, control.start_line, b_line
                            ),
                        };
                        edges
                            .entry((a_idx, b_idx))
                            .and_modify(|e| {
                                if edge.weight > e.weight {
                                    *e = edge.clone();
                                }
                            })
                            .or_insert(edge);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Language, SourceFile};
    use crate::graph::{DebtItem, DebtType};
    use chrono::Utc;
    use std::collections::HashMap;

    fn item(file: &str, line: u32) -> DebtItem {
        DebtItem {
            id: format!("{file}:{line}:untracked"),
            file: file.to_string(),
            line,
            content: "# TODO".to_string(),
            extended_content: String::new(),
            created_commit: "untracked".to_string(),
            created_date: Utc::now(),
            debt_type: DebtType::Requirement,
            confidence: 0.9,
            sir_score: None,
            sir_components: None,
        }
    }

    fn ctx_for<'a>(
        items: &'a [DebtItem],
        files: &'a HashMap<String, SourceFile>,
    ) -> RelationContext<'a> {
        RelationContext {
            items,
            files,
            max_hops: 5,
        }
    }

    #[test]
    fn test_structure_reach_links_items() {
        let code = "\
# TODO branching mess
if condition:
    x = 1
    y = 2
    # FIXME inner case broken
    handle()
";
        let files = HashMap::from([(
            "a.py".to_string(),
            SourceFile::from_content("a.py", Language::Python, code.as_bytes().to_vec()),
        )]);
        let items = vec![item("a.py", 1), item("a.py", 5)];

        let outcome = ControlFlowAnalyzer::new().find_relationships(&ctx_for(&items, &files));
        // A → B from the if anchored at A spanning B; B is also within ±5 of
        // the same structure, giving the reverse edge as well.
        assert!(!outcome.relationships.is_empty());
        let forward = outcome
            .relationships
            .iter()
            .find(|r| r.source_id == items[0].id)
            .expect("forward edge");
        assert_eq!(forward.target_id, items[1].id);
        assert!(RelationshipType::Control.band().contains(forward.strength));
        assert!(forward.description.contains("if_statement"));
    }

    #[test]
    fn test_item_outside_reach_not_linked() {
        let code = "\
# TODO branching mess
if condition:
    x = 1

y = 2
z = 3
w = 4
q = 5
r = 6
# FIXME far away
handle()
";
        let files = HashMap::from([(
            "a.py".to_string(),
            SourceFile::from_content("a.py", Language::Python, code.as_bytes().to_vec()),
        )]);
        let items = vec![item("a.py", 1), item("a.py", 10)];

        let outcome = ControlFlowAnalyzer::new().find_relationships(&ctx_for(&items, &files));
        assert!(outcome.relationships.is_empty());
    }

    #[test]
    fn test_nested_structures_weigh_more() {
        let band = RelationshipType::Control.band();
        assert!(band.weight_at(2) > band.weight_at(0));
        assert!(band.weight_at(2) <= band.max);
    }
}
