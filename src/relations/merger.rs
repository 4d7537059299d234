//! Relationship merging across analyzers.

use std::collections::BTreeMap;

use crate::graph::SatdRelationship;

/// Merge relationships sharing an ordered `(source, target)` pair.
///
/// Types are unioned, edges concatenated, strength takes the maximum, and
/// differing descriptions are joined. Self-loops are dropped. Keys are
/// sorted, so output order is deterministic, and re-merging an already
/// merged list is a no-op.
pub fn merge(relationships: Vec<SatdRelationship>) -> Vec<SatdRelationship> {
    let mut merged: BTreeMap<(String, String), SatdRelationship> = BTreeMap::new();

    for rel in relationships {
        if rel.source_id == rel.target_id {
            tracing::debug!("dropping self-loop on {}", rel.source_id);
            continue;
        }
        let key = (rel.source_id.clone(), rel.target_id.clone());
        match merged.entry(key) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(rel);
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.types.extend(rel.types.iter().copied());
                existing.edges.extend(rel.edges);
                existing.strength = existing.strength.max(rel.strength);
                if !rel.description.is_empty() && existing.description != rel.description {
                    existing.description = format!(
                        "{}\n\nAdditional relationship:\n{}",
                        existing.description, rel.description
                    );
                }
            }
        }
    }

    merged.into_values().collect()
}
