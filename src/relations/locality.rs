//! Locality rule shared by all relationship analyzers.

use std::collections::HashMap;

use crate::graph::{DebtItem, LINES_PER_HOP, LOCALITY_RADIUS};

/// Index debt items by file, as `(item index, line)` in input order.
pub fn items_by_file(items: &[DebtItem]) -> HashMap<&str, Vec<(usize, u32)>> {
    let mut map: HashMap<&str, Vec<(usize, u32)>> = HashMap::new();
    for (idx, item) in items.iter().enumerate() {
        map.entry(item.file.as_str())
            .or_default()
            .push((idx, item.line));
    }
    map
}

/// Associate an AST element at `line` with the nearest debt item within the
/// locality radius. Ties on distance prefer the earlier item.
pub fn associate(file_items: &[(usize, u32)], line: u32) -> Option<usize> {
    let mut best: Option<(u32, usize)> = None;
    for &(idx, item_line) in file_items {
        let distance = line.abs_diff(item_line);
        if distance > LOCALITY_RADIUS {
            continue;
        }
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, idx));
        }
    }
    best.map(|(_, idx)| idx)
}

/// Hops for an intra-file edge: one per ten lines of distance, at least one.
pub fn intra_file_hops(source_line: u32, target_line: u32) -> u32 {
    source_line.abs_diff(target_line).div_ceil(LINES_PER_HOP).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_associate_within_radius() {
        let items = vec![(0, 10), (1, 30)];
        assert_eq!(associate(&items, 12), Some(0));
        assert_eq!(associate(&items, 15), Some(0));
        assert_eq!(associate(&items, 16), None);
        assert_eq!(associate(&items, 27), Some(1));
    }

    #[test]
    fn test_associate_prefers_smallest_distance() {
        let items = vec![(0, 10), (1, 14)];
        assert_eq!(associate(&items, 13), Some(1));
        assert_eq!(associate(&items, 11), Some(0));
    }

    #[test]
    fn test_associate_tie_prefers_earlier_item() {
        let items = vec![(0, 10), (1, 14)];
        // Line 12 is distance 2 from both.
        assert_eq!(associate(&items, 12), Some(0));
    }

    #[test]
    fn test_intra_file_hops() {
        assert_eq!(intra_file_hops(10, 10), 1);
        assert_eq!(intra_file_hops(10, 15), 1);
        assert_eq!(intra_file_hops(10, 20), 1);
        assert_eq!(intra_file_hops(10, 21), 2);
        assert_eq!(intra_file_hops(10, 60), 5);
        assert_eq!(intra_file_hops(10, 61), 6);
        // Symmetric.
        assert_eq!(intra_file_hops(61, 10), 6);
    }
}
