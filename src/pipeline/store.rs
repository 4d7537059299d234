//! Single-writer store for the current debt items.
//!
//! The pipeline owns the only writer; observers (the commit monitor, editor
//! hosts) hold cheap cloneable readers and get immutable snapshots. This
//! replaces any module-scoped mutable list: readers can never observe a
//! half-written state because the writer swaps whole `Arc`s.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::graph::DebtItem;

type Shared = Arc<RwLock<Arc<Vec<DebtItem>>>>;

/// The unique writing handle, owned by the pipeline.
pub struct DebtStoreWriter {
    inner: Shared,
}

/// A read-only view; clone freely.
#[derive(Clone)]
pub struct DebtStore {
    inner: Shared,
}

/// Create a paired writer and reader over an empty item list.
pub fn debt_store() -> (DebtStoreWriter, DebtStore) {
    let inner: Shared = Arc::new(RwLock::new(Arc::new(Vec::new())));
    (
        DebtStoreWriter {
            inner: inner.clone(),
        },
        DebtStore { inner },
    )
}

impl DebtStoreWriter {
    /// Publish a new item list.
    pub fn set(&self, items: Vec<DebtItem>) {
        *self.inner.write() = Arc::new(items);
    }
}

impl DebtStore {
    /// Snapshot of the current items.
    pub fn get(&self) -> Arc<Vec<DebtItem>> {
        self.inner.read().clone()
    }

    /// Number of current items.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DebtType;
    use chrono::Utc;

    fn item(id: &str) -> DebtItem {
        DebtItem {
            id: id.to_string(),
            file: "a.py".to_string(),
            line: 1,
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

    #[test]
    fn test_snapshot_is_stable_across_writes() {
        let (writer, reader) = debt_store();
        writer.set(vec![item("a")]);
        let snapshot = reader.get();
        writer.set(vec![item("b"), item("c")]);

        // The old snapshot is untouched by the new write.
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "a");
        assert_eq!(reader.len(), 2);
    }

    #[test]
    fn test_starts_empty() {
        let (_writer, reader) = debt_store();
        assert!(reader.is_empty());
    }
}
