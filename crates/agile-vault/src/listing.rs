//! Search, grouping and index/disk reconciliation over index rows.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::items::ItemCategory;
use crate::reader::IndexEntry;

/// Non-trashed entries matching `query`, sorted by title.
///
/// The query is trimmed and matched case-insensitively against title,
/// location and type name. An empty query matches everything. Ties on
/// title (ignoring case) are broken by uuid.
#[must_use]
pub fn search<'a>(entries: &'a [IndexEntry], query: &str) -> Vec<&'a IndexEntry> {
    let needle = query.trim().to_lowercase();
    let hit = |e: &IndexEntry| {
        needle.is_empty()
            || e.title.to_lowercase().contains(&needle)
            || e.location.to_lowercase().contains(&needle)
            || e.type_name.to_lowercase().contains(&needle)
    };

    let mut found: Vec<&IndexEntry> = entries
        .iter()
        .filter(|e| !e.trashed)
        .filter(|e| hit(*e))
        .collect();
    found.sort_by_cached_key(|e| (e.title.to_lowercase(), e.uuid.clone()));
    found
}

/// Count non-trashed entries per category.
#[must_use]
pub fn category_counts(entries: &[IndexEntry]) -> BTreeMap<ItemCategory, usize> {
    let mut counts = BTreeMap::new();
    for entry in entries.iter().filter(|e| !e.trashed) {
        let slot = counts
            .entry(ItemCategory::from_type_name(&entry.type_name))
            .or_insert(0_usize);
        *slot = slot.saturating_add(1);
    }
    counts
}

/// Differences between the index and the entry files on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    /// Indexed uuids with no `.1password` file, sorted.
    pub missing_files: Vec<String>,
    /// Entry files with no index row, sorted.
    pub unindexed_files: Vec<String>,
}

impl Reconciliation {
    /// `true` when index and disk agree.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.missing_files.is_empty() && self.unindexed_files.is_empty()
    }
}

/// Compare index uuids against entry file stems found on disk.
#[must_use]
pub fn reconcile(index: &[IndexEntry], on_disk_ids: &[String]) -> Reconciliation {
    let indexed: BTreeSet<&str> = index
        .iter()
        .map(|e| e.uuid.as_str())
        .filter(|u| !u.is_empty())
        .collect();
    let on_disk: BTreeSet<&str> = on_disk_ids.iter().map(String::as_str).collect();

    let report = Reconciliation {
        missing_files: indexed.difference(&on_disk).map(|s| (*s).to_string()).collect(),
        unindexed_files: on_disk.difference(&indexed).map(|s| (*s).to_string()).collect(),
    };
    if !report.is_consistent() {
        tracing::warn!(
            missing = report.missing_files.len(),
            unindexed = report.unindexed_files.len(),
            "index and entry files disagree"
        );
    }
    report
}
