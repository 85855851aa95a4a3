//! Duplicate collection and the final report.
//!
//! [`collect`] is the last step of the pipeline. It receives every
//! full-hash subgroup, discards the ones that turned out to hold a single
//! file, orders the rest and numbers them. It performs no I/O.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use super::DuplicateGroup;
use crate::scanner::{FileEntry, Hash};

/// Ordered set of confirmed duplicate groups from one detection run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DuplicateReport {
    groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    /// Number of duplicate groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in report order.
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    /// Iterate over groups in report order.
    pub fn iter(&self) -> std::slice::Iter<'_, DuplicateGroup> {
        self.groups.iter()
    }

    /// Consume the report, returning its groups.
    #[must_use]
    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        self.groups
    }

    /// Map of hex full hash to member paths.
    #[must_use]
    pub fn as_map(&self) -> BTreeMap<String, Vec<PathBuf>> {
        self.groups
            .iter()
            .map(|g| (g.hash_hex(), g.paths()))
            .collect()
    }

    /// Map of `Group N` label to member paths.
    ///
    /// Keys sort lexically, so callers that care about report order should
    /// use [`DuplicateReport::iter`] instead.
    #[must_use]
    pub fn as_labelled_map(&self) -> BTreeMap<String, Vec<PathBuf>> {
        self.groups.iter().map(|g| (g.label(), g.paths())).collect()
    }

    /// Number of redundant copies across all groups.
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }

    /// Bytes that removing every redundant copy would free.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::wasted_space).sum()
    }
}

impl<'a> IntoIterator for &'a DuplicateReport {
    type Item = &'a DuplicateGroup;
    type IntoIter = std::slice::Iter<'a, DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

impl IntoIterator for DuplicateReport {
    type Item = DuplicateGroup;
    type IntoIter = std::vec::IntoIter<DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Assemble confirmed full-hash subgroups into a report.
///
/// Subgroups with fewer than two files are dropped. The remaining groups
/// are sorted by size (largest first), ties broken by their first path,
/// and numbered `1..=n` in that order. File order inside a group is kept.
///
/// # Example
///
/// ```
/// use dupehunt::duplicates::collect;
/// use dupehunt::scanner::FileEntry;
/// use std::path::PathBuf;
///
/// let small = vec![
///     FileEntry::new(PathBuf::from("/a"), 10),
///     FileEntry::new(PathBuf::from("/b"), 10),
/// ];
/// let large = vec![
///     FileEntry::new(PathBuf::from("/c"), 99),
///     FileEntry::new(PathBuf::from("/d"), 99),
/// ];
/// let lonely = vec![FileEntry::new(PathBuf::from("/e"), 5)];
///
/// let report = collect(vec![([1u8; 32], small), ([2u8; 32], large), ([3u8; 32], lonely)]);
///
/// assert_eq!(report.len(), 2);
/// assert_eq!(report.groups()[0].size, 99);
/// assert_eq!(report.groups()[0].id, 1);
/// ```
#[must_use]
pub fn collect(groups: impl IntoIterator<Item = (Hash, Vec<FileEntry>)>) -> DuplicateReport {
    let mut confirmed: Vec<(Hash, Vec<FileEntry>)> = groups
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .collect();

    confirmed.sort_by(|(_, a), (_, b)| {
        let size_a = a.first().map_or(0, |f| f.size);
        let size_b = b.first().map_or(0, |f| f.size);
        size_b
            .cmp(&size_a)
            .then_with(|| a.first().map(|f| &f.path).cmp(&b.first().map(|f| &f.path)))
    });

    let groups = confirmed
        .into_iter()
        .enumerate()
        .map(|(idx, (hash, files))| {
            let size = files.first().map_or(0, |f| f.size);
            let group = DuplicateGroup::new(idx + 1, hash, size, files);
            log::debug!(
                "{} ({}): {} files, {} bytes each",
                group.label(),
                group.hash_hex(),
                group.len(),
                size
            );
            group
        })
        .collect();

    DuplicateReport { groups }
}
