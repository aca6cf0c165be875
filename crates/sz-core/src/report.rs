//! Aggregated scan output.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScanWarning;
use crate::lossy;
use crate::probe::{ProbeResult, ProbeStatus};

/// Mapping from every probed directory to its direct size.
///
/// Built one [`ProbeResult`] at a time by the coordinator; complete once the
/// scan returns. Aggregation is order-independent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// Root path that was scanned.
    #[serde(serialize_with = "lossy::path")]
    pub root: PathBuf,

    /// Direct (non-recursive) size of each probed directory.
    #[serde(serialize_with = "lossy::path_keys")]
    pub sizes: HashMap<PathBuf, u64>,

    /// Directories whose size may be an undercount.
    #[serde(serialize_with = "lossy::path_keys")]
    pub degraded: HashMap<PathBuf, ProbeStatus>,

    /// Blacklisted paths encountered during the scan.
    #[serde(serialize_with = "lossy::paths")]
    pub skipped: Vec<PathBuf>,

    /// Warnings encountered during the scan.
    pub warnings: Vec<ScanWarning>,

    /// Duration of the scan.
    pub scan_duration: Duration,
}

impl ScanReport {
    /// Create an empty report for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Fold one probe result into the report.
    pub fn record(&mut self, result: ProbeResult) {
        if result.status.is_degraded() {
            self.degraded.insert(result.path.clone(), result.status);
        }
        self.sizes.insert(result.path, result.direct_size);
        self.skipped.extend(result.skipped);
        self.warnings.extend(result.warnings);
    }

    /// Direct size of a probed directory.
    pub fn direct_size(&self, path: impl AsRef<Path>) -> Option<u64> {
        self.sizes.get(path.as_ref()).copied()
    }

    /// Direct size of the root directory.
    pub fn root_size(&self) -> u64 {
        self.direct_size(&self.root).unwrap_or(0)
    }

    /// Sum of all direct sizes, i.e. the size of the whole subtree.
    pub fn total_size(&self) -> u64 {
        self.sizes.values().sum()
    }

    /// Number of directories probed.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Check if nothing was probed.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Check whether a directory was probed.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.sizes.contains_key(path.as_ref())
    }

    /// Check whether a directory's size may be an undercount.
    pub fn is_degraded(&self, path: impl AsRef<Path>) -> bool {
        self.degraded.contains_key(path.as_ref())
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Entries sorted by size descending; equal sizes are ordered by path.
    pub fn sorted_by_size(&self) -> Vec<(&Path, u64)> {
        let mut entries: Vec<(&Path, u64)> = self
            .sizes
            .iter()
            .map(|(path, size)| (path.as_path(), *size))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WarningKind;

    fn result(path: &str, size: u64) -> ProbeResult {
        ProbeResult {
            direct_size: size,
            ..ProbeResult::new(path)
        }
    }

    #[test]
    fn test_record_and_totals() {
        let mut report = ScanReport::new("/a");
        report.record(result("/a", 100));
        report.record(result("/a/b", 50));

        assert_eq!(report.len(), 2);
        assert_eq!(report.root_size(), 100);
        assert_eq!(report.total_size(), 150);
        assert_eq!(report.direct_size("/a/b"), Some(50));
        assert_eq!(report.direct_size("/a/c"), None);
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_record_degraded() {
        let mut report = ScanReport::new("/a");
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        report.record(ProbeResult::unreadable(
            "/a/c",
            ScanWarning::read_error("/a/c", &denied),
        ));

        assert!(report.contains("/a/c"));
        assert_eq!(report.direct_size("/a/c"), Some(0));
        assert!(report.is_degraded("/a/c"));
        assert_eq!(report.warnings[0].kind, WarningKind::PermissionDenied);
    }

    #[test]
    fn test_sorted_by_size() {
        let mut report = ScanReport::new("/r");
        report.record(result("/r", 10));
        report.record(result("/r/z", 30));
        report.record(result("/r/a", 30));
        report.record(result("/r/m", 0));

        let sorted = report.sorted_by_size();
        let paths: Vec<_> = sorted.iter().map(|(p, _)| p.to_str().unwrap()).collect();
        assert_eq!(paths, vec!["/r/a", "/r/z", "/r", "/r/m"]);
    }

    #[test]
    fn test_missing_root_size() {
        let report = ScanReport::new("/nothing");
        assert!(report.is_empty());
        assert_eq!(report.root_size(), 0);
        assert_eq!(report.total_size(), 0);
    }
}
