//! Scan coordinator: fans probes out over a bounded pool and aggregates them.

use std::thread;
use std::time::Instant;

use crossbeam_channel::Sender;
use rayon::{Scope, ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info};

use sz_core::{InodeInfo, ProbeResult, ScanConfig, ScanError, ScanReport, ScanTarget};

use crate::inode::InodeTracker;
use crate::prober::Prober;

/// Drives a whole scan.
///
/// Every discovered directory becomes one probe task on a fixed-size rayon
/// pool, so the number of probes in flight never exceeds the pool size.
/// Results flow back over a channel to a single consuming loop, which is the
/// only place the report is mutated.
pub struct Coordinator {
    config: ScanConfig,
    pool: ThreadPool,
}

impl Coordinator {
    /// Create a coordinator and start its worker pool.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("sz-probe-{i}"));
        if config.threads > 0 {
            builder = builder.num_threads(config.threads);
        }

        let pool = builder.build().map_err(|e| ScanError::ThreadPool {
            message: e.to_string(),
        })?;

        Ok(Self { config, pool })
    }

    /// Configuration this coordinator was built with.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Number of probe workers.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Resolve the configured root and scan it.
    pub fn run(&self) -> Result<ScanReport, ScanError> {
        let target = ScanTarget::resolve(&self.config.root)?;
        Ok(self.scan(&target))
    }

    /// Scan the tree below `target`.
    ///
    /// Returns once every dispatched probe has reported. The report holds
    /// one entry per directory probed, the root included.
    ///
    /// A directory reachable through more than one path on the same device
    /// (a bind mount) is probed once, under whichever path claims its inode
    /// first. Sizes and totals do not depend on probe order, but for such
    /// trees the path the directory is reported under may differ between
    /// runs; the losing path shows up as an `AlreadyVisited` warning.
    pub fn scan(&self, target: &ScanTarget) -> ScanReport {
        let start = Instant::now();

        let directories = InodeTracker::new();
        if let Ok(metadata) = std::fs::metadata(&target.path) {
            directories.track(InodeInfo::from_metadata(&metadata));
        }
        let hardlinks = InodeTracker::new();

        let mut prober = Prober::new(&self.config.blacklist)
            .size_mode(self.config.size_mode)
            .claim_directories(&directories);
        if self.config.dedupe_hardlinks {
            prober = prober.dedupe_hardlinks(&hardlinks);
        }

        let (results_tx, results_rx) = crossbeam_channel::unbounded();
        let mut report = ScanReport::new(&target.path);
        let mut received: usize = 0;
        let mut discovered: usize = 0;

        thread::scope(|threads| {
            let pool = &self.pool;
            threads.spawn(move || {
                // Returns only after every probe spawned into the scope has run.
                pool.in_place_scope(|scope| dispatch(scope, prober, target.clone(), results_tx));
            });

            // Disconnects once the pool scope has drained and dropped every sender.
            for result in results_rx {
                received += 1;
                discovered += result.sub_paths.len();
                report.record(result);
            }
        });

        debug_assert_eq!(received, discovered + 1);
        report.scan_duration = start.elapsed();

        info!(
            root = %target.path.display(),
            directories = report.len(),
            total_size = report.total_size(),
            warnings = report.warnings.len(),
            elapsed_ms = report.scan_duration.as_millis() as u64,
            "Scan complete"
        );

        report
    }
}

/// Spawn a probe for `target`; it dispatches its own subdirectories before reporting.
fn dispatch<'s>(
    scope: &Scope<'s>,
    prober: Prober<'s>,
    target: ScanTarget,
    results: Sender<ProbeResult>,
) {
    scope.spawn(move |scope| {
        let result = prober.probe(&target);

        for sub_path in &result.sub_paths {
            debug!(path = %sub_path.display(), "Dispatching probe");
            dispatch(scope, prober, target.descend(sub_path), results.clone());
        }

        // Receiver is only gone if the collecting thread panicked.
        let _ = results.send(result);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use sz_core::Blacklist;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();

        temp
    }

    fn config_for(temp: &TempDir) -> ScanConfig {
        ScanConfig::builder()
            .root(temp.path())
            .threads(2usize)
            .blacklist(Blacklist::empty())
            .build()
            .unwrap()
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let coordinator = Coordinator::new(config_for(&temp)).unwrap();
        let report = coordinator.run().unwrap();
        let root = &report.root;

        assert_eq!(report.len(), 4);
        assert_eq!(report.root_size(), 5);
        assert_eq!(report.direct_size(root.join("dir1")), Some(17));
        assert_eq!(report.direct_size(root.join("dir1/subdir")), Some(4));
        assert_eq!(report.direct_size(root.join("dir2")), Some(17));
        assert_eq!(report.total_size(), 43);
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_pool_size_from_config() {
        let temp = TempDir::new().unwrap();
        let coordinator = Coordinator::new(config_for(&temp)).unwrap();
        assert_eq!(coordinator.threads(), 2);
    }

    #[test]
    fn test_run_rejects_missing_root() {
        let temp = TempDir::new().unwrap();
        let config = ScanConfig::new(temp.path().join("missing"));
        let coordinator = Coordinator::new(config).unwrap();

        assert!(matches!(coordinator.run(), Err(ScanError::NotFound { .. })));
    }

    #[test]
    fn test_empty_root() {
        let temp = TempDir::new().unwrap();
        let coordinator = Coordinator::new(config_for(&temp)).unwrap();
        let report = coordinator.run().unwrap();

        assert_eq!(report.len(), 1);
        assert!(report.contains(&report.root));
        assert_eq!(report.total_size(), 0);
    }
}
