//! Directory scanning engine for sz.
//!
//! Computes the direct size of every directory below a root without leaving
//! the root's filesystem, in the spirit of `du -x`.
//!
//! # Overview
//!
//! - [`Prober`] lists a single directory. It sums the sizes of regular files
//!   and other non-directories, and returns the same-device subdirectories
//!   still to visit. Symlinks and blacklisted paths are skipped.
//! - [`Coordinator`] seeds the scan with the root, runs one probe per
//!   discovered directory on a bounded rayon pool, and folds every
//!   [`ProbeResult`] into a [`ScanReport`].
//!
//! Unreadable directories never abort a scan; they appear in the report with
//! size zero and are flagged as degraded.
//!
//! # Example
//!
//! ```rust,no_run
//! use sz_scan::{Coordinator, ScanConfig, ScanTarget};
//!
//! let target = ScanTarget::resolve("/var").unwrap();
//! let coordinator = Coordinator::new(ScanConfig::new(&target.path)).unwrap();
//! let report = coordinator.scan(&target);
//!
//! println!("Total size: {} bytes", report.total_size());
//! for (path, size) in report.sorted_by_size().into_iter().take(10) {
//!     println!("{size}\t{}", path.display());
//! }
//! ```

mod coordinator;
mod inode;
mod prober;

pub use coordinator::Coordinator;
pub use inode::InodeTracker;
pub use prober::{Prober, probe};

// Re-export core types for convenience
pub use sz_core::{
    Blacklist, InodeInfo, ProbeResult, ProbeStatus, ScanConfig, ScanError, ScanReport, ScanTarget,
    ScanWarning, SizeMode, WarningKind,
};
