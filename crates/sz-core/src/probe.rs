//! Scan targets and per-directory probe results.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanWarning};

/// A directory to probe, paired with the device of the scan root.
///
/// The device is captured once from the root and never changes during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    /// Directory to list.
    pub path: PathBuf,
    /// Device identifier of the scan root.
    pub root_device: u64,
}

impl ScanTarget {
    /// Create a target from a path and a known root device.
    pub fn new(path: impl Into<PathBuf>, root_device: u64) -> Self {
        Self {
            path: path.into(),
            root_device,
        }
    }

    /// Resolve the root of a scan.
    ///
    /// Canonicalizes `root`, checks that it is a directory and captures its
    /// device identifier. Fails when the root cannot be used so that no scan
    /// is ever started on it.
    pub fn resolve(root: impl AsRef<Path>) -> Result<Self, ScanError> {
        let root = root.as_ref();
        let path = root.canonicalize().map_err(|e| ScanError::io(root, e))?;
        let metadata = std::fs::metadata(&path).map_err(|e| ScanError::io(&path, e))?;

        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory { path });
        }

        Ok(Self {
            root_device: device_id(&metadata),
            path,
        })
    }

    /// Target for a subdirectory on the same scan.
    pub fn descend(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root_device: self.root_device,
        }
    }
}

/// Inode information used to detect entries reached twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InodeInfo {
    /// Inode number.
    pub inode: u64,
    /// Device ID.
    pub device: u64,
}

impl InodeInfo {
    /// Create new inode info.
    pub fn new(inode: u64, device: u64) -> Self {
        Self { inode, device }
    }

    /// Extract inode info from metadata.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self::new(metadata.ino(), metadata.dev())
    }

    /// Extract inode info from metadata.
    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Self {
        Self::new(0, 0)
    }
}

/// Get the device ID from metadata.
#[cfg(unix)]
pub fn device_id(metadata: &Metadata) -> u64 {
    metadata.dev()
}

#[cfg(not(unix))]
pub fn device_id(_metadata: &Metadata) -> u64 {
    0 // no device IDs; everything is treated as one filesystem
}

/// How completely a directory could be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeStatus {
    /// Every entry was listed and classified.
    #[default]
    Complete,
    /// The listing succeeded but some entries could not be inspected.
    Partial,
    /// The directory could not be listed at all; its size reads as zero.
    Unreadable,
}

impl ProbeStatus {
    /// Whether the reported size may be an undercount.
    pub fn is_degraded(self) -> bool {
        !matches!(self, ProbeStatus::Complete)
    }
}

/// Outcome of probing a single directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResult {
    /// Directory that was probed.
    pub path: PathBuf,
    /// Bytes held by non-directory, non-symlink entries directly inside `path`.
    pub direct_size: u64,
    /// Same-device, non-blacklisted child directories still to probe.
    pub sub_paths: Vec<PathBuf>,
    /// Blacklisted children that were skipped.
    pub skipped: Vec<PathBuf>,
    /// How completely the directory was read.
    pub status: ProbeStatus,
    /// Problems met while reading the directory.
    pub warnings: Vec<ScanWarning>,
}

impl ProbeResult {
    /// Empty result for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Result for a directory that could not be listed.
    pub fn unreadable(path: impl Into<PathBuf>, warning: ScanWarning) -> Self {
        Self {
            path: path.into(),
            status: ProbeStatus::Unreadable,
            warnings: vec![warning],
            ..Self::default()
        }
    }

    /// Record a problem with one entry, downgrading the result to partial.
    pub fn mark_partial(&mut self, warning: ScanWarning) {
        if self.status == ProbeStatus::Complete {
            self.status = ProbeStatus::Partial;
        }
        self.warnings.push(warning);
    }
}
