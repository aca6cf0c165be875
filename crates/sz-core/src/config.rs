//! Scan configuration types.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use derive_builder::{Builder, UninitializedFieldError};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Pseudo-filesystems whose reported sizes are meaningless.
pub const DEFAULT_BLACKLIST: &[&str] = &["/proc", "/sys"];

/// Absolute paths excluded from traversal entirely.
///
/// A blacklisted entry contributes nothing to its parent's size and is never
/// probed itself. Matching is exact on the full path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blacklist {
    paths: BTreeSet<PathBuf>,
}

impl Blacklist {
    /// A blacklist that excludes nothing.
    pub fn empty() -> Self {
        Self {
            paths: BTreeSet::new(),
        }
    }

    /// Add a path to the blacklist.
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.insert(path.into())
    }

    /// Builder-style variant of [`Blacklist::insert`].
    pub fn with(mut self, path: impl Into<PathBuf>) -> Self {
        self.insert(path);
        self
    }

    /// Check whether a path is excluded.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Number of excluded paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate over the excluded paths in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}

impl Default for Blacklist {
    fn default() -> Self {
        DEFAULT_BLACKLIST.iter().copied().collect()
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for Blacklist {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<P: Into<PathBuf>> Extend<P> for Blacklist {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        self.paths.extend(iter.into_iter().map(Into::into));
    }
}

/// How a file's size is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeMode {
    /// Byte length as reported by metadata.
    #[default]
    Apparent,
    /// Space actually allocated on disk (512-byte blocks).
    Allocated,
}

/// Configuration for scanning operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate", error = "ScanError"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Size of the probe worker pool (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Paths never counted or traversed.
    #[builder(default)]
    #[serde(default)]
    pub blacklist: Blacklist,

    /// Apparent size vs allocated size.
    #[builder(default)]
    #[serde(default)]
    pub size_mode: SizeMode,

    /// Count a multiply-linked file only once per scan.
    #[builder(default = "false")]
    #[serde(default)]
    pub dedupe_hardlinks: bool,
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), ScanError> {
        match &self.root {
            Some(root) if root.as_os_str().is_empty() => Err(ScanError::InvalidConfig {
                message: "Root path cannot be empty".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl From<UninitializedFieldError> for ScanError {
    fn from(err: UninitializedFieldError) -> Self {
        Self::InvalidConfig {
            message: err.to_string(),
        }
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            threads: 0,
            blacklist: Blacklist::default(),
            size_mode: SizeMode::default(),
            dedupe_hardlinks: false,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
