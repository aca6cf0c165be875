//! Single-directory prober.

use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use tracing::{debug, info};

use sz_core::{
    Blacklist, InodeInfo, ProbeResult, ScanTarget, ScanWarning, SizeMode, device_id,
};

use crate::inode::InodeTracker;

/// Lists one directory and classifies its immediate children.
///
/// A probe only reads the filesystem. The inode trackers it may be given are
/// concurrent sets, so any number of probes can run at once.
#[derive(Debug, Clone, Copy)]
pub struct Prober<'a> {
    blacklist: &'a Blacklist,
    size_mode: SizeMode,
    directories: Option<&'a InodeTracker>,
    hardlinks: Option<&'a InodeTracker>,
}

impl<'a> Prober<'a> {
    /// Create a prober that skips everything in `blacklist`.
    pub fn new(blacklist: &'a Blacklist) -> Self {
        Self {
            blacklist,
            size_mode: SizeMode::Apparent,
            directories: None,
            hardlinks: None,
        }
    }

    /// Measure files by apparent or allocated size.
    pub fn size_mode(mut self, size_mode: SizeMode) -> Self {
        self.size_mode = size_mode;
        self
    }

    /// Only report a subdirectory if its inode has not been claimed yet.
    pub fn claim_directories(mut self, tracker: &'a InodeTracker) -> Self {
        self.directories = Some(tracker);
        self
    }

    /// Count a multiply-linked file only for the first probe that sees it.
    pub fn dedupe_hardlinks(mut self, tracker: &'a InodeTracker) -> Self {
        self.hardlinks = Some(tracker);
        self
    }

    /// Probe a directory.
    ///
    /// Never fails: a directory that cannot be listed yields a zero-size
    /// result marked [`Unreadable`](sz_core::ProbeStatus::Unreadable), and
    /// entries whose metadata cannot be read mark the result partial.
    pub fn probe(&self, target: &ScanTarget) -> ProbeResult {
        let entries = match fs::read_dir(&target.path) {
            Ok(entries) => entries,
            Err(err) => {
                return ProbeResult::unreadable(
                    &target.path,
                    ScanWarning::read_error(&target.path, &err),
                );
            }
        };

        self.probe_entries(target, entries.map(|entry| entry.map(|e| e.path())))
    }

    /// Classify already-listed entries of `target`.
    ///
    /// Entries are inspected one at a time, so one that vanished after the
    /// listing, or a listing error partway through, only makes the result
    /// partial.
    pub(crate) fn probe_entries<I>(&self, target: &ScanTarget, entries: I) -> ProbeResult
    where
        I: IntoIterator<Item = io::Result<PathBuf>>,
    {
        let mut result = ProbeResult::new(&target.path);

        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    result.mark_partial(ScanWarning::read_error(&target.path, &err));
                    continue;
                }
            };

            // lstat: a symlink must be seen as a symlink, not as its target
            let metadata = match fs::symlink_metadata(&path) {
                Ok(m) => m,
                Err(err) => {
                    result.mark_partial(ScanWarning::metadata_error(&path, &err));
                    continue;
                }
            };

            let facts = EntryFacts::from_metadata(&metadata);
            match classify(&path, facts, target.root_device, self.blacklist) {
                EntryClass::Symlink => {}
                EntryClass::Blacklisted => {
                    info!(path = %path.display(), "Skipping blacklisted path");
                    result.skipped.push(path);
                }
                EntryClass::Directory => {
                    if self.claim_directory(&metadata) {
                        result.sub_paths.push(path);
                    } else {
                        debug!(path = %path.display(), "Directory already claimed");
                        result.warnings.push(ScanWarning::already_visited(path));
                    }
                }
                EntryClass::ForeignDirectory => {
                    debug!(path = %path.display(), "Not crossing filesystem boundary");
                }
                EntryClass::Sized => {
                    result.direct_size += self.entry_size(&metadata);
                }
            }
        }

        result
    }

    fn claim_directory(&self, metadata: &Metadata) -> bool {
        self.directories
            .is_none_or(|tracker| tracker.track(InodeInfo::from_metadata(metadata)))
    }

    fn entry_size(&self, metadata: &Metadata) -> u64 {
        if let Some(tracker) = self.hardlinks {
            if get_nlink(metadata) > 1 && !tracker.track(InodeInfo::from_metadata(metadata)) {
                return 0; // already counted through another link
            }
        }

        match self.size_mode {
            SizeMode::Apparent => metadata.len(),
            SizeMode::Allocated => get_allocated(metadata),
        }
    }
}

/// Probe `target` with default settings: apparent sizes, no inode tracking.
pub fn probe(target: &ScanTarget, blacklist: &Blacklist) -> ProbeResult {
    Prober::new(blacklist).probe(target)
}

/// What a directory entry contributes to its parent's probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryClass {
    /// Ignored entirely, whatever it points to.
    Symlink,
    /// Ignored entirely and reported as skipped.
    Blacklisted,
    /// Same-device directory to probe next.
    Directory,
    /// Directory on another filesystem; neither counted nor traversed.
    ForeignDirectory,
    /// Regular file or other non-directory; its size counts.
    Sized,
}

/// The parts of an entry's (non-following) metadata that classification needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EntryFacts {
    pub is_symlink: bool,
    pub is_dir: bool,
    pub device: u64,
}

impl EntryFacts {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        Self {
            is_symlink: file_type.is_symlink(),
            is_dir: file_type.is_dir(),
            device: device_id(metadata),
        }
    }
}

/// Classify an entry. Rules apply in order: symlink, blacklist, directory.
pub(crate) fn classify(
    path: &Path,
    facts: EntryFacts,
    root_device: u64,
    blacklist: &Blacklist,
) -> EntryClass {
    if facts.is_symlink {
        EntryClass::Symlink
    } else if blacklist.contains(path) {
        EntryClass::Blacklisted
    } else if facts.is_dir && facts.device == root_device {
        EntryClass::Directory
    } else if facts.is_dir {
        EntryClass::ForeignDirectory
    } else {
        EntryClass::Sized
    }
}

/// Get the number of hard links from metadata.
#[cfg(unix)]
fn get_nlink(metadata: &Metadata) -> u64 {
    metadata.nlink()
}

#[cfg(not(unix))]
fn get_nlink(_metadata: &Metadata) -> u64 {
    1 // Assume single link
}

/// Get the bytes allocated on disk from metadata.
#[cfg(unix)]
fn get_allocated(metadata: &Metadata) -> u64 {
    metadata.blocks() * 512
}

#[cfg(not(unix))]
fn get_allocated(metadata: &Metadata) -> u64 {
    // Estimate from file size (512-byte blocks, rounded up)
    metadata.len().div_ceil(512) * 512
}
