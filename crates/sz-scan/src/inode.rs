//! Concurrent inode bookkeeping.

use dashmap::DashSet;
use sz_core::InodeInfo;

/// Records (inode, device) pairs seen during a scan.
///
/// Shared by every probe running on the pool. Used to claim directories so
/// that one reachable twice through a bind mount is only probed once, and
/// optionally to count multiply-linked files once.
#[derive(Debug, Default)]
pub struct InodeTracker {
    seen: DashSet<InodeInfo>,
}

impl InodeTracker {
    /// Create a new inode tracker.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Claim an inode. Returns `true` if this is the first claim.
    pub fn track(&self, info: InodeInfo) -> bool {
        self.seen.insert(info)
    }

    /// Check if an inode has been claimed.
    pub fn has_seen(&self, info: &InodeInfo) -> bool {
        self.seen.contains(info)
    }

    /// Get the number of unique inodes tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if no inodes have been tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_claim_wins() {
        let tracker = InodeTracker::new();
        let info = InodeInfo::new(12345, 1);

        assert!(tracker.track(info));
        assert!(!tracker.track(info));
        assert!(tracker.has_seen(&info));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_different_devices() {
        let tracker = InodeTracker::new();

        assert!(tracker.track(InodeInfo::new(12345, 1)));
        assert!(tracker.track(InodeInfo::new(12345, 2)));
    }

    #[test]
    fn test_concurrent_claims() {
        let tracker = InodeTracker::new();
        let info = InodeInfo::new(7, 7);

        let wins: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| tracker.track(info))).collect();
            handles.into_iter().map(|h| h.join().unwrap() as usize).sum()
        });

        assert_eq!(wins, 1);
    }
}
