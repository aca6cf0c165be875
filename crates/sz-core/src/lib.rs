//! Core types for sz.
//!
//! This crate provides the data model shared by the scan engine and the
//! command-line front end: scan targets, per-directory probe results, the
//! aggregated report, and configuration.

mod config;
mod error;
mod lossy;
mod probe;
mod report;

pub use config::{Blacklist, DEFAULT_BLACKLIST, ScanConfig, ScanConfigBuilder, SizeMode};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use probe::{InodeInfo, ProbeResult, ProbeStatus, ScanTarget, device_id};
pub use report::ScanReport;
