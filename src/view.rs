//! Text rendering of a scan report.

use std::io::{self, Write};
use std::path::Path;

use crossterm::style::Stylize;

use sz_core::ScanReport;

const SEPARATOR: &str = "---------------------------------------------------------";

const GIGA: u64 = 1_000_000_000;
const MEGA: u64 = 1_000_000;
const KILO: u64 = 1_000;

/// Presentation switches. None of these affect the scan itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Human-readable sizes instead of raw byte counts.
    pub human: bool,
    /// List every entry rather than only those above 1% of the total.
    pub nosummary: bool,
    /// Include directories whose direct size is zero.
    pub zeroes: bool,
    /// ANSI colours.
    pub colors: bool,
    /// List directories that could not be fully read.
    pub errors: bool,
}

impl FormatOptions {
    /// Summary mode shows only entries above 1% of the total.
    pub fn summary(&self) -> bool {
        !self.nosummary && !self.zeroes
    }
}

/// Write the report table.
pub fn render(report: &ScanReport, options: &FormatOptions, out: &mut impl Write) -> io::Result<()> {
    let root = report.root.display();
    let total = report.total_size();

    writeln!(out, "{root} files size: {}", format_size(report.root_size(), options))?;
    writeln!(out, "{root} total size: {}", format_size(total, options))?;

    let summary = options.summary();
    let one_percent = total / 100;

    if summary {
        writeln!(out, "Entries that consume at least 1% of space in this path")?;
    }
    writeln!(out, "{SEPARATOR}")?;

    for (path, size) in report.sorted_by_size() {
        if summary && size <= one_percent {
            continue;
        }
        if !options.zeroes && size == 0 {
            continue;
        }
        writeln!(out, "{}\t\t{}", format_size(size, options), path.display())?;
    }

    if options.errors {
        render_degraded(report, out)?;
    }

    Ok(())
}

/// List directories whose sizes may be undercounts.
fn render_degraded(report: &ScanReport, out: &mut impl Write) -> io::Result<()> {
    if report.degraded.is_empty() {
        return Ok(());
    }

    let mut degraded: Vec<(&Path, _)> = report
        .degraded
        .iter()
        .map(|(path, status)| (path.as_path(), status))
        .collect();
    degraded.sort_by(|a, b| a.0.cmp(b.0));

    writeln!(out)?;
    writeln!(out, "{} directories could not be fully read:", degraded.len())?;
    for (path, status) in degraded {
        writeln!(out, "  {:?}\t{}", status, path.display())?;
    }
    Ok(())
}

/// Format a byte count per the display options.
///
/// Raw mode prints the integer. Human mode scales sizes above a thousand to
/// `K`, `M` or `G` (decimal units, rounded to two places) and colours them
/// by magnitude when colours are on.
pub fn format_size(size: u64, options: &FormatOptions) -> String {
    if !options.human {
        return size.to_string();
    }

    let (text, magnitude) = match size {
        s if s > GIGA => (format!("{}G", round2(s, GIGA)), Magnitude::Giga),
        s if s > MEGA => (format!("{}M", round2(s, MEGA)), Magnitude::Mega),
        s if s > KILO => (format!("{}K", round2(s, KILO)), Magnitude::Kilo),
        s => (s.to_string(), Magnitude::Bytes),
    };

    if !options.colors {
        return text;
    }

    match magnitude {
        Magnitude::Giga => text.red().bold().to_string(),
        Magnitude::Mega => text.red().to_string(),
        Magnitude::Kilo => text.magenta().to_string(),
        Magnitude::Bytes => text.green().to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Magnitude {
    Giga,
    Mega,
    Kilo,
    Bytes,
}

/// `size / unit`, rounded to two decimal places.
fn round2(size: u64, unit: u64) -> f64 {
    (size as f64 / unit as f64 * 100.0).round() / 100.0
}
