//! sz - per-directory disk usage that stays on one filesystem.
//!
//! Usage:
//!   sz [DIR]            Directories using at least 1% of the total
//!   sz -h [DIR]         Same, with human-readable sizes
//!   sz -v [DIR]         Every non-empty directory
//!   sz -j [DIR]         Full report as JSON
//!   sz --help           Show help

mod view;

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use sz_scan::{Blacklist, Coordinator, ScanConfig, ScanTarget, SizeMode};

use crate::view::FormatOptions;

#[derive(Parser, Debug)]
#[command(
    name = "sz",
    version,
    about = "Per-directory disk usage, confined to one filesystem",
    long_about = "sz reports the size of the files directly inside every directory \
                  below DIR, without crossing into other mounted filesystems.\n\n\
                  Like du, -h selects human-readable sizes; use --help for help.",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Directory to scan
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Human-readable sizes (K/M/G)
    #[arg(short = 'h', long)]
    human: bool,

    /// Size of the probe worker pool (0 = one per CPU)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// List every non-empty directory, not only those above 1% of the total
    #[arg(short = 'v', long)]
    nosummary: bool,

    /// Include directories with no files of their own
    #[arg(short = 'V', long)]
    zeroes: bool,

    /// Disable coloured output
    #[arg(short = 'c', long)]
    nocolors: bool,

    /// Skip this path entirely (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATH")]
    exclude: Vec<PathBuf>,

    /// Do not skip /proc and /sys by default
    #[arg(long)]
    no_default_excludes: bool,

    /// Report allocated disk space instead of apparent size
    #[arg(short = 'a', long)]
    allocated: bool,

    /// Count hard-linked files only once
    #[arg(short = 'l', long)]
    count_links_once: bool,

    /// List directories that could not be fully read
    #[arg(short = 'e', long)]
    errors: bool,

    /// Print the full report as JSON
    #[arg(short = 'j', long)]
    json: bool,

    /// Verbose logging to stderr
    #[arg(long)]
    debug: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,

    /// Print version
    #[arg(long, action = ArgAction::Version)]
    version: Option<bool>,
}

impl Cli {
    fn scan_config(&self, root: PathBuf) -> Result<ScanConfig> {
        let mut blacklist = if self.no_default_excludes {
            Blacklist::empty()
        } else {
            Blacklist::default()
        };
        // Entries are matched against canonical paths below the root
        blacklist.extend(
            self.exclude
                .iter()
                .map(|path| path.canonicalize().unwrap_or_else(|_| path.clone())),
        );

        let size_mode = if self.allocated {
            SizeMode::Allocated
        } else {
            SizeMode::Apparent
        };

        ScanConfig::builder()
            .root(root)
            .threads(self.threads)
            .blacklist(blacklist)
            .size_mode(size_mode)
            .dedupe_hardlinks(self.count_links_once)
            .build()
            .context("Invalid scan configuration")
    }

    fn format_options(&self) -> FormatOptions {
        FormatOptions {
            human: self.human,
            nosummary: self.nosummary,
            zeroes: self.zeroes,
            colors: !self.nocolors && io::stdout().is_terminal(),
            errors: self.errors,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.debug);

    let target = ScanTarget::resolve(&cli.dir)
        .with_context(|| format!("Cannot scan {}", cli.dir.display()))?;
    let config = cli.scan_config(target.path.clone())?;
    let coordinator = Coordinator::new(config).context("Failed to start scanner")?;

    let report = coordinator.scan(&target);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    view::render(&report, &cli.format_options(), &mut out)?;

    if report.has_warnings() && !cli.errors {
        eprintln!();
        eprintln!("{} warning(s) during scan (use -e to list)", report.warnings.len());
    }

    Ok(())
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the default level.
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("sz=debug,sz_scan=debug,sz_core=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_du_style_flags() {
        let cli = Cli::try_parse_from(["sz", "-h", "-v", "-c", "-t", "8", "/srv"]).unwrap();
        assert!(cli.human);
        assert!(cli.nosummary);
        assert!(cli.nocolors);
        assert_eq!(cli.threads, 8);
        assert_eq!(cli.dir, PathBuf::from("/srv"));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["sz"]).unwrap();
        assert_eq!(cli.dir, PathBuf::from("."));
        assert_eq!(cli.threads, 0);
        assert!(!cli.zeroes && !cli.json && !cli.errors);
    }

    #[test]
    fn test_capital_v_is_zeroes() {
        let cli = Cli::try_parse_from(["sz", "-V"]).unwrap();
        assert!(cli.zeroes);
        assert!(!cli.format_options().summary());
    }

    #[test]
    fn test_scan_config_blacklist() {
        let cli = Cli::try_parse_from(["sz", "-x", "/nonexistent/skip", "-x", "/nonexistent/other"])
            .unwrap();
        let config = cli.scan_config(PathBuf::from("/")).unwrap();

        assert!(config.blacklist.contains(Path::new("/proc")));
        assert!(config.blacklist.contains(Path::new("/nonexistent/skip")));
        assert!(config.blacklist.contains(Path::new("/nonexistent/other")));
        assert_eq!(config.size_mode, SizeMode::Apparent);
    }

    #[test]
    fn test_scan_config_without_default_excludes() {
        let cli =
            Cli::try_parse_from(["sz", "--no-default-excludes", "-a", "-l"]).unwrap();
        let config = cli.scan_config(PathBuf::from("/")).unwrap();

        assert!(config.blacklist.is_empty());
        assert_eq!(config.size_mode, SizeMode::Allocated);
        assert!(config.dedupe_hardlinks);
    }
}
