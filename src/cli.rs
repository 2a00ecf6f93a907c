//! Command-line interface definitions.
//!
//! # Examples
//!
//! ```bash
//! # List every PDF under ~/Documents, recursively
//! dupefind search -r -e pdf ~/Documents
//!
//! # Duplicate photos of at least 1 MB, as CSV
//! dupefind duplicates -r -e jpg,png --min-size 1 -o csv ~/Pictures
//!
//! # Files modified since the start of 2024
//! dupefind search -r --modified '>=2024-01-01' ~/Projects
//!
//! # Verbose logging
//! dupefind -v duplicates ~/Downloads
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::output::OutputFormat;
use crate::scanner::{DateFilter, FilterConfig, SizeUnit};

/// Find files by size, extension, name and date, and detect duplicates.
///
/// Duplicates are files with identical size and MD5 content digest.
#[derive(Debug, Parser)]
#[command(name = "dupefind")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Settings file (TOML); defaults to the platform config directory
    #[arg(long, value_name = "FILE", global = true, env = "DUPEFIND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List files matching the filter
    Search(SearchArgs),
    /// Report groups of identical files among those matching the filter
    Duplicates(DuplicateArgs),
}

/// Filter flags shared by both subcommands.
///
/// Flags left out fall back to the settings file.
#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Directories to scan
    #[arg(value_name = "ROOT", required = true)]
    pub roots: Vec<PathBuf>,

    /// Minimum file size in the size unit (0 = no bound)
    #[arg(long, value_name = "N", value_parser = parse_size_bound)]
    pub min_size: Option<f64>,

    /// Maximum file size in the size unit (0 = no bound)
    #[arg(long, value_name = "N", value_parser = parse_size_bound)]
    pub max_size: Option<f64>,

    /// Unit of --min-size and --max-size
    #[arg(long, value_enum, value_name = "UNIT")]
    pub size_unit: Option<SizeUnitArg>,

    /// Allowed extensions, comma-separated; repeatable (e.g. -e pdf,.TXT)
    #[arg(short, long = "ext", value_name = "LIST")]
    pub extensions: Vec<String>,

    /// Case-insensitive substring the file name must contain
    #[arg(short, long = "name", value_name = "TEXT")]
    pub name_contains: Option<String>,

    /// Creation date filter: operator then date (e.g. '>=2024-01-01')
    #[arg(long, value_name = "EXPR", value_parser = parse_date_filter)]
    pub created: Option<DateFilter>,

    /// Modification date filter: operator then date (e.g. '<2023-06-30')
    #[arg(long, value_name = "EXPR", value_parser = parse_date_filter)]
    pub modified: Option<DateFilter>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,
}

impl FilterArgs {
    /// Overlay the flags that were given onto `base`.
    #[must_use]
    pub fn apply(&self, mut base: FilterConfig) -> FilterConfig {
        if let Some(min) = self.min_size {
            base.min_size = min;
        }
        if let Some(max) = self.max_size {
            base.max_size = max;
        }
        if let Some(unit) = self.size_unit {
            base.size_unit = unit.into();
        }
        if !self.extensions.is_empty() {
            base.extensions = self
                .extensions
                .iter()
                .flat_map(|list| FilterConfig::parse_extensions(list))
                .collect();
        }
        if let Some(ref name) = self.name_contains {
            base.name_contains = name.clone();
        }
        if let Some(created) = self.created {
            base.created = created;
        }
        if let Some(modified) = self.modified {
            base.modified = modified;
        }
        if self.recursive {
            base.include_subfolders = true;
        }
        base
    }
}

/// Output flags shared by both subcommands.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Write results to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the search subcommand.
#[derive(Debug, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the duplicates subcommand.
#[derive(Debug, Args)]
pub struct DuplicateArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Threads used to hash files of the same size (default 1)
    #[arg(long, value_name = "N")]
    pub hash_threads: Option<usize>,

    /// Never group files that could not be read
    ///
    /// By default same-size unreadable files share an error hash and are
    /// reported as a group.
    #[arg(long)]
    pub exclude_unreadable: bool,
}

/// Size unit accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SizeUnitArg {
    /// Mebibytes (1,048,576 bytes)
    Mb,
    /// Bytes
    Bytes,
}

impl From<SizeUnitArg> for SizeUnit {
    fn from(arg: SizeUnitArg) -> Self {
        match arg {
            SizeUnitArg::Mb => SizeUnit::Megabytes,
            SizeUnitArg::Bytes => SizeUnit::Bytes,
        }
    }
}

/// Parse a non-negative size bound.
///
/// # Examples
///
/// ```
/// use dupefind::cli::parse_size_bound;
///
/// assert_eq!(parse_size_bound("1.5").unwrap(), 1.5);
/// assert!(parse_size_bound("-1").is_err());
/// ```
pub fn parse_size_bound(s: &str) -> Result<f64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let value: f64 = s.parse().map_err(|_| format!("Invalid number: '{s}'"))?;
    if !value.is_finite() {
        return Err(format!("Invalid number: '{s}'"));
    }
    if value < 0.0 {
        return Err("Size cannot be negative".to_string());
    }
    Ok(value)
}

/// Parse a date filter expression such as `>=2024-01-01`.
pub fn parse_date_filter(s: &str) -> Result<DateFilter, String> {
    s.parse::<DateFilter>().map_err(|e| e.to_string())
}
