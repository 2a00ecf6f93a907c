//! File filter predicate.
//!
//! [`FilterConfig`] holds every criterion a scan can apply, and
//! [`FilterConfig::matches`] evaluates one [`FileRecord`] against it. The
//! predicate is pure: the same record and configuration always give the
//! same answer.
//!
//! Checks run cheapest first:
//! 1. size bounds
//! 2. extension allow-list
//! 3. case-insensitive name substring
//! 4. creation and modification dates, only when configured
//!
//! A criterion left at its default value imposes no constraint.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{FileRecord, BYTES_PER_MB};

/// Unit in which `min_size` and `max_size` are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    /// Mebibytes (bytes / 1,048,576).
    #[default]
    Megabytes,
    /// Raw bytes.
    Bytes,
}

impl SizeUnit {
    /// Express `bytes` in this unit.
    #[must_use]
    pub fn measure(self, bytes: u64) -> f64 {
        match self {
            Self::Megabytes => bytes as f64 / BYTES_PER_MB,
            Self::Bytes => bytes as f64,
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Megabytes => write!(f, "MB"),
            Self::Bytes => write!(f, "bytes"),
        }
    }
}

/// Comparison applied between a file's date and the filter date.
///
/// Parsed from `<`, `<=`, `=`, `>=` and `>`. Any other text, including the
/// empty string, becomes [`DateOperator::Any`], which never rejects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DateOperator {
    /// Strictly before.
    Before,
    /// Before or on the same day.
    BeforeOrEqual,
    /// Same day.
    Equal,
    /// On or after.
    #[default]
    AfterOrEqual,
    /// Strictly after.
    After,
    /// No constraint.
    Any,
}

impl DateOperator {
    /// Parse an operator symbol, falling back to [`DateOperator::Any`].
    #[must_use]
    pub fn parse(symbol: &str) -> Self {
        match symbol.trim() {
            "<" => Self::Before,
            "<=" => Self::BeforeOrEqual,
            "=" => Self::Equal,
            ">=" => Self::AfterOrEqual,
            ">" => Self::After,
            _ => Self::Any,
        }
    }

    /// The symbol this operator parses from. Empty for [`DateOperator::Any`].
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Before => "<",
            Self::BeforeOrEqual => "<=",
            Self::Equal => "=",
            Self::AfterOrEqual => ">=",
            Self::After => ">",
            Self::Any => "",
        }
    }

    /// Compare `file_date` against `filter_date`.
    #[must_use]
    pub fn compare(self, file_date: NaiveDate, filter_date: NaiveDate) -> bool {
        match self {
            Self::Before => file_date < filter_date,
            Self::BeforeOrEqual => file_date <= filter_date,
            Self::Equal => file_date == filter_date,
            Self::AfterOrEqual => file_date >= filter_date,
            Self::After => file_date > filter_date,
            Self::Any => true,
        }
    }
}

impl From<&str> for DateOperator {
    fn from(symbol: &str) -> Self {
        Self::parse(symbol)
    }
}

impl From<String> for DateOperator {
    fn from(symbol: String) -> Self {
        Self::parse(&symbol)
    }
}

impl From<DateOperator> for String {
    fn from(op: DateOperator) -> Self {
        op.symbol().to_string()
    }
}

impl fmt::Display for DateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One date criterion. Without a date it is disabled whatever the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFilter {
    /// Comparison to apply.
    pub operator: DateOperator,
    /// Date to compare against; `None` disables the filter.
    pub date: Option<NaiveDate>,
}

impl DateFilter {
    /// Create an enabled date filter.
    #[must_use]
    pub fn new(operator: DateOperator, date: NaiveDate) -> Self {
        Self {
            operator,
            date: Some(date),
        }
    }

    /// Whether a date is set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.date.is_some()
    }

    /// Whether a file with `file_date` satisfies this filter.
    ///
    /// An unconfigured filter always passes. A configured filter rejects a
    /// file whose date could not be read.
    #[must_use]
    pub fn allows(&self, file_date: Option<NaiveDate>) -> bool {
        let Some(filter_date) = self.date else {
            return true;
        };
        match file_date {
            Some(date) => self.operator.compare(date, filter_date),
            None => false,
        }
    }
}

/// Error produced when a textual date filter cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterParseError {
    /// Nothing after the operator.
    #[error("Missing date in '{0}'")]
    MissingDate(String),
    /// The date part is not `YYYY-MM-DD`.
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl FromStr for DateFilter {
    type Err = FilterParseError;

    /// Parse an expression such as `>=2024-01-01`.
    ///
    /// A bare date means `=`. An unrecognised operator is kept as
    /// [`DateOperator::Any`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| FilterParseError::MissingDate(s.to_string()))?;
        let (symbol, date_str) = s.split_at(split);

        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
            .map_err(|_| FilterParseError::InvalidDate(date_str.to_string()))?;

        let operator = if symbol.trim().is_empty() {
            DateOperator::Equal
        } else {
            DateOperator::parse(symbol)
        };

        Ok(Self::new(operator, date))
    }
}

/// Complete filter configuration for one scan.
///
/// # Example
///
/// ```
/// use dupefind::scanner::FilterConfig;
///
/// let config = FilterConfig::default()
///     .with_min_size(1.0)
///     .with_extensions(["PDF", ".docx"])
///     .with_name_contains("report");
///
/// assert!(config.extensions.contains("pdf"));
/// assert!(config.extensions.contains("docx"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Lower size bound in `size_unit`; 0 means unbounded.
    pub min_size: f64,
    /// Upper size bound in `size_unit`; 0 means unbounded.
    pub max_size: f64,
    /// Unit of the size bounds.
    pub size_unit: SizeUnit,
    /// Allowed extensions, lower-cased without a leading dot. Empty allows all.
    pub extensions: BTreeSet<String>,
    /// Case-insensitive substring required in the file name. Empty allows all.
    pub name_contains: String,
    /// Creation date criterion.
    pub created: DateFilter,
    /// Modification date criterion.
    pub modified: DateFilter,
    /// Descend into subdirectories of each root.
    pub include_subfolders: bool,
}

impl FilterConfig {
    /// Set the minimum size.
    #[must_use]
    pub fn with_min_size(mut self, size: f64) -> Self {
        self.min_size = size;
        self
    }

    /// Set the maximum size.
    #[must_use]
    pub fn with_max_size(mut self, size: f64) -> Self {
        self.max_size = size;
        self
    }

    /// Set the unit of the size bounds.
    #[must_use]
    pub fn with_size_unit(mut self, unit: SizeUnit) -> Self {
        self.size_unit = unit;
        self
    }

    /// Replace the extension allow-list. Entries are normalized.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .filter_map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    /// Set the name substring.
    #[must_use]
    pub fn with_name_contains(mut self, pattern: impl Into<String>) -> Self {
        self.name_contains = pattern.into();
        self
    }

    /// Set the creation date criterion.
    #[must_use]
    pub fn with_created(mut self, filter: DateFilter) -> Self {
        self.created = filter;
        self
    }

    /// Set the modification date criterion.
    #[must_use]
    pub fn with_modified(mut self, filter: DateFilter) -> Self {
        self.modified = filter;
        self
    }

    /// Enable or disable descending into subdirectories.
    #[must_use]
    pub fn with_include_subfolders(mut self, include: bool) -> Self {
        self.include_subfolders = include;
        self
    }

    /// Split a comma-separated extension list such as `"pdf, .TXT"`.
    ///
    /// Entries are trimmed, leading dots stripped and case folded; empty
    /// entries are dropped.
    #[must_use]
    pub fn parse_extensions(list: &str) -> BTreeSet<String> {
        list.split(',').filter_map(normalize_extension).collect()
    }

    /// Re-normalize the extension list, e.g. after loading from a file.
    #[must_use]
    pub fn normalized(self) -> Self {
        let extensions = self.extensions.clone();
        self.with_extensions(extensions)
    }

    /// Whether any date criterion is configured.
    #[must_use]
    pub fn has_date_filters(&self) -> bool {
        self.created.is_configured() || self.modified.is_configured()
    }

    /// Evaluate `record` against every criterion.
    #[must_use]
    pub fn matches(&self, record: &FileRecord) -> bool {
        let size = self.size_unit.measure(record.size());
        if self.min_size > 0.0 && size < self.min_size {
            return false;
        }
        if self.max_size > 0.0 && size > self.max_size {
            return false;
        }

        if !self.extensions.is_empty() && !self.extensions.contains(record.extension()) {
            return false;
        }

        if !self.name_contains.is_empty()
            && !record
                .name()
                .to_lowercase()
                .contains(&self.name_contains.to_lowercase())
        {
            return false;
        }

        if self.has_date_filters() {
            if self.created.is_configured() && !self.created.allows(record.creation_date()) {
                return false;
            }
            if self.modified.is_configured()
                && !self.modified.allows(record.modification_date())
            {
                return false;
            }
        }

        true
    }
}

/// Evaluate `record` against `config`. Same as [`FilterConfig::matches`].
#[must_use]
pub fn matches(record: &FileRecord, config: &FilterConfig) -> bool {
    config.matches(record)
}

fn normalize_extension(raw: &str) -> Option<String> {
    let ext = raw.trim().trim_start_matches('.').to_lowercase();
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}
