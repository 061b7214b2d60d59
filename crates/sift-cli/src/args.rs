//! Command-line arguments.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use sift_engine::{Bound, FilterCriteria, SiftConfig, parse_bound};

use crate::export::ExportFormat;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "logsift",
    version,
    about = "Parse, filter and summarize log files"
)]
pub struct Args {
    /// Log files to analyze
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Path to a TOML config file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Keep records at or after this instant (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<String>,

    /// Keep records at or before this instant; a bare date covers the whole day
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<String>,

    /// Levels to include (e.g. `error,warn`)
    #[arg(long, short = 'l', value_delimiter = ',')]
    pub level: Vec<String>,

    /// Comma-separated keywords; a message matching any of them is kept
    #[arg(long, short = 'k', value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// Regex matched against messages
    #[arg(long, conflicts_with = "keywords")]
    pub pattern: Option<String>,

    /// Substring of the source component (case-insensitive)
    #[arg(long, short = 's')]
    pub source: Option<String>,

    /// Named filter preset from the config file
    #[arg(long)]
    pub preset: Option<String>,

    /// Write the selected records to this file
    #[arg(long, short = 'e', value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Export format; inferred from the export extension when omitted
    #[arg(long, value_enum)]
    pub format: Option<ExportFormat>,

    /// Print statistics only, not individual records
    #[arg(long)]
    pub stats_only: bool,

    /// Maximum number of records to print
    #[arg(long, default_value_t = 100)]
    pub limit: usize,

    /// Emit diagnostics as JSON lines on stderr
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    pub fn load_config(&self) -> anyhow::Result<SiftConfig> {
        match &self.config {
            Some(path) => SiftConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display())),
            None => Ok(SiftConfig::default()),
        }
    }

    /// Filter criteria from the flags, intersected with `--preset` if given.
    pub fn criteria(&self, config: &SiftConfig) -> anyhow::Result<FilterCriteria> {
        let offset = config.default_offset()?;
        let mut builder = FilterCriteria::builder().levels(&self.level);

        if let Some(pattern) = &self.pattern {
            builder = builder.keyword_pattern(pattern);
        } else if !self.keywords.is_empty() {
            builder = builder.keywords(&self.keywords);
        }
        if let Some(source) = &self.source {
            builder = builder.source(source);
        }
        if let Some(start) = &self.start_date {
            let start = parse_bound(start, Bound::Start, offset).context("invalid --start-date")?;
            builder = builder.start(start);
        }
        if let Some(end) = &self.end_date {
            let end = parse_bound(end, Bound::End, offset).context("invalid --end-date")?;
            builder = builder.end(end);
        }
        let criteria = builder.build()?;

        match &self.preset {
            Some(name) => {
                let preset = config.preset(name)?.build()?;
                preset
                    .and(&criteria)
                    .with_context(|| format!("flags conflict with preset '{name}'"))
            }
            None => Ok(criteria),
        }
    }

    pub fn export_format(&self) -> Option<ExportFormat> {
        self.export
            .as_deref()
            .map(|path| ExportFormat::resolve(self.format, path))
    }
}
