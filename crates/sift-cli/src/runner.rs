//! Drives one CLI invocation: parse files in parallel, filter, summarize,
//! report and export.

use anyhow::Context;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use sift_engine::{
    Decoding, FilterCriteria, LogParser, LogRecord, ParseOutput, Statistics, StatsAggregator,
    filter,
};

use crate::args::Args;
use crate::{export, report};

/// Per-file parse counts.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSummary {
    pub path: PathBuf,
    pub total_lines: usize,
    pub records: usize,
    pub fallback: usize,
    pub skipped: usize,
    pub lossy: bool,
}

impl FileSummary {
    fn new(path: PathBuf, output: &ParseOutput) -> Self {
        Self {
            path,
            total_lines: output.total_lines,
            records: output.records.len(),
            fallback: output.fallback_count,
            skipped: output.skipped_lines,
            lossy: output.decoding == Decoding::Lossy,
        }
    }
}

/// Result of parsing, filtering and summarizing a set of files.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub files: Vec<FileSummary>,
    /// Every parsed record, files concatenated in argument order.
    pub parsed: Vec<LogRecord>,
    /// Records passing the filter criteria.
    pub selected: Vec<LogRecord>,
    /// Computed over `parsed`.
    pub statistics: Statistics,
}

/// Parse each file on the blocking pool; results come back in argument order.
pub async fn parse_files(
    parser: Arc<LogParser>,
    paths: &[PathBuf],
) -> anyhow::Result<Vec<(PathBuf, ParseOutput)>> {
    let handles: Vec<_> = paths
        .iter()
        .map(|path| {
            let parser = Arc::clone(&parser);
            let path = path.clone();
            tokio::task::spawn_blocking(move || parser.parse_path(&path))
        })
        .collect();

    let mut outputs = Vec::with_capacity(paths.len());
    for (path, handle) in paths.iter().zip(handles) {
        let output = handle
            .await
            .context("parser task failed")?
            .with_context(|| format!("failed to parse {}", path.display()))?;
        outputs.push((path.clone(), output));
    }
    Ok(outputs)
}

pub async fn analyze_files(
    parser: Arc<LogParser>,
    paths: &[PathBuf],
    criteria: &FilterCriteria,
    aggregator: StatsAggregator,
) -> anyhow::Result<Analysis> {
    let outputs = parse_files(parser, paths).await?;

    let mut files = Vec::with_capacity(outputs.len());
    let mut parsed = Vec::new();
    for (path, output) in outputs {
        files.push(FileSummary::new(path, &output));
        parsed.extend(output.records);
    }

    let selected = filter(&parsed, criteria);
    let statistics = aggregator.analyze(&parsed);
    tracing::info!(
        files = files.len(),
        parsed = parsed.len(),
        selected = selected.len(),
        "analysis complete"
    );

    Ok(Analysis {
        files,
        parsed,
        selected,
        statistics,
    })
}

/// Run the whole command, writing the console report to `out`.
pub async fn run<W: Write>(args: &Args, out: &mut W) -> anyhow::Result<()> {
    let config = args.load_config()?;
    let criteria = args.criteria(&config)?;
    let parser = Arc::new(config.build_parser()?);

    let analysis = analyze_files(parser, &args.files, &criteria, config.aggregator()).await?;

    report::write_parse_summary(out, &analysis.files)?;
    report::write_statistics(out, &analysis.statistics)?;
    if !args.stats_only {
        report::write_entries(out, &analysis.selected, args.limit)?;
    }

    if let (Some(path), Some(format)) = (&args.export, args.export_format()) {
        export::export(path, format, &analysis.selected, &analysis.statistics)?;
        writeln!(out, "\nResults exported to: {}", path.display())?;
    }
    Ok(())
}
