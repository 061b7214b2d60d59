//! Export selected records as JSON, CSV or a plain-text report.

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use sift_engine::{LogRecord, Statistics};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Txt,
}

impl ExportFormat {
    /// Format named by the file extension, if recognized.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "txt" | "log" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Explicit choice first, then the extension, then JSON.
    pub fn resolve(explicit: Option<Self>, path: &Path) -> Self {
        explicit
            .or_else(|| Self::from_extension(path))
            .unwrap_or(Self::Json)
    }
}

pub const CSV_HEADERS: [&str; 5] = ["timestamp", "level", "source", "message", "line_number"];

#[derive(Serialize)]
struct ExportDocument<'a> {
    metadata: ExportMetadata<'a>,
    entries: &'a [LogRecord],
}

#[derive(Serialize)]
struct ExportMetadata<'a> {
    export_time: DateTime<Local>,
    entry_count: usize,
    statistics: &'a Statistics,
}

/// Write `records` to `path` in `format`.
pub fn export(
    path: &Path,
    format: ExportFormat,
    records: &[LogRecord],
    stats: &Statistics,
) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    match format {
        ExportFormat::Json => write_json(&mut writer, records, stats)?,
        ExportFormat::Csv => write_csv(&mut writer, records)?,
        ExportFormat::Txt => write_txt(&mut writer, records)?,
    }
    writer.flush()?;

    tracing::info!(
        path = %path.display(),
        format = ?format,
        records = records.len(),
        "export written"
    );
    Ok(())
}

/// `{ "metadata": { export_time, entry_count, statistics }, "entries": [...] }`
pub fn write_json<W: Write>(
    writer: W,
    records: &[LogRecord],
    stats: &Statistics,
) -> anyhow::Result<()> {
    let doc = ExportDocument {
        metadata: ExportMetadata {
            export_time: Local::now(),
            entry_count: records.len(),
            statistics: stats,
        },
        entries: records,
    };
    serde_json::to_writer_pretty(writer, &doc)?;
    Ok(())
}

/// One row per record; absent timestamp/source are empty cells.
pub fn write_csv<W: Write>(writer: W, records: &[LogRecord]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADERS)?;
    for record in records {
        let timestamp = record.timestamp().map(|ts| ts.to_rfc3339()).unwrap_or_default();
        let line_number = record.line_number().to_string();
        wtr.write_record([
            timestamp.as_str(),
            record.level().as_str(),
            record.source().unwrap_or(""),
            record.message(),
            line_number.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_txt<W: Write>(mut writer: W, records: &[LogRecord]) -> anyhow::Result<()> {
    writeln!(writer, "Log Analysis Report")?;
    writeln!(writer, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(writer, "Total Entries: {}", records.len())?;
    writeln!(writer)?;
    for record in records {
        writeln!(writer, "{record}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sift_engine::{LogParser, MockLogSource, analyze};

    fn records() -> Vec<LogRecord> {
        LogParser::with_defaults()
            .parse(&MockLogSource::with_mixed_sample(), "/var/log/mixed.log")
            .unwrap()
            .records
    }

    #[test]
    fn extension_detection() {
        assert_eq!(ExportFormat::from_extension(Path::new("a.JSON")), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_extension(Path::new("a.csv")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_extension(Path::new("a.txt")), Some(ExportFormat::Txt));
        assert_eq!(ExportFormat::from_extension(Path::new("a.xml")), None);
        assert_eq!(ExportFormat::from_extension(Path::new("noext")), None);
        assert_eq!(
            ExportFormat::resolve(None, Path::new("a.xml")),
            ExportFormat::Json
        );
    }

    #[test]
    fn json_document_shape() {
        let records = records();
        let stats = analyze(&records);
        let mut buf = Vec::new();
        write_json(&mut buf, &records[..3], &stats).unwrap();

        let doc: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(doc["metadata"]["entry_count"], 3);
        assert_eq!(doc["metadata"]["statistics"]["total_records"], 11);
        assert!(doc["metadata"]["export_time"].is_string());
        let entries = doc["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2]["level"], "ERROR");
        assert_eq!(entries[2]["message"], "Database connection failed");
        assert_eq!(entries[0]["timestamp"], "2024-01-15T10:30:25.123+00:00");
    }

    #[test]
    fn csv_rows() {
        let records = records();
        let mut buf = Vec::new();
        write_csv(&mut buf, &records[6..8]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "timestamp,level,source,message,line_number");
        assert!(lines[1].ends_with(",INFO,apache,GET /index.html - 200,7"));
        assert!(lines[2].starts_with("2024-01-15T10:30:32-07:00,ERROR,apache,"));
    }

    #[test]
    fn csv_quotes_and_empty_cells() {
        let record = LogRecord::new(4, "raw").with_message(r#"said "hi", left"#);
        let mut buf = Vec::new();
        write_csv(&mut buf, &[record]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().nth(1), Some(r#",UNKNOWN,,"said ""hi"", left",4"#));
    }

    #[test]
    fn txt_report() {
        let records = records();
        let mut buf = Vec::new();
        write_txt(&mut buf, &records[..2]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Log Analysis Report\n"));
        assert!(text.contains("Total Entries: 2\n"));
        assert!(text.contains("[2024-01-15T10:30:26.456+00:00] WARNING: High memory usage detected"));
    }

    #[test]
    fn export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let records = records();
        export(&path, ExportFormat::Csv, &records, &analyze(&records)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 12);

        let missing = dir.path().join("no/such/dir/out.json");
        assert!(export(&missing, ExportFormat::Json, &records, &analyze(&records)).is_err());
    }
}
