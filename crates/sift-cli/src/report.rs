//! Console report: parse summary, statistics block and record listing.

use std::io::{self, Write};

use sift_engine::{LogLevel, LogRecord, Statistics};

use crate::runner::FileSummary;

const RULE_WIDTH: usize = 50;

pub fn write_parse_summary<W: Write>(out: &mut W, files: &[FileSummary]) -> io::Result<()> {
    for file in files {
        writeln!(
            out,
            "Loaded {} entries from {} lines: {} ({} unrecognized, {} skipped{})",
            group_thousands(file.records),
            group_thousands(file.total_lines),
            file.path.display(),
            file.fallback,
            file.skipped,
            if file.lossy { ", lossy UTF-8" } else { "" },
        )?;
    }
    Ok(())
}

pub fn write_statistics<W: Write>(out: &mut W, stats: &Statistics) -> io::Result<()> {
    writeln!(out, "\nLOG FILE STATISTICS")?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "Total Entries: {}", group_thousands(stats.total_records))?;
    if stats.total_records == 0 {
        return Ok(());
    }
    writeln!(out, "Error Rate: {:.2}%", stats.error_rate)?;
    writeln!(out, "Warning Rate: {:.2}%", stats.warning_rate)?;
    if stats.unparsed_timestamp_count > 0 {
        writeln!(out, "Without Timestamp: {}", group_thousands(stats.unparsed_timestamp_count))?;
    }

    writeln!(out, "\nLog Level Distribution:")?;
    for level in LogLevel::ALL {
        let count = stats.count(level);
        if count > 0 {
            writeln!(
                out,
                "  {:10}: {:>8} ({:5.1}%)",
                level.as_str(),
                group_thousands(count),
                stats.percentage(level)
            )?;
        }
    }

    if !stats.top_sources.is_empty() {
        writeln!(out, "\nTop Sources:")?;
        for item in &stats.top_sources {
            writeln!(out, "  {:20}: {}", item.value, group_thousands(item.count))?;
        }
    }

    if !stats.top_error_messages.is_empty() {
        writeln!(out, "\nTop Error Messages:")?;
        for item in &stats.top_error_messages {
            writeln!(out, "  {:>6}  {}", group_thousands(item.count), item.value)?;
        }
    }

    if let Some((start, end)) = stats.date_range() {
        writeln!(out, "\nDate Range: {} to {}", start.to_rfc3339(), end.to_rfc3339())?;
    }

    if stats.timestamped_count > 0 {
        writeln!(out, "\nHourly Distribution:")?;
        for (hour, count) in stats.hourly_histogram.iter().enumerate() {
            if *count > 0 {
                writeln!(out, "  {hour:02}:00 - {hour:02}:59: {}", group_thousands(*count))?;
            }
        }
    }
    Ok(())
}

/// List up to `limit` records, one per line.
pub fn write_entries<W: Write>(out: &mut W, records: &[LogRecord], limit: usize) -> io::Result<()> {
    let shown = records.len().min(limit);
    writeln!(
        out,
        "\nLOG ENTRIES ({} total, showing first {})",
        group_thousands(records.len()),
        group_thousands(shown)
    )?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH * 2))?;

    for record in &records[..shown] {
        let timestamp = record
            .timestamp()
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "[{:19}] {:8} | {:15} | {}",
            timestamp,
            record.level().as_str(),
            record.source().unwrap_or("-"),
            record.message()
        )?;
    }

    if records.len() > shown {
        writeln!(out, "\n... and {} more entries", group_thousands(records.len() - shown))?;
    }
    Ok(())
}

/// `1234567` → `1,234,567`
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_engine::{LogParser, MockLogSource, analyze};

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn records() -> Vec<LogRecord> {
        LogParser::with_defaults()
            .parse(&MockLogSource::with_mixed_sample(), "/var/log/mixed.log")
            .unwrap()
            .records
    }

    #[test]
    fn thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn statistics_block() {
        let stats = analyze(&records());
        let text = render(|out| write_statistics(out, &stats));
        assert!(text.contains("Total Entries: 11"));
        assert!(text.contains("Error Rate: 45.45%"));
        assert!(text.contains("Warning Rate: 9.09%"));
        assert!(text.contains("  INFO      :        5 ( 45.5%)"));
        assert!(text.contains("  apache              : 4"));
        assert!(text.contains("Date Range: "));
        assert!(text.contains("10:00 - 10:59: 11"));
        assert!(!text.contains("TRACE"));
    }

    #[test]
    fn empty_statistics() {
        let text = render(|out| write_statistics(out, &analyze(&[])));
        assert!(text.contains("Total Entries: 0"));
        assert!(!text.contains("Error Rate"));
    }

    #[test]
    fn entries_are_capped() {
        let records = records();
        let text = render(|out| write_entries(out, &records, 2));
        assert!(text.contains("LOG ENTRIES (11 total, showing first 2)"));
        assert!(text.contains("[2024-01-15 10:30:25] INFO     | -               | Application started successfully"));
        assert!(text.contains("... and 9 more entries"));
        assert!(!text.contains("Database connection failed"));
    }

    #[test]
    fn untimestamped_entry() {
        let record = LogRecord::new(1, "x").with_message("orphan");
        let text = render(|out| write_entries(out, &[record], 100));
        assert!(text.contains("[-                  ] UNKNOWN  | -               | orphan"));
        assert!(!text.contains("more entries"));
    }
}
