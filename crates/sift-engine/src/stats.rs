//! Statistics aggregator — severity counts, rates, sources, time histograms.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::types::{LogLevel, LogRecord};

/// Rankings are cut to this many entries unless configured otherwise.
pub const DEFAULT_TOP_N: usize = 10;

/// A value and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedItem {
    pub value: String,
    pub count: usize,
}

/// Read-only snapshot derived from a record sequence.
///
/// Percentages and rates are in the 0–100 range and are all 0 for an empty
/// input. Temporal fields only consider records with a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_records: usize,
    pub timestamped_count: usize,
    pub unparsed_timestamp_count: usize,
    /// Every level, including zero counts.
    pub level_counts: BTreeMap<LogLevel, usize>,
    pub level_percentages: BTreeMap<LogLevel, f64>,
    /// ERROR + FATAL.
    pub error_count: usize,
    pub warning_count: usize,
    pub error_rate: f64,
    pub warning_rate: f64,
    pub top_sources: Vec<RankedItem>,
    /// All sources, most frequent first.
    pub source_distribution: Vec<RankedItem>,
    /// Index = hour of day in the record's own offset.
    pub hourly_histogram: [usize; 24],
    pub daily_distribution: BTreeMap<NaiveDate, usize>,
    pub top_error_messages: Vec<RankedItem>,
    pub top_warning_messages: Vec<RankedItem>,
    pub earliest: Option<DateTime<FixedOffset>>,
    pub latest: Option<DateTime<FixedOffset>>,
}

impl Statistics {
    pub fn count(&self, level: LogLevel) -> usize {
        self.level_counts.get(&level).copied().unwrap_or(0)
    }

    pub fn percentage(&self, level: LogLevel) -> f64 {
        self.level_percentages.get(&level).copied().unwrap_or(0.0)
    }

    /// `(earliest, latest)` when at least one record has a timestamp.
    pub fn date_range(&self) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        self.earliest.zip(self.latest)
    }
}

/// Computes [`Statistics`] with a configurable ranking size.
#[derive(Debug, Clone, Copy)]
pub struct StatsAggregator {
    top_n: usize,
}

impl StatsAggregator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn analyze(&self, records: &[LogRecord]) -> Statistics {
        let total = records.len();
        let mut level_counts: BTreeMap<LogLevel, usize> =
            LogLevel::ALL.iter().map(|l| (*l, 0)).collect();
        let mut sources = Tally::default();
        let mut errors = Tally::default();
        let mut warnings = Tally::default();
        let mut hourly_histogram = [0usize; 24];
        let mut daily_distribution = BTreeMap::new();
        let mut timestamped_count = 0;
        let mut earliest: Option<DateTime<FixedOffset>> = None;
        let mut latest: Option<DateTime<FixedOffset>> = None;

        for record in records {
            *level_counts.entry(record.level()).or_default() += 1;
            if let Some(source) = record.source() {
                sources.add(source);
            }
            match record.level() {
                LogLevel::Error | LogLevel::Fatal => errors.add(record.message()),
                LogLevel::Warning => warnings.add(record.message()),
                _ => {}
            }

            let Some(ts) = record.timestamp() else {
                continue;
            };
            timestamped_count += 1;
            hourly_histogram[ts.hour() as usize] += 1;
            *daily_distribution.entry(ts.date_naive()).or_default() += 1;
            if earliest.is_none_or(|e| ts < e) {
                earliest = Some(ts);
            }
            if latest.is_none_or(|l| ts > l) {
                latest = Some(ts);
            }
        }

        let level_percentages = level_counts
            .iter()
            .map(|(level, count)| (*level, percent(*count, total)))
            .collect();
        let error_count = level_counts[&LogLevel::Error] + level_counts[&LogLevel::Fatal];
        let warning_count = level_counts[&LogLevel::Warning];
        let source_distribution = sources.ranked(usize::MAX);

        Statistics {
            total_records: total,
            timestamped_count,
            unparsed_timestamp_count: total - timestamped_count,
            level_counts,
            level_percentages,
            error_count,
            warning_count,
            error_rate: percent(error_count, total),
            warning_rate: percent(warning_count, total),
            top_sources: source_distribution.iter().take(self.top_n).cloned().collect(),
            source_distribution,
            hourly_histogram,
            daily_distribution,
            top_error_messages: errors.ranked(self.top_n),
            top_warning_messages: warnings.ranked(self.top_n),
            earliest,
            latest,
        }
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

/// Statistics with the default ranking size.
pub fn analyze(records: &[LogRecord]) -> Statistics {
    StatsAggregator::default().analyze(records)
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Frequency counter that remembers first-seen order for tie-breaking.
#[derive(Default)]
struct Tally {
    index: HashMap<String, usize>,
    items: Vec<RankedItem>,
}

impl Tally {
    fn add(&mut self, value: &str) {
        match self.index.get(value) {
            Some(&i) => self.items[i].count += 1,
            None => {
                self.index.insert(value.to_string(), self.items.len());
                self.items.push(RankedItem {
                    value: value.to_string(),
                    count: 1,
                });
            }
        }
    }

    /// Most frequent first; equal counts keep first-seen order (stable sort).
    fn ranked(self, limit: usize) -> Vec<RankedItem> {
        let mut items = self.items;
        items.sort_by(|a, b| b.count.cmp(&a.count));
        items.truncate(limit);
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLogSource;
    use crate::pipeline::LogParser;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn parse_sample(source: &MockLogSource, path: &str) -> Vec<LogRecord> {
        LogParser::with_defaults().parse(source, path).unwrap().records
    }

    fn ranked(items: &[RankedItem]) -> Vec<(&str, usize)> {
        items.iter().map(|i| (i.value.as_str(), i.count)).collect()
    }

    #[test]
    fn empty_input_is_all_zero() {
        let stats = analyze(&[]);
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.error_rate, 0.0);
        assert_eq!(stats.warning_rate, 0.0);
        assert_eq!(stats.level_counts.len(), LogLevel::ALL.len());
        assert!(stats.level_percentages.values().all(|p| *p == 0.0));
        assert!(stats.date_range().is_none());
        assert_eq!(stats.hourly_histogram, [0; 24]);
    }

    #[test]
    fn counts_sum_to_total() {
        let records = parse_sample(&MockLogSource::with_mixed_sample(), "/var/log/mixed.log");
        let stats = analyze(&records);
        assert_eq!(stats.total_records, 11);
        assert_eq!(stats.level_counts.values().sum::<usize>(), 11);
        let pct: f64 = stats.level_percentages.values().sum();
        assert!((pct - 100.0).abs() < 1e-9);
        assert_eq!(stats.count(LogLevel::Info), 5);
        assert_eq!(stats.count(LogLevel::Error), 4);
        assert_eq!(stats.error_count, 5);
        assert_eq!(stats.warning_count, 1);
        assert!((stats.error_rate - 5.0 / 11.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn sources_ranked_with_first_seen_ties() {
        let records = parse_sample(&MockLogSource::with_mixed_sample(), "/var/log/mixed.log");
        let stats = analyze(&records);
        assert_eq!(ranked(&stats.top_sources), vec![("apache", 4), ("mysql", 1)]);

        let records = parse_sample(&MockLogSource::with_syslog_sample(), "/var/log/syslog");
        let stats = StatsAggregator::new(2).analyze(&records);
        assert_eq!(ranked(&stats.top_sources), vec![("myapp", 3), ("kernel", 1)]);
        assert_eq!(stats.source_distribution.len(), 3);
        assert_eq!(stats.source_distribution[2].value, "cron");
    }

    #[test]
    fn top_error_messages_by_frequency() {
        let records = parse_sample(&MockLogSource::with_application_sample(), "/var/log/app.log");
        let stats = analyze(&records);
        assert_eq!(
            ranked(&stats.top_error_messages),
            vec![("Timeout talking to payments", 3)]
        );
        assert_eq!(
            ranked(&stats.top_warning_messages),
            vec![("Slow query took 2300ms", 1)]
        );
    }

    #[test]
    fn untimestamped_records_excluded_from_temporal_stats() {
        let records = parse_sample(&MockLogSource::with_application_sample(), "/var/log/app.log");
        let stats = analyze(&records);
        // Two of the eight records are fallback lines without a timestamp.
        assert_eq!(stats.total_records, 8);
        assert_eq!(stats.timestamped_count, 6);
        assert_eq!(stats.unparsed_timestamp_count, 2);
        assert_eq!(stats.hourly_histogram.iter().sum::<usize>(), 6);
        assert_eq!(stats.hourly_histogram[8], 2);
        assert_eq!(stats.hourly_histogram[9], 2);
        assert_eq!(stats.hourly_histogram[13], 2);
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(stats.daily_distribution.get(&day), Some(&6));
    }

    #[test]
    fn hour_uses_record_offset() {
        let offset = FixedOffset::west_opt(7 * 3600).unwrap();
        let ts = offset.with_ymd_and_hms(2024, 1, 15, 23, 10, 0).unwrap();
        let records = vec![LogRecord::new(1, "x").with_timestamp(Some(ts))];
        let stats = analyze(&records);
        assert_eq!(stats.hourly_histogram[23], 1);
        assert_eq!(
            stats.daily_distribution.keys().next(),
            NaiveDate::from_ymd_opt(2024, 1, 15).as_ref()
        );
    }

    #[test]
    fn date_range_spans_instants() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let plus2 = FixedOffset::east_opt(2 * 3600).unwrap();
        let a = utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        // 09:00 UTC, earliest instant despite the later wall-clock hour.
        let b = plus2.with_ymd_and_hms(2024, 1, 15, 11, 0, 0).unwrap();
        let records = vec![
            LogRecord::new(1, "a").with_timestamp(Some(a)),
            LogRecord::new(2, "b").with_timestamp(Some(b)),
        ];
        let (earliest, latest) = analyze(&records).date_range().unwrap();
        assert_eq!(earliest, b);
        assert_eq!(latest, a);
    }

    #[test]
    fn statistics_serialize_to_plain_json() {
        let records = parse_sample(&MockLogSource::with_mixed_sample(), "/var/log/mixed.log");
        let json = serde_json::to_value(analyze(&records)).unwrap();
        assert_eq!(json["level_counts"]["FATAL"], 1);
        assert_eq!(json["hourly_histogram"].as_array().unwrap().len(), 24);
        assert!(json["daily_distribution"]["2024-01-15"].is_number());
        assert!(json["earliest"].is_string());
    }
}
