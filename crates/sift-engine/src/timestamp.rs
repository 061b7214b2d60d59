//! Timestamp normalization across heterogeneous log formats.
//!
//! Every recognized timestamp becomes a `DateTime<FixedOffset>`. Inputs
//! without an offset are placed in the normalizer's default offset, and
//! syslog-style inputs without a year get the reference (processing) year.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

// "14:30:25,456" → "14:30:25.456" so chrono's `%.f` accepts it
static RE_DECIMAL_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2}:\d{2}:\d{2}),(\d)").unwrap());

/// How a format string anchors its result in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKind {
    /// RFC 3339 / ISO-8601 with an explicit offset or `Z`.
    Rfc3339,
    /// chrono pattern containing an offset specifier (`%z`, `%:z`).
    Zoned,
    /// chrono pattern with a full date but no offset.
    Naive,
    /// chrono pattern with no year component (syslog `%b %e %H:%M:%S`).
    Yearless,
}

/// A single timestamp format: a chrono pattern plus its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFormat {
    pattern: String,
    kind: TimestampKind,
}

impl TimestampFormat {
    /// Classify a chrono format string by the specifiers it contains.
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let kind = if ["%z", "%:z", "%#z", "%::z"].iter().any(|z| pattern.contains(z)) {
            TimestampKind::Zoned
        } else if ["%Y", "%y", "%G", "%C", "%D", "%F", "%s"]
            .iter()
            .any(|y| pattern.contains(y))
        {
            TimestampKind::Naive
        } else {
            TimestampKind::Yearless
        };
        Self { pattern, kind }
    }

    pub fn rfc3339() -> Self {
        Self {
            pattern: "rfc3339".to_string(),
            kind: TimestampKind::Rfc3339,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn kind(&self) -> TimestampKind {
        self.kind
    }
}

/// The ordered list tried when no hint is given or the hint fails.
pub fn default_formats() -> Vec<TimestampFormat> {
    vec![
        TimestampFormat::rfc3339(),
        // Basic offset without a colon: 2024-01-15T10:30:25+0200
        TimestampFormat::new("%Y-%m-%dT%H:%M:%S%.f%z"),
        TimestampFormat::new("%Y-%m-%dT%H:%M:%S%.f"),
        TimestampFormat::new("%Y-%m-%d %H:%M:%S%.f"),
        TimestampFormat::new("%Y-%m-%d %H:%M:%S%.f%:z"),
        TimestampFormat::new("%Y-%m-%d %H:%M:%S%.f %z"),
        TimestampFormat::new("%Y/%m/%d %H:%M:%S%.f"),
        TimestampFormat::new("%d/%b/%Y:%H:%M:%S %z"),
        TimestampFormat::new("%d/%b/%Y:%H:%M:%S"),
        TimestampFormat::new("%b %e %H:%M:%S"),
    ]
}

/// Converts raw timestamp text into a canonical instant.
///
/// Immutable once built: the reference year is captured at construction,
/// so a whole parse session resolves yearless timestamps consistently.
#[derive(Debug, Clone)]
pub struct TimestampNormalizer {
    formats: Vec<TimestampFormat>,
    default_offset: FixedOffset,
    reference_year: i32,
}

impl TimestampNormalizer {
    /// Default formats, UTC default offset, current year as reference.
    pub fn new() -> Self {
        Self {
            formats: default_formats(),
            default_offset: utc_offset(),
            reference_year: Utc::now().year(),
        }
    }

    pub fn with_default_offset(mut self, offset: FixedOffset) -> Self {
        self.default_offset = offset;
        self
    }

    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    /// Add formats ahead of the built-in list.
    pub fn with_extra_formats(mut self, extra: Vec<TimestampFormat>) -> Self {
        let mut formats = extra;
        formats.append(&mut self.formats);
        self.formats = formats;
        self
    }

    pub fn default_offset(&self) -> FixedOffset {
        self.default_offset
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    pub fn formats(&self) -> &[TimestampFormat] {
        &self.formats
    }

    /// Normalize `raw`, trying `hint` first and then the ordered format list.
    ///
    /// Returns `None` when nothing parses; callers leave the timestamp absent.
    pub fn normalize(
        &self,
        raw: &str,
        hint: Option<&TimestampFormat>,
    ) -> Option<DateTime<FixedOffset>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let raw = decimal_comma_to_dot(raw);

        if let Some(hint) = hint
            && let Some(ts) = self.parse_with(&raw, hint)
        {
            return Some(ts);
        }

        self.formats
            .iter()
            .filter(|f| Some(*f) != hint)
            .find_map(|f| self.parse_with(&raw, f))
    }

    /// Parse `raw` with exactly one format.
    pub fn parse_with(&self, raw: &str, format: &TimestampFormat) -> Option<DateTime<FixedOffset>> {
        match format.kind {
            TimestampKind::Rfc3339 => DateTime::parse_from_rfc3339(raw).ok(),
            TimestampKind::Zoned => DateTime::parse_from_str(raw, &format.pattern).ok(),
            TimestampKind::Naive => NaiveDateTime::parse_from_str(raw, &format.pattern)
                .ok()
                .and_then(|ndt| self.default_offset.from_local_datetime(&ndt).single()),
            TimestampKind::Yearless => {
                let with_year = format!("{} {raw}", self.reference_year);
                let pattern = format!("%Y {}", format.pattern);
                NaiveDateTime::parse_from_str(&with_year, &pattern)
                    .ok()
                    .and_then(|ndt| self.default_offset.from_local_datetime(&ndt).single())
            }
        }
    }
}

impl Default for TimestampNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn decimal_comma_to_dot(raw: &str) -> Cow<'_, str> {
    RE_DECIMAL_COMMA.replace(raw, "${1}.${2}")
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Parse an offset such as `Z`, `UTC`, `+05:30`, `-0700`.
pub fn parse_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Some(utc_offset());
    }
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
