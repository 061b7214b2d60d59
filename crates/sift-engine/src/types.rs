//! Core record types: severity levels and the parsed log record.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::LogError;

// ── Log Level ─────────────────────────────────────────────────

/// Every severity word `LogLevel::from_token` accepts, except `UNKNOWN`.
///
/// Longer words precede their prefixes (`WARNING` before `WARN`) so
/// regex alternations built from this list prefer the full word.
pub const LEVEL_KEYWORDS: &[&str] = &[
    "TRACE",
    "DEBUG",
    "INFORMATION",
    "INFO",
    "NOTICE",
    "WARNING",
    "WARN",
    "ERROR",
    "ERR",
    "FATAL",
    "CRITICAL",
    "CRIT",
    "SEVERE",
    "PANIC",
    "EMERG",
    "ALERT",
];

/// `LEVEL_KEYWORDS` as a regex alternation, e.g. `TRACE|DEBUG|...`.
pub fn level_keyword_alternation() -> String {
    LEVEL_KEYWORDS.join("|")
}

/// Normalized severity level.
///
/// Variant declaration order matters: `#[derive(Ord)]` uses it, so
/// Trace < Debug < Info < Warning < Error < Fatal < Unknown. Statistics
/// maps keyed by level iterate in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
    Unknown,
}

impl LogLevel {
    /// Every level, in declaration order.
    pub const ALL: [LogLevel; 7] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Fatal,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Normalize a severity token, case-insensitively, through the alias
    /// table (`warn` → WARNING, `crit` → FATAL, ...).
    ///
    /// Returns `None` for words outside the vocabulary.
    pub fn from_token(token: &str) -> Option<Self> {
        let upper = token.trim().to_ascii_uppercase();
        let level = match upper.as_str() {
            "TRACE" => Self::Trace,
            "DEBUG" => Self::Debug,
            "INFO" | "INFORMATION" | "NOTICE" => Self::Info,
            "WARN" | "WARNING" => Self::Warning,
            "ERROR" | "ERR" => Self::Error,
            "FATAL" | "CRITICAL" | "CRIT" | "SEVERE" | "PANIC" | "EMERG" | "ALERT" => Self::Fatal,
            "UNKNOWN" => Self::Unknown,
            _ => return None,
        };
        Some(level)
    }

    /// Map an HTTP status code to a level: 4xx/5xx are errors.
    pub fn from_http_status(status: u16) -> Self {
        if status >= 400 { Self::Error } else { Self::Info }
    }

    /// ERROR or FATAL.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error | Self::Fatal)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| LogError::InvalidCriteria(format!("unknown log level: {s}")))
    }
}

// ── Log Record ────────────────────────────────────────────────

/// One parsed log line.
///
/// `raw_line` and `line_number` are always present; everything else is
/// best-effort. Records are built once by the parsing pipeline and are
/// read-only afterwards: the `with_*` methods consume the record and are
/// only used while it is being assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    timestamp: Option<DateTime<FixedOffset>>,
    level: LogLevel,
    message: String,
    source: Option<String>,
    raw_line: String,
    line_number: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, String>,
}

impl LogRecord {
    /// Start a record for `raw_line`: level UNKNOWN, message = trimmed line.
    pub fn new(line_number: usize, raw_line: impl Into<String>) -> Self {
        let raw_line = raw_line.into();
        Self {
            timestamp: None,
            level: LogLevel::Unknown,
            message: raw_line.trim().to_string(),
            source: None,
            raw_line,
            line_number,
            format: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<DateTime<FixedOffset>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_message(mut self, message: impl AsRef<str>) -> Self {
        self.message = message.as_ref().trim().to_string();
        self
    }

    /// Empty sources are treated as absent.
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn raw_line(&self) -> &str {
        &self.raw_line
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Name of the format that recognized the line; `None` for fallback records.
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

impl std::fmt::Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.timestamp {
            Some(ts) => write!(f, "[{}] {}: {}", ts.to_rfc3339(), self.level, self.message),
            None => write!(f, "[-] {}: {}", self.level, self.message),
        }
    }
}
