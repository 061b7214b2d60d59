//! Parsing pipeline: stream lines through the format cascade.
//!
//! Lines are read one at a time from a `BufRead`; only the resulting
//! records are held in memory. A line that no format recognizes degrades
//! to the keyword fallback, never to an error. Only file-level problems
//! (open/read failures, undecodable bytes) abort a parse.

use serde::Serialize;
use std::borrow::Cow;
use std::io::BufRead;
use std::path::Path;

use crate::error::{LogError, LogResult};
use crate::fallback;
use crate::formats::FormatRegistry;
use crate::source::{FileLogSource, LogSource};
use crate::timestamp::TimestampNormalizer;
use crate::types::LogRecord;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Text decoding applied to each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decoding {
    /// Invalid UTF-8 aborts the parse with [`LogError::Decode`].
    Strict,
    /// Invalid sequences are replaced with U+FFFD.
    Lossy,
}

/// Why a line did not parse cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// No format spec matched; the fallback heuristic produced the record.
    NoFormatMatched,
    /// A format matched but its timestamp capture could not be normalized.
    UnparsableTimestamp { format: String, raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineDiagnostic {
    pub line_number: usize,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

/// Result of parsing one line: always a record, sometimes a diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub record: LogRecord,
    pub diagnostic: Option<LineDiagnostic>,
}

impl ParsedLine {
    pub fn is_fallback(&self) -> bool {
        self.record.format().is_none()
    }
}

/// Everything produced by one parse call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseOutput {
    /// Records in input order.
    pub records: Vec<LogRecord>,
    /// Every line read, blank and comment lines included.
    pub total_lines: usize,
    /// Records produced by the fallback heuristic.
    pub fallback_count: usize,
    /// Blank and comment lines that produced no record.
    pub skipped_lines: usize,
    pub diagnostics: Vec<LineDiagnostic>,
    pub decoding: Decoding,
}

impl ParseOutput {
    fn empty(decoding: Decoding) -> Self {
        Self {
            records: Vec::new(),
            total_lines: 0,
            fallback_count: 0,
            skipped_lines: 0,
            diagnostics: Vec::new(),
            decoding,
        }
    }

    /// Lines that fell back to the generic heuristic.
    pub fn failure_count(&self) -> usize {
        self.fallback_count
    }

    /// Percentage of records recognized by a format spec; 0 when empty.
    pub fn success_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let matched = self.records.len() - self.fallback_count;
        matched as f64 / self.records.len() as f64 * 100.0
    }
}

/// Turns log text into [`LogRecord`]s.
///
/// Immutable after construction and safe to share across threads; each
/// parse call owns its output.
#[derive(Debug, Clone)]
pub struct LogParser {
    registry: FormatRegistry,
    normalizer: TimestampNormalizer,
    skip_comments: bool,
}

impl LogParser {
    pub fn new(registry: FormatRegistry, normalizer: TimestampNormalizer) -> Self {
        Self {
            registry,
            normalizer,
            skip_comments: true,
        }
    }

    /// Built-in formats, default normalizer.
    pub fn with_defaults() -> Self {
        Self::new(FormatRegistry::with_defaults(), TimestampNormalizer::new())
    }

    /// Whether lines starting with `#` are skipped (W3C directives etc.).
    pub fn skip_comments(mut self, skip: bool) -> Self {
        self.skip_comments = skip;
        self
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn normalizer(&self) -> &TimestampNormalizer {
        &self.normalizer
    }

    /// Parse one line. Never fails.
    pub fn parse_line(&self, line: &str, line_number: usize) -> ParsedLine {
        let Some(m) = self.registry.find_match(line) else {
            tracing::trace!(line_number, "no format matched, using keyword fallback");
            return ParsedLine {
                record: fallback::parse_line(line, line_number),
                diagnostic: Some(LineDiagnostic {
                    line_number,
                    kind: DiagnosticKind::NoFormatMatched,
                }),
            };
        };

        let spec = m.spec();
        let mut diagnostic = None;
        let timestamp = match m.timestamp_text() {
            Some(raw) => {
                let ts = self.normalizer.normalize(raw, spec.timestamp_hint());
                if ts.is_none() {
                    diagnostic = Some(LineDiagnostic {
                        line_number,
                        kind: DiagnosticKind::UnparsableTimestamp {
                            format: spec.name().to_string(),
                            raw: raw.to_string(),
                        },
                    });
                }
                ts
            }
            None => None,
        };

        let mut record = LogRecord::new(line_number, line)
            .with_timestamp(timestamp)
            .with_level(m.level())
            .with_source(m.source())
            .with_format(spec.name())
            .with_fields(m.extra_fields());
        if let Some(message) = m.message() {
            record = record.with_message(message);
        }

        ParsedLine { record, diagnostic }
    }

    /// Parse an already-open stream. `origin` names it in errors and logs.
    pub fn parse_reader<R: BufRead>(
        &self,
        mut reader: R,
        origin: &str,
        decoding: Decoding,
    ) -> LogResult<ParseOutput> {
        let mut out = ParseOutput::empty(decoding);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| LogError::from_io(origin, e))?;
            if n == 0 {
                break;
            }
            out.total_lines += 1;
            let line_number = out.total_lines;

            let mut bytes = trim_line_ending(&buf);
            if line_number == 1 {
                bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            }
            let line: Cow<'_, str> = match decoding {
                Decoding::Strict => Cow::Borrowed(std::str::from_utf8(bytes).map_err(|_| {
                    LogError::Decode {
                        path: origin.to_string(),
                        line: line_number,
                    }
                })?),
                Decoding::Lossy => String::from_utf8_lossy(bytes),
            };

            if self.is_skippable(&line) {
                out.skipped_lines += 1;
                continue;
            }

            let parsed = self.parse_line(&line, line_number);
            if parsed.is_fallback() {
                out.fallback_count += 1;
            }
            if let Some(diagnostic) = parsed.diagnostic {
                out.diagnostics.push(diagnostic);
            }
            out.records.push(parsed.record);
        }

        tracing::info!(
            origin,
            total_lines = out.total_lines,
            records = out.records.len(),
            fallback = out.fallback_count,
            skipped = out.skipped_lines,
            decoding = ?out.decoding,
            "parse complete"
        );
        Ok(out)
    }

    /// Parse `path` from `source`: strict UTF-8 first, then one lossy retry
    /// from the start if the strict pass hits undecodable bytes.
    pub fn parse(&self, source: &dyn LogSource, path: &str) -> LogResult<ParseOutput> {
        let reader = source.open(path)?;
        match self.parse_reader(reader, path, Decoding::Strict) {
            Err(LogError::Decode { line, .. }) => {
                tracing::warn!(path, line, "invalid UTF-8, retrying with lossy decoding");
                let reader = source.open(path)?;
                self.parse_reader(reader, path, Decoding::Lossy)
            }
            other => other,
        }
    }

    /// Parse a file on the local filesystem.
    pub fn parse_path(&self, path: impl AsRef<Path>) -> LogResult<ParseOutput> {
        let path = path.as_ref().to_string_lossy();
        self.parse(&FileLogSource, &path)
    }

    fn is_skippable(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        trimmed.is_empty() || (self.skip_comments && trimmed.starts_with('#'))
    }
}

impl Default for LogParser {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Parse `path` with the default parser.
pub fn parse(source: &dyn LogSource, path: &str) -> LogResult<ParseOutput> {
    LogParser::with_defaults().parse(source, path)
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
