//! Format registry: an ordered cascade of named line recognizers.
//!
//! Each [`FormatSpec`] is a compiled regex with named captures, a set of
//! field-mapping rules, and an optional timestamp hint. The registry tries
//! specs in priority order and the first match wins, so denser formats must
//! be registered ahead of generic ones.

pub mod builtin;

use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

use crate::error::{LogError, LogResult};
use crate::fallback;
use crate::timestamp::TimestampFormat;
use crate::types::LogLevel;

/// Name of the capture group holding the raw timestamp text.
pub const TIMESTAMP_CAPTURE: &str = "timestamp";

// ── Mapping rules ─────────────────────────────────────────────

/// How a text field (message, source) is derived from a match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    /// Value of a named capture.
    Capture(String),
    /// A constant.
    Fixed(String),
    /// `$name` / `${name}` expansion over the captures.
    Template(String),
}

impl FieldRule {
    fn resolve(&self, caps: &Captures<'_>) -> Option<String> {
        match self {
            Self::Capture(name) => caps.name(name).map(|m| m.as_str().to_string()),
            Self::Fixed(value) => Some(value.clone()),
            Self::Template(template) => {
                let mut out = String::new();
                caps.expand(template, &mut out);
                Some(out)
            }
        }
    }

    fn capture_name(&self) -> Option<&str> {
        match self {
            Self::Capture(name) => Some(name),
            _ => None,
        }
    }
}

/// One way of deriving a level. A spec lists several; the first that
/// yields a level wins, and UNKNOWN is used when none does.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelRule {
    /// Severity token in a capture, normalized through the alias table.
    Capture(String),
    /// HTTP status code in a capture: >= 400 is ERROR, otherwise INFO.
    HttpStatus(String),
    /// Syslog `<PRI>` value in a capture; severity is `pri & 7`.
    SyslogPriority(String),
    /// Leftmost level keyword found inside a capture's text.
    Scan(String),
    /// A constant level.
    Fixed(LogLevel),
}

impl LevelRule {
    fn resolve(&self, caps: &Captures<'_>) -> Option<LogLevel> {
        match self {
            Self::Capture(name) => caps
                .name(name)
                .and_then(|m| LogLevel::from_token(m.as_str())),
            Self::HttpStatus(name) => caps
                .name(name)
                .and_then(|m| m.as_str().parse::<u16>().ok())
                .map(LogLevel::from_http_status),
            Self::SyslogPriority(name) => caps
                .name(name)
                .and_then(|m| m.as_str().parse::<u8>().ok())
                .map(|pri| level_from_syslog_severity(pri & 0x07)),
            Self::Scan(name) => caps
                .name(name)
                .and_then(|m| fallback::find_level_keyword(m.as_str()))
                .map(|kw| kw.level),
            Self::Fixed(level) => Some(*level),
        }
    }

    fn capture_name(&self) -> Option<&str> {
        match self {
            Self::Capture(name)
            | Self::HttpStatus(name)
            | Self::SyslogPriority(name)
            | Self::Scan(name) => Some(name),
            Self::Fixed(_) => None,
        }
    }
}

/// Map syslog numeric severity (0–7) onto the level vocabulary.
pub fn level_from_syslog_severity(sev: u8) -> LogLevel {
    match sev {
        0..=2 => LogLevel::Fatal, // Emergency, Alert, Critical
        3 => LogLevel::Error,
        4 => LogLevel::Warning,
        5 | 6 => LogLevel::Info, // Notice, Informational
        _ => LogLevel::Debug,
    }
}

/// Field-mapping rules of a [`FormatSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapper {
    pub level: Vec<LevelRule>,
    pub message: FieldRule,
    pub source: Option<FieldRule>,
    /// Captures copied verbatim into the record's `fields` map.
    pub fields: Vec<String>,
}

impl FieldMapper {
    /// Message from the `message` capture, no level, no source.
    pub fn new() -> Self {
        Self {
            level: Vec::new(),
            message: FieldRule::Capture("message".to_string()),
            source: None,
            fields: Vec::new(),
        }
    }

    pub fn level(mut self, rule: LevelRule) -> Self {
        self.level.push(rule);
        self
    }

    pub fn message(mut self, rule: FieldRule) -> Self {
        self.message = rule;
        self
    }

    pub fn source(mut self, rule: FieldRule) -> Self {
        self.source = Some(rule);
        self
    }

    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    fn referenced_captures(&self) -> impl Iterator<Item = &str> {
        self.level
            .iter()
            .filter_map(LevelRule::capture_name)
            .chain(self.message.capture_name())
            .chain(self.source.as_ref().and_then(FieldRule::capture_name))
            .chain(self.fields.iter().map(String::as_str))
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

// ── Format Spec ───────────────────────────────────────────────

/// A named, stateless line recognizer.
#[derive(Debug, Clone)]
pub struct FormatSpec {
    name: String,
    pattern: Regex,
    mapper: FieldMapper,
    timestamp_hint: Option<TimestampFormat>,
}

impl FormatSpec {
    /// Compile `pattern` and check that every capture the mapper refers to
    /// exists in it.
    pub fn new(name: impl Into<String>, pattern: &str, mapper: FieldMapper) -> LogResult<Self> {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|e| LogError::Format {
            name: name.clone(),
            message: e.to_string(),
        })?;

        let known: HashSet<&str> = pattern.capture_names().flatten().collect();
        if let Some(missing) = mapper.referenced_captures().find(|c| !known.contains(c)) {
            return Err(LogError::Format {
                name,
                message: format!("pattern has no capture group named '{missing}'"),
            });
        }

        Ok(Self {
            name,
            pattern,
            mapper,
            timestamp_hint: None,
        })
    }

    pub fn with_timestamp_hint(mut self, hint: TimestampFormat) -> Self {
        self.timestamp_hint = Some(hint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn timestamp_hint(&self) -> Option<&TimestampFormat> {
        self.timestamp_hint.as_ref()
    }

    /// Test `line` against this spec.
    pub fn match_line<'t>(&self, line: &'t str) -> Option<FormatMatch<'_, 't>> {
        self.pattern
            .captures(line)
            .map(|captures| FormatMatch { spec: self, captures })
    }
}

/// A successful match of a [`FormatSpec`] against one line.
pub struct FormatMatch<'s, 't> {
    spec: &'s FormatSpec,
    captures: Captures<'t>,
}

impl<'s, 't> FormatMatch<'s, 't> {
    pub fn spec(&self) -> &'s FormatSpec {
        self.spec
    }

    /// Raw text of a named capture, if it participated in the match.
    pub fn get(&self, name: &str) -> Option<&'t str> {
        self.captures.name(name).map(|m| m.as_str())
    }

    pub fn timestamp_text(&self) -> Option<&'t str> {
        self.get(TIMESTAMP_CAPTURE)
    }

    pub fn level(&self) -> LogLevel {
        self.spec
            .mapper
            .level
            .iter()
            .find_map(|rule| rule.resolve(&self.captures))
            .unwrap_or(LogLevel::Unknown)
    }

    pub fn message(&self) -> Option<String> {
        self.spec.mapper.message.resolve(&self.captures)
    }

    pub fn source(&self) -> Option<String> {
        self.spec
            .mapper
            .source
            .as_ref()
            .and_then(|rule| rule.resolve(&self.captures))
    }

    /// Extra captures that participated and are non-empty.
    pub fn extra_fields(&self) -> BTreeMap<String, String> {
        self.spec
            .mapper
            .fields
            .iter()
            .filter_map(|name| {
                self.get(name)
                    .filter(|v| !v.is_empty())
                    .map(|v| (name.clone(), v.to_string()))
            })
            .collect()
    }
}

// ── Registry ──────────────────────────────────────────────────

/// Ordered, immutable collection of format specs.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    specs: Vec<FormatSpec>,
}

impl FormatRegistry {
    /// Build a registry from specs in priority order. Names must be unique.
    pub fn new(specs: Vec<FormatSpec>) -> LogResult<Self> {
        let mut seen = HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(LogError::Format {
                    name: spec.name.clone(),
                    message: "duplicate format name".into(),
                });
            }
        }
        tracing::debug!(
            formats = ?specs.iter().map(FormatSpec::name).collect::<Vec<_>>(),
            "format registry built"
        );
        Ok(Self { specs })
    }

    /// The built-in cascade: web access formats, application, syslog.
    pub fn with_defaults() -> Self {
        Self {
            specs: builtin::all_formats(),
        }
    }

    /// Custom specs ahead of the built-ins, preserving their given order.
    pub fn with_custom(custom: Vec<FormatSpec>) -> LogResult<Self> {
        let mut specs = custom;
        specs.extend(builtin::all_formats());
        Self::new(specs)
    }

    /// First spec (in priority order) whose pattern matches `line`.
    pub fn find_match<'t>(&self, line: &'t str) -> Option<FormatMatch<'_, 't>> {
        self.specs.iter().find_map(|spec| spec.match_line(line))
    }

    pub fn get(&self, name: &str) -> Option<&FormatSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(FormatSpec::name).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
