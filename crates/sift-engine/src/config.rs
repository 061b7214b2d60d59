//! Engine configuration, loadable from TOML.
//!
//! Loaded once and passed explicitly into registry, normalizer, parser and
//! filter construction. Every section is optional.

use chrono::FixedOffset;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{LogError, LogResult};
use crate::filter::{Bound, FilterCriteria, FilterCriteriaBuilder, parse_bound};
use crate::formats::{FieldMapper, FieldRule, FormatRegistry, FormatSpec, LevelRule};
use crate::pipeline::LogParser;
use crate::stats::{DEFAULT_TOP_N, StatsAggregator};
use crate::timestamp::{TimestampFormat, TimestampNormalizer, parse_offset};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiftConfig {
    #[serde(default)]
    pub timestamps: TimestampConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    /// Custom formats, tried ahead of the built-ins in listed order.
    #[serde(default)]
    pub formats: Vec<FormatConfig>,
    /// Named filter presets.
    #[serde(default)]
    pub presets: BTreeMap<String, FilterPreset>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimestampConfig {
    /// Offset applied to timestamps that carry none (`"+00:00"`, `"-0700"`, `"UTC"`).
    #[serde(default = "default_offset")]
    pub default_offset: String,
    /// Year for yearless (syslog) timestamps. Defaults to the current year.
    #[serde(default)]
    pub reference_year: Option<i32>,
    /// Extra chrono patterns tried before the built-in list.
    #[serde(default)]
    pub extra_formats: Vec<String>,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            default_offset: default_offset(),
            reference_year: None,
            extra_formats: Vec::new(),
        }
    }
}

fn default_offset() -> String {
    "+00:00".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParserConfig {
    /// Skip lines starting with `#`.
    #[serde(default = "default_true")]
    pub skip_comments: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { skip_comments: true }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { top_n: DEFAULT_TOP_N }
    }
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

/// A user-defined line format.
///
/// ```toml
/// [[formats]]
/// name = "gateway"
/// pattern = '^(?P<timestamp>\S+) \[(?P<lvl>\w+)\] (?P<svc>\w+): (?P<message>.*)$'
/// timestamp_format = "%Y-%m-%dT%H:%M:%S"
/// level = [{ capture = "lvl" }, { fixed = "INFO" }]
/// source = { capture = "svc" }
/// fields = ["svc"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatConfig {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub timestamp_format: Option<String>,
    #[serde(default)]
    pub level: Option<OneOrMany<LevelRule>>,
    #[serde(default)]
    pub message: Option<FieldRule>,
    #[serde(default)]
    pub source: Option<FieldRule>,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// A single table or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

impl FormatConfig {
    /// Compile into a [`FormatSpec`], validating the regex and captures.
    pub fn to_spec(&self) -> LogResult<FormatSpec> {
        let mut mapper = FieldMapper::new().fields(self.fields.iter().cloned());
        for rule in self.level.clone().map(OneOrMany::into_vec).unwrap_or_default() {
            mapper = mapper.level(rule);
        }
        if let Some(message) = &self.message {
            mapper = mapper.message(message.clone());
        }
        if let Some(source) = &self.source {
            mapper = mapper.source(source.clone());
        }

        let spec = FormatSpec::new(&self.name, &self.pattern, mapper)?;
        Ok(match &self.timestamp_format {
            Some(fmt) => spec.with_timestamp_hint(TimestampFormat::new(fmt)),
            None => spec,
        })
    }
}

/// Stored filter criteria, selected by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterPreset {
    #[serde(default)]
    pub levels: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Raw regex; mutually exclusive with `keywords`.
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// RFC 3339 or `YYYY-MM-DD`.
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl FilterPreset {
    /// Start a criteria builder from this preset; callers may add more.
    pub fn to_builder(&self, offset: FixedOffset) -> LogResult<FilterCriteriaBuilder> {
        if self.pattern.is_some() && !self.keywords.is_empty() {
            return Err(LogError::InvalidCriteria(
                "preset sets both 'pattern' and 'keywords'".into(),
            ));
        }

        let mut builder = FilterCriteria::builder().levels(&self.levels);
        if let Some(pattern) = &self.pattern {
            builder = builder.keyword_pattern(pattern);
        } else if !self.keywords.is_empty() {
            builder = builder.keywords(&self.keywords);
        }
        if let Some(source) = &self.source {
            builder = builder.source(source);
        }
        if let Some(start) = &self.start {
            builder = builder.start(parse_bound(start, Bound::Start, offset)?);
        }
        if let Some(end) = &self.end {
            builder = builder.end(parse_bound(end, Bound::End, offset)?);
        }
        Ok(builder)
    }
}

impl SiftConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LogError::from_io(&path.to_string_lossy(), e))?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!(
            path = %path.display(),
            formats = config.formats.len(),
            presets = config.presets.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> LogResult<Self> {
        toml::from_str(contents).map_err(|e| LogError::Config(e.to_string()))
    }

    pub fn default_offset(&self) -> LogResult<FixedOffset> {
        parse_offset(&self.timestamps.default_offset).ok_or_else(|| {
            LogError::Config(format!(
                "invalid default_offset '{}'",
                self.timestamps.default_offset
            ))
        })
    }

    pub fn build_normalizer(&self) -> LogResult<TimestampNormalizer> {
        let mut normalizer = TimestampNormalizer::new()
            .with_default_offset(self.default_offset()?)
            .with_extra_formats(
                self.timestamps
                    .extra_formats
                    .iter()
                    .map(TimestampFormat::new)
                    .collect(),
            );
        if let Some(year) = self.timestamps.reference_year {
            normalizer = normalizer.with_reference_year(year);
        }
        Ok(normalizer)
    }

    pub fn build_registry(&self) -> LogResult<FormatRegistry> {
        if self.formats.is_empty() {
            return Ok(FormatRegistry::with_defaults());
        }
        let custom = self
            .formats
            .iter()
            .map(FormatConfig::to_spec)
            .collect::<LogResult<Vec<_>>>()?;
        FormatRegistry::with_custom(custom)
    }

    pub fn build_parser(&self) -> LogResult<LogParser> {
        Ok(LogParser::new(self.build_registry()?, self.build_normalizer()?)
            .skip_comments(self.parser.skip_comments))
    }

    pub fn aggregator(&self) -> StatsAggregator {
        StatsAggregator::new(self.stats.top_n)
    }

    /// Look up a preset by name and start a builder from it.
    pub fn preset(&self, name: &str) -> LogResult<FilterCriteriaBuilder> {
        let preset = self
            .presets
            .get(name)
            .ok_or_else(|| LogError::Config(format!("unknown filter preset '{name}'")))?;
        preset.to_builder(self.default_offset()?)
    }
}
