//! Filter engine — select records by date range, level, keyword and source.
//!
//! A [`FilterCriteria`] is validated once at construction; applying it
//! never fails. Every present constraint must hold (conjunction).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use regex::Regex;
use std::collections::BTreeSet;

use crate::error::{LogError, LogResult};
use crate::types::{LogLevel, LogRecord};

/// Immutable bundle of optional record predicates. Absence means "no
/// constraint".
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
    levels: Option<BTreeSet<LogLevel>>,
    keyword: Option<Regex>,
    /// Stored lowercased.
    source: Option<String>,
}

impl FilterCriteria {
    pub fn builder() -> FilterCriteriaBuilder {
        FilterCriteriaBuilder::default()
    }

    /// Criteria that accept every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        self.end
    }

    pub fn levels(&self) -> Option<&BTreeSet<LogLevel>> {
        self.levels.as_ref()
    }

    pub fn keyword_pattern(&self) -> Option<&str> {
        self.keyword.as_ref().map(Regex::as_str)
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// True when no constraint is set.
    pub fn is_unconstrained(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.levels.is_none()
            && self.keyword.is_none()
            && self.source.is_none()
    }

    /// Whether `record` satisfies every present constraint.
    ///
    /// Checks run cheapest first: level, source, keyword, then date.
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(levels) = &self.levels
            && !levels.contains(&record.level())
        {
            return false;
        }

        if let Some(needle) = &self.source {
            match record.source() {
                Some(source) if source.to_lowercase().contains(needle.as_str()) => {}
                _ => return false,
            }
        }

        if let Some(re) = &self.keyword
            && !re.is_match(record.message())
        {
            return false;
        }

        if self.start.is_some() || self.end.is_some() {
            let Some(ts) = record.timestamp() else {
                return false;
            };
            if self.start.is_some_and(|start| ts < start) || self.end.is_some_and(|end| ts > end) {
                return false;
            }
        }

        true
    }

    /// Conjunction of two criteria.
    ///
    /// Level sets intersect and date bounds tighten; the result may accept
    /// nothing. Two keyword constraints or two source constraints cannot be
    /// merged and are rejected.
    pub fn and(&self, other: &FilterCriteria) -> LogResult<FilterCriteria> {
        if self.keyword.is_some() && other.keyword.is_some() {
            return Err(LogError::InvalidCriteria(
                "cannot combine two keyword constraints".into(),
            ));
        }
        if self.source.is_some() && other.source.is_some() {
            return Err(LogError::InvalidCriteria(
                "cannot combine two source constraints".into(),
            ));
        }

        let levels = match (&self.levels, &other.levels) {
            (Some(a), Some(b)) => Some(a.intersection(b).copied().collect()),
            (a, b) => a.clone().or_else(|| b.clone()),
        };

        Ok(FilterCriteria {
            start: tighter(self.start, other.start, std::cmp::max),
            end: tighter(self.end, other.end, std::cmp::min),
            levels,
            keyword: self.keyword.clone().or_else(|| other.keyword.clone()),
            source: self.source.clone().or_else(|| other.source.clone()),
        })
    }
}

fn tighter<T: Copy>(a: Option<T>, b: Option<T>, pick: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

// ── Builder ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum KeywordInput {
    Pattern(String),
    AnyOf(Vec<String>),
}

/// Collects raw criteria; [`build`](Self::build) validates them.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteriaBuilder {
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
    level_names: Vec<String>,
    level_set: Option<BTreeSet<LogLevel>>,
    keyword: Option<KeywordInput>,
    source: Option<String>,
}

impl FilterCriteriaBuilder {
    pub fn start(mut self, start: DateTime<FixedOffset>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<FixedOffset>) -> Self {
        self.end = Some(end);
        self
    }

    /// Accepted levels by name (`warn`, `Error`, ...). Unknown names fail
    /// at build time.
    pub fn levels<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.level_names
            .extend(names.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn level_set(mut self, levels: impl IntoIterator<Item = LogLevel>) -> Self {
        self.level_set
            .get_or_insert_with(BTreeSet::new)
            .extend(levels);
        self
    }

    /// A regex matched against each record's message.
    pub fn keyword_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.keyword = Some(KeywordInput::Pattern(pattern.into()));
        self
    }

    /// Literal keywords; a record matches if its message contains any of
    /// them, ignoring case. Blank entries are dropped.
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        self.keyword = Some(KeywordInput::AnyOf(list));
        self
    }

    /// Case-insensitive substring of the record source. Blank is ignored.
    pub fn source(mut self, source: impl AsRef<str>) -> Self {
        let source = source.as_ref().trim();
        self.source = (!source.is_empty()).then(|| source.to_lowercase());
        self
    }

    pub fn build(self) -> LogResult<FilterCriteria> {
        if let (Some(start), Some(end)) = (self.start, self.end)
            && start > end
        {
            return Err(LogError::InvalidCriteria(format!(
                "start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }

        let mut levels = self.level_set;
        if !self.level_names.is_empty() {
            let set = levels.get_or_insert_with(BTreeSet::new);
            for name in &self.level_names {
                set.insert(name.parse::<LogLevel>()?);
            }
        }

        let keyword = match self.keyword {
            Some(KeywordInput::Pattern(p)) => {
                Some(Regex::new(&p).map_err(|e| LogError::Regex(e.to_string()))?)
            }
            Some(KeywordInput::AnyOf(list)) if !list.is_empty() => {
                let alternation = list
                    .iter()
                    .map(|k| regex::escape(k))
                    .collect::<Vec<_>>()
                    .join("|");
                Some(
                    Regex::new(&format!("(?i)(?:{alternation})"))
                        .map_err(|e| LogError::Regex(e.to_string()))?,
                )
            }
            _ => None,
        };

        Ok(FilterCriteria {
            start: self.start,
            end: self.end,
            levels,
            keyword,
            source: self.source,
        })
    }
}

/// Records satisfying `criteria`, in input order. The input is untouched.
pub fn filter(records: &[LogRecord], criteria: &FilterCriteria) -> Vec<LogRecord> {
    let selected: Vec<LogRecord> = records
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect();
    tracing::debug!(input = records.len(), output = selected.len(), "filter applied");
    selected
}

// ── Date bounds ───────────────────────────────────────────────

/// Which end of a range a textual bound describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

/// Parse a user-supplied date bound.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` (taken
/// in `offset`) or a bare `YYYY-MM-DD`, which expands to the start or the
/// last instant of that day.
pub fn parse_bound(text: &str, bound: Bound, offset: FixedOffset) -> LogResult<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt);
    }

    let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| match bound {
                    Bound::Start => Some(date.and_time(NaiveTime::MIN)),
                    Bound::End => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
                })
        })
        .ok_or_else(|| LogError::InvalidCriteria(format!("unrecognized date: {text}")))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| LogError::InvalidCriteria(format!("ambiguous date: {text}")))
}
