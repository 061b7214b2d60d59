//! Fallback heuristic for lines no format spec recognizes.
//!
//! Scans for a level keyword (case-insensitive, whole word). When several
//! are present the leftmost one wins. Text before the keyword is dropped
//! and the rest of the line becomes the message.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{LogLevel, LogRecord, level_keyword_alternation};

static RE_LEVEL_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})\b", level_keyword_alternation())).unwrap()
});

/// A level keyword located inside a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelKeyword {
    pub level: LogLevel,
    /// Byte offset of the keyword.
    pub start: usize,
    /// Byte offset just past the keyword.
    pub end: usize,
}

/// Find the leftmost level keyword in `text`.
pub fn find_level_keyword(text: &str) -> Option<LevelKeyword> {
    let m = RE_LEVEL_KEYWORD.find(text)?;
    let level = LogLevel::from_token(m.as_str())?;
    Some(LevelKeyword {
        level,
        start: m.start(),
        end: m.end(),
    })
}

/// Build a record from an unrecognized line.
///
/// With a keyword: level set, message = remainder after the keyword with
/// leading separators removed. Without: level UNKNOWN, message = whole line.
/// The timestamp is always absent.
pub fn parse_line(line: &str, line_number: usize) -> LogRecord {
    let record = LogRecord::new(line_number, line);
    match find_level_keyword(line) {
        Some(kw) => {
            let remainder = strip_separators(&line[kw.end..]);
            record.with_level(kw.level).with_message(remainder)
        }
        None => record,
    }
}

fn strip_separators(s: &str) -> &str {
    s.trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, ':' | ']' | ')' | '>' | '-' | '|' | '=')
    })
}
