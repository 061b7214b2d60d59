//! Log parsing and analysis engine for logsift.
//!
//! Turns heterogeneous log text (Apache/Nginx access, IIS W3C, timestamped
//! application logs, BSD syslog, or anything containing a level keyword)
//! into normalized [`LogRecord`]s, then filters them and derives
//! [`Statistics`]. The engine is synchronous; a `LogSource` abstraction
//! keeps it testable without touching the filesystem.

pub mod config;
pub mod error;
pub mod fallback;
pub mod filter;
pub mod formats;
pub mod mock;
pub mod pipeline;
pub mod source;
pub mod stats;
pub mod timestamp;
pub mod types;

// Re-export key types for convenience
pub use config::SiftConfig;
pub use error::{LogError, LogResult};
pub use filter::{Bound, FilterCriteria, FilterCriteriaBuilder, filter, parse_bound};
pub use formats::{FieldMapper, FieldRule, FormatRegistry, FormatSpec, LevelRule};
pub use mock::MockLogSource;
pub use pipeline::{Decoding, DiagnosticKind, LineDiagnostic, LogParser, ParseOutput, ParsedLine};
pub use source::{FileLogSource, LogSource};
pub use stats::{RankedItem, Statistics, StatsAggregator, analyze};
pub use timestamp::{TimestampFormat, TimestampNormalizer};
pub use types::{LEVEL_KEYWORDS, LogLevel, LogRecord};
