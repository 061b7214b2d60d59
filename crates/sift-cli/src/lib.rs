//! logsift command-line front end.
//!
//! Argument parsing, config loading, parallel file parsing on tokio's
//! blocking pool, the console report and the JSON/CSV/TXT exporters. All
//! log semantics live in `sift_engine`.

pub mod args;
pub mod export;
pub mod logging;
pub mod report;
pub mod runner;

pub use args::Args;
pub use export::ExportFormat;
pub use runner::{Analysis, FileSummary, analyze_files, run};
