//! Mock log source for testing — serves pre-loaded log content.

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Cursor};

use crate::error::{LogError, LogResult};
use crate::source::LogSource;

/// A mock log source that serves pre-loaded bytes by path.
///
/// Content is stored as bytes so tests can exercise invalid UTF-8, and
/// paths can be marked unreadable to simulate permission failures.
pub struct MockLogSource {
    files: HashMap<String, Vec<u8>>,
    denied: HashSet<String>,
}

impl MockLogSource {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
            denied: HashSet::new(),
        }
    }

    /// Add a file with the given lines (joined with `\n`).
    pub fn add_file(&mut self, path: impl Into<String>, lines: Vec<String>) {
        self.files.insert(path.into(), lines.join("\n").into_bytes());
    }

    /// Add a file with raw bytes.
    pub fn add_bytes(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Make `open` on `path` fail with permission denied.
    pub fn deny(&mut self, path: impl Into<String>) {
        self.denied.insert(path.into());
    }

    /// Mixed formats: application, Apache access and syslog lines.
    pub fn with_mixed_sample() -> Self {
        let mut m = Self::new();
        m.add_file(
            "/var/log/mixed.log",
            vec![
                "2024-01-15 10:30:25.123 [INFO]: Application started successfully".into(),
                "2024-01-15 10:30:26.456 [WARNING]: High memory usage detected".into(),
                "2024-01-15 10:30:27.789 [ERROR]: Database connection failed".into(),
                "2024-01-15 10:30:28.012 [INFO]: Retrying database connection".into(),
                "2024-01-15 10:30:29.345 [ERROR]: Connection retry failed".into(),
                "2024-01-15 10:30:30.678 [FATAL]: System shutdown initiated".into(),
                r#"192.168.1.100 - - [15/Jan/2024:10:30:31 -0700] "GET /index.html HTTP/1.1" 200 2326"#.into(),
                r#"192.168.1.101 - - [15/Jan/2024:10:30:32 -0700] "POST /login HTTP/1.1" 401 234"#.into(),
                r#"192.168.1.102 - - [15/Jan/2024:10:30:33 -0700] "GET /admin HTTP/1.1" 403 145"#.into(),
                "Jan 15 10:30:34 server01 apache[1234]: Configuration reloaded".into(),
                "Jan 15 10:30:35 server01 mysql[5678]: Database connection restored".into(),
            ],
        );
        m
    }

    /// Application log with a blank line, a comment and unrecognized lines.
    pub fn with_application_sample() -> Self {
        let mut m = Self::new();
        m.add_file(
            "/var/log/app.log",
            vec![
                "2024-01-15 08:00:01,001 INFO: Starting worker pool".into(),
                "2024-01-15 08:00:05,250 DEBUG: Loaded 12 plugins".into(),
                "".into(),
                "# rotated by logrotate".into(),
                "2024-01-15 09:15:00,000 WARN: Slow query took 2300ms".into(),
                "2024-01-15 09:15:02,500 ERROR: Timeout talking to payments".into(),
                "payments-client ERROR Timeout talking to payments".into(),
                "2024-01-15 13:45:10,100 ERROR: Timeout talking to payments".into(),
                "stack frame at 0x7ffe1234".into(),
                "2024-01-15 13:46:00,000 INFO: Recovered".into(),
            ],
        );
        m
    }

    /// BSD syslog without priority prefixes.
    pub fn with_syslog_sample() -> Self {
        let mut m = Self::new();
        m.add_file(
            "/var/log/syslog",
            vec![
                "Jan 15 12:00:01 edge1 myapp[1234]: Service started successfully".into(),
                "Jan 15 12:00:05 edge1 myapp[1234]: ERROR failed to connect to database".into(),
                "Jan 15 12:00:10 edge1 kernel: eth0: link up".into(),
                "Jan 15 13:00:15 edge1 cron[5678]: (root) CMD (/usr/bin/healthcheck)".into(),
                "Jan 15 13:00:20 edge1 myapp[1234]: WARNING disk usage at 91%".into(),
            ],
        );
        m
    }
}

impl Default for MockLogSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSource for MockLogSource {
    fn open(&self, path: &str) -> LogResult<Box<dyn BufRead + Send + '_>> {
        if self.denied.contains(path) {
            return Err(LogError::PermissionDenied {
                path: path.to_string(),
            });
        }
        self.files
            .get(path)
            .map(|bytes| Box::new(Cursor::new(bytes.as_slice())) as Box<dyn BufRead + Send + '_>)
            .ok_or_else(|| LogError::NotFound {
                path: path.to_string(),
            })
    }
}
