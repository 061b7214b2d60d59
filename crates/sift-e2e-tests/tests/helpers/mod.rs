//! Shared test harness for E2E tests.
//!
//! Writes fixtures into a temporary directory and drives the engine and
//! the CLI runner against them, exercising real file I/O end to end.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tempfile::TempDir;

use sift_cli::Args;

/// Mixed-format log: application, Apache access and syslog lines.
pub const MIXED_LOG: &[&str] = &[
    "2024-01-15 10:30:25.123 [INFO]: Application started successfully",
    "2024-01-15 10:30:26.456 [WARNING]: High memory usage detected",
    "2024-01-15 10:30:27.789 [ERROR]: Database connection failed",
    "2024-01-15 10:30:28.012 [INFO]: Retrying database connection",
    "2024-01-15 10:30:29.345 [ERROR]: Connection retry failed",
    "2024-01-15 10:30:30.678 [FATAL]: System shutdown initiated",
    r#"192.168.1.100 - - [15/Jan/2024:10:30:31 -0700] "GET /index.html HTTP/1.1" 200 2326"#,
    r#"192.168.1.101 - - [15/Jan/2024:10:30:32 -0700] "POST /login HTTP/1.1" 401 234"#,
    r#"192.168.1.102 - - [15/Jan/2024:10:30:33 -0700] "GET /admin HTTP/1.1" 403 145"#,
    "Jan 15 10:30:34 server01 apache[1234]: Configuration reloaded",
    "Jan 15 10:30:35 server01 mysql[5678]: Database connection restored",
];

/// IIS W3C log with its `#` directive header.
pub const IIS_LOG: &[&str] = &[
    "#Software: Microsoft Internet Information Services 10.0",
    "#Version: 1.0",
    "#Date: 2024-01-16 00:00:00",
    "#Fields: date time s-ip cs-method cs-uri-stem cs-uri-query s-port cs-username c-ip cs(User-Agent) cs(Referer) sc-status sc-substatus sc-win32-status time-taken",
    "2024-01-16 00:00:01 10.0.0.5 GET /default.htm - 80 - 203.0.113.9 Mozilla/5.0 - 200 0 0 31",
    "2024-01-16 00:00:02 10.0.0.5 GET /missing.htm - 80 - 203.0.113.9 Mozilla/5.0 - 404 0 2 4",
    "2024-01-16 00:00:03 10.0.0.5 POST /api/orders - 443 - 198.51.100.7 curl/8.0 - 500 0 0 120",
];

pub struct TestHarness {
    dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `lines` (newline-terminated) to `name`.
    pub fn write_log(&self, name: &str, lines: &[&str]) -> PathBuf {
        let path = self.path(name);
        let mut file = std::fs::File::create(&path).expect("create log");
        for line in lines {
            writeln!(file, "{line}").expect("write log line");
        }
        path
    }

    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, bytes).expect("write bytes");
        path
    }

    pub fn write_config(&self, toml: &str) -> PathBuf {
        let path = self.path("logsift.toml");
        std::fs::write(&path, toml).expect("write config");
        path
    }

    /// Parse a CLI argument vector (program name included).
    pub fn args(&self, argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("valid arguments")
    }

    /// Run the CLI and return stdout, or the error chain.
    pub async fn run(&self, argv: &[&str]) -> Result<String, String> {
        let args = self.args(argv);
        let mut out = Vec::new();
        match sift_cli::run(&args, &mut out).await {
            Ok(()) => Ok(String::from_utf8(out).expect("utf-8 report")),
            Err(e) => Err(format!("{e:#}")),
        }
    }
}

pub fn path_str(path: &std::path::Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}
