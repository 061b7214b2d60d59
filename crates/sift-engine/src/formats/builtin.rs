//! Built-in format specs, in priority order.
//!
//! Dense web-server access formats come first (they require an address and
//! a request line), then the timestamped application format, then syslog.

use std::sync::LazyLock;

use super::{FieldMapper, FieldRule, FormatSpec, LevelRule};
use crate::timestamp::TimestampFormat;
use crate::types::{LogLevel, level_keyword_alternation};

pub const APACHE_ACCESS: &str = "apache_access";
pub const IIS_W3C: &str = "iis_w3c";
pub const APPLICATION: &str = "application";
pub const SYSLOG: &str = "syslog";

// Apache/Nginx common or combined log format:
// 127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /a.gif HTTP/1.0" 200 2326 "ref" "ua"
const APACHE_ACCESS_PATTERN: &str = concat!(
    r#"^(?P<ip>\d{1,3}(?:\.\d{1,3}){3}) (?P<ident>\S+) (?P<user>\S+) "#,
    r#"\[(?P<timestamp>[^\]]+)\] "#,
    r#""(?P<method>[A-Z]+) (?P<url>\S+) (?P<protocol>[^"]+)" "#,
    r#"(?P<status>\d{3}) (?P<size>\d+|-)"#,
    r#"(?: "(?P<referer>[^"]*)" "(?P<user_agent>[^"]*)")?"#,
);

// IIS W3C extended (default field set):
// date time s-ip cs-method cs-uri-stem cs-uri-query s-port cs-username c-ip
// cs(User-Agent) cs(Referer) sc-status sc-substatus sc-win32-status time-taken
const IIS_W3C_PATTERN: &str = concat!(
    r"^(?P<timestamp>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}) ",
    r"(?P<server_ip>\S+) (?P<method>[A-Z]+) (?P<uri>\S+) (?P<query>\S+) ",
    r"(?P<port>\d+) (?P<username>\S+) (?P<client_ip>\S+) ",
    r"(?P<user_agent>\S+) (?P<referer>\S+) ",
    r"(?P<status>\d{3}) (?P<substatus>\d+) (?P<win32_status>\d+) (?P<time_taken>\d+)\s*$",
);

// 2024-01-15 14:30:25,456 [INFO]: message
fn application_pattern() -> String {
    format!(
        concat!(
            r"^(?P<timestamp>\d{{4}}-\d{{2}}-\d{{2}}[T ]\d{{2}}:\d{{2}}:\d{{2}}(?:[.,]\d+)?(?:Z|[+-]\d{{2}}:?\d{{2}})?)\s+",
            r"\[?(?P<level>(?i:{levels}))\b\]?",
            r"\s*(?:[:|-]\s*)?(?P<message>.*)$",
        ),
        levels = level_keyword_alternation(),
    )
}

// [<PRI>]Jan 15 14:30:25 host tag[pid]: message
const SYSLOG_PATTERN: &str = concat!(
    r"^(?:<(?P<pri>\d{1,3})>)?",
    r"(?P<timestamp>[A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+",
    r"(?P<hostname>\S+)\s+(?P<source>[^\s\[:]+)(?:\[(?P<pid>\d+)\])?:\s*(?P<message>.*)$",
);

static BUILTIN_FORMATS: LazyLock<Vec<FormatSpec>> = LazyLock::new(|| {
    vec![
        FormatSpec::new(
            APACHE_ACCESS,
            APACHE_ACCESS_PATTERN,
            FieldMapper::new()
                .level(LevelRule::HttpStatus("status".into()))
                .message(FieldRule::Template("${method} ${url} - ${status}".into()))
                .source(FieldRule::Fixed("apache".into()))
                .fields([
                    "ip",
                    "method",
                    "url",
                    "protocol",
                    "status",
                    "size",
                    "referer",
                    "user_agent",
                ]),
        )
        .unwrap()
        .with_timestamp_hint(TimestampFormat::new("%d/%b/%Y:%H:%M:%S %z")),
        FormatSpec::new(
            IIS_W3C,
            IIS_W3C_PATTERN,
            FieldMapper::new()
                .level(LevelRule::HttpStatus("status".into()))
                .message(FieldRule::Template("${method} ${uri} - ${status}".into()))
                .source(FieldRule::Fixed("iis".into()))
                .fields([
                    "server_ip",
                    "client_ip",
                    "method",
                    "uri",
                    "query",
                    "port",
                    "username",
                    "status",
                    "substatus",
                    "win32_status",
                    "time_taken",
                ]),
        )
        .unwrap()
        .with_timestamp_hint(TimestampFormat::new("%Y-%m-%d %H:%M:%S")),
        // No hint: separators, fractions and offsets vary, the default list covers them.
        FormatSpec::new(
            APPLICATION,
            &application_pattern(),
            FieldMapper::new().level(LevelRule::Capture("level".into())),
        )
        .unwrap(),
        FormatSpec::new(
            SYSLOG,
            SYSLOG_PATTERN,
            FieldMapper::new()
                .level(LevelRule::SyslogPriority("pri".into()))
                .level(LevelRule::Scan("message".into()))
                .level(LevelRule::Fixed(LogLevel::Info))
                .source(FieldRule::Capture("source".into()))
                .fields(["hostname", "pid"]),
        )
        .unwrap()
        .with_timestamp_hint(TimestampFormat::new("%b %e %H:%M:%S")),
    ]
});

/// A fresh copy of the built-in cascade. Regexes are compiled once and shared.
pub fn all_formats() -> Vec<FormatSpec> {
    BUILTIN_FORMATS.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::FormatRegistry;

    fn matched(line: &str) -> Option<String> {
        FormatRegistry::with_defaults()
            .find_match(line)
            .map(|m| m.spec().name().to_string())
    }

    #[test]
    fn priority_order() {
        let names: Vec<_> = all_formats().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec![APACHE_ACCESS, IIS_W3C, APPLICATION, SYSLOG]);
    }

    #[test]
    fn apache_common_line() {
        let registry = FormatRegistry::with_defaults();
        let m = registry
            .find_match(r#"192.168.1.1 - - [10/Oct/2000:13:55:36 -0700] "GET /x HTTP/1.0" 200 2326"#)
            .unwrap();
        assert_eq!(m.spec().name(), APACHE_ACCESS);
        assert_eq!(m.get("method"), Some("GET"));
        assert_eq!(m.get("status"), Some("200"));
        assert_eq!(m.timestamp_text(), Some("10/Oct/2000:13:55:36 -0700"));
        assert_eq!(m.level(), LogLevel::Info);
        assert_eq!(m.message().as_deref(), Some("GET /x - 200"));
        assert_eq!(m.source().as_deref(), Some("apache"));
        assert!(m.extra_fields().get("referer").is_none());
    }

    #[test]
    fn apache_combined_line() {
        let registry = FormatRegistry::with_defaults();
        let m = registry
            .find_match(
                r#"10.0.0.7 - alice [15/Jan/2024:10:30:33 +0000] "POST /login HTTP/1.1" 401 - "https://ex.com/" "curl/8.0""#,
            )
            .unwrap();
        assert_eq!(m.level(), LogLevel::Error);
        let fields = m.extra_fields();
        assert_eq!(fields["size"], "-");
        assert_eq!(fields["referer"], "https://ex.com/");
        assert_eq!(fields["user_agent"], "curl/8.0");
    }

    #[test]
    fn iis_line() {
        let line = "2024-01-15 10:30:25 10.0.0.1 GET /default.htm - 80 - 192.168.0.9 Mozilla/5.0 - 404 0 2 15";
        let registry = FormatRegistry::with_defaults();
        let m = registry.find_match(line).unwrap();
        assert_eq!(m.spec().name(), IIS_W3C);
        assert_eq!(m.level(), LogLevel::Error);
        assert_eq!(m.message().as_deref(), Some("GET /default.htm - 404"));
        assert_eq!(m.extra_fields()["client_ip"], "192.168.0.9");
    }

    #[test]
    fn application_variants() {
        assert_eq!(
            matched("2024-01-15 14:30:25,456 INFO: Application started successfully").as_deref(),
            Some(APPLICATION)
        );
        assert_eq!(
            matched("2024-01-15 10:30:25.123 [ERROR]: Database connection failed").as_deref(),
            Some(APPLICATION)
        );
        assert_eq!(
            matched("2024-01-15T10:30:25Z warn - cache miss").as_deref(),
            Some(APPLICATION)
        );
    }

    #[test]
    fn application_accepts_every_level_alias() {
        let registry = FormatRegistry::with_defaults();
        for word in crate::types::LEVEL_KEYWORDS {
            let line = format!("2024-01-15 10:30:25 [{word}]: payload");
            let m = registry.find_match(&line).unwrap();
            assert_eq!(m.spec().name(), APPLICATION, "{word}");
            assert_eq!(Some(m.level()), LogLevel::from_token(word));
        }
        let m = registry.find_match("2024-01-15 10:30:25 PANIC: out of memory").unwrap();
        assert_eq!(m.level(), LogLevel::Fatal);
        assert_eq!(m.message().as_deref(), Some("out of memory"));
    }

    #[test]
    fn application_message_and_level() {
        let registry = FormatRegistry::with_defaults();
        let m = registry
            .find_match("2024-01-15 10:30:27.789 [ERROR]: Database connection failed")
            .unwrap();
        assert_eq!(m.level(), LogLevel::Error);
        assert_eq!(m.message().as_deref(), Some("Database connection failed"));
    }

    #[test]
    fn application_requires_level_word() {
        // A timestamp followed by prose is not the application format.
        assert_eq!(matched("2024-01-15 12:00:01 Starting application"), None);
        assert_eq!(matched("2024-01-15 12:00:01 INFORMATIONAL text"), None);
    }

    #[test]
    fn syslog_line() {
        let registry = FormatRegistry::with_defaults();
        let m = registry
            .find_match("Jan 15 14:30:25 server01 apache[1234]: Configuration reloaded")
            .unwrap();
        assert_eq!(m.spec().name(), SYSLOG);
        assert_eq!(m.source().as_deref(), Some("apache"));
        assert_eq!(m.message().as_deref(), Some("Configuration reloaded"));
        assert_eq!(m.level(), LogLevel::Info);
        let fields = m.extra_fields();
        assert_eq!(fields["hostname"], "server01");
        assert_eq!(fields["pid"], "1234");
    }

    #[test]
    fn syslog_with_priority_and_keyword() {
        let registry = FormatRegistry::with_defaults();
        let m = registry
            .find_match("<131>Jan 15 12:00:05 edge1 myapp[1234]: Failed to connect")
            .unwrap();
        assert_eq!(m.level(), LogLevel::Error);

        let m = registry
            .find_match("Jan  5 08:00:00 edge1 kernel: WARNING: CPU throttled")
            .unwrap();
        assert_eq!(m.source().as_deref(), Some("kernel"));
        assert_eq!(m.level(), LogLevel::Warning);
    }

    #[test]
    fn apache_preferred_over_generic() {
        // Contains "ERROR" in the URL but is an access line.
        assert_eq!(
            matched(r#"1.2.3.4 - - [15/Jan/2024:10:30:31 -0700] "GET /ERROR HTTP/1.1" 200 12"#).as_deref(),
            Some(APACHE_ACCESS)
        );
    }

    #[test]
    fn garbage_matches_nothing() {
        assert_eq!(matched("%%% random ERROR noise"), None);
    }
}
