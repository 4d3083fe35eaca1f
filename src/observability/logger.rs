//! Structured JSON logger
//!
//! - One log line = one event
//! - Key order: event, severity, ts, then fields sorted by key
//! - Synchronous, no buffering
//! - ERROR lines go to stderr, everything else to stdout

use std::fmt;
use std::io::{self, Write};

use chrono::{SecondsFormat, Utc};

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Normal operations
    Info = 1,
    /// Recoverable issues or operator attention needed
    Warn = 2,
    /// Operation failures
    Error = 3,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger that outputs JSON lines
pub struct Logger;

impl Logger {
    /// Log an event at its own severity.
    pub fn log(event: Event, fields: &[(&str, &str)]) {
        let severity = event.severity();
        let line = Self::render(severity, event, fields);
        if severity >= Severity::Error {
            Self::write_line(&line, &mut io::stderr());
        } else {
            Self::write_line(&line, &mut io::stdout());
        }
    }

    fn write_line<W: Write>(line: &str, writer: &mut W) {
        // One write per line; a failed log write never fails the run.
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    /// Render one event as a single JSON line.
    fn render(severity: Severity, event: Event, fields: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(256);
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        output.push('{');
        Self::push_pair(&mut output, "event", event.as_str());
        output.push(',');
        Self::push_pair(&mut output, "severity", severity.as_str());
        output.push(',');
        Self::push_pair(&mut output, "ts", &ts);

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push(',');
            Self::push_pair(&mut output, key, value);
        }

        output.push('}');
        output.push('\n');
        output
    }

    fn push_pair(output: &mut String, key: &str, value: &str) {
        // Serializing a &str cannot fail.
        output.push_str(&serde_json::to_string(key).unwrap_or_default());
        output.push(':');
        output.push_str(&serde_json::to_string(value).unwrap_or_default());
    }
}

/// Render a log line without writing it.
#[cfg(test)]
pub fn capture_log(event: Event, fields: &[(&str, &str)]) -> String {
    Logger::render(event.severity(), event, fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_log_json_format() {
        let output = capture_log(Event::RunStart, &[]);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "RUN_BEGIN");
        assert_eq!(parsed["severity"], "INFO");
        assert!(parsed["ts"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_log_with_fields() {
        let output = capture_log(
            Event::PromotionFailed,
            &[("index", "logs"), ("attempts", "3")],
        );

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["index"], "logs");
        assert_eq!(parsed["attempts"], "3");
        assert_eq!(parsed["severity"], "ERROR");
    }

    #[test]
    fn test_log_field_ordering() {
        let output = capture_log(
            Event::ReconcileSummary,
            &[("zebra", "1"), ("apple", "2"), ("mango", "3")],
        );

        let event_pos = output.find("\"event\"").unwrap();
        let ts_pos = output.find("\"ts\"").unwrap();
        let apple_pos = output.find("apple").unwrap();
        let mango_pos = output.find("mango").unwrap();
        let zebra_pos = output.find("zebra").unwrap();

        assert!(event_pos < ts_pos);
        assert!(ts_pos < apple_pos);
        assert!(apple_pos < mango_pos);
        assert!(mango_pos < zebra_pos);
    }

    #[test]
    fn test_log_escapes_special_chars() {
        let output = capture_log(
            Event::FollowFailed,
            &[("error", "reason \"quoted\"\nline2")],
        );

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["error"], "reason \"quoted\"\nline2");
    }

    #[test]
    fn test_log_one_line() {
        let output = capture_log(Event::RunComplete, &[("a", "1"), ("b", "2")]);

        assert_eq!(output.chars().filter(|c| *c == '\n').count(), 1);
        assert!(output.ends_with('\n'));
    }
}
