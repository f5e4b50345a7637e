//! # Diagnostic Log
//!
//! Plain-text, append-only log of failures worth a human look. One file per
//! calendar day:
//!
//! ```text
//! <log dir>/Log_26-10-18.txt
//! ```
//!
//! Each entry is framed by a date-stamped separator line:
//!
//! ```text
//! ===== 2026-10-18 14:03:22 =====
//! unauthorized: (401) Unauthorized
//! Headers:
//!   x-ms-diagnostics:
//!       3000003;reason="Invalid audience Uri"
//! <stack trace, if any>
//! ===== 2026-10-18 14:03:22 =====
//! ```
//!
//! Writes go through [`RetryingFileWriter::write_or_drop`]: losing a log line
//! is acceptable, failing the caller because the log file is locked is not.

use crate::classify::{describe_failure, RemoteFailure};
use crate::error::Result;
use crate::writer::{ensure_file, FileSink, FsSink, RetryingFileWriter, WriteMode};
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEntry {
    pub message: String,
    pub headers: Vec<(String, String)>,
    pub stack_trace: Option<String>,
}

impl LogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }

    /// Classified message plus every response header of the failure.
    pub fn from_failure(failure: &RemoteFailure) -> Self {
        Self::described(failure, &describe_failure(failure))
    }

    fn described(failure: &RemoteFailure, description: &str) -> Self {
        let mut entry = Self::new(format!("{}\n{}", description, failure.message));
        if let Some(response) = &failure.response {
            for (name, value) in &response.headers {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                entry = entry.with_header(name.as_str(), value);
            }
        }
        entry
    }
}

pub fn log_file_name(date: NaiveDate) -> String {
    format!("Log_{}.txt", date.format("%y-%m-%d"))
}

pub fn format_entry(entry: &LogEntry, at: NaiveDateTime) -> String {
    let separator = format!("===== {} =====", at.format("%Y-%m-%d %H:%M:%S"));
    let mut out = String::new();

    out.push_str(&separator);
    out.push('\n');
    out.push_str(entry.message.trim_end());
    out.push('\n');

    if !entry.headers.is_empty() {
        out.push_str("Headers:\n");
        for (name, value) in &entry.headers {
            out.push_str(&format!("  {}:\n      {}\n", name, value));
        }
    }

    if let Some(trace) = &entry.stack_trace {
        out.push_str(trace.trim_end());
        out.push('\n');
    }

    out.push_str(&separator);
    out.push('\n');
    out
}

pub struct DiagnosticLog<S: FileSink = FsSink> {
    dir: PathBuf,
    writer: RetryingFileWriter<S>,
}

impl<S: FileSink> DiagnosticLog<S> {
    pub fn new(dir: impl Into<PathBuf>, writer: RetryingFileWriter<S>) -> Self {
        Self {
            dir: dir.into(),
            writer,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(log_file_name(date))
    }

    /// Makes sure today's log file exists, returning its path.
    pub fn ensure_today(&self) -> Result<PathBuf> {
        ensure_file(&self.dir, &log_file_name(Local::now().date_naive()))
    }

    pub fn log(&self, entry: &LogEntry) {
        self.log_at(entry, Local::now().naive_local());
    }

    pub fn log_at(&self, entry: &LogEntry, at: NaiveDateTime) {
        let path = self.path_for(at.date());
        self.writer
            .write_or_drop(&path, &format_entry(entry, at), WriteMode::Append);
    }

    /// Logs a classified remote failure and hands the message back for display.
    pub fn log_failure(&self, failure: &RemoteFailure) -> String {
        let description = describe_failure(failure);
        tracing::warn!("{}", description);
        self.log(&LogEntry::described(failure, &description));
        description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{FailureResponse, DIAGNOSTICS_HEADER};
    use crate::writer::RetryPolicy;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use std::fs;
    use tempfile::TempDir;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_log_file_name_pattern() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(log_file_name(date), "Log_26-03-07.txt");
    }

    #[test]
    fn test_format_entry_framing() {
        let entry = LogEntry::new("something broke")
            .with_header("x-request-id", "abc")
            .with_stack_trace("at foo\nat bar");
        let text = format_entry(&entry, at(2026, 10, 18));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.first(), Some(&"===== 2026-10-18 09:05:07 ====="));
        assert_eq!(lines.last(), Some(&"===== 2026-10-18 09:05:07 ====="));
        assert_eq!(lines[1], "something broke");
        assert_eq!(lines[2], "Headers:");
        assert_eq!(lines[3], "  x-request-id:");
        assert_eq!(lines[4], "      abc");
        assert_eq!(lines[5], "at foo");
    }

    #[test]
    fn test_format_entry_without_optional_parts() {
        let text = format_entry(&LogEntry::new("plain"), at(2026, 1, 2));
        assert_eq!(text.lines().count(), 3);
        assert!(!text.contains("Headers:"));
    }

    #[test]
    fn test_entries_append_to_daily_file() {
        let dir = TempDir::new().unwrap();
        let log = DiagnosticLog::new(dir.path().join("logs"), RetryingFileWriter::new(RetryPolicy::default()));

        log.log_at(&LogEntry::new("first"), at(2026, 10, 18));
        log.log_at(&LogEntry::new("second"), at(2026, 10, 18));
        log.log_at(&LogEntry::new("next day"), at(2026, 10, 19));

        let day_one = fs::read_to_string(dir.path().join("logs/Log_26-10-18.txt")).unwrap();
        assert!(day_one.contains("first"));
        assert!(day_one.contains("second"));
        assert!(!day_one.contains("next day"));

        let day_two = fs::read_to_string(dir.path().join("logs/Log_26-10-19.txt")).unwrap();
        assert!(day_two.contains("next day"));
    }

    #[test]
    fn test_log_failure_includes_headers() {
        let dir = TempDir::new().unwrap();
        let log = DiagnosticLog::new(dir.path(), RetryingFileWriter::new(RetryPolicy::default()));

        let mut headers = HeaderMap::new();
        headers.insert(
            DIAGNOSTICS_HEADER,
            HeaderValue::from_static(r#"3000003;reason="Invalid audience Uri""#),
        );
        let failure = crate::classify::RemoteFailure::with_response(
            "token request rejected",
            FailureResponse::new(StatusCode::UNAUTHORIZED).with_headers(headers),
        );

        let message = log.log_failure(&failure);
        assert_eq!(message, "Invalid audience Uri: (401) Unauthorized");

        let path = log.ensure_today().unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("Invalid audience Uri: (401) Unauthorized"));
        assert!(text.contains("token request rejected"));
        assert!(text.contains("  x-ms-diagnostics:"));
    }

    #[test]
    fn test_ensure_today_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let log = DiagnosticLog::new(dir.path().join("fresh"), RetryingFileWriter::new(RetryPolicy::default()));
        let path = log.ensure_today().unwrap();
        assert!(path.exists());
        assert_eq!(path, log.path_for(Local::now().date_naive()));
    }
}
