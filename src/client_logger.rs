//! Logging hook for completion traffic.
//!
//! This module provides the [`CompletionLogger`] trait, which sees every request body a
//! backend sends, every fragment it receives, and the outcome of each turn, plus
//! [`FileLogger`], which records them as JSON lines.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::{Error, Result};

/// A trait for logging completion traffic.
///
/// Implementations must be cheap and infallible from the caller's point of view; a
/// logger that cannot write drops the record.
pub trait CompletionLogger: Send + Sync {
    /// Log the request body a backend is about to send.
    fn log_request(&self, backend: &str, body: &Value);

    /// Log one streamed text fragment.
    fn log_fragment(&self, fragment: &str);

    /// Log the assembled reply of a completed turn.
    fn log_reply(&self, reply: &str);

    /// Log the error that failed a turn.
    fn log_failure(&self, error: &Error);
}

/// Appends one JSON object per event to a file.
pub struct FileLogger {
    writer: Mutex<BufWriter<File>>,
}

impl FileLogger {
    /// Opens `path` for appending, creating it if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .map_err(|err| Error::io("failed to open log file", err))?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn record(&self, kind: &str, mut fields: Value) {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        if let Value::Object(map) = &mut fields {
            map.insert("ts".to_string(), Value::String(timestamp));
            map.insert("kind".to_string(), Value::String(kind.to_string()));
        }
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        if serde_json::to_writer(&mut *writer, &fields).is_ok() {
            let _ = writer.write_all(b"\n");
            let _ = writer.flush();
        }
    }
}

impl CompletionLogger for FileLogger {
    fn log_request(&self, backend: &str, body: &Value) {
        self.record("request", json!({ "backend": backend, "body": body }));
    }

    fn log_fragment(&self, fragment: &str) {
        self.record("fragment", json!({ "text": fragment }));
    }

    fn log_reply(&self, reply: &str) {
        self.record("reply", json!({ "text": reply }));
    }

    fn log_failure(&self, error: &Error) {
        self.record("failure", json!({ "error": error.to_string() }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("gamechat-{}-{name}.jsonl", std::process::id()))
    }

    #[test]
    fn writes_json_lines() {
        let path = temp_log_path("writes");
        let _ = std::fs::remove_file(&path);
        {
            let logger = FileLogger::create(&path).unwrap();
            logger.log_request("Groq", &json!({ "model": "m" }));
            logger.log_fragment("Try ");
            logger.log_reply("Try Hollow Knight!");
            logger.log_failure(&Error::authentication("invalid API key"));
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["kind"], "request");
        assert_eq!(lines[0]["body"]["model"], "m");
        assert_eq!(lines[1]["text"], "Try ");
        assert_eq!(lines[2]["kind"], "reply");
        assert_eq!(lines[3]["error"], "Authentication error: invalid API key");
        assert!(lines[3]["ts"].as_str().unwrap().contains('T'));
        let _ = std::fs::remove_file(&path);
    }
}
