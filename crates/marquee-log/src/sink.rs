// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The shared, mutex-guarded JSON line writer.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

/// Severity of a log entry. Ordering is significant: entries below the
/// sink's minimum are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Info,
    Error,
    Fatal,
    Off,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
            Level::Off => "OFF",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown log level `{0}` (expected one of: info, error, fatal, off)")]
pub struct UnknownLevel(pub String);

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Level::Info),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            "off" => Ok(Level::Off),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

#[derive(Serialize)]
struct Entry<'a> {
    level: &'static str,
    time: String,
    message: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    properties: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<String>,
}

/// A cloneable handle to one output stream. Every clone writes through the
/// same lock, so lines from concurrent callers never interleave.
#[derive(Clone)]
pub struct JsonSink {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
    min_level: Level,
}

impl fmt::Debug for JsonSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSink")
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

impl JsonSink {
    pub fn new(out: impl Write + Send + 'static, min_level: Level) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
            min_level,
        }
    }

    pub fn stdout(min_level: Level) -> Self {
        Self::new(io::stdout(), min_level)
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    /// Writes one entry. Entries below the minimum level are a successful no-op
    /// returning 0.
    pub fn print(
        &self,
        level: Level,
        message: &str,
        properties: &BTreeMap<String, String>,
    ) -> io::Result<usize> {
        if level < self.min_level || level == Level::Off {
            return Ok(0);
        }

        let trace = (level >= Level::Error)
            .then(|| std::backtrace::Backtrace::force_capture().to_string());

        let entry = Entry {
            level: level.as_str(),
            time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            message,
            properties,
            trace,
        };

        let mut line = match serde_json::to_vec(&entry) {
            Ok(line) => line,
            Err(e) => format!(
                "{{\"level\":\"ERROR\",\"message\":\"unable to marshal log message: {}\"}}",
                e.to_string().replace('"', "'")
            )
            .into_bytes(),
        };
        line.push(b'\n');

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(&line)?;
        out.flush()?;
        Ok(line.len())
    }

    /// An `io::Write` adapter that logs each write as an ERROR entry.
    pub fn writer(&self) -> SinkWriter {
        SinkWriter { sink: self.clone() }
    }
}

/// Error-output adapter over a [`JsonSink`].
#[derive(Debug, Clone)]
pub struct SinkWriter {
    sink: JsonSink,
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        self.sink
            .print(Level::Error, text.trim_end(), &BTreeMap::new())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// In-memory writer for tests.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct Capture(pub Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl Capture {
    pub fn lines(&self) -> Vec<serde_json::Value> {
        let buf = self.0.lock().unwrap();
        String::from_utf8(buf.clone())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

#[cfg(test)]
impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
