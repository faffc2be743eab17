use chrono::{DateTime, Local};

use crate::ring::LineRing;
use crate::text::{coerce_utf8, format_log_line};

const CR: u8 = 0x0D;
const LF: u8 = 0x0A;

/// One completed line: its bytes (CR removed, LF excluded) and the time its
/// first byte arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    bytes: Vec<u8>,
    started_at: DateTime<Local>,
}

impl Line {
    pub fn new(bytes: Vec<u8>, started_at: DateTime<Local>) -> Self {
        Self { bytes, started_at }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// The line as text, cut back to its longest valid UTF-8 prefix.
    pub fn text(&self) -> &str {
        coerce_utf8(&self.bytes)
    }

    /// Timestamped, whitespace-trimmed form of the line, or `None` when
    /// nothing is left after trimming.
    pub fn to_log_line(&self) -> Option<String> {
        let text = self.text().trim_end_matches([' ', '\t', '\r', '\n']);
        if text.is_empty() {
            return None;
        }
        Some(format_log_line(&self.started_at, text))
    }
}

/// Accumulates bytes into lines.
///
/// CR bytes are discarded, LF ends the line. The line keeps at most the
/// ring capacity worth of its most recent bytes.
#[derive(Debug, Clone, Default)]
pub struct LineFramer {
    ring: LineRing,
    started_at: Option<DateTime<Local>>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Framer with a custom ring capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ring: LineRing::new(capacity),
            started_at: None,
        }
    }

    /// Feed one byte. `now` is only called when the byte starts a new line.
    pub fn push(&mut self, byte: u8, now: impl FnOnce() -> DateTime<Local>) -> Option<Line> {
        match byte {
            LF => {
                let started_at = self.started_at.take().unwrap_or_else(now);
                let bytes = self.ring.contents();
                self.ring.reset();
                Some(Line::new(bytes, started_at))
            }
            CR => None,
            _ => {
                if self.ring.total_written() == 0 {
                    self.started_at = Some(now());
                }
                self.ring.push(byte);
                None
            }
        }
    }

    /// Discard the line in progress.
    pub fn reset(&mut self) {
        self.ring.reset();
        self.started_at = None;
    }

    /// True when no byte of a new line has been seen yet.
    pub fn is_idle(&self) -> bool {
        self.ring.total_written() == 0
    }
}
