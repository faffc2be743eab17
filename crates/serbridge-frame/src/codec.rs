use bytes::{Buf, BufMut, BytesMut};
use chrono::{DateTime, Local};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{FrameError, Result};
use crate::line::{Line, LineFramer};

/// `tokio_util` codec over [`LineFramer`].
///
/// Decoding consumes the source buffer byte by byte; bytes of an unfinished
/// line live in the framer, not in the caller's buffer. Encoding writes a
/// text line followed by LF.
#[derive(Debug, Clone)]
pub struct LineCodec {
    framer: LineFramer,
    clock: fn() -> DateTime<Local>,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::with_clock(Local::now)
    }

    /// Codec stamping lines with a custom clock.
    pub fn with_clock(clock: fn() -> DateTime<Local>) -> Self {
        Self {
            framer: LineFramer::new(),
            clock,
        }
    }

    /// Codec keeping up to `capacity` bytes of each line instead of
    /// [`LINE_CAPACITY`](crate::ring::LINE_CAPACITY).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            framer: LineFramer::with_capacity(capacity),
            clock: Local::now,
        }
    }

    /// Discard the line in progress.
    pub fn reset(&mut self) {
        self.framer.reset();
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = Line;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Line>> {
        while src.has_remaining() {
            let byte = src.get_u8();
            if let Some(line) = self.framer.push(byte, self.clock) {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}

impl<'a> Encoder<&'a str> for LineCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a str, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(item.len() + 1);
        dst.put_slice(item.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
