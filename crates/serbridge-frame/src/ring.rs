/// Capacity of the line ring: enough for any realistic serial line.
pub const LINE_CAPACITY: usize = 4096;

/// Fixed-capacity ring holding the tail of the line in progress.
///
/// Writing past capacity overwrites the oldest bytes, so [`LineRing::contents`]
/// always returns the most recent `capacity` bytes written since the last
/// [`LineRing::reset`].
#[derive(Debug, Clone)]
pub struct LineRing {
    buf: Box<[u8]>,
    head: usize,
    len: usize,
    total_written: u64,
}

impl LineRing {
    /// Create a ring with the given capacity (at least one byte).
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity.max(1)].into_boxed_slice(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Append one byte, dropping the oldest byte if the ring is full.
    pub fn push(&mut self, byte: u8) {
        let cap = self.buf.len();
        self.buf[self.head] = byte;
        self.head = (self.head + 1) % cap;
        self.len = (self.len + 1).min(cap);
        self.total_written += 1;
    }

    /// Append a run of bytes.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// Buffered bytes, oldest first.
    pub fn contents(&self) -> Vec<u8> {
        let cap = self.buf.len();
        let start = (self.head + cap - self.len) % cap;
        let mut out = Vec::with_capacity(self.len);
        if start + self.len <= cap {
            out.extend_from_slice(&self.buf[start..start + self.len]);
        } else {
            out.extend_from_slice(&self.buf[start..]);
            out.extend_from_slice(&self.buf[..self.head]);
        }
        out
    }

    /// Forget everything written so far.
    pub fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
        self.total_written = 0;
    }

    /// Bytes written since the last reset, including overwritten ones.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Default for LineRing {
    fn default() -> Self {
        Self::new(LINE_CAPACITY)
    }
}
