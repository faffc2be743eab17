/// Errors that can occur during line or packet framing.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A datagram is larger than a packet frame may carry.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A two-character group in a `pktout` line is not valid hex.
    #[error("invalid hex group {group:?} at offset {offset}")]
    InvalidHex { offset: usize, group: String },

    /// A `pktout` line has an odd number of hex digits before `$`.
    #[error("odd hex digit count ({digits}), trailing digit ignored")]
    OddLength { digits: usize },

    /// An I/O error surfaced through the codec.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
