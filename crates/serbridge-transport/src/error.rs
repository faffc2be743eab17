/// Errors that can occur in bridge transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open serial device {device} at {baud} baud: {source}")]
    Open {
        device: String,
        baud: u32,
        source: tokio_serial::Error,
    },

    /// Failed to enumerate serial ports.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(tokio_serial::Error),

    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on an endpoint.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The other side of a byte channel has gone away.
    #[error("byte channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
