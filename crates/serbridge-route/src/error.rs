/// Errors that can occur while routing bytes between endpoints.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] serbridge_transport::TransportError),

    /// Framing error.
    #[error("frame error: {0}")]
    Frame(#[from] serbridge_frame::FrameError),

    /// The duplicator actor is no longer running.
    #[error("broadcast duplicator stopped")]
    DuplicatorGone,

    /// The serial device stopped producing data.
    #[error("serial device closed")]
    SerialClosed,

    /// A background task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, RouteError>;
