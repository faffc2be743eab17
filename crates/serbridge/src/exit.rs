use std::fmt;
use std::io;

use serbridge_frame::FrameError;
use serbridge_route::RouteError;
use serbridge_transport::TransportError;

/// Clean exit.
pub const SUCCESS: i32 = 0;
/// I/O failure with no more specific code.
pub const FAILURE: i32 = 1;
/// The serial device or a socket could not be opened, bound or reached, or
/// the device went away while bridging.
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
/// A datagram could not be framed.
pub const DATA_INVALID: i32 = 60;
/// Bad command line (same value as sysexits `EX_USAGE`).
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
/// A bridge task panicked or was cancelled.
pub const INTERNAL: i32 = 125;
/// Conventional status for termination by SIGINT.
pub const INTERRUPTED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::AddrInUse
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { addr, source } => {
            io_error(&format!("{context}: cannot bind {addr}"), source)
        }
        TransportError::Connect { addr, source } => {
            io_error(&format!("{context}: cannot reach {addr}"), source)
        }
        TransportError::Accept(source) | TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn route_error(context: &str, err: RouteError) -> CliError {
    match err {
        RouteError::Transport(err) => transport_error(context, err),
        RouteError::Frame(err) => frame_error(context, err),
        RouteError::SerialClosed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}
