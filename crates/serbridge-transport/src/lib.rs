//! Byte-stream transport for the serial bridge.
//!
//! Provides the pieces every other layer is wired from:
//! - [`ByteSender`] / [`ByteReceiver`], the bounded conduit between tasks
//! - read and write pumps that move bytes between an endpoint and a channel
//! - serial device open and port enumeration
//!
//! This is the lowest layer of serbridge. Endpoints (serial device, console,
//! sockets) are owned by exactly one pump task each and are only ever reached
//! through a channel.

pub mod channel;
pub mod error;
pub mod pump;
pub mod serial;

pub use channel::{byte_channel, ByteReceiver, ByteSender, TrySendError, DEFAULT_CHANNEL_DEPTH};
pub use error::{Result, TransportError};
pub use pump::{is_transient, read_into, write_from, READ_CHUNK_SIZE};
pub use serial::{available_ports, open_serial, PortInfo, SerialStream};
