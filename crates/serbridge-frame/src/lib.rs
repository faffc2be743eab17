//! Line framing and packet framing on top of an unstructured byte stream.
//!
//! Serial traffic is line oriented but arrives as arbitrary chunks. This
//! crate turns those chunks back into lines:
//! - [`LineRing`] keeps the most recent 4096 bytes of the line in progress
//! - [`LineFramer`] splits on LF, drops CR and stamps each line with the
//!   arrival time of its first byte
//! - [`LineCodec`] exposes the framer as a `tokio_util::codec` decoder, and
//!   encodes outgoing text lines
//! - [`packet`] carries binary datagrams across the line stream as hex text

pub mod codec;
pub mod error;
pub mod line;
pub mod packet;
pub mod ring;
pub mod text;

pub use codec::LineCodec;
pub use error::{FrameError, Result};
pub use line::{Line, LineFramer};
pub use packet::{
    decode_hex_payload, encode_pktin, encode_pktout, HexDecode, PacketDecoder, PacketEvent,
    PacketState, BEGIN_PKTOUT, END_PKTOUT, MAX_DATAGRAM, PKTIN, PKTOUT_LINE_CAPACITY,
};
pub use ring::{LineRing, LINE_CAPACITY};
pub use text::{coerce_utf8, format_log_line, TIMESTAMP_FORMAT};
