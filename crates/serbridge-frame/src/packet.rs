//! Hex text framing for UDP datagrams carried over the line stream.
//!
//! Inbound (datagram toward the serial side):
//! ```text
//! pktin
//! 48656c6c6f
//! $
//! ```
//!
//! Outbound (serial side toward a datagram), one datagram per payload line:
//! ```text
//! #!begin pktout
//! 48656c6c6f$
//! 776f726c64$
//! #!end pktout
//! ```

use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Marker line opening an inbound frame.
pub const PKTIN: &str = "pktin";

/// Marker line opening an outbound block.
pub const BEGIN_PKTOUT: &str = "#!begin pktout";

/// Marker line closing an outbound block.
pub const END_PKTOUT: &str = "#!end pktout";

/// Largest datagram carried in either direction.
pub const MAX_DATAGRAM: usize = 4096;

/// Longest outbound payload line: two hex digits per byte plus `$`. Lines
/// feeding a [`PacketDecoder`] must be framed with at least this capacity.
pub const PKTOUT_LINE_CAPACITY: usize = MAX_DATAGRAM * 2 + 1;

const TERMINATOR: u8 = b'$';

/// Append the inbound frame for one datagram: `pktin\n<hex>\n$\n`.
pub fn encode_pktin(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_DATAGRAM {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_DATAGRAM,
        });
    }
    dst.reserve(PKTIN.len() + payload.len() * 2 + 4);
    dst.put_slice(PKTIN.as_bytes());
    dst.put_u8(b'\n');
    dst.put_slice(hex::encode(payload).as_bytes());
    dst.put_u8(b'\n');
    dst.put_u8(TERMINATOR);
    dst.put_u8(b'\n');
    Ok(())
}

/// Append an outbound block carrying one payload line per datagram.
pub fn encode_pktout<'a>(
    payloads: impl IntoIterator<Item = &'a [u8]>,
    dst: &mut BytesMut,
) -> Result<()> {
    dst.put_slice(BEGIN_PKTOUT.as_bytes());
    dst.put_u8(b'\n');
    for payload in payloads {
        if payload.len() > MAX_DATAGRAM {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_DATAGRAM,
            });
        }
        dst.put_slice(hex::encode(payload).as_bytes());
        dst.put_u8(TERMINATOR);
        dst.put_u8(b'\n');
    }
    dst.put_slice(END_PKTOUT.as_bytes());
    dst.put_u8(b'\n');
    Ok(())
}

/// Result of a best-effort hex decode.
///
/// Groups that fail to decode leave a zero byte in their position; the
/// failures are reported in `errors` for logging.
#[derive(Debug, Default)]
pub struct HexDecode {
    pub bytes: Vec<u8>,
    pub errors: Vec<FrameError>,
}

impl HexDecode {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Decode every two-digit group of `digits`.
pub fn decode_hex_payload(digits: &[u8]) -> HexDecode {
    let mut out = HexDecode {
        bytes: vec![0u8; digits.len() / 2],
        errors: Vec::new(),
    };

    for (index, group) in digits.chunks_exact(2).enumerate() {
        if hex::decode_to_slice(group, &mut out.bytes[index..index + 1]).is_err() {
            out.bytes[index] = 0;
            out.errors.push(FrameError::InvalidHex {
                offset: index * 2,
                group: String::from_utf8_lossy(group).into_owned(),
            });
        }
    }

    if digits.len() % 2 != 0 {
        out.errors.push(FrameError::OddLength {
            digits: digits.len(),
        });
    }

    out
}

/// Whether the outbound decoder is inside a `pktout` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacketState {
    #[default]
    Idle,
    Collecting,
}

/// What a line did to the outbound decoder.
#[derive(Debug)]
pub enum PacketEvent {
    /// Begin marker seen.
    Begin,
    /// End marker seen.
    End,
    /// A payload line inside a block; send this as one datagram.
    Datagram(HexDecode),
    /// Line has no packet meaning.
    Ignored,
}

/// Line-driven state machine extracting outbound datagrams.
#[derive(Debug, Default)]
pub struct PacketDecoder {
    state: PacketState,
}

impl PacketDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PacketState {
        self.state
    }

    /// Feed one complete line (CR removed, LF excluded).
    pub fn feed_line(&mut self, line: &[u8]) -> PacketEvent {
        if line.starts_with(BEGIN_PKTOUT.as_bytes()) {
            self.state = PacketState::Collecting;
            return PacketEvent::Begin;
        }
        if line.starts_with(END_PKTOUT.as_bytes()) {
            self.state = PacketState::Idle;
            return PacketEvent::End;
        }
        match (self.state, line.split_last()) {
            (PacketState::Collecting, Some((&TERMINATOR, digits))) => {
                PacketEvent::Datagram(decode_hex_payload(digits))
            }
            _ => PacketEvent::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio_util::codec::Decoder;

    use super::*;
    use crate::codec::LineCodec;

    fn datagram(event: PacketEvent) -> HexDecode {
        match event {
            PacketEvent::Datagram(decoded) => decoded,
            other => panic!("expected datagram, got {other:?}"),
        }
    }

    #[test]
    fn pktin_frame_layout() {
        let mut dst = BytesMut::new();
        encode_pktin(&[0x00, 0xAB, 0x10], &mut dst).unwrap();
        assert_eq!(dst.as_ref(), b"pktin\n00ab10\n$\n");
    }

    #[test]
    fn pktin_empty_datagram() {
        let mut dst = BytesMut::new();
        encode_pktin(&[], &mut dst).unwrap();
        assert_eq!(dst.as_ref(), b"pktin\n\n$\n");
    }

    #[test]
    fn pktin_rejects_oversized_datagram() {
        let mut dst = BytesMut::new();
        let err = encode_pktin(&[0u8; MAX_DATAGRAM + 1], &mut dst).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(dst.is_empty());
    }

    #[test]
    fn payload_lines_only_count_inside_block() {
        let mut decoder = PacketDecoder::new();
        assert!(matches!(decoder.feed_line(b"0102$"), PacketEvent::Ignored));

        assert!(matches!(
            decoder.feed_line(b"#!begin pktout"),
            PacketEvent::Begin
        ));
        assert_eq!(decoder.state(), PacketState::Collecting);

        let first = datagram(decoder.feed_line(b"0102$"));
        assert_eq!(first.bytes, vec![0x01, 0x02]);
        assert!(first.is_clean());

        let second = datagram(decoder.feed_line(b"FFfe$"));
        assert_eq!(second.bytes, vec![0xFF, 0xFE]);

        assert!(matches!(decoder.feed_line(b"no terminator"), PacketEvent::Ignored));

        assert!(matches!(decoder.feed_line(b"#!end pktout"), PacketEvent::End));
        assert_eq!(decoder.state(), PacketState::Idle);
        assert!(matches!(decoder.feed_line(b"0304$"), PacketEvent::Ignored));
    }

    #[test]
    fn markers_match_by_prefix() {
        let mut decoder = PacketDecoder::new();
        decoder.feed_line(b"#!begin pktout seq=3");
        assert_eq!(decoder.state(), PacketState::Collecting);
        decoder.feed_line(b"#!end pktout trailing");
        assert_eq!(decoder.state(), PacketState::Idle);
    }

    #[test]
    fn invalid_group_is_zero_filled() {
        let decoded = decode_hex_payload(b"01zz03");
        assert_eq!(decoded.bytes, vec![0x01, 0x00, 0x03]);
        assert_eq!(decoded.errors.len(), 1);
        assert!(matches!(
            &decoded.errors[0],
            FrameError::InvalidHex { offset: 2, group } if group == "zz"
        ));
    }

    #[test]
    fn sign_prefixed_group_is_rejected() {
        let decoded = decode_hex_payload(b"+a");
        assert_eq!(decoded.bytes, vec![0x00]);
        assert!(!decoded.is_clean());
    }

    #[test]
    fn odd_trailing_digit_is_reported() {
        let decoded = decode_hex_payload(b"0a0");
        assert_eq!(decoded.bytes, vec![0x0a]);
        assert!(matches!(
            decoded.errors.as_slice(),
            [FrameError::OddLength { digits: 3 }]
        ));
    }

    #[test]
    fn pktout_block_reproduces_payloads() {
        let payloads: [&[u8]; 2] = [b"\x00\x01binary\xff", b"second"];
        let mut wire = BytesMut::new();
        encode_pktout(payloads, &mut wire).unwrap();

        let mut decoder = PacketDecoder::new();
        let sent: Vec<Vec<u8>> = wire[..]
            .split(|&b| b == b'\n')
            .filter_map(|line| match decoder.feed_line(line) {
                PacketEvent::Datagram(decoded) => Some(decoded.bytes),
                _ => None,
            })
            .collect();

        assert_eq!(sent, vec![payloads[0].to_vec(), payloads[1].to_vec()]);
    }

    #[test]
    fn largest_datagram_survives_pktout_framing() {
        let payload: Vec<u8> = (0..MAX_DATAGRAM).map(|i| (i * 7 % 251) as u8).collect();
        let mut wire = BytesMut::new();
        encode_pktout([payload.as_slice()], &mut wire).unwrap();

        let mut codec = LineCodec::with_capacity(PKTOUT_LINE_CAPACITY);
        let mut decoder = PacketDecoder::new();
        let mut sent = Vec::new();
        while let Some(line) = codec.decode(&mut wire).unwrap() {
            if let PacketEvent::Datagram(decoded) = decoder.feed_line(line.bytes()) {
                assert!(decoded.is_clean());
                sent.push(decoded.bytes);
            }
        }

        assert_eq!(sent, vec![payload]);
    }

    #[test]
    fn largest_datagram_fits_pktin() {
        let payload = vec![0xA5u8; MAX_DATAGRAM];
        let mut dst = BytesMut::new();
        encode_pktin(&payload, &mut dst).unwrap();

        let lines: Vec<&[u8]> = dst[..].split(|&b| b == b'\n').collect();
        assert_eq!(lines[0], PKTIN.as_bytes());
        assert_eq!(lines[1].len(), MAX_DATAGRAM * 2);
        assert_eq!(hex::decode(lines[1]).unwrap(), payload);
        assert_eq!(lines[2], b"$");
    }
}
