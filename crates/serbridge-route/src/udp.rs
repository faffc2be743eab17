use std::io::ErrorKind;
use std::net::SocketAddr;

use bytes::BytesMut;
use serbridge_frame::{
    encode_pktin, LineCodec, PacketDecoder, PacketEvent, MAX_DATAGRAM, PKTOUT_LINE_CAPACITY,
};
use serbridge_transport::{is_transient, ByteReceiver, ByteSender, TransportError};
use tokio::net::{lookup_host, UdpSocket};
use tokio_util::codec::Decoder;
use tracing::{debug, warn};

use crate::error::Result;

/// Carries UDP datagrams across the line stream as hex text.
///
/// Datagrams received on the local socket become `pktin` frames on the
/// serial-bound stream. `pktout` blocks found in the serial output become
/// datagrams sent to the remote address.
pub struct UdpBridge {
    inbound: UdpSocket,
    outbound: UdpSocket,
    input: ByteReceiver,
    to_serial: ByteSender,
}

impl UdpBridge {
    /// Bind the receive socket on `local` and a send socket connected to
    /// `remote`.
    pub async fn bind(
        local: &str,
        remote: &str,
        input: ByteReceiver,
        to_serial: ByteSender,
    ) -> Result<Self> {
        let inbound = UdpSocket::bind(local)
            .await
            .map_err(|source| TransportError::Bind {
                addr: local.to_string(),
                source,
            })?;

        let remote_addr = resolve(remote).await?;
        let any: SocketAddr = if remote_addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let outbound = UdpSocket::bind(any)
            .await
            .map_err(|source| TransportError::Bind {
                addr: any.to_string(),
                source,
            })?;
        outbound
            .connect(remote_addr)
            .await
            .map_err(|source| TransportError::Connect {
                addr: remote.to_string(),
                source,
            })?;

        debug!(local = ?inbound.local_addr().ok(), remote = %remote_addr, "udp bridge bound");
        Ok(Self {
            inbound,
            outbound,
            input,
            to_serial,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inbound.local_addr().map_err(TransportError::Io)?)
    }

    /// Run both directions. Returns only when receiving fails for good or
    /// the serial-bound stream is gone.
    pub async fn run(self) -> Result<()> {
        let UdpBridge {
            inbound,
            outbound,
            input,
            to_serial,
        } = self;

        let sender = tokio::spawn(send_datagrams(outbound, input));
        let result = receive_datagrams(inbound, to_serial).await;
        sender.abort();
        result
    }
}

async fn resolve(addr: &str) -> Result<SocketAddr> {
    let connect_err = |source| TransportError::Connect {
        addr: addr.to_string(),
        source,
    };
    let resolved = lookup_host(addr).await.map_err(connect_err)?.next();
    resolved.ok_or_else(|| {
        connect_err(std::io::Error::new(
            ErrorKind::NotFound,
            "address resolved to nothing",
        ))
        .into()
    })
}

async fn receive_datagrams(socket: UdpSocket, to_serial: ByteSender) -> Result<()> {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut frame = BytesMut::new();

    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            // ICMP errors from earlier sends surface here on some platforms.
            Err(err)
                if is_transient(&err)
                    || matches!(
                        err.kind(),
                        ErrorKind::ConnectionReset | ErrorKind::ConnectionRefused
                    ) =>
            {
                debug!(error = %err, "udp receive interrupted, retrying");
                continue;
            }
            Err(err) => return Err(TransportError::Io(err).into()),
        };
        debug!(%from, size = len, "datagram received");

        encode_pktin(&buf[..len], &mut frame)?;
        to_serial.send(frame.split().freeze()).await?;
    }
}

async fn send_datagrams(socket: UdpSocket, mut input: ByteReceiver) {
    let mut codec = LineCodec::with_capacity(PKTOUT_LINE_CAPACITY);
    let mut decoder = PacketDecoder::new();
    let mut pending = BytesMut::new();

    while let Some(chunk) = input.recv().await {
        pending.extend_from_slice(&chunk);
        while let Ok(Some(line)) = codec.decode(&mut pending) {
            match decoder.feed_line(line.bytes()) {
                PacketEvent::Datagram(decoded) => {
                    for err in &decoded.errors {
                        warn!(
                            line = %String::from_utf8_lossy(line.bytes()),
                            error = %err,
                            "malformed pktout line"
                        );
                    }
                    match socket.send(&decoded.bytes).await {
                        Ok(sent) => debug!(
                            size = sent,
                            payload = %hex::encode(&decoded.bytes),
                            "datagram sent"
                        ),
                        Err(err) => warn!(error = %err, "datagram send failed"),
                    }
                }
                PacketEvent::Begin => debug!("pktout block started"),
                PacketEvent::End => debug!("pktout block ended"),
                PacketEvent::Ignored => {}
            }
        }
    }
    debug!("udp bridge input closed");
}
