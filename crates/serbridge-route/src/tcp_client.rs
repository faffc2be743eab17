use std::future::Future;
use std::time::Duration;

use bytes::BytesMut;
use futures_util::SinkExt;
use serbridge_frame::{FrameError, Line, LineCodec};
use serbridge_transport::{read_into, ByteReceiver, ByteSender};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, FramedWrite};
use tracing::{debug, info, trace, warn};

use crate::config::MirrorOfflinePolicy;
use crate::daily_log::DailyLog;

/// Keeps an outbound TCP mirror of the serial stream alive.
///
/// Serial output is cut into lines; each non-blank line is timestamped,
/// appended to the daily log and written to the connection. Whatever the
/// remote sends goes to the serial device. A remote that stops sending but
/// keeps reading stays connected. When the connection breaks the forwarder
/// waits a fixed delay and connects again, forever. What happens to serial
/// output in between is set by [`MirrorOfflinePolicy`].
pub struct TcpClientForwarder {
    target: String,
    input: ByteReceiver,
    to_serial: ByteSender,
    log: DailyLog,
    reconnect_delay: Duration,
    offline: MirrorOfflinePolicy,
    codec: LineCodec,
}

enum SessionEnd {
    /// The serial side is gone; nothing more will ever arrive.
    InputClosed,
    ConnectionLost,
}

impl TcpClientForwarder {
    pub fn new(
        target: impl Into<String>,
        input: ByteReceiver,
        to_serial: ByteSender,
        log: DailyLog,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            target: target.into(),
            input,
            to_serial,
            log,
            reconnect_delay,
            offline: MirrorOfflinePolicy::default(),
            codec: LineCodec::new(),
        }
    }

    pub fn with_offline_policy(mut self, policy: MirrorOfflinePolicy) -> Self {
        self.offline = policy;
        self
    }

    /// Connect, mirror, reconnect. Returns only once the input stream ends.
    pub async fn run(mut self) {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            info!(remote = %self.target, attempt, "connecting tcp mirror");

            let connect = TcpStream::connect(self.target.clone());
            match self.while_offline(connect).await {
                None => break,
                Some(Ok(stream)) => {
                    let end = self.session(stream).await;
                    self.codec.reset();
                    if let SessionEnd::InputClosed = end {
                        break;
                    }
                }
                Some(Err(err)) => {
                    warn!(remote = %self.target, error = %err, "tcp mirror connect failed");
                }
            }

            info!(delay = ?self.reconnect_delay, "waiting before reconnecting tcp mirror");
            let pause = tokio::time::sleep(self.reconnect_delay);
            if self.while_offline(pause).await.is_none() {
                break;
            }
        }
        info!(remote = %self.target, "serial input closed, tcp mirror stopping");
    }

    /// Drive `fut` to completion with no connection up. `None` when the
    /// input closes first.
    async fn while_offline<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        if self.offline == MirrorOfflinePolicy::Block {
            return Some(fut.await);
        }

        tokio::pin!(fut);
        let mut pending = BytesMut::new();
        loop {
            tokio::select! {
                biased;
                output = &mut fut => return Some(output),
                chunk = self.input.recv() => {
                    pending.extend_from_slice(&chunk?);
                    while let Ok(Some(line)) = self.codec.decode(&mut pending) {
                        if let Some(text) = line.to_log_line() {
                            trace!(line = %text, "no tcp mirror, logging only");
                            log_line(&self.log, &line, &text).await;
                        }
                    }
                }
            }
        }
    }

    async fn session(&mut self, stream: TcpStream) -> SessionEnd {
        let peer = stream.peer_addr().ok();
        info!(?peer, "tcp mirror connected");

        let (read_half, write_half) = stream.into_split();
        let to_serial = self.to_serial.clone();
        let mut reader = tokio::spawn(async move { read_into(read_half, &to_serial).await });
        let mut remote_sending = true;

        let mut sink = FramedWrite::new(write_half, LineCodec::new());
        let mut pending = BytesMut::new();

        let end = loop {
            tokio::select! {
                chunk = self.input.recv() => {
                    let Some(chunk) = chunk else {
                        break SessionEnd::InputClosed;
                    };
                    pending.extend_from_slice(&chunk);
                    let forwarded =
                        forward_lines(&self.log, &mut self.codec, &mut pending, &mut sink).await;
                    if let Err(err) = forwarded {
                        warn!(?peer, error = %err, "tcp mirror write failed");
                        break SessionEnd::ConnectionLost;
                    }
                }
                result = &mut reader, if remote_sending => {
                    match result {
                        // Half-closed: the remote may still be reading.
                        Ok(Ok(())) => {
                            info!(?peer, "tcp mirror remote finished sending");
                            remote_sending = false;
                        }
                        Ok(Err(err)) => {
                            warn!(?peer, error = %err, "tcp mirror read failed");
                            break SessionEnd::ConnectionLost;
                        }
                        Err(err) => {
                            warn!(?peer, error = %err, "tcp mirror reader task failed");
                            break SessionEnd::ConnectionLost;
                        }
                    }
                }
            }
        };

        reader.abort();
        end
    }
}

async fn log_line(log: &DailyLog, line: &Line, text: &str) {
    let date = line.started_at().date_naive();
    if let Err(err) = log.append_on(date, text).await {
        warn!(dir = ?log.dir(), error = %err, "failed to append to daily log");
    }
}

/// Emit every complete line buffered in `pending`.
async fn forward_lines(
    log: &DailyLog,
    codec: &mut LineCodec,
    pending: &mut BytesMut,
    sink: &mut FramedWrite<OwnedWriteHalf, LineCodec>,
) -> Result<(), FrameError> {
    while let Some(line) = codec.decode(pending)? {
        let Some(text) = line.to_log_line() else {
            continue;
        };
        debug!(line = %text, "mirroring line");
        log_line(log, &line, &text).await;
        sink.send(text.as_str()).await?;
    }
    Ok(())
}
