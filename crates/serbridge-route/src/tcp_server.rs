use std::net::SocketAddr;

use serbridge_transport::{
    byte_channel, is_transient, read_into, write_from, ByteReceiver, ByteSender, TransportError,
};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::config::SubscriberConfig;
use crate::duplicator::{Duplicator, DuplicatorHandle, SubscriberId};
use crate::error::Result;

/// Accepts connections and treats each one as a two-way tap on the serial
/// stream.
///
/// Serial output arrives on the forwarder's input and is broadcast to every
/// connection. Whatever a connection sends is merged into the serial-bound
/// stream.
pub struct TcpServerForwarder {
    listener: TcpListener,
    duplicator: DuplicatorHandle,
    to_serial: ByteSender,
    subscriber: SubscriberConfig,
}

impl TcpServerForwarder {
    /// Bind the listening socket and start the broadcast duplicator.
    ///
    /// Must be called inside a tokio runtime.
    pub async fn bind(
        addr: &str,
        input: ByteReceiver,
        to_serial: ByteSender,
        subscriber: SubscriberConfig,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!(addr = ?listener.local_addr().ok(), "listening for tcp subscribers");

        let (duplicator, _task) = Duplicator::spawn(input, subscriber.policy);

        Ok(Self {
            listener,
            duplicator,
            to_serial,
            subscriber,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr().map_err(TransportError::Io)?)
    }

    /// Handle for inspecting the subscriber set.
    pub fn duplicator(&self) -> DuplicatorHandle {
        self.duplicator.clone()
    }

    /// Accept connections forever. Returns only on a non-transient accept
    /// failure.
    pub async fn run(self) -> Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) if is_transient(&err) => continue,
                Err(err) => return Err(TransportError::Accept(err).into()),
            };
            info!(%peer, "accepted subscriber connection");

            let (tx, rx) = byte_channel(self.subscriber.queue_depth);
            let id = self.duplicator.register(tx).await?;
            tokio::spawn(serve_connection(
                stream,
                peer,
                id,
                rx,
                self.to_serial.clone(),
                self.duplicator.clone(),
            ));
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    id: SubscriberId,
    mut from_serial: ByteReceiver,
    to_serial: ByteSender,
    duplicator: DuplicatorHandle,
) {
    let (read_half, write_half) = stream.into_split();
    let mut writer = tokio::spawn(async move { write_from(write_half, &mut from_serial).await });

    tokio::select! {
        result = read_into(read_half, &to_serial) => match result {
            Ok(()) => info!(%peer, "subscriber closed connection"),
            Err(err) => warn!(%peer, error = %err, "subscriber read failed"),
        },
        result = &mut writer => match result {
            Ok(Ok(())) => info!(%peer, "subscriber dropped by duplicator"),
            Ok(Err(err)) => warn!(%peer, error = %err, "subscriber write failed"),
            Err(err) => warn!(%peer, error = %err, "subscriber writer task failed"),
        },
    }

    writer.abort();
    if let Err(err) = duplicator.remove(id).await {
        debug!(%peer, error = %err, "subscriber removal skipped");
    }
}
