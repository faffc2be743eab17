//! Bounded byte conduits between tasks.
//!
//! A channel carries chunks of bytes in the order they were read from the
//! producing endpoint. With a depth of 1 a send completes only once the
//! previous chunk has been taken by the receiver, so a stalled consumer
//! stalls its producer.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::{Result, TransportError};

/// Default channel depth. Keeps producer and consumer in lock-step.
pub const DEFAULT_CHANNEL_DEPTH: usize = 1;

/// Create a byte channel holding at most `depth` in-flight chunks.
///
/// A depth of zero is treated as 1.
pub fn byte_channel(depth: usize) -> (ByteSender, ByteReceiver) {
    let (tx, rx) = mpsc::channel(depth.max(1));
    (ByteSender { inner: tx }, ByteReceiver { inner: rx })
}

/// Producing half of a byte channel. Cheap to clone; all clones feed the
/// same receiver.
#[derive(Debug, Clone)]
pub struct ByteSender {
    inner: mpsc::Sender<Bytes>,
}

/// Consuming half of a byte channel.
#[derive(Debug)]
pub struct ByteReceiver {
    inner: mpsc::Receiver<Bytes>,
}

/// Why a non-waiting send did not go through. The chunk is handed back.
#[derive(Debug)]
pub enum TrySendError {
    /// The channel is at capacity.
    Full(Bytes),
    /// The receiver has been dropped.
    Closed(Bytes),
}

impl ByteSender {
    /// Send a chunk, waiting for room in the channel.
    ///
    /// Empty chunks are accepted and discarded.
    pub async fn send(&self, chunk: Bytes) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.inner
            .send(chunk)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }

    /// Copy a slice into a chunk and send it.
    pub async fn send_slice(&self, data: &[u8]) -> Result<()> {
        self.send(Bytes::copy_from_slice(data)).await
    }

    /// Send a chunk only if there is room right now.
    pub fn try_send(&self, chunk: Bytes) -> std::result::Result<(), TrySendError> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.inner.try_send(chunk).map_err(|err| match err {
            mpsc::error::TrySendError::Full(chunk) => TrySendError::Full(chunk),
            mpsc::error::TrySendError::Closed(chunk) => TrySendError::Closed(chunk),
        })
    }
}

impl ByteReceiver {
    /// Receive the next chunk. `None` once every sender is gone and the
    /// channel is drained.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.inner.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunks_arrive_in_order() {
        let (tx, mut rx) = byte_channel(4);
        tx.send_slice(b"one").await.unwrap();
        tx.send_slice(b"two").await.unwrap();
        drop(tx);

        assert_eq!(rx.recv().await.unwrap().as_ref(), b"one");
        assert_eq!(rx.recv().await.unwrap().as_ref(), b"two");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn empty_chunks_are_skipped() {
        let (tx, mut rx) = byte_channel(1);
        tx.send(Bytes::new()).await.unwrap();
        tx.send_slice(b"x").await.unwrap();
        assert_eq!(rx.recv().await.unwrap().as_ref(), b"x");
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_fails() {
        let (tx, rx) = byte_channel(1);
        drop(rx);
        let err = tx.send_slice(b"lost").await.unwrap_err();
        assert!(matches!(err, TransportError::ChannelClosed));
    }

    #[tokio::test]
    async fn try_send_reports_full_channel() {
        let (tx, mut rx) = byte_channel(1);
        tx.try_send(Bytes::from_static(b"a")).unwrap();
        match tx.try_send(Bytes::from_static(b"b")) {
            Err(TrySendError::Full(chunk)) => assert_eq!(chunk.as_ref(), b"b"),
            other => panic!("expected full channel, got {other:?}"),
        }
        assert_eq!(rx.recv().await.unwrap().as_ref(), b"a");
    }

    #[test]
    fn zero_depth_is_promoted() {
        let (tx, _rx) = byte_channel(0);
        tx.try_send(Bytes::from_static(b"a")).unwrap();
    }
}
