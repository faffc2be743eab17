use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::channel::{ByteReceiver, ByteSender};
use crate::error::{Result, TransportError};

/// Largest chunk taken from an endpoint in a single read.
pub const READ_CHUNK_SIZE: usize = 4096;

/// Whether an I/O error is worth retrying on the same endpoint.
pub fn is_transient(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
    )
}

/// Copy everything read from `reader` onto `tx`, in order.
///
/// Returns `Ok(())` at end of stream. Transient read errors are retried in
/// place; any other read error is returned. Fails with
/// [`TransportError::ChannelClosed`] if the consumer goes away.
pub async fn read_into<R>(mut reader: R, tx: &ByteSender) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        let read = match reader.read(&mut chunk).await {
            Ok(n) => n,
            Err(err) if is_transient(&err) => {
                trace!(error = %err, "transient read error, retrying");
                continue;
            }
            Err(err) => return Err(TransportError::Io(err)),
        };

        if read == 0 {
            debug!("endpoint reached end of stream");
            return Ok(());
        }

        tx.send_slice(&chunk[..read]).await?;
    }
}

/// Drain `rx` into `writer`, flushing after every chunk.
///
/// Returns `Ok(())` once every sender is gone. A failed write is returned
/// and leaves the remaining chunks in the channel.
pub async fn write_from<W>(mut writer: W, rx: &mut ByteReceiver) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(chunk) = rx.recv().await {
        writer.write_all(&chunk).await?;
        writer.flush().await?;
    }
    Ok(())
}
