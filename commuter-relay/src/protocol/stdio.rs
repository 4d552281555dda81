//! Line-delimited JSON transport.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::message::OutboundMessage;
use super::transport::{Transport, TransportError};

/// Writes each message as one JSON line.
///
/// A message counts as delivered once its line is written and flushed.
/// Concurrent jobs share the writer one whole line at a time.
pub struct LineTransport<W> {
    writer: Mutex<W>,
}

impl<W> LineTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: AsyncWrite + Unpin + Send> Transport for LineTransport<W> {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let mut line = serde_json::to_vec(message)
            .map_err(|e| TransportError::Rejected(format!("unencodable message: {e}")))?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}
