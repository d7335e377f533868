use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::chunked::DeliveryReceiver;
use crate::common::{errors::Result, types::ByteStream};
use crate::info::StreamDescriptor;

enum Source {
    /// The upstream body, passed through untouched.
    Direct(Option<ByteStream>),
    Chunked(DeliveryReceiver),
}

/// Lazy byte stream of one download. Not restartable.
///
/// Dropping or cancelling it aborts the in-flight request and no further
/// segments are fetched.
pub struct DownloadStream {
    source: Source,
    cancel: CancellationToken,
    format: StreamDescriptor,
}

impl DownloadStream {
    pub(crate) fn direct(body: ByteStream, format: StreamDescriptor) -> Self {
        Self {
            source: Source::Direct(Some(body)),
            cancel: CancellationToken::new(),
            format,
        }
    }

    pub(crate) fn chunked(
        rx: DeliveryReceiver,
        cancel: CancellationToken,
        format: StreamDescriptor,
    ) -> Self {
        Self {
            source: Source::Chunked(rx),
            cancel,
            format,
        }
    }

    /// The validated format being downloaded.
    pub fn format(&self) -> &StreamDescriptor {
        &self.format
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.source, Source::Chunked(_))
    }

    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            debug!("[ Download ]: cancelled itag {}", self.format.itag);
            self.cancel.cancel();
        }
    }

    /// Copies the whole stream into `writer`, returning the byte count.
    pub async fn write_to<W>(mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }
}

impl fmt::Debug for DownloadStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadStream")
            .field("itag", &self.format.itag)
            .field("chunked", &self.is_chunked())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Stream for DownloadStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            if let Source::Direct(body) = &mut self.source {
                body.take();
            }
            return Poll::Ready(None);
        }

        match &mut self.source {
            Source::Direct(Some(body)) => body.poll_next_unpin(cx),
            Source::Direct(None) => Poll::Ready(None),
            Source::Chunked(rx) => rx
                .poll_recv(cx)
                .map(|item| item.map(|delivery| delivery.map(|d| d.chunk))),
        }
    }
}

impl Drop for DownloadStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
