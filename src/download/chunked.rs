use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::DownloadRange;
use super::request::{RequestSetup, download_headers, ranged_url};
use crate::clients::AgentClass;
use crate::common::errors::{Error, Result};
use crate::common::http::{Fetcher, HttpRequest};

/// Range state of a chunked download.
///
/// Segments are inclusive on both ends: the first is `[start, end]`, each
/// following one starts right after the previous end and is `chunk_size`
/// longer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkCursor {
    start: u64,
    end: u64,
    chunk_size: u64,
    content_length: Option<u64>,
    bounded: bool,
    should_end: bool,
}

impl ChunkCursor {
    pub fn new(range: Option<&DownloadRange>, chunk_size: u64, content_length: Option<u64>) -> Self {
        let start = range.map_or(0, |r| r.start);
        let end = range.and_then(|r| r.end).unwrap_or(start + chunk_size);

        Self {
            start,
            end,
            chunk_size,
            content_length,
            bounded: range.is_some_and(|r| r.end.is_some()),
            should_end: false,
        }
    }

    /// Next segment to fetch, or `None` once the stream should close.
    pub fn next_segment(&mut self) -> Option<(u64, u64)> {
        if self.should_end {
            return None;
        }

        let reached_length = self.content_length.is_some_and(|len| self.end >= len);
        if reached_length || self.bounded {
            self.should_end = true;
        }

        Some((self.start, self.end))
    }

    /// Moves past a completed segment. Without a known length, a short
    /// segment marks the end of the resource.
    pub fn advance(&mut self, received: u64) {
        if self.content_length.is_none() && received < self.end.saturating_sub(self.start) + 1 {
            self.should_end = true;
        }
        self.start = self.end + 1;
        self.end += self.chunk_size;
    }

    pub fn is_finished(&self) -> bool {
        self.should_end
    }
}

/// One forwarded chunk. The permit returns its bytes to the buffer budget
/// when the consumer takes the chunk.
pub(crate) struct Delivery {
    pub chunk: Bytes,
    _permit: Option<OwnedSemaphorePermit>,
}

pub(crate) type DeliverySender = mpsc::UnboundedSender<Result<Delivery>>;
pub(crate) type DeliveryReceiver = mpsc::UnboundedReceiver<Result<Delivery>>;

/// Fetches ranged segments one after another and forwards their bytes.
pub(crate) struct SegmentPump {
    pub fetcher: Arc<dyn Fetcher>,
    pub url: String,
    pub setup: RequestSetup,
    pub agent: AgentClass,
    pub cursor: ChunkCursor,
    pub high_water_mark: usize,
}

enum SegmentEnd {
    Done(u64),
    Stop,
}

impl SegmentPump {
    pub fn spawn(self, cancel: CancellationToken) -> DeliveryReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(self.run(tx, cancel));
        rx
    }

    async fn run(mut self, tx: DeliverySender, cancel: CancellationToken) {
        let budget_size = self.high_water_mark.clamp(1, Semaphore::MAX_PERMITS.min(u32::MAX as usize));
        let budget = Arc::new(Semaphore::new(budget_size));

        while let Some((start, end)) = self.cursor.next_segment() {
            let segment = cancel.child_token();

            match self.segment(start, end, &tx, &budget, &segment, budget_size).await {
                Ok(SegmentEnd::Done(received)) => {
                    trace!("[ Download ]: segment {}-{} done ({} bytes)", start, end, received);
                    self.cursor.advance(received);
                }
                Ok(SegmentEnd::Stop) => {
                    debug!("[ Download ]: stopped at segment {}-{}", start, end);
                    return;
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    return;
                }
            }
        }

        trace!("[ Download ]: all segments delivered");
    }

    async fn segment(
        &self,
        start: u64,
        end: u64,
        tx: &DeliverySender,
        budget: &Arc<Semaphore>,
        token: &CancellationToken,
        budget_size: usize,
    ) -> Result<SegmentEnd> {
        let url = self.setup.apply(&ranged_url(&self.url, start, end));
        debug!("[ Download ]: Requesting URL: {}", url);
        let request = download_headers(HttpRequest::get(url), self.agent);

        let res = tokio::select! {
            _ = token.cancelled() => return Ok(SegmentEnd::Stop),
            res = self.fetcher.fetch(request) => res?,
        };

        if !res.is_success() {
            return Err(Error::DownloadFailed { status: res.status });
        }
        let mut body = res.body.ok_or(Error::EmptyResponseBody)?;

        let mut received = 0u64;
        loop {
            let next = tokio::select! {
                _ = token.cancelled() => return Ok(SegmentEnd::Stop),
                next = body.next() => next,
            };

            let chunk = match next {
                Some(chunk) => chunk?,
                None => break,
            };
            if chunk.is_empty() {
                continue;
            }
            received += chunk.len() as u64;

            let wanted = chunk.len().min(budget_size) as u32;
            let permit = tokio::select! {
                _ = token.cancelled() => return Ok(SegmentEnd::Stop),
                permit = budget.clone().acquire_many_owned(wanted) => permit.ok(),
            };

            let delivery = Delivery {
                chunk,
                _permit: permit,
            };
            if tx.send(Ok(delivery)).is_err() {
                return Ok(SegmentEnd::Stop);
            }
        }

        Ok(SegmentEnd::Done(received))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const C: u64 = 10 * 1024 * 1024;

    #[test]
    fn twenty_mebibytes_take_two_segments() {
        let mut cursor = ChunkCursor::new(None, C, Some(2 * C));

        assert_eq!(cursor.next_segment(), Some((0, C)));
        cursor.advance(C + 1);
        assert_eq!(cursor.next_segment(), Some((C + 1, 2 * C)));
        cursor.advance(C);
        assert!(cursor.is_finished());
        assert_eq!(cursor.next_segment(), None);
    }

    #[test]
    fn segments_advance_by_chunk_size() {
        let mut cursor = ChunkCursor::new(None, 100, Some(10_000));
        let mut prev_end = None;
        for _ in 0..5 {
            let (start, end) = cursor.next_segment().unwrap();
            match prev_end {
                None => assert_eq!((start, end), (0, 100)),
                Some(prev) => assert_eq!((start, end), (prev + 1, prev + 100)),
            }
            prev_end = Some(end);
            cursor.advance(end - start + 1);
        }
    }

    #[test]
    fn bounded_range_is_a_single_segment() {
        let range = DownloadRange { start: 500, end: Some(999) };
        let mut cursor = ChunkCursor::new(Some(&range), C, Some(2 * C));
        assert_eq!(cursor.next_segment(), Some((500, 999)));
        cursor.advance(500);
        assert_eq!(cursor.next_segment(), None);
    }

    #[test]
    fn open_range_continues_from_start() {
        let range = DownloadRange { start: 50, end: None };
        let mut cursor = ChunkCursor::new(Some(&range), 100, Some(1_000));
        assert_eq!(cursor.next_segment(), Some((50, 150)));
        cursor.advance(101);
        assert_eq!(cursor.next_segment(), Some((151, 250)));
    }

    #[test]
    fn unknown_length_stops_after_short_segment() {
        let mut cursor = ChunkCursor::new(None, 100, None);
        assert_eq!(cursor.next_segment(), Some((0, 100)));
        cursor.advance(101);
        assert_eq!(cursor.next_segment(), Some((101, 200)));
        cursor.advance(42);
        assert_eq!(cursor.next_segment(), None);
    }
}
