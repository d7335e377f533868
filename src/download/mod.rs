//! Turns a validated format into a byte stream.
//!
//! Muxed downloads without a range are a single pass-through request.
//! Everything else is fetched as consecutive ranged segments, because
//! googlevideo throttles or cuts off long single responses for adaptive
//! streams.

pub mod chunked;
pub mod request;
pub mod stream;

use std::{collections::BTreeSet, fmt, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::clients::{AgentClass, ClientOrigin};
use crate::common::errors::{Error, Result};
use crate::common::http::{Fetcher, HttpRequest};
use crate::configs::{DEFAULT_DL_CHUNK_SIZE, DEFAULT_HIGH_WATER_MARK, DownloadConfig};
use crate::format::{Filter, FormatConstraints, Including, MobileFallback, NarrowingPolicy, Quality, get_valid_download_url};
use crate::info::VideoMetadata;

use chunked::{ChunkCursor, SegmentPump};
use request::{OriginalProxy, RequestSetup, RewriteRequest, download_headers};

pub use stream::DownloadStream;

/// Byte range requested by the caller, inclusive. An open end keeps
/// fetching segments until the resource is exhausted.
///
/// Only a range with an end is fetched as one final segment. `start-` is
/// not capped at `start + dl_chunk_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl std::str::FromStr for DownloadRange {
    type Err = String;

    /// Parses `start-end` or `start-`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("expected start-end, got {}", s))?;
        let start = start
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("invalid range start: {}", e))?;
        let end = match end.trim() {
            "" => None,
            end => Some(end.parse::<u64>().map_err(|e| format!("invalid range end: {}", e))?),
        };
        if end.is_some_and(|end| end < start) {
            return Err(format!("range end is before start: {}", s));
        }
        Ok(Self { start, end })
    }
}

#[derive(Clone)]
pub struct DownloadOptions {
    pub filter: Option<Filter>,
    pub quality: Quality,
    pub range: Option<DownloadRange>,
    pub dl_chunk_size: u64,
    pub high_water_mark: usize,
    pub excluding_clients: BTreeSet<ClientOrigin>,
    pub including_clients: Including,
    pub rewrite_request: Option<RewriteRequest>,
    pub original_proxy: Option<OriginalProxy>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            filter: None,
            quality: Quality::default(),
            range: None,
            dl_chunk_size: DEFAULT_DL_CHUNK_SIZE,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            excluding_clients: BTreeSet::new(),
            including_clients: Including::All,
            rewrite_request: None,
            original_proxy: None,
        }
    }
}

impl DownloadOptions {
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self {
            dl_chunk_size: config.dl_chunk_size.max(1),
            high_water_mark: config.high_water_mark,
            original_proxy: config.original_proxy.as_ref().map(OriginalProxy::from),
            ..Default::default()
        }
    }

    pub fn constraints(&self) -> FormatConstraints {
        FormatConstraints {
            filter: self.filter.clone(),
            quality: self.quality.clone(),
            excluding: self.excluding_clients.clone(),
            including: self.including_clients.clone(),
            excluding_urls: BTreeSet::new(),
        }
    }

    pub fn request_setup(&self) -> RequestSetup {
        RequestSetup {
            rewrite: self.rewrite_request.clone(),
            original_proxy: self.original_proxy.clone(),
        }
    }

    /// Muxed formats without an explicit range are fetched in one request.
    fn is_direct(&self) -> bool {
        self.range.is_none() && self.filter.as_ref().is_some_and(Filter::wants_combined)
    }
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("filter", &self.filter)
            .field("quality", &self.quality)
            .field("range", &self.range)
            .field("dl_chunk_size", &self.dl_chunk_size)
            .field("high_water_mark", &self.high_water_mark)
            .field("excluding_clients", &self.excluding_clients)
            .field("including_clients", &self.including_clients)
            .field("rewrite_request", &self.rewrite_request.is_some())
            .field("original_proxy", &self.original_proxy)
            .finish()
    }
}

pub struct DownloadEngine {
    fetcher: Arc<dyn Fetcher>,
    policy: Arc<dyn NarrowingPolicy>,
}

impl DownloadEngine {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            policy: Arc::new(MobileFallback),
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn NarrowingPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Validates a format from `metadata` and starts streaming it.
    ///
    /// Metadata preconditions are checked before any request is made.
    pub async fn download_from_metadata(
        &self,
        metadata: &VideoMetadata,
        options: &DownloadOptions,
    ) -> Result<DownloadStream> {
        if !metadata.full {
            return Err(Error::IncompleteMetadata);
        }
        if metadata.formats.is_empty() {
            return Err(Error::NotDownloadable);
        }

        let setup = options.request_setup();
        let format = get_valid_download_url(
            &metadata.formats,
            &options.constraints(),
            self.fetcher.as_ref(),
            &setup,
            self.policy.as_ref(),
        )
        .await?;

        let agent = AgentClass::from_origin(format.origin);
        info!(
            "[ {} ]: downloading itag {} ({})",
            format.origin, format.itag, format.mime_type
        );

        if options.is_direct() {
            let url = setup.apply(&format.url);
            debug!("[ Download ]: Requesting URL: {}", url);

            let res = self
                .fetcher
                .fetch(download_headers(HttpRequest::get(url), agent))
                .await?;
            if !res.is_success() {
                return Err(Error::DownloadFailed { status: res.status });
            }
            let body = res.body.ok_or(Error::EmptyResponseBody)?;
            return Ok(DownloadStream::direct(body, format));
        }

        let cursor = ChunkCursor::new(
            options.range.as_ref(),
            options.dl_chunk_size.max(1),
            format.content_length(),
        );
        let pump = SegmentPump {
            fetcher: self.fetcher.clone(),
            url: format.url.clone(),
            setup,
            agent,
            cursor,
            high_water_mark: options.high_water_mark,
        };

        let cancel = CancellationToken::new();
        let rx = pump.spawn(cancel.clone());
        Ok(DownloadStream::chunked(rx, cancel, format))
    }
}
