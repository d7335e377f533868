//! Scripted doubles for the transport and profile capabilities.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream};
use parking_lot::Mutex;

use crate::clients::{
    ClientError, ClientOrigin, ClientProfile, ClientsParams, PlayabilityStatus, PlayerResponse,
    RawFormat, StreamingData, VideoDetails,
};
use crate::common::{
    errors::Result,
    http::{Fetcher, HttpRequest, HttpResponse},
};

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync;

/// Answers every request from a closure and records what was asked.
pub struct MockFetcher {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockFetcher {
    pub fn new(handler: impl Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ok_empty() -> Self {
        Self::new(|_| Self::status_response(200))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.url.clone()).collect()
    }

    pub fn status_response(status: u16) -> Result<HttpResponse> {
        Self::body_response(status, Vec::new())
    }

    pub fn json_response(status: u16, body: &str) -> Result<HttpResponse> {
        Self::body_response(status, vec![Bytes::from(body.to_string())])
    }

    pub fn body_response(status: u16, chunks: Vec<Bytes>) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status,
            body: Some(stream::iter(chunks.into_iter().map(Ok)).boxed()),
        })
    }

    /// Sends `first` and then never finishes.
    pub fn hanging_response(first: Bytes) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status: 206,
            body: Some(
                stream::iter(vec![Ok(first)])
                    .chain(stream::pending())
                    .boxed(),
            ),
        })
    }

    pub fn no_body_response(status: u16) -> Result<HttpResponse> {
        Ok(HttpResponse { status, body: None })
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = (self.handler)(&request);
        self.requests.lock().push(request);
        response
    }
}

/// A profile with a fixed outcome that counts its calls.
pub struct MockProfile {
    origin: ClientOrigin,
    outcome: std::result::Result<PlayerResponse, ClientError>,
    calls: AtomicUsize,
}

impl MockProfile {
    pub fn ok(origin: ClientOrigin, response: PlayerResponse) -> Arc<Self> {
        Arc::new(Self {
            origin,
            outcome: Ok(response),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(origin: ClientOrigin, contents: Option<PlayerResponse>) -> Arc<Self> {
        Arc::new(Self {
            origin,
            outcome: Err(ClientError {
                origin,
                status: None,
                reason: "LOGIN_REQUIRED".to_string(),
                contents,
            }),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientProfile for MockProfile {
    fn origin(&self) -> ClientOrigin {
        self.origin
    }

    async fn request(
        &self,
        _params: &ClientsParams,
    ) -> std::result::Result<PlayerResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.outcome.clone()
    }
}

pub fn raw_format(itag: u32, mime: &str, url: &str) -> RawFormat {
    RawFormat {
        itag,
        url: Some(url.to_string()),
        mime_type: mime.to_string(),
        ..Default::default()
    }
}

pub fn playable_response(formats: Vec<RawFormat>) -> PlayerResponse {
    PlayerResponse {
        playability_status: Some(PlayabilityStatus {
            status: "OK".to_string(),
            ..Default::default()
        }),
        video_details: Some(VideoDetails {
            video_id: "dQw4w9WgXcQ".to_string(),
            title: "Never Gonna Give You Up".to_string(),
            author: "Rick Astley".to_string(),
            length_seconds: Some("212".to_string()),
            ..Default::default()
        }),
        streaming_data: Some(StreamingData {
            adaptive_formats: formats,
            ..Default::default()
        }),
    }
}

pub fn blocked_response(reason: &str) -> PlayerResponse {
    PlayerResponse {
        playability_status: Some(PlayabilityStatus {
            status: "UNPLAYABLE".to_string(),
            reason: Some(reason.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
