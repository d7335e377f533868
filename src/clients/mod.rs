//! Emulated InnerTube client profiles.
//!
//! Each profile knows how to phrase a `/player` request the way one official
//! app or device does. The rest of the crate only sees the [`ClientProfile`]
//! capability and the [`ClientOrigin`] tag that follows every piece of data a
//! profile produced.

pub mod android;
pub mod common;
pub mod ios;
pub mod mweb;
pub mod response;
pub mod tv;
pub mod tv_embedded;
pub mod ua;
pub mod web;
pub mod web_creator;
pub mod web_embedded;

use std::{fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::{errors::Error, http::Fetcher};

pub use response::{PlayabilityStatus, PlayerResponse, RawFormat, StreamingData, VideoDetails};
pub use ua::AgentClass;

/// Which emulated profile produced a response or a stream descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientOrigin {
    Web,
    WebCreator,
    WebEmbedded,
    TvEmbedded,
    Ios,
    Android,
    Mweb,
    Tv,
    /// Untrusted tag for data whose producer cannot be told apart.
    Unknown,
}

impl ClientOrigin {
    /// Every contactable profile, in aggregation order.
    pub const PROFILES: [ClientOrigin; 8] = [
        ClientOrigin::Web,
        ClientOrigin::WebCreator,
        ClientOrigin::WebEmbedded,
        ClientOrigin::TvEmbedded,
        ClientOrigin::Ios,
        ClientOrigin::Android,
        ClientOrigin::Mweb,
        ClientOrigin::Tv,
    ];

    pub const DEFAULT_SELECTION: [ClientOrigin; 4] = [
        ClientOrigin::Web,
        ClientOrigin::Mweb,
        ClientOrigin::Tv,
        ClientOrigin::Ios,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::WebCreator => "webCreator",
            Self::WebEmbedded => "webEmbedded",
            Self::TvEmbedded => "tvEmbedded",
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Mweb => "mweb",
            Self::Tv => "tv",
            Self::Unknown => "unknown",
        }
    }

    /// Label used in log lines and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Web => "Web",
            Self::WebCreator => "WebCreator",
            Self::WebEmbedded => "WebEmbedded",
            Self::TvEmbedded => "TvEmbedded",
            Self::Ios => "Ios",
            Self::Android => "Android",
            Self::Mweb => "MWeb",
            Self::Tv => "Tv",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ClientOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ClientOrigin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "web" => Ok(Self::Web),
            "webcreator" => Ok(Self::WebCreator),
            "webembedded" | "webembeddedplayer" => Ok(Self::WebEmbedded),
            "tvembedded" | "tvhtml5simplyembeddedplayer" => Ok(Self::TvEmbedded),
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            "mweb" => Ok(Self::Mweb),
            "tv" | "tvhtml5" => Ok(Self::Tv),
            "unknown" => Ok(Self::Unknown),
            _ => Err(Error::UnknownClient(s.to_string())),
        }
    }
}

/// Parameters shared by every profile for one player request.
#[derive(Debug, Clone)]
pub struct ClientsParams {
    pub video_id: String,
    pub hl: String,
    pub gl: String,
    pub signature_timestamp: Option<u32>,
    pub po_token: Option<String>,
    pub visitor_data: Option<String>,
}

impl ClientsParams {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            hl: "en".to_string(),
            gl: "US".to_string(),
            signature_timestamp: None,
            po_token: None,
            visitor_data: None,
        }
    }
}

/// A failed profile request.
///
/// `contents` keeps whatever body the upstream returned, e.g. a player
/// response whose playability status is not `OK`.
#[derive(Debug, Clone)]
pub struct ClientError {
    pub origin: ClientOrigin,
    pub status: Option<u16>,
    pub reason: String,
    pub contents: Option<PlayerResponse>,
}

impl ClientError {
    pub fn new(origin: ClientOrigin, reason: impl Into<String>) -> Self {
        Self {
            origin,
            status: None,
            reason: reason.into(),
            contents: None,
        }
    }
}

impl From<ClientError> for Error {
    fn from(e: ClientError) -> Self {
        Error::Client {
            origin: e.origin,
            status: e.status,
            reason: e.reason,
        }
    }
}

/// One emulated device/app. Must be callable concurrently.
#[async_trait]
pub trait ClientProfile: Send + Sync {
    fn origin(&self) -> ClientOrigin;

    async fn request(&self, params: &ClientsParams) -> Result<PlayerResponse, ClientError>;
}

/// Builds the full set of InnerTube profiles over one transport.
pub fn default_profiles(fetcher: Arc<dyn Fetcher>) -> Vec<Arc<dyn ClientProfile>> {
    vec![
        Arc::new(web::WebClient::new(fetcher.clone())),
        Arc::new(web_creator::WebCreatorClient::new(fetcher.clone())),
        Arc::new(web_embedded::WebEmbeddedClient::new(fetcher.clone())),
        Arc::new(tv_embedded::TvEmbeddedClient::new(fetcher.clone())),
        Arc::new(ios::IosClient::new(fetcher.clone())),
        Arc::new(android::AndroidClient::new(fetcher.clone())),
        Arc::new(mweb::MwebClient::new(fetcher.clone())),
        Arc::new(tv::TvClient::new(fetcher)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_names_round_trip_through_parser() {
        for origin in ClientOrigin::PROFILES {
            assert_eq!(origin.as_str().parse::<ClientOrigin>().unwrap(), origin);
            assert_eq!(origin.label().parse::<ClientOrigin>().unwrap(), origin);
        }
        assert_eq!("TVHTML5".parse::<ClientOrigin>().unwrap(), ClientOrigin::Tv);
        assert!("fridge".parse::<ClientOrigin>().is_err());
    }

    #[test]
    fn default_profiles_cover_every_origin_once() {
        let fetcher: Arc<dyn Fetcher> = Arc::new(crate::testing::MockFetcher::ok_empty());
        let origins: Vec<ClientOrigin> = default_profiles(fetcher)
            .iter()
            .map(|p| p.origin())
            .collect();
        assert_eq!(origins, ClientOrigin::PROFILES.to_vec());
    }
}
