//! Embedded TV player. Frequently gets past age gates for embeddable videos.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::common::{ClientIdentity, make_player_request, with_locale};
use super::{ClientError, ClientOrigin, ClientProfile, ClientsParams, PlayerResponse};
use crate::common::http::Fetcher;

const CLIENT_NAME: &str = "TVHTML5_SIMPLY_EMBEDDED_PLAYER";
const CLIENT_ID: &str = "85";
const CLIENT_VERSION: &str = "2.0";
const USER_AGENT: &str = super::ua::yt_ua::TV_EMBEDDED;

const IDENTITY: ClientIdentity = ClientIdentity {
    origin: ClientOrigin::TvEmbedded,
    client_id: CLIENT_ID,
    client_version: CLIENT_VERSION,
    user_agent: USER_AGENT,
    web_origin: None,
};

pub struct TvEmbeddedClient {
    fetcher: Arc<dyn Fetcher>,
}

impl TvEmbeddedClient {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    fn build_context(&self, params: &ClientsParams) -> Value {
        let client = json!({
            "clientName": CLIENT_NAME,
            "clientVersion": CLIENT_VERSION,
            "userAgent": USER_AGENT,
            "clientScreen": "EMBED"
        });

        json!({
            "client": with_locale(client, params),
            "user": { "lockedSafetyMode": false },
            "thirdParty": { "embedUrl": "https://www.youtube.com" }
        })
    }
}

#[async_trait]
impl ClientProfile for TvEmbeddedClient {
    fn origin(&self) -> ClientOrigin {
        ClientOrigin::TvEmbedded
    }

    async fn request(&self, params: &ClientsParams) -> Result<PlayerResponse, ClientError> {
        let context = self.build_context(params);
        make_player_request(self.fetcher.as_ref(), &IDENTITY, context, params).await
    }
}
