use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::common::{ClientIdentity, make_player_request, with_locale};
use super::{ClientError, ClientOrigin, ClientProfile, ClientsParams, PlayerResponse};
use crate::common::http::Fetcher;

const CLIENT_NAME: &str = "TVHTML5";
const CLIENT_ID: &str = "7";
const CLIENT_VERSION: &str = "7.20250219.19.00";
const USER_AGENT: &str = super::ua::yt_ua::TVHTML5;

const IDENTITY: ClientIdentity = ClientIdentity {
    origin: ClientOrigin::Tv,
    client_id: CLIENT_ID,
    client_version: CLIENT_VERSION,
    user_agent: USER_AGENT,
    web_origin: None,
};

pub struct TvClient {
    fetcher: Arc<dyn Fetcher>,
}

impl TvClient {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    fn build_context(&self, params: &ClientsParams) -> Value {
        let client = json!({
            "clientName": CLIENT_NAME,
            "clientVersion": CLIENT_VERSION,
            "userAgent": USER_AGENT,
            "platform": "TV"
        });

        json!({
            "client": with_locale(client, params),
            "user": { "lockedSafetyMode": false },
            "request": { "useSsl": true }
        })
    }
}

#[async_trait]
impl ClientProfile for TvClient {
    fn origin(&self) -> ClientOrigin {
        ClientOrigin::Tv
    }

    async fn request(&self, params: &ClientsParams) -> Result<PlayerResponse, ClientError> {
        let context = self.build_context(params);
        make_player_request(self.fetcher.as_ref(), &IDENTITY, context, params).await
    }
}
