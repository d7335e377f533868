use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::common::{ClientIdentity, make_player_request, with_locale};
use super::{ClientError, ClientOrigin, ClientProfile, ClientsParams, PlayerResponse};
use crate::common::http::Fetcher;

const CLIENT_NAME: &str = "WEB";
const CLIENT_ID: &str = "1";
const CLIENT_VERSION: &str = "2.20260114.01.00";
const USER_AGENT: &str = super::ua::yt_ua::WEB;

const IDENTITY: ClientIdentity = ClientIdentity {
    origin: ClientOrigin::Web,
    client_id: CLIENT_ID,
    client_version: CLIENT_VERSION,
    user_agent: USER_AGENT,
    web_origin: Some("https://www.youtube.com"),
};

pub struct WebClient {
    fetcher: Arc<dyn Fetcher>,
}

impl WebClient {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    fn build_context(&self, params: &ClientsParams) -> Value {
        let client = json!({
            "clientName": CLIENT_NAME,
            "clientVersion": CLIENT_VERSION,
            "userAgent": USER_AGENT,
            "platform": "DESKTOP"
        });

        json!({
            "client": with_locale(client, params),
            "user": { "lockedSafetyMode": false },
            "request": { "useSsl": true }
        })
    }
}

#[async_trait]
impl ClientProfile for WebClient {
    fn origin(&self) -> ClientOrigin {
        ClientOrigin::Web
    }

    async fn request(&self, params: &ClientsParams) -> Result<PlayerResponse, ClientError> {
        let context = self.build_context(params);
        make_player_request(self.fetcher.as_ref(), &IDENTITY, context, params).await
    }
}
