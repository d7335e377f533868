use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::common::{ClientIdentity, make_player_request, with_locale};
use super::{ClientError, ClientOrigin, ClientProfile, ClientsParams, PlayerResponse};
use crate::common::http::Fetcher;

const CLIENT_NAME: &str = "MWEB";
const CLIENT_ID: &str = "2";
const CLIENT_VERSION: &str = "2.20250311.03.00";
const USER_AGENT: &str = super::ua::yt_ua::MWEB;

const IDENTITY: ClientIdentity = ClientIdentity {
    origin: ClientOrigin::Mweb,
    client_id: CLIENT_ID,
    client_version: CLIENT_VERSION,
    user_agent: USER_AGENT,
    web_origin: Some("https://m.youtube.com"),
};

pub struct MwebClient {
    fetcher: Arc<dyn Fetcher>,
}

impl MwebClient {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    fn build_context(&self, params: &ClientsParams) -> Value {
        let client = json!({
            "clientName": CLIENT_NAME,
            "clientVersion": CLIENT_VERSION,
            "userAgent": USER_AGENT,
            "platform": "MOBILE"
        });

        json!({
            "client": with_locale(client, params),
            "user": { "lockedSafetyMode": false },
            "request": { "useSsl": true }
        })
    }
}

#[async_trait]
impl ClientProfile for MwebClient {
    fn origin(&self) -> ClientOrigin {
        ClientOrigin::Mweb
    }

    async fn request(&self, params: &ClientsParams) -> Result<PlayerResponse, ClientError> {
        let context = self.build_context(params);
        make_player_request(self.fetcher.as_ref(), &IDENTITY, context, params).await
    }
}
