//! iOS app client. URLs come pre-signed, no player script is needed.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::common::{ClientIdentity, make_player_request, with_locale};
use super::{ClientError, ClientOrigin, ClientProfile, ClientsParams, PlayerResponse};
use crate::common::http::Fetcher;

const CLIENT_NAME: &str = "IOS";
const CLIENT_ID: &str = "5";
const CLIENT_VERSION: &str = "21.02.1";
const USER_AGENT: &str = super::ua::yt_ua::IOS;

const IDENTITY: ClientIdentity = ClientIdentity {
    origin: ClientOrigin::Ios,
    client_id: CLIENT_ID,
    client_version: CLIENT_VERSION,
    user_agent: USER_AGENT,
    web_origin: None,
};

pub struct IosClient {
    fetcher: Arc<dyn Fetcher>,
}

impl IosClient {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    fn build_context(&self, params: &ClientsParams) -> Value {
        let client = json!({
            "clientName": CLIENT_NAME,
            "clientVersion": CLIENT_VERSION,
            "userAgent": USER_AGENT,
            "deviceMake": "Apple",
            "deviceModel": "iPhone16,2",
            "osName": "iPhone",
            "osVersion": "18.2.22C152",
            "utcOffsetMinutes": 0
        });

        json!({
            "client": with_locale(client, params),
            "user": { "lockedSafetyMode": false },
            "request": { "useSsl": true }
        })
    }
}

#[async_trait]
impl ClientProfile for IosClient {
    fn origin(&self) -> ClientOrigin {
        ClientOrigin::Ios
    }

    async fn request(&self, params: &ClientsParams) -> Result<PlayerResponse, ClientError> {
        let context = self.build_context(params);
        make_player_request(self.fetcher.as_ref(), &IDENTITY, context, params).await
    }
}
