use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::common::{ClientIdentity, make_player_request, with_locale};
use super::{ClientError, ClientOrigin, ClientProfile, ClientsParams, PlayerResponse};
use crate::common::http::Fetcher;

const CLIENT_NAME: &str = "ANDROID";
const CLIENT_ID: &str = "3";
const CLIENT_VERSION: &str = "20.01.35";
const USER_AGENT: &str = super::ua::yt_ua::ANDROID;

const IDENTITY: ClientIdentity = ClientIdentity {
    origin: ClientOrigin::Android,
    client_id: CLIENT_ID,
    client_version: CLIENT_VERSION,
    user_agent: USER_AGENT,
    web_origin: None,
};

pub struct AndroidClient {
    fetcher: Arc<dyn Fetcher>,
}

impl AndroidClient {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    fn build_context(&self, params: &ClientsParams) -> Value {
        let client = json!({
            "clientName": CLIENT_NAME,
            "clientVersion": CLIENT_VERSION,
            "userAgent": USER_AGENT,
            "deviceMake": "Google",
            "deviceModel": "Pixel 6",
            "osName": "Android",
            "osVersion": "14",
            "androidSdkVersion": "34"
        });

        json!({
            "client": with_locale(client, params),
            "user": { "lockedSafetyMode": false },
            "request": { "useSsl": true }
        })
    }
}

#[async_trait]
impl ClientProfile for AndroidClient {
    fn origin(&self) -> ClientOrigin {
        ClientOrigin::Android
    }

    async fn request(&self, params: &ClientsParams) -> Result<PlayerResponse, ClientError> {
        let context = self.build_context(params);
        make_player_request(self.fetcher.as_ref(), &IDENTITY, context, params).await
    }
}
