use serde_json::{Value, json};
use tracing::{debug, trace};

use super::{ClientError, ClientOrigin, ClientsParams, PlayerResponse};
use crate::common::http::{Fetcher, HttpRequest};

/// YouTube InnerTube API base endpoint (googleapis is more stable and avoids
/// some geo-restrictions that www.youtube.com may impose).
pub const INNERTUBE_API: &str = "https://youtubei.googleapis.com";

/// Static identity of one emulated client, sent as request headers.
pub struct ClientIdentity {
    pub origin: ClientOrigin,
    pub client_id: &'static str,
    pub client_version: &'static str,
    pub user_agent: &'static str,
    /// `Origin`/`Referer` for browser-like clients.
    pub web_origin: Option<&'static str>,
}

pub fn player_url() -> String {
    format!("{}/youtubei/v1/player?prettyPrint=false", INNERTUBE_API)
}

/// Attaches the per-request parts of the client block shared by every
/// profile: locale and visitor data.
pub fn with_locale(mut client: Value, params: &ClientsParams) -> Value {
    if let Some(obj) = client.as_object_mut() {
        obj.insert("hl".to_string(), params.hl.clone().into());
        obj.insert("gl".to_string(), params.gl.clone().into());
        if let Some(vd) = &params.visitor_data {
            obj.insert("visitorData".to_string(), vd.clone().into());
        }
    }
    client
}

pub fn build_player_body(context: Value, params: &ClientsParams) -> Value {
    let mut body = json!({
        "context": context,
        "videoId": params.video_id,
        "contentCheckOk": true,
        "racyCheckOk": true
    });

    if let Some(sts) = params.signature_timestamp {
        body["playbackContext"] = json!({
            "contentPlaybackContext": {
                "html5Preference": "HTML5_PREF_WANTS",
                "signatureTimestamp": sts
            }
        });
    }

    if let Some(po_token) = &params.po_token {
        body["serviceIntegrityDimensions"] = json!({ "poToken": po_token });
    }

    body
}

/// POSTs a player request and classifies the outcome.
///
/// Transport failures and non-2xx statuses are failures without contents. A
/// parsed body whose playability status is not `OK` is a failure that keeps
/// the body, so callers can still read `videoDetails` and the reason.
pub async fn make_player_request(
    fetcher: &dyn Fetcher,
    identity: &ClientIdentity,
    context: Value,
    params: &ClientsParams,
) -> Result<PlayerResponse, ClientError> {
    let origin = identity.origin;
    let body = build_player_body(context, params);

    let mut req = HttpRequest::post_json(player_url(), &body)
        .map_err(|e| ClientError::new(origin, e.to_string()))?
        .header("User-Agent", identity.user_agent)
        .header("X-YouTube-Client-Name", identity.client_id)
        .header("X-YouTube-Client-Version", identity.client_version);

    if let Some(web_origin) = identity.web_origin {
        req = req
            .header("Origin", web_origin)
            .header("Referer", format!("{}/", web_origin));
    }
    if let Some(vd) = &params.visitor_data {
        req = req.header("X-Goog-Visitor-Id", vd.as_str());
    }

    trace!("[ {} ]: requesting player for {}", origin, params.video_id);

    let res = fetcher
        .fetch(req)
        .await
        .map_err(|e| ClientError::new(origin, e.to_string()))?;

    if !res.is_success() {
        return Err(ClientError {
            origin,
            status: Some(res.status),
            reason: format!("player request failed with status {}", res.status),
            contents: None,
        });
    }

    let response: PlayerResponse = res
        .json()
        .await
        .map_err(|e| ClientError::new(origin, e.to_string()))?;

    if !response.is_playable() {
        let reason = response
            .playability_reason()
            .unwrap_or("missing playability status")
            .to_string();
        debug!("[ {} ]: video {} not playable ({})", origin, params.video_id, reason);
        return Err(ClientError {
            origin,
            status: None,
            reason,
            contents: Some(response),
        });
    }

    Ok(response)
}
