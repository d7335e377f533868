use serde::{Deserialize, Serialize};

/// The subset of a `/player` response the pipeline reads.
///
/// Unknown fields are ignored; every section is optional because failing
/// clients routinely return only `playabilityStatus`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    #[serde(default)]
    pub playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    pub video_details: Option<VideoDetails>,
    #[serde(default)]
    pub streaming_data: Option<StreamingData>,
}

impl PlayerResponse {
    pub fn is_playable(&self) -> bool {
        self.playability_status
            .as_ref()
            .is_some_and(|p| p.status == "OK")
    }

    pub fn playability_reason(&self) -> Option<&str> {
        self.playability_status
            .as_ref()
            .and_then(|p| p.reason.as_deref().or(Some(p.status.as_str())))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayabilityStatus {
    #[serde(default)]
    pub status: String,
    pub reason: Option<String>,
    pub playable_in_embed: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    #[serde(default)]
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub channel_id: Option<String>,
    pub length_seconds: Option<String>,
    pub view_count: Option<String>,
    pub is_live_content: Option<bool>,
    pub short_description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    pub expires_in_seconds: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
    #[serde(default)]
    pub adaptive_formats: Vec<RawFormat>,
    pub hls_manifest_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFormat {
    pub itag: u32,
    pub url: Option<String>,
    pub signature_cipher: Option<String>,
    pub cipher: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    pub bitrate: Option<u64>,
    pub average_bitrate: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub content_length: Option<String>,
    pub quality: Option<String>,
    pub quality_label: Option<String>,
    pub audio_quality: Option<String>,
    pub audio_sample_rate: Option<String>,
    pub audio_channels: Option<u32>,
    pub approx_duration_ms: Option<String>,
}
