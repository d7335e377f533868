use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::clients::{ClientOrigin, PlayerResponse, RawFormat};

/// One playable rendition as offered by one client profile.
///
/// Descriptors are never mutated after the catalog is built; validation and
/// selection only narrow the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDescriptor {
    pub itag: u32,
    pub url: String,
    pub mime_type: String,
    pub container: Option<String>,
    pub codecs: Vec<String>,
    /// Byte length as sent upstream (a decimal string). Authoritative for
    /// chunk boundaries when present.
    pub content_length: Option<String>,
    pub quality_label: Option<String>,
    pub bitrate: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub has_audio: bool,
    pub has_video: bool,
    pub origin: ClientOrigin,
}

const AUDIO_CODEC_PREFIXES: &[&str] = &["mp4a", "opus", "vorbis", "ac-3", "ec-3", "flac"];

impl StreamDescriptor {
    /// Builds a descriptor from a raw format entry.
    ///
    /// Returns `None` for entries without a direct http(s) URL, which covers
    /// signature-ciphered formats.
    pub fn from_raw(raw: &RawFormat, origin: ClientOrigin) -> Option<Self> {
        let url = raw.url.as_deref()?;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return None;
        }

        let (container, codecs) = parse_mime(&raw.mime_type);
        let is_video_mime = raw.mime_type.starts_with("video/");
        let is_audio_mime = raw.mime_type.starts_with("audio/");
        let has_audio_codec = codecs
            .iter()
            .any(|c| AUDIO_CODEC_PREFIXES.iter().any(|p| c.starts_with(p)));

        Some(Self {
            itag: raw.itag,
            url: url.to_string(),
            mime_type: raw.mime_type.clone(),
            container,
            codecs,
            content_length: raw.content_length.clone(),
            quality_label: raw.quality_label.clone(),
            bitrate: raw.bitrate.or(raw.average_bitrate),
            width: raw.width,
            height: raw.height,
            fps: raw.fps,
            has_audio: is_audio_mime || has_audio_codec || raw.audio_quality.is_some(),
            has_video: is_video_mime,
            origin,
        })
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length.as_deref()?.trim().parse().ok()
    }

    pub fn is_combined(&self) -> bool {
        self.has_audio && self.has_video
    }

    /// Vertical resolution from the quality label ("1080p60" -> 1080),
    /// falling back to the declared height.
    pub fn resolution(&self) -> u32 {
        self.quality_label
            .as_deref()
            .and_then(|label| {
                let digits: String = label.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().ok()
            })
            .or(self.height)
            .unwrap_or(0)
    }
}

/// Splits `video/mp4; codecs="avc1.42001E, mp4a.40.2"` into the container
/// and codec list.
fn parse_mime(mime: &str) -> (Option<String>, Vec<String>) {
    let mut parts = mime.splitn(2, ';');
    let container = parts
        .next()
        .and_then(|t| t.split('/').nth(1))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let codecs = parts
        .next()
        .and_then(|rest| rest.split_once("codecs="))
        .map(|(_, list)| {
            list.trim_matches(|c: char| c == '"' || c.is_whitespace())
                .split(',')
                .map(|c| c.trim().trim_matches('"').to_string())
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default();

    (container, codecs)
}

/// Merges the playable formats of every given response, in the order given.
/// Within one response muxed formats come before adaptive ones.
pub fn build_catalog<'a>(
    responses: impl IntoIterator<Item = (ClientOrigin, &'a PlayerResponse)>,
) -> Vec<StreamDescriptor> {
    let mut catalog = Vec::new();

    for (origin, response) in responses {
        let Some(streaming_data) = &response.streaming_data else {
            continue;
        };

        for raw in streaming_data
            .formats
            .iter()
            .chain(streaming_data.adaptive_formats.iter())
        {
            match StreamDescriptor::from_raw(raw, origin) {
                Some(descriptor) => catalog.push(descriptor),
                None => trace!(
                    "[ {} ]: skipping itag {} without a direct url",
                    origin, raw.itag
                ),
            }
        }
    }

    catalog
}
