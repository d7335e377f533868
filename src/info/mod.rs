//! Video metadata: client fan-out, format catalog and the cached result.

pub mod cache;
pub mod formats;
pub mod player;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::clients::{ClientOrigin, PlayabilityStatus, VideoDetails};
use crate::common::errors::{Error, Result};

pub use cache::{Cache, MemoryCache};
pub use formats::{StreamDescriptor, build_catalog};
pub use player::{AggregationResult, ClientOutcome, ResponseAggregator};

static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex"));

/// Everything known about one video after aggregation.
///
/// `full` is only set when `formats` holds the merged catalog; downloads
/// refuse anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub video_id: String,
    pub video_details: Option<VideoDetails>,
    pub playability_status: Option<PlayabilityStatus>,
    pub formats: Vec<StreamDescriptor>,
    /// Origins whose player request succeeded.
    pub clients: Vec<ClientOrigin>,
    pub is_minimal_mode: bool,
    pub full: bool,
}

impl VideoMetadata {
    pub fn from_aggregation(video_id: &str, result: &AggregationResult, full: bool) -> Self {
        Self {
            video_id: video_id.to_string(),
            video_details: result.video_details().cloned(),
            playability_status: result.playability_status().cloned(),
            formats: if full { result.catalog() } else { Vec::new() },
            clients: result.succeeded_origins(),
            is_minimal_mode: result.is_minimal_mode,
            full,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.video_details.as_ref().map(|d| d.title.as_str())
    }
}

fn after<'a>(input: &'a str, marker: &str, terminators: &[char]) -> Option<&'a str> {
    let rest = input.split(marker).nth(1)?;
    rest.split(terminators).next()
}

/// Pulls the 11 character video id out of a bare id or a watch, youtu.be,
/// shorts, live or embed URL.
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();

    let candidate = if input.contains("v=") {
        after(input, "v=", &['&', '#'])
    } else if input.contains("youtu.be/") {
        after(input, "youtu.be/", &['?', '&', '#', '/'])
    } else if input.contains("/shorts/") {
        after(input, "/shorts/", &['?', '&', '#', '/'])
    } else if input.contains("/live/") {
        after(input, "/live/", &['?', '&', '#', '/'])
    } else if input.contains("/embed/") {
        after(input, "/embed/", &['?', '&', '#', '/'])
    } else {
        Some(input)
    };

    match candidate {
        Some(id) if VIDEO_ID_RE.is_match(id) => Ok(id.to_string()),
        _ => Err(Error::InvalidVideoId(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ClientsParams;
    use crate::testing::{MockProfile, playable_response, raw_format};
    use std::sync::Arc;

    #[test]
    fn extracts_ids_from_common_urls() {
        let cases = [
            "dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?feature=share",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ#t=1",
        ];
        for case in cases {
            assert_eq!(extract_video_id(case).unwrap(), "dQw4w9WgXcQ", "{case}");
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        for case in ["", "short", "https://example.com/video", "dQw4w9WgXcQ!!"] {
            assert!(matches!(extract_video_id(case), Err(Error::InvalidVideoId(_))), "{case}");
        }
    }

    #[tokio::test]
    async fn basic_metadata_carries_no_formats() {
        let ios = MockProfile::ok(
            ClientOrigin::Ios,
            playable_response(vec![raw_format(18, "video/mp4; codecs=\"avc1, mp4a.40.2\"", "https://ios/18")]),
        );
        let agg = ResponseAggregator::new(vec![ios as Arc<dyn crate::clients::ClientProfile>]);
        let result = agg
            .aggregate(&ClientsParams::new("dQw4w9WgXcQ"), &[ClientOrigin::Ios])
            .await
            .unwrap();

        let basic = VideoMetadata::from_aggregation("dQw4w9WgXcQ", &result, false);
        assert!(!basic.full);
        assert!(basic.formats.is_empty());
        assert_eq!(basic.title(), Some("Never Gonna Give You Up"));

        let full = VideoMetadata::from_aggregation("dQw4w9WgXcQ", &result, true);
        assert!(full.full);
        assert_eq!(full.formats.len(), 1);
        assert_eq!(full.clients, vec![ClientOrigin::Ios]);
    }
}
