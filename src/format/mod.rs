//! Format selection: constraints, the deterministic resolver and the
//! probing validator.

pub mod resolver;
pub mod validator;

use std::{collections::BTreeSet, fmt, str::FromStr, sync::Arc};

use crate::clients::ClientOrigin;
use crate::info::StreamDescriptor;

pub use resolver::choose;
pub use validator::{MobileFallback, NarrowingPolicy, ProbeFailure, get_valid_download_url};

pub type FormatPredicate = dyn Fn(&StreamDescriptor) -> bool + Send + Sync;

/// Which kind of stream the caller wants.
#[derive(Clone)]
pub enum Filter {
    AudioAndVideo,
    VideoAndAudio,
    AudioOnly,
    VideoOnly,
    /// Anything carrying audio.
    Audio,
    /// Anything carrying video.
    Video,
    Custom(Arc<FormatPredicate>),
}

impl Filter {
    pub fn custom(f: impl Fn(&StreamDescriptor) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    pub fn matches(&self, d: &StreamDescriptor) -> bool {
        match self {
            Self::AudioAndVideo | Self::VideoAndAudio => d.has_audio && d.has_video,
            Self::AudioOnly => d.has_audio && !d.has_video,
            Self::VideoOnly => d.has_video && !d.has_audio,
            Self::Audio => d.has_audio,
            Self::Video => d.has_video,
            Self::Custom(f) => f(d),
        }
    }

    /// Whether the filter asks for muxed audio+video streams.
    pub fn wants_combined(&self) -> bool {
        matches!(self, Self::AudioAndVideo | Self::VideoAndAudio)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AudioAndVideo => f.write_str("AudioAndVideo"),
            Self::VideoAndAudio => f.write_str("VideoAndAudio"),
            Self::AudioOnly => f.write_str("AudioOnly"),
            Self::VideoOnly => f.write_str("VideoOnly"),
            Self::Audio => f.write_str("Audio"),
            Self::Video => f.write_str("Video"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "audioandvideo" => Ok(Self::AudioAndVideo),
            "videoandaudio" => Ok(Self::VideoAndAudio),
            "audioonly" => Ok(Self::AudioOnly),
            "videoonly" => Ok(Self::VideoOnly),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            other => Err(format!("unknown filter: {}", other)),
        }
    }
}

/// Which of the matching formats to pick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Quality {
    #[default]
    Highest,
    Lowest,
    HighestAudio,
    LowestAudio,
    HighestVideo,
    LowestVideo,
    Itag(u32),
    /// Exact quality label such as `720p`.
    Label(String),
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(itag) = s.parse::<u32>() {
            return Ok(Self::Itag(itag));
        }
        match s.to_ascii_lowercase().as_str() {
            "highest" => Ok(Self::Highest),
            "lowest" => Ok(Self::Lowest),
            "highestaudio" => Ok(Self::HighestAudio),
            "lowestaudio" => Ok(Self::LowestAudio),
            "highestvideo" => Ok(Self::HighestVideo),
            "lowestvideo" => Ok(Self::LowestVideo),
            "" => Err("empty quality".to_string()),
            _ => Ok(Self::Label(s.to_string())),
        }
    }
}

/// Origin allow-list for resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Including {
    #[default]
    All,
    Only(BTreeSet<ClientOrigin>),
}

impl Including {
    pub fn only(origins: impl IntoIterator<Item = ClientOrigin>) -> Self {
        Self::Only(origins.into_iter().collect())
    }

    pub fn allows(&self, origin: ClientOrigin) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(&origin),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormatConstraints {
    pub filter: Option<Filter>,
    pub quality: Quality,
    pub excluding: BTreeSet<ClientOrigin>,
    pub including: Including,
    /// Descriptor URLs already known to be bad. Keeps untrusted-origin
    /// candidates from being picked twice.
    pub excluding_urls: BTreeSet<String>,
}

impl FormatConstraints {
    pub fn admits(&self, d: &StreamDescriptor) -> bool {
        self.including.allows(d.origin)
            && !self.excluding.contains(&d.origin)
            && !self.excluding_urls.contains(&d.url)
            && self.filter.as_ref().is_none_or(|f| f.matches(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_style_values() {
        assert!(matches!("audioonly".parse::<Filter>(), Ok(Filter::AudioOnly)));
        assert!(matches!("AudioAndVideo".parse::<Filter>(), Ok(Filter::AudioAndVideo)));
        assert!("subtitles".parse::<Filter>().is_err());

        assert_eq!("251".parse::<Quality>(), Ok(Quality::Itag(251)));
        assert_eq!("highestaudio".parse::<Quality>(), Ok(Quality::HighestAudio));
        assert_eq!("720p".parse::<Quality>(), Ok(Quality::Label("720p".into())));
    }

    #[test]
    fn including_all_allows_everything() {
        assert!(Including::All.allows(ClientOrigin::Unknown));
        let mobile = Including::only([ClientOrigin::Ios, ClientOrigin::Android]);
        assert!(mobile.allows(ClientOrigin::Android));
        assert!(!mobile.allows(ClientOrigin::Web));
    }
}
