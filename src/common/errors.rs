use thiserror::Error;

use crate::clients::ClientOrigin;

/// Every failure the pipeline can surface.
///
/// Variants map onto four classes: unrecoverable (the video is confirmed
/// unplayable), exhaustion (`NoMatchingFormat`, `NoValidFormat`), per-origin
/// failures (`Client`, recovered by the validator loop) and stream failures
/// raised while bytes are already flowing.
#[derive(Debug, Error)]
pub enum Error {
    #[error("video is unplayable: {reason}")]
    Unrecoverable { reason: String },

    #[error("no format matches the requested constraints")]
    NoMatchingFormat,

    #[error("every candidate format failed validation")]
    NoValidFormat,

    #[error("this video is not available due to lack of video format")]
    NotDownloadable,

    #[error("cannot download from basic metadata, fetch full metadata first")]
    IncompleteMetadata,

    #[error("download failed with status code {status}")]
    DownloadFailed { status: u16 },

    #[error("failed to retrieve response body")]
    EmptyResponseBody,

    #[error("[ {origin} ]: {reason}")]
    Client {
        origin: ClientOrigin,
        status: Option<u16>,
        reason: String,
    },

    #[error("unknown client profile: {0}")]
    UnknownClient(String),

    #[error("invalid video id or url: {0}")]
    InvalidVideoId(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::DownloadFailed { status } => Some(*status),
            Self::Client { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::DownloadFailed {
                status: status.as_u16(),
            },
            None => Self::Transport(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_exposed_for_http_failures() {
        assert_eq!(Error::DownloadFailed { status: 403 }.status(), Some(403));

        let client = Error::Client {
            origin: ClientOrigin::Ios,
            status: Some(429),
            reason: "rate limited".into(),
        };
        assert_eq!(client.status(), Some(429));
        assert_eq!(Error::NoValidFormat.status(), None);
    }

    #[test]
    fn client_error_names_origin() {
        let err = Error::Client {
            origin: ClientOrigin::TvEmbedded,
            status: None,
            reason: "LOGIN_REQUIRED".into(),
        };
        assert_eq!(err.to_string(), "[ TvEmbedded ]: LOGIN_REQUIRED");
    }
}
