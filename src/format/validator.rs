use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::{FormatConstraints, Including, choose};
use crate::clients::ClientOrigin;
use crate::common::errors::{Error, Result};
use crate::common::http::{Fetcher, HttpRequest};
use crate::download::request::RequestSetup;
use crate::info::StreamDescriptor;

/// Why a candidate URL was rejected by the probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub origin: ClientOrigin,
    pub status: Option<u16>,
    pub reason: String,
}

impl ProbeFailure {
    /// A 403 either as the answer's status or inside a transport error
    /// message.
    pub fn is_forbidden(&self) -> bool {
        self.status == Some(403) || self.reason.contains("403")
    }
}

/// Decides whether a probe failure should restrict the origins considered
/// for the next resolution.
pub trait NarrowingPolicy: Send + Sync {
    fn narrow(&self, failure: &ProbeFailure) -> Option<Including>;
}

/// Forbidden URLs tend to be identity-bound, and mobile app URLs are the ones
/// that usually still work, so a 403 restricts the next pick to ios and
/// android.
#[derive(Debug, Clone, Copy, Default)]
pub struct MobileFallback;

impl NarrowingPolicy for MobileFallback {
    fn narrow(&self, failure: &ProbeFailure) -> Option<Including> {
        if failure.is_forbidden() {
            Some(Including::only([ClientOrigin::Ios, ClientOrigin::Android]))
        } else {
            None
        }
    }
}

/// Exclusions accumulated by one validation loop. Only ever grows.
#[derive(Debug, Clone)]
pub struct ValidationState {
    excluding: BTreeSet<ClientOrigin>,
    excluding_urls: BTreeSet<String>,
    including: Including,
}

impl ValidationState {
    /// Retries never go back to the web profile, whose URLs are the first to
    /// be throttled.
    pub fn new(caller: &FormatConstraints) -> Self {
        let mut excluding = caller.excluding.clone();
        excluding.insert(ClientOrigin::Web);
        Self {
            excluding,
            excluding_urls: caller.excluding_urls.clone(),
            including: caller.including.clone(),
        }
    }

    pub fn excluding(&self) -> &BTreeSet<ClientOrigin> {
        &self.excluding
    }

    pub fn including(&self) -> &Including {
        &self.including
    }

    /// Records a failed candidate. An `unknown` origin is never excluded as a
    /// whole, only its URL is.
    pub fn record(
        &mut self,
        candidate: &StreamDescriptor,
        failure: &ProbeFailure,
        caller: &FormatConstraints,
        policy: &dyn NarrowingPolicy,
    ) {
        if candidate.origin != ClientOrigin::Unknown {
            self.excluding.insert(candidate.origin);
        }
        self.excluding_urls.insert(candidate.url.clone());
        self.including = policy
            .narrow(failure)
            .unwrap_or_else(|| caller.including.clone());
    }

    pub fn constraints(&self, caller: &FormatConstraints) -> FormatConstraints {
        FormatConstraints {
            filter: caller.filter.clone(),
            quality: caller.quality.clone(),
            excluding: self.excluding.clone(),
            including: self.including.clone(),
            excluding_urls: self.excluding_urls.clone(),
        }
    }
}

/// HEAD-probes a candidate through the request setup. Only a plain 200
/// passes.
pub async fn probe(
    fetcher: &dyn Fetcher,
    candidate: &StreamDescriptor,
    setup: &RequestSetup,
) -> std::result::Result<(), ProbeFailure> {
    let url = setup.apply(&candidate.url);

    let failure = match fetcher.fetch(HttpRequest::head(url)).await {
        Ok(res) if res.status == 200 => {
            debug!(
                "[ {} ]: Video URL is normal. The response was received with status code \"200\".",
                candidate.origin
            );
            return Ok(());
        }
        Ok(res) => ProbeFailure {
            origin: candidate.origin,
            status: Some(res.status),
            reason: format!("Status code: {}", res.status),
        },
        Err(e) => ProbeFailure {
            origin: candidate.origin,
            status: e.status(),
            reason: e.to_string(),
        },
    };

    debug!(
        "[ {} ]: The URL for the video did not return a successful response. Got another format. Reason: {}",
        candidate.origin, failure.reason
    );
    Err(failure)
}

/// Resolves and probes candidates until one answers, excluding each failed
/// origin before resolving again.
///
/// The first resolution failing is [`Error::NoMatchingFormat`]; running out
/// of candidates after at least one probe is [`Error::NoValidFormat`].
pub async fn get_valid_download_url(
    catalog: &[StreamDescriptor],
    constraints: &FormatConstraints,
    fetcher: &dyn Fetcher,
    setup: &RequestSetup,
    policy: &dyn NarrowingPolicy,
) -> Result<StreamDescriptor> {
    let mut candidate = choose(catalog, constraints)?;
    let mut state = ValidationState::new(constraints);

    loop {
        let failure = match probe(fetcher, &candidate, setup).await {
            Ok(()) => return Ok(candidate),
            Err(failure) => failure,
        };

        state.record(&candidate, &failure, constraints, policy);

        candidate = match choose(catalog, &state.constraints(constraints)) {
            Ok(next) => next,
            Err(_) => {
                warn!(
                    "No valid format left after excluding {:?} (last failure: {})",
                    state.excluding(),
                    failure.reason
                );
                return Err(Error::NoValidFormat);
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    fn desc(itag: u32, origin: ClientOrigin, label: &str) -> StreamDescriptor {
        StreamDescriptor {
            itag,
            url: format!("https://{}.googlevideo.com/videoplayback?itag={}", origin.as_str(), itag),
            mime_type: "video/mp4".into(),
            container: Some("mp4".into()),
            codecs: Vec::new(),
            content_length: None,
            quality_label: Some(label.into()),
            bitrate: None,
            width: None,
            height: None,
            fps: None,
            has_audio: false,
            has_video: true,
            origin,
        }
    }

    fn catalog() -> Vec<StreamDescriptor> {
        vec![
            desc(137, ClientOrigin::Web, "1080p"),
            desc(136, ClientOrigin::Tv, "720p"),
            desc(135, ClientOrigin::Android, "480p"),
            desc(134, ClientOrigin::Ios, "360p"),
        ]
    }

    fn status_by_host(rules: &'static [(&'static str, u16)]) -> MockFetcher {
        MockFetcher::new(move |req| {
            let status = rules
                .iter()
                .find(|(host, _)| req.url.contains(host))
                .map(|(_, status)| *status)
                .unwrap_or(200);
            MockFetcher::no_body_response(status)
        })
    }

    #[tokio::test]
    async fn first_healthy_candidate_is_returned() {
        let fetcher = status_by_host(&[]);
        let chosen = get_valid_download_url(
            &catalog(),
            &FormatConstraints::default(),
            &fetcher,
            &RequestSetup::default(),
            &MobileFallback,
        )
        .await
        .unwrap();

        assert_eq!(chosen.origin, ClientOrigin::Web);
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn forbidden_narrows_to_mobile_origins() {
        let fetcher = status_by_host(&[("web.", 403)]);
        let chosen = get_valid_download_url(
            &catalog(),
            &FormatConstraints::default(),
            &fetcher,
            &RequestSetup::default(),
            &MobileFallback,
        )
        .await
        .unwrap();

        // tv outranks android on resolution but is outside the narrowed set.
        assert_eq!(chosen.origin, ClientOrigin::Android);
        assert_eq!(fetcher.urls().len(), 2);
    }

    #[tokio::test]
    async fn forbidden_overrides_caller_inclusion() {
        let fetcher = status_by_host(&[("web.", 403)]);
        let caller = FormatConstraints {
            including: Including::only([ClientOrigin::Web, ClientOrigin::Tv]),
            ..Default::default()
        };
        let catalog: Vec<_> = catalog()
            .into_iter()
            .filter(|d| d.origin != ClientOrigin::Ios)
            .collect();

        let chosen = get_valid_download_url(
            &catalog,
            &caller,
            &fetcher,
            &RequestSetup::default(),
            &MobileFallback,
        )
        .await
        .unwrap();

        assert_eq!(chosen.origin, ClientOrigin::Android);
        assert_eq!(fetcher.urls().len(), 2);
    }

    #[tokio::test]
    async fn transport_error_mentioning_403_narrows() {
        let fetcher = MockFetcher::new(|req| {
            if req.url.contains("web.") {
                Err(Error::Transport("HTTP 403 Forbidden".into()))
            } else {
                MockFetcher::no_body_response(200)
            }
        });
        let catalog: Vec<_> = catalog()
            .into_iter()
            .filter(|d| d.origin != ClientOrigin::Android)
            .collect();

        let chosen = get_valid_download_url(
            &catalog,
            &FormatConstraints::default(),
            &fetcher,
            &RequestSetup::default(),
            &MobileFallback,
        )
        .await
        .unwrap();

        assert_eq!(chosen.origin, ClientOrigin::Ios);
    }

    #[test]
    fn forbidden_is_read_from_status_or_reason() {
        let failure = |status, reason: &str| ProbeFailure {
            origin: ClientOrigin::Web,
            status,
            reason: reason.into(),
        };
        assert!(failure(Some(403), "Status code: 403").is_forbidden());
        assert!(failure(None, "transport error: HTTP 403 Forbidden").is_forbidden());
        assert!(!failure(Some(500), "Status code: 500").is_forbidden());
        assert!(MobileFallback.narrow(&failure(Some(429), "Status code: 429")).is_none());
    }

    #[tokio::test]
    async fn other_failures_keep_caller_inclusion() {
        let fetcher = status_by_host(&[("web.", 500)]);
        let chosen = get_valid_download_url(
            &catalog(),
            &FormatConstraints::default(),
            &fetcher,
            &RequestSetup::default(),
            &MobileFallback,
        )
        .await
        .unwrap();
        assert_eq!(chosen.origin, ClientOrigin::Tv);
    }

    #[tokio::test]
    async fn exhaustion_is_no_valid_format() {
        let fetcher = status_by_host(&[("googlevideo", 410)]);
        let err = get_valid_download_url(
            &catalog(),
            &FormatConstraints::default(),
            &fetcher,
            &RequestSetup::default(),
            &MobileFallback,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::NoValidFormat));
        // every origin probed exactly once
        assert_eq!(fetcher.urls().len(), 4);
    }

    #[tokio::test]
    async fn nothing_matching_up_front_is_no_matching_format() {
        let fetcher = status_by_host(&[]);
        let constraints = FormatConstraints {
            quality: crate::format::Quality::Itag(1),
            ..Default::default()
        };
        let err = get_valid_download_url(&catalog(), &constraints, &fetcher, &RequestSetup::default(), &MobileFallback)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoMatchingFormat));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn unknown_origin_is_excluded_by_url_only() {
        let mut catalog = vec![
            desc(140, ClientOrigin::Unknown, "1080p"),
            desc(141, ClientOrigin::Unknown, "720p"),
        ];
        catalog[1].url = "https://ok.example/videoplayback?itag=141".into();
        let fetcher = status_by_host(&[("unknown.", 404)]);

        let chosen = get_valid_download_url(
            &catalog,
            &FormatConstraints::default(),
            &fetcher,
            &RequestSetup::default(),
            &MobileFallback,
        )
        .await
        .unwrap();
        assert_eq!(chosen.itag, 141);
    }

    #[test]
    fn exclusions_only_grow() {
        let caller = FormatConstraints::default();
        let mut state = ValidationState::new(&caller);
        assert!(state.excluding().contains(&ClientOrigin::Web));

        let mut seen = state.excluding().len();
        for d in catalog() {
            let failure = ProbeFailure {
                origin: d.origin,
                status: Some(403),
                reason: "Status code: 403".into(),
            };
            state.record(&d, &failure, &caller, &MobileFallback);
            assert!(state.excluding().len() >= seen);
            assert!(state.excluding().contains(&d.origin));
            seen = state.excluding().len();
        }
        assert_eq!(
            state.including(),
            &Including::only([ClientOrigin::Ios, ClientOrigin::Android])
        );
    }
}
