use std::{fmt, sync::Arc};

use reqwest::Url;
use tracing::debug;

use crate::clients::AgentClass;
use crate::common::http::HttpRequest;

const YOUTUBE_ORIGIN: &str = "https://www.youtube.com";

/// Context handed to the rewrite hook.
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext {
    pub is_download_url: bool,
}

/// Caller hook that may replace any outbound download URL.
pub type RewriteRequest = Arc<dyn Fn(&str, &RewriteContext) -> String + Send + Sync>;

/// Relay that receives the real URL as a query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalProxy {
    pub download: String,
    pub url_query_name: String,
}

impl OriginalProxy {
    pub fn new(download: impl Into<String>) -> Self {
        Self {
            download: download.into(),
            url_query_name: "url".to_string(),
        }
    }

    fn wrap(&self, url: &str) -> Option<String> {
        let parsed = match Url::parse(&self.download) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(
                    "[ OriginalProxy ]: The original proxy could not be adapted due to the following error: {}",
                    e
                );
                return None;
            }
        };

        let host = match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                debug!("[ OriginalProxy ]: {} has no host, ignoring it", self.download);
                return None;
            }
        };

        if url.contains(&host) {
            return None;
        }

        Some(format!(
            "{}://{}{}?{}={}",
            parsed.scheme(),
            host,
            parsed.path(),
            self.url_query_name,
            urlencoding::encode(url)
        ))
    }
}

/// Applied to every outbound download and probe URL: first the rewrite
/// hook, then the original-proxy substitution.
#[derive(Clone, Default)]
pub struct RequestSetup {
    pub rewrite: Option<RewriteRequest>,
    pub original_proxy: Option<OriginalProxy>,
}

impl RequestSetup {
    pub fn apply(&self, url: &str) -> String {
        let mut url = match &self.rewrite {
            Some(rewrite) => rewrite(url, &RewriteContext { is_download_url: true }),
            None => url.to_string(),
        };

        if let Some(proxy) = &self.original_proxy {
            if let Some(wrapped) = proxy.wrap(&url) {
                url = wrapped;
            }
        }

        url
    }
}

impl fmt::Debug for RequestSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSetup")
            .field("rewrite", &self.rewrite.is_some())
            .field("original_proxy", &self.original_proxy)
            .finish()
    }
}

/// Browser-like headers googlevideo expects, with a User-Agent matching the
/// device family the URL was issued to.
pub fn download_headers(request: HttpRequest, agent: AgentClass) -> HttpRequest {
    request
        .header("accept", "*/*")
        .header("origin", YOUTUBE_ORIGIN)
        .header("referer", YOUTUBE_ORIGIN)
        .header("DNT", "?1")
        .header("User-Agent", agent.random_user_agent())
}

/// Googlevideo takes byte ranges as a query parameter, inclusive on both ends.
pub fn ranged_url(url: &str, start: u64, end: u64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}range={}-{}", url, separator, start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO_URL: &str = "https://rr1.googlevideo.com/videoplayback?itag=140&id=abc";

    #[test]
    fn proxy_wraps_encoded_url() {
        let setup = RequestSetup {
            original_proxy: Some(OriginalProxy::new("https://proxy.example.com:8443/dl?ignored=1")),
            ..Default::default()
        };
        assert_eq!(
            setup.apply(VIDEO_URL),
            "https://proxy.example.com:8443/dl?url=https%3A%2F%2Frr1.googlevideo.com%2Fvideoplayback%3Fitag%3D140%26id%3Dabc"
        );
    }

    #[test]
    fn proxy_skips_urls_already_on_the_proxy_host() {
        let setup = RequestSetup {
            original_proxy: Some(OriginalProxy {
                download: "https://proxy.example.com/dl".into(),
                url_query_name: "target".into(),
            }),
            ..Default::default()
        };
        let url = "https://proxy.example.com/dl?target=x";
        assert_eq!(setup.apply(url), url);
    }

    #[test]
    fn malformed_proxy_is_ignored() {
        let setup = RequestSetup {
            original_proxy: Some(OriginalProxy::new("not a url")),
            ..Default::default()
        };
        assert_eq!(setup.apply(VIDEO_URL), VIDEO_URL);
    }

    #[test]
    fn rewrite_runs_before_proxy() {
        let setup = RequestSetup {
            rewrite: Some(Arc::new(|url: &str, ctx: &RewriteContext| {
                assert!(ctx.is_download_url);
                url.replace("rr1.googlevideo.com", "mirror.example.net")
            })),
            original_proxy: Some(OriginalProxy::new("https://proxy.example.com/dl")),
        };
        let out = setup.apply(VIDEO_URL);
        assert!(out.starts_with("https://proxy.example.com/dl?url=https%3A%2F%2Fmirror.example.net"));
    }

    #[test]
    fn download_headers_follow_agent_class() {
        let req = download_headers(HttpRequest::get(VIDEO_URL), AgentClass::Ios);
        assert_eq!(req.header_value("accept"), Some("*/*"));
        assert_eq!(req.header_value("Referer"), Some("https://www.youtube.com"));
        assert_eq!(req.header_value("dnt"), Some("?1"));
        assert!(
            req.header_value("user-agent")
                .is_some_and(|ua| ua.starts_with("com.google.ios.youtube"))
        );
    }

    #[test]
    fn ranged_url_appends_query_parameter() {
        assert_eq!(ranged_url(VIDEO_URL, 0, 10), format!("{}&range=0-10", VIDEO_URL));
        assert_eq!(ranged_url("https://h/p", 11, 20), "https://h/p?range=11-20");
    }
}
