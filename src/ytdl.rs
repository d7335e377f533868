use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::clients::{ClientOrigin, ClientProfile, ClientsParams, default_profiles};
use crate::common::errors::Result;
use crate::common::http::{Fetcher, ReqwestFetcher};
use crate::configs::Config;
use crate::download::{DownloadEngine, DownloadOptions, DownloadStream};
use crate::info::{Cache, MemoryCache, ResponseAggregator, VideoMetadata, extract_video_id};

/// Entry point tying aggregation, caching and downloading together.
pub struct Ytdl {
    aggregator: ResponseAggregator,
    engine: DownloadEngine,
    selected: Vec<ClientOrigin>,
    params: ClientsParams,
    cache: Option<Arc<dyn Cache>>,
    cache_ttl: Duration,
    download_defaults: DownloadOptions,
}

impl Ytdl {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            aggregator: ResponseAggregator::new(default_profiles(fetcher.clone())),
            engine: DownloadEngine::new(fetcher),
            selected: ClientOrigin::DEFAULT_SELECTION.to_vec(),
            params: ClientsParams::new(""),
            cache: None,
            cache_ttl: Duration::from_secs(3600),
            download_defaults: DownloadOptions::default(),
        }
    }

    /// Builds the production stack described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new()?);
        let mut ytdl = Self::new(fetcher).with_clients(config.clients.origins());

        ytdl.params.hl = config.clients.hl.clone();
        ytdl.params.gl = config.clients.gl.clone();
        ytdl.params.po_token = config.clients.po_token.clone();
        ytdl.params.visitor_data = config.clients.visitor_data.clone();
        ytdl.download_defaults = DownloadOptions::from_config(&config.download);

        if config.cache.enabled {
            ytdl = ytdl.with_cache(
                Arc::new(MemoryCache::new()),
                Duration::from_secs(config.cache.ttl_secs),
            );
        }
        Ok(ytdl)
    }

    pub fn with_clients(mut self, selected: Vec<ClientOrigin>) -> Self {
        self.selected = selected;
        self
    }

    /// Replaces the profile set, mostly useful with custom transports.
    pub fn with_profiles(mut self, profiles: Vec<Arc<dyn ClientProfile>>) -> Self {
        self.aggregator = ResponseAggregator::new(profiles);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    pub fn with_engine(mut self, engine: DownloadEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Download options seeded from configuration.
    pub fn download_options(&self) -> DownloadOptions {
        self.download_defaults.clone()
    }

    fn params_for(&self, video_id: &str) -> ClientsParams {
        ClientsParams {
            video_id: video_id.to_string(),
            ..self.params.clone()
        }
    }

    /// Details and playability only. Cannot be downloaded from.
    pub async fn get_basic_info(&self, link: &str) -> Result<VideoMetadata> {
        let video_id = extract_video_id(link)?;
        let result = self
            .aggregator
            .aggregate(&self.params_for(&video_id), &self.selected)
            .await?;
        Ok(VideoMetadata::from_aggregation(&video_id, &result, false))
    }

    /// Details plus the merged format catalog.
    pub async fn get_full_info(&self, link: &str) -> Result<VideoMetadata> {
        let video_id = extract_video_id(link)?;
        let key = format!("full:{}", video_id);

        if let Some(cached) = self.cached(&key).await {
            debug!("[ Cache ]: hit for {}", video_id);
            return Ok(cached);
        }

        let result = self
            .aggregator
            .aggregate(&self.params_for(&video_id), &self.selected)
            .await?;
        let metadata = VideoMetadata::from_aggregation(&video_id, &result, true);

        if !metadata.is_minimal_mode {
            self.store(&key, &metadata).await;
        }
        Ok(metadata)
    }

    pub async fn download(&self, link: &str, options: &DownloadOptions) -> Result<DownloadStream> {
        let metadata = self.get_full_info(link).await?;
        self.download_from_metadata(&metadata, options).await
    }

    pub async fn download_from_metadata(
        &self,
        metadata: &VideoMetadata,
        options: &DownloadOptions,
    ) -> Result<DownloadStream> {
        self.engine.download_from_metadata(metadata, options).await
    }

    async fn cached(&self, key: &str) -> Option<VideoMetadata> {
        let cache = self.cache.as_ref()?;
        match cache.get(key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(metadata) => Some(metadata),
                Err(e) => {
                    warn!("[ Cache ]: dropping unreadable entry {}: {}", key, e);
                    let _ = cache.delete(key).await;
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("[ Cache ]: lookup failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn store(&self, key: &str, metadata: &VideoMetadata) {
        let Some(cache) = &self.cache else {
            return;
        };
        let value = match serde_json::to_value(metadata) {
            Ok(value) => value,
            Err(e) => {
                warn!("[ Cache ]: could not serialize {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = cache.set(key, value, self.cache_ttl).await {
            warn!("[ Cache ]: could not store {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::Error;
    use crate::testing::{MockFetcher, MockProfile, playable_response, raw_format};

    fn ytdl(profiles: Vec<Arc<MockProfile>>) -> Ytdl {
        Ytdl::new(Arc::new(MockFetcher::ok_empty()))
            .with_profiles(
                profiles
                    .into_iter()
                    .map(|p| p as Arc<dyn ClientProfile>)
                    .collect(),
            )
            .with_clients(vec![ClientOrigin::Ios])
    }

    #[tokio::test]
    async fn full_info_is_served_from_cache() {
        let ios = MockProfile::ok(
            ClientOrigin::Ios,
            playable_response(vec![raw_format(140, "audio/mp4; codecs=\"mp4a.40.2\"", "https://ios/140")]),
        );
        let ytdl = ytdl(vec![ios.clone()]).with_cache(Arc::new(MemoryCache::new()), Duration::from_secs(60));

        let first = ytdl.get_full_info("https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        let second = ytdl.get_full_info("dQw4w9WgXcQ").await.unwrap();

        assert!(first.full);
        assert_eq!(first.formats, second.formats);
        assert_eq!(ios.calls(), 1);
    }

    #[tokio::test]
    async fn minimal_results_are_not_cached() {
        let ios = MockProfile::failing(ClientOrigin::Ios, Some(playable_response(vec![])));
        let web = MockProfile::failing(ClientOrigin::Web, None);
        let ytdl = ytdl(vec![ios.clone(), web.clone()]).with_cache(Arc::new(MemoryCache::new()), Duration::from_secs(60));

        let info = ytdl.get_full_info("dQw4w9WgXcQ").await.unwrap();
        assert!(info.is_minimal_mode);
        ytdl.get_full_info("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(ios.calls(), 2);
    }

    #[tokio::test]
    async fn basic_info_cannot_be_downloaded() {
        let ios = MockProfile::ok(
            ClientOrigin::Ios,
            playable_response(vec![raw_format(140, "audio/mp4", "https://ios/140")]),
        );
        let ytdl = ytdl(vec![ios]);

        let basic = ytdl.get_basic_info("dQw4w9WgXcQ").await.unwrap();
        let err = ytdl
            .download_from_metadata(&basic, &DownloadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IncompleteMetadata));
    }

    #[tokio::test]
    async fn invalid_links_fail_early() {
        let ios = MockProfile::ok(ClientOrigin::Ios, playable_response(vec![]));
        let ytdl = ytdl(vec![ios.clone()]);
        assert!(matches!(
            ytdl.get_full_info("https://example.com/").await,
            Err(Error::InvalidVideoId(_))
        ));
        assert_eq!(ios.calls(), 0);
    }
}
