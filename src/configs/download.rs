use serde::{Deserialize, Serialize};

use crate::download::request::OriginalProxy;

pub const DEFAULT_DL_CHUNK_SIZE: u64 = 1024 * 1024 * 10;
pub const DEFAULT_HIGH_WATER_MARK: usize = 1024 * 512;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DownloadConfig {
    #[serde(default = "default_dl_chunk_size")]
    pub dl_chunk_size: u64,
    #[serde(default = "default_high_water_mark")]
    pub high_water_mark: usize,
    pub original_proxy: Option<OriginalProxyConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OriginalProxyConfig {
    pub download: String,
    pub url_query_name: Option<String>,
}

fn default_dl_chunk_size() -> u64 {
    DEFAULT_DL_CHUNK_SIZE
}

fn default_high_water_mark() -> usize {
    DEFAULT_HIGH_WATER_MARK
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dl_chunk_size: default_dl_chunk_size(),
            high_water_mark: default_high_water_mark(),
            original_proxy: None,
        }
    }
}

impl From<&OriginalProxyConfig> for OriginalProxy {
    fn from(config: &OriginalProxyConfig) -> Self {
        Self {
            download: config.download.clone(),
            url_query_name: config
                .url_query_name
                .clone()
                .unwrap_or_else(|| "url".to_string()),
        }
    }
}
