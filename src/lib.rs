pub mod clients;
pub mod common;
pub mod configs;
pub mod download;
pub mod format;
pub mod info;
pub mod ytdl;

#[cfg(test)]
mod testing;

pub use common::errors::{Error, Result};
pub use download::{DownloadOptions, DownloadRange, DownloadStream};
pub use format::{Filter, Quality};
pub use info::VideoMetadata;
pub use ytdl::Ytdl;
