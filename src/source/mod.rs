//! Remote endpoints the coordinator talks to.
//!
//! [`ComponentSource`] is the seam between the store and the network so the
//! workflow can be driven without a server in tests.

mod http;

#[cfg(test)]
pub(crate) mod fake;

use std::future::Future;

use thiserror::Error;

use crate::model::changelog::ComponentInfoResponse;
use crate::model::component::ComponentType;
use crate::model::feed::CompatibilityFeed;
use crate::model::installed::InstalledComponents;
use crate::model::report::DownloadResponse;

pub use http::{
    HttpComponentSource, component_info_url, download_url, feed_url, installed_components_url,
};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("invalid response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Fetches feeds, changelogs and installed inventory, and triggers component downloads.
pub trait ComponentSource: Send + Sync + 'static {
    /// Fetch the compatibility feed at `url`.
    fn fetch_feed(&self, url: &str) -> impl Future<Output = SourceResult<CompatibilityFeed>> + Send;

    /// Fetch description and release history for one component.
    fn fetch_component_info(
        &self,
        kind: ComponentType,
        folder: &str,
    ) -> impl Future<Output = SourceResult<ComponentInfoResponse>> + Send;

    /// Ask the server to download and unpack the archive at `archive_url`.
    fn download_component(
        &self,
        kind: ComponentType,
        archive_url: &str,
    ) -> impl Future<Output = SourceResult<DownloadResponse>> + Send;

    /// Fetch what is currently installed.
    fn fetch_installed(&self) -> impl Future<Output = SourceResult<InstalledComponents>> + Send;
}
