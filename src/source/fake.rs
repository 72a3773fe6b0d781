use std::collections::HashMap;
use std::sync::Mutex;

use crate::model::changelog::ComponentInfoResponse;
use crate::model::component::ComponentType;
use crate::model::feed::CompatibilityFeed;
use crate::model::installed::InstalledComponents;
use crate::model::report::DownloadResponse;

use super::{ComponentSource, SourceError, SourceResult};

/// A request the fake received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Feed(String),
    Info(ComponentType, String),
    Download(ComponentType, String),
    Installed,
}

/// In-memory source. Anything not configured answers with an error.
#[derive(Debug, Default)]
pub struct FakeSource {
    pub feed: Option<CompatibilityFeed>,
    pub installed: Option<InstalledComponents>,
    /// Keyed by folder.
    pub info: HashMap<String, serde_json::Value>,
    /// Keyed by archive URL.
    pub downloads: HashMap<String, serde_json::Value>,
    pub(crate) calls: Mutex<Vec<Call>>,
}

impl FakeSource {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn unavailable(url: &str) -> SourceError {
    SourceError::Request {
        url: url.to_string(),
        reason: "connection refused".to_string(),
    }
}

fn decode<T: serde::de::DeserializeOwned>(url: &str, value: &serde_json::Value) -> SourceResult<T> {
    serde_json::from_value(value.clone()).map_err(|e| SourceError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

impl ComponentSource for FakeSource {
    async fn fetch_feed(&self, url: &str) -> SourceResult<CompatibilityFeed> {
        self.record(Call::Feed(url.to_string()));
        self.feed.clone().ok_or_else(|| unavailable(url))
    }

    async fn fetch_component_info(
        &self,
        kind: ComponentType,
        folder: &str,
    ) -> SourceResult<ComponentInfoResponse> {
        self.record(Call::Info(kind, folder.to_string()));
        match self.info.get(folder) {
            Some(body) => decode(folder, body),
            None => Err(unavailable(folder)),
        }
    }

    async fn download_component(
        &self,
        kind: ComponentType,
        archive_url: &str,
    ) -> SourceResult<DownloadResponse> {
        self.record(Call::Download(kind, archive_url.to_string()));
        match self.downloads.get(archive_url) {
            Some(body) => decode(archive_url, body),
            None => Err(unavailable(archive_url)),
        }
    }

    async fn fetch_installed(&self) -> SourceResult<InstalledComponents> {
        self.record(Call::Installed);
        self.installed
            .clone()
            .ok_or_else(|| unavailable("get_installed_components"))
    }
}
