use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::model::changelog::ComponentInfoResponse;
use crate::model::component::ComponentType;
use crate::model::feed::CompatibilityFeed;
use crate::model::installed::InstalledComponents;
use crate::model::report::DownloadResponse;

use super::{ComponentSource, SourceError, SourceResult};

/// Location of the compatibility feed for a core version.
pub fn feed_url(data_source_url: &str, core_version: &str) -> String {
    format!(
        "{}/feeds/core/{core_version}.json",
        data_source_url.trim_end_matches('/')
    )
}

pub fn component_info_url(actions_url: &str, kind: ComponentType, folder: &str) -> String {
    format!(
        "{actions_url}?action=get_component_info&type={kind}&component={}",
        urlencoding::encode(folder)
    )
}

/// Download-and-unpack request for one archive. The archive location travels URL-encoded.
pub fn download_url(actions_url: &str, kind: ComponentType, archive_url: &str) -> String {
    format!(
        "{actions_url}?action=installation_download_single_component&type={kind}&url={}",
        urlencoding::encode(archive_url)
    )
}

pub fn installed_components_url(actions_url: &str) -> String {
    format!("{actions_url}?action=get_installed_components")
}

/// [`ComponentSource`] backed by the data source and the installation's actions script.
#[derive(Clone)]
pub struct HttpComponentSource {
    client: Client,
    actions_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for HttpComponentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpComponentSource")
            .field("actions_url", &self.actions_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpComponentSource {
    pub fn new(actions_url: impl Into<String>, timeout: Duration) -> SourceResult<Self> {
        let actions_url = actions_url.into();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("component-manager/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Request {
                url: actions_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            actions_url,
            timeout,
        })
    }

    #[instrument(skip(self))]
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> SourceResult<T> {
        debug!("sending GET");
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                SourceError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        debug!(%status, "received response");
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| SourceError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl ComponentSource for HttpComponentSource {
    async fn fetch_feed(&self, url: &str) -> SourceResult<CompatibilityFeed> {
        self.get_json(url).await
    }

    async fn fetch_component_info(
        &self,
        kind: ComponentType,
        folder: &str,
    ) -> SourceResult<ComponentInfoResponse> {
        self.get_json(&component_info_url(&self.actions_url, kind, folder))
            .await
    }

    async fn download_component(
        &self,
        kind: ComponentType,
        archive_url: &str,
    ) -> SourceResult<DownloadResponse> {
        self.get_json(&download_url(&self.actions_url, kind, archive_url))
            .await
    }

    async fn fetch_installed(&self) -> SourceResult<InstalledComponents> {
        self.get_json(&installed_components_url(&self.actions_url))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIONS: &str = "http://localhost/global/code/actions-react.php";

    #[test]
    fn feed_url_per_core_version() {
        assert_eq!(
            feed_url("https://x/", "3.1.1"),
            "https://x/feeds/core/3.1.1.json"
        );
    }

    #[test]
    fn download_url_encodes_archive_location() {
        let url = download_url(ACTIONS, ComponentType::Module, "https://x/modules/m1-2.zip");
        assert_eq!(
            url,
            "http://localhost/global/code/actions-react.php\
             ?action=installation_download_single_component&type=module\
             &url=https%3A%2F%2Fx%2Fmodules%2Fm1-2.zip"
        );
    }

    #[test]
    fn info_url_names_type_and_component() {
        assert_eq!(
            component_info_url(ACTIONS, ComponentType::Theme, "opal"),
            format!("{ACTIONS}?action=get_component_info&type=theme&component=opal")
        );
    }

    #[test]
    fn installed_url() {
        assert_eq!(
            installed_components_url(ACTIONS),
            format!("{ACTIONS}?action=get_installed_components")
        );
    }

    #[test]
    fn client_construction() {
        let source = HttpComponentSource::new(ACTIONS, Duration::from_secs(5)).unwrap();
        assert_eq!(source.timeout, Duration::from_secs(5));
        assert_eq!(source.actions_url, ACTIONS);
    }
}
