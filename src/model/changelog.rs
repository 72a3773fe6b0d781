use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::component::ComponentId;
use super::lenient;

/// Body of the `get_component_info` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentInfoResponse {
    #[serde(default, deserialize_with = "lenient::deserialize_flag")]
    pub success: bool,
    /// Anything but an object (e.g. an error string) reads as no data.
    #[serde(default, deserialize_with = "deserialize_data")]
    pub data: Option<ComponentInfoData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentInfoData {
    #[serde(default, deserialize_with = "lenient::deserialize_text")]
    pub desc: Option<String>,
    #[serde(default, deserialize_with = "lenient::deserialize_items")]
    pub versions: Vec<VersionEntry>,
}

fn deserialize_data<'de, D>(d: D) -> Result<Option<ComponentInfoData>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        value @ Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// One release in a component's history, kept exactly as the server sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionEntry(pub Value);

impl From<Value> for VersionEntry {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl VersionEntry {
    pub fn version(&self) -> Option<String> {
        self.field("version")
    }

    pub fn release_date(&self) -> Option<String> {
        self.field("release_date")
    }

    pub fn field(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(lenient::text)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changelog {
    pub load_success: bool,
    pub desc: Option<String>,
    pub versions: Vec<VersionEntry>,
}

impl From<ComponentInfoResponse> for Changelog {
    fn from(response: ComponentInfoResponse) -> Self {
        if !response.success {
            return Self::default();
        }
        let data = response.data.unwrap_or_default();
        Self {
            load_success: true,
            desc: data.desc,
            versions: data.versions,
        }
    }
}

/// Changelogs fetched so far. Entries are never evicted.
#[derive(Debug, Clone, Default)]
pub struct ChangelogCache {
    entries: HashMap<ComponentId, Changelog>,
}

impl ChangelogCache {
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &ComponentId) -> Option<&Changelog> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: ComponentId, changelog: Changelog) {
        self.entries.insert(id, changelog);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
