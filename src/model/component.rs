use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of installable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    /// The base application. Pre-installed, never downloaded.
    Core,
    Api,
    Module,
    Theme,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Core => "core",
            ComponentType::Api => "api",
            ComponentType::Module => "module",
            ComponentType::Theme => "theme",
        }
    }

    /// Directory under the data source that holds this type's archives.
    pub fn archive_dir(&self) -> Option<&'static str> {
        match self {
            ComponentType::Core => None,
            ComponentType::Api => Some("api"),
            ComponentType::Module => Some("modules"),
            ComponentType::Theme => Some("themes"),
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "core" => Ok(ComponentType::Core),
            "api" => Ok(ComponentType::Api),
            "module" => Ok(ComponentType::Module),
            "theme" => Ok(ComponentType::Theme),
            other => Err(format!("unknown component type: {other}")),
        }
    }
}

/// Identity of a component: unique per type + folder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId {
    pub kind: ComponentType,
    pub folder: String,
}

impl ComponentId {
    pub fn new(kind: ComponentType, folder: impl Into<String>) -> Self {
        Self {
            kind,
            folder: folder.into(),
        }
    }

    pub fn core() -> Self {
        Self::new(ComponentType::Core, "core")
    }

    pub fn api() -> Self {
        Self::new(ComponentType::Api, "api")
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.folder)
    }
}

/// A selected component resolved against the feed, ready to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedComponent {
    pub kind: ComponentType,
    pub folder: String,
    pub version: String,
}

impl SelectedComponent {
    pub fn id(&self) -> ComponentId {
        ComponentId::new(self.kind, self.folder.clone())
    }

    /// Location of the package archive, `None` for core.
    pub fn archive_url(&self, data_source_url: &str) -> Option<String> {
        let dir = self.kind.archive_dir()?;
        Some(format!(
            "{}/{dir}/{}-{}.zip",
            data_source_url.trim_end_matches('/'),
            self.folder,
            self.version
        ))
    }
}
