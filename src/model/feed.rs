use serde::Deserialize;

use super::component::ComponentType;
use super::selection::Selection;

/// Components compatible with one core version, as published by the data source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompatibilityFeed {
    #[serde(default)]
    pub api: Option<FeedApi>,
    #[serde(default)]
    pub modules: Vec<FeedComponent>,
    #[serde(default)]
    pub themes: Vec<FeedComponent>,
    #[serde(default)]
    pub default_components: DefaultComponents,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedApi {
    pub version: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedComponent {
    pub folder: String,
    pub version: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

impl FeedComponent {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.folder)
    }
}

/// Recommended selection for a core version.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DefaultComponents {
    #[serde(default)]
    pub api: bool,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
}

impl CompatibilityFeed {
    pub fn has_module(&self, folder: &str) -> bool {
        self.modules.iter().any(|m| m.folder == folder)
    }

    pub fn has_theme(&self, folder: &str) -> bool {
        self.themes.iter().any(|t| t.folder == folder)
    }

    pub fn components(&self, kind: ComponentType) -> &[FeedComponent] {
        match kind {
            ComponentType::Module => &self.modules,
            ComponentType::Theme => &self.themes,
            ComponentType::Core | ComponentType::Api => &[],
        }
    }

    /// Version of a component offered by this feed.
    pub fn version_of(&self, kind: ComponentType, folder: &str) -> Option<&str> {
        match kind {
            ComponentType::Api => self.api.as_ref().map(|api| api.version.as_str()),
            ComponentType::Module | ComponentType::Theme => self
                .components(kind)
                .iter()
                .find(|c| c.folder == folder)
                .map(|c| c.version.as_str()),
            ComponentType::Core => None,
        }
    }

    /// The declared defaults, minus anything the feed no longer lists.
    pub fn default_selection(&self) -> Selection {
        let modules = self
            .default_components
            .modules
            .iter()
            .filter(|folder| self.has_module(folder))
            .cloned()
            .collect();
        let themes = self
            .default_components
            .themes
            .iter()
            .filter(|folder| self.has_theme(folder))
            .cloned()
            .collect();

        Selection {
            core: false,
            api: self.default_components.api,
            modules,
            themes,
        }
    }
}
