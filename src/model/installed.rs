use serde::Deserialize;

use super::selection::Selection;

/// Theme shipped with core; it is never offered for download.
pub const BUILTIN_THEME: &str = "default";

/// Body of the `get_installed_components` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InstalledComponents {
    #[serde(default)]
    pub api: InstalledApi,
    #[serde(default)]
    pub modules: Vec<InstalledModule>,
    #[serde(default)]
    pub themes: Vec<InstalledTheme>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InstalledApi {
    #[serde(default)]
    pub installed: bool,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstalledModule {
    pub module_folder: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstalledTheme {
    pub theme_folder: String,
    #[serde(default)]
    pub theme_version: Option<String>,
}

impl InstalledComponents {
    /// Everything already installed counts as selected. Core always is.
    pub fn to_selection(&self) -> Selection {
        Selection {
            core: true,
            api: self.api.installed,
            modules: self
                .modules
                .iter()
                .map(|m| m.module_folder.clone())
                .collect(),
            themes: self
                .themes
                .iter()
                .filter(|t| t.theme_folder != BUILTIN_THEME)
                .map(|t| t.theme_folder.clone())
                .collect(),
        }
    }
}
