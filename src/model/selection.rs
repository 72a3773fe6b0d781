use std::collections::BTreeSet;

use super::component::{ComponentId, ComponentType, SelectedComponent};
use super::feed::CompatibilityFeed;

/// Which components the user wants installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub core: bool,
    pub api: bool,
    pub modules: BTreeSet<String>,
    pub themes: BTreeSet<String>,
}

impl Selection {
    pub fn is_selected(&self, id: &ComponentId) -> bool {
        match id.kind {
            ComponentType::Core => self.core,
            ComponentType::Api => self.api,
            ComponentType::Module => self.modules.contains(&id.folder),
            ComponentType::Theme => self.themes.contains(&id.folder),
        }
    }

    /// Flip one component. Core is pre-installed and cannot be toggled.
    pub fn toggle(&mut self, id: &ComponentId) {
        match id.kind {
            ComponentType::Core => {}
            ComponentType::Api => self.api = !self.api,
            ComponentType::Module => toggle_folder(&mut self.modules, &id.folder),
            ComponentType::Theme => toggle_folder(&mut self.themes, &id.folder),
        }
    }

    pub fn all_modules_selected(&self, feed: &CompatibilityFeed) -> bool {
        feed.modules
            .iter()
            .all(|module| self.modules.contains(&module.folder))
    }

    pub fn select_all_modules(&mut self, feed: &CompatibilityFeed) {
        self.modules = feed.modules.iter().map(|m| m.folder.clone()).collect();
    }

    pub fn deselect_all_modules(&mut self) {
        self.modules.clear();
    }

    /// Resolve the selection against the feed, in display order: core, api, modules, themes.
    ///
    /// Folders the feed does not offer are skipped since there is no version to fetch.
    pub fn resolve(&self, feed: &CompatibilityFeed, core_version: &str) -> Vec<SelectedComponent> {
        let mut selected = Vec::new();

        if self.core {
            selected.push(SelectedComponent {
                kind: ComponentType::Core,
                folder: "core".to_string(),
                version: core_version.to_string(),
            });
        }

        if self.api {
            if let Some(api) = feed.api.as_ref() {
                selected.push(SelectedComponent {
                    kind: ComponentType::Api,
                    folder: "api".to_string(),
                    version: api.version.clone(),
                });
            }
        }

        for kind in [ComponentType::Module, ComponentType::Theme] {
            let chosen = match kind {
                ComponentType::Module => &self.modules,
                _ => &self.themes,
            };
            selected.extend(
                feed.components(kind)
                    .iter()
                    .filter(|c| chosen.contains(&c.folder))
                    .map(|c| SelectedComponent {
                        kind,
                        folder: c.folder.clone(),
                        version: c.version.clone(),
                    }),
            );
        }

        selected
    }
}

fn toggle_folder(set: &mut BTreeSet<String>, folder: &str) {
    if !set.remove(folder) {
        set.insert(folder.to_string());
    }
}

/// Authoritative selection plus an optional staged copy for edit/save/cancel.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    saved: Selection,
    pending: Option<Selection>,
}

impl SelectionState {
    /// Replace the authoritative selection and drop any in-progress edit.
    pub fn init(&mut self, selection: Selection) {
        self.saved = selection;
        self.pending = None;
    }

    pub fn saved(&self) -> &Selection {
        &self.saved
    }

    /// The selection the user is currently looking at.
    pub fn active(&self) -> &Selection {
        self.pending.as_ref().unwrap_or(&self.saved)
    }

    pub fn active_mut(&mut self) -> &mut Selection {
        self.pending.as_mut().unwrap_or(&mut self.saved)
    }

    pub fn is_editing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn edit(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(self.saved.clone());
        }
    }

    pub fn save(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.saved = pending;
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
