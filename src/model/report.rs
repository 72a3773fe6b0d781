use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::component::{ComponentId, ComponentType, SelectedComponent};
use super::lenient;

/// Body returned by the download-and-unpack endpoint.
///
/// Only `success` and `log` are interpreted, both loosely; anything else is carried
/// along verbatim.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DownloadResponse {
    #[serde(default, deserialize_with = "lenient::deserialize_optional_flag")]
    pub success: Option<bool>,
    #[serde(default, deserialize_with = "lenient::deserialize_lines")]
    pub log: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportEntry {
    /// `None` until the component's response arrives.
    pub download_success: Option<bool>,
    pub log: Vec<String>,
    pub extra: Map<String, Value>,
}

impl ReportEntry {
    pub fn is_terminal(&self) -> bool {
        self.download_success.is_some()
    }
}

/// Per-component download outcome. The keyset is fixed when the report is created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadReport {
    entries: BTreeMap<ComponentId, ReportEntry>,
}

impl DownloadReport {
    /// One unknown entry per selected component, core excluded.
    pub fn skeleton(components: &[SelectedComponent]) -> Self {
        let entries = components
            .iter()
            .filter(|c| c.kind != ComponentType::Core)
            .map(|c| (c.id(), ReportEntry::default()))
            .collect();
        Self { entries }
    }

    /// Merge a response into its own entry.
    ///
    /// Returns `false` when the identifier is not part of the report or the entry has
    /// already reached a terminal state; neither case modifies the report.
    pub fn apply(&mut self, id: &ComponentId, response: DownloadResponse) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        if entry.is_terminal() {
            return false;
        }

        entry.download_success = Some(response.success.unwrap_or(false));
        entry.log = response.log;
        entry.extra = response.extra;
        true
    }

    pub fn get(&self, id: &ComponentId) -> Option<&ReportEntry> {
        self.entries.get(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ComponentId, &ReportEntry)> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.count(Some(true))
    }

    pub fn failed(&self) -> usize {
        self.count(Some(false))
    }

    pub fn pending(&self) -> usize {
        self.count(None)
    }

    /// Every entry has a terminal outcome.
    pub fn is_complete(&self) -> bool {
        self.entries.values().all(ReportEntry::is_terminal)
    }

    fn count(&self, state: Option<bool>) -> usize {
        self.entries
            .values()
            .filter(|e| e.download_success == state)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(kind: ComponentType, folder: &str) -> SelectedComponent {
        SelectedComponent {
            kind,
            folder: folder.into(),
            version: "1.0.0".into(),
        }
    }

    fn report() -> DownloadReport {
        DownloadReport::skeleton(&[
            component(ComponentType::Core, "core"),
            component(ComponentType::Api, "api"),
            component(ComponentType::Module, "a"),
            component(ComponentType::Module, "b"),
        ])
    }

    fn response(json: Value) -> DownloadResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn skeleton_excludes_core_and_starts_unknown() {
        let report = report();
        assert_eq!(report.len(), 3);
        assert!(report.get(&ComponentId::core()).is_none());
        assert!(report.entries().all(|(_, e)| e.download_success.is_none() && e.log.is_empty()));
        assert!(!report.is_complete());
    }

    #[test]
    fn response_updates_only_its_own_entry() {
        let mut report = report();
        let a = ComponentId::new(ComponentType::Module, "a");
        let b = ComponentId::new(ComponentType::Module, "b");

        let applied = report.apply(
            &a,
            response(serde_json::json!({ "success": false, "log": ["checksum mismatch"] })),
        );

        assert!(applied);
        assert_eq!(report.get(&a).unwrap().download_success, Some(false));
        assert_eq!(report.get(&a).unwrap().log, vec!["checksum mismatch"]);
        assert_eq!(report.get(&b).unwrap(), &ReportEntry::default());
    }

    #[test]
    fn entries_transition_at_most_once() {
        let mut report = report();
        let api = ComponentId::api();

        assert!(report.apply(&api, response(serde_json::json!({ "success": true, "log": ["ok"] }))));
        assert!(!report.apply(&api, response(serde_json::json!({ "success": false }))));

        let entry = report.get(&api).unwrap();
        assert_eq!(entry.download_success, Some(true));
        assert_eq!(entry.log, vec!["ok"]);
    }

    #[test]
    fn keyset_is_fixed() {
        let mut report = report();
        let stranger = ComponentId::new(ComponentType::Theme, "opal");

        assert!(!report.apply(&stranger, DownloadResponse::default()));
        assert_eq!(report.len(), 3);
        assert!(report.get(&stranger).is_none());
    }

    #[test]
    fn extra_fields_are_kept() {
        let mut report = report();
        let a = ComponentId::new(ComponentType::Module, "a");
        report.apply(
            &a,
            response(serde_json::json!({ "success": true, "log": [], "folder": "a" })),
        );
        assert_eq!(
            report.get(&a).unwrap().extra.get("folder"),
            Some(&Value::String("a".into()))
        );
    }

    #[test]
    fn counts_outcomes() {
        let mut report = report();
        report.apply(&ComponentId::api(), response(serde_json::json!({ "success": true })));
        report.apply(
            &ComponentId::new(ComponentType::Module, "a"),
            response(serde_json::json!({})),
        );

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.pending(), 1);
        assert!(!report.is_complete());

        report.apply(
            &ComponentId::new(ComponentType::Module, "b"),
            response(serde_json::json!({ "success": true })),
        );
        assert!(report.is_complete());
    }

    #[test]
    fn loosely_typed_bodies_still_settle_the_entry() {
        let mut report = report();
        let a = ComponentId::new(ComponentType::Module, "a");
        let b = ComponentId::new(ComponentType::Module, "b");

        assert!(report.apply(&a, response(serde_json::json!({ "success": 1, "log": ["ok", 3] }))));
        assert!(report.apply(&b, response(serde_json::json!({ "log": "unpacked" }))));
        assert!(report.apply(
            &ComponentId::api(),
            response(serde_json::json!({ "success": "", "log": null }))
        ));

        let entry = report.get(&a).unwrap();
        assert_eq!(entry.download_success, Some(true));
        assert_eq!(entry.log, vec!["ok", "3"]);
        assert_eq!(report.get(&b).unwrap().download_success, Some(false));
        assert_eq!(report.get(&b).unwrap().log, vec!["unpacked"]);
        assert_eq!(report.get(&ComponentId::api()).unwrap().download_success, Some(false));
        assert!(report.get(&ComponentId::api()).unwrap().log.is_empty());
        assert!(report.is_complete());
    }
}
