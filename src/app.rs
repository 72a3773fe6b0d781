use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::model::changelog::{Changelog, ChangelogCache};
use crate::model::component::{ComponentId, ComponentType, SelectedComponent};
use crate::model::config::AppConfig;
use crate::model::feed::CompatibilityFeed;
use crate::model::installed::InstalledComponents;
use crate::model::phase::Phase;
use crate::model::report::{DownloadReport, DownloadResponse};
use crate::model::selection::{Selection, SelectionState};
use crate::msg::{Direction, Msg};
use crate::source::{ComponentSource, feed_url};

const MAX_NOTIFICATIONS: usize = 8;

const ALL_SECTIONS: [ComponentType; 3] = [
    ComponentType::Api,
    ComponentType::Module,
    ComponentType::Theme,
];

/// Neighbours of the component shown in the changelog modal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrevNext {
    pub prev: Option<ComponentId>,
    pub next: Option<ComponentId>,
}

/// The state store. All mutation goes through [`App::update`]; network work is spawned
/// onto the runtime and comes back as [`Msg`]s on `event_tx`.
pub struct App<S> {
    pub config: AppConfig,
    pub phase: Phase,
    core_version: Option<String>,
    feed: Option<CompatibilityFeed>,
    selection: SelectionState,
    sections: BTreeSet<ComponentType>,
    changelogs: ChangelogCache,
    info_modal: Option<ComponentId>,
    report: DownloadReport,
    download_run: u64,
    show_detailed_log: bool,
    installed: Option<InstalledComponents>,
    installed_error: Option<String>,
    pub notifications: VecDeque<String>,
    pub should_quit: bool,
    source: Arc<S>,
    event_tx: UnboundedSender<Msg>,
}

impl<S: ComponentSource> App<S> {
    pub fn new(config: AppConfig, source: Arc<S>, event_tx: UnboundedSender<Msg>) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            core_version: None,
            feed: None,
            selection: SelectionState::default(),
            sections: ALL_SECTIONS.into_iter().collect(),
            changelogs: ChangelogCache::default(),
            info_modal: None,
            report: DownloadReport::default(),
            download_run: 0,
            show_detailed_log: false,
            installed: None,
            installed_error: None,
            notifications: VecDeque::new(),
            should_quit: false,
            source,
            event_tx,
        }
    }

    // ── Update ───────────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) {
        match msg {
            Msg::SetCoreVersion(version) => self.core_version = Some(version),
            Msg::FeedRequested => self.phase = Phase::FeedLoading,
            Msg::CompatibleComponentsLoaded { core_version, feed } => {
                self.handle_feed_loaded(core_version, feed)
            }
            Msg::CompatibleComponentsLoadError(reason) => {
                self.push_notification(format!("could not load compatible components: {reason}"));
                self.phase = Phase::FeedError(reason);
            }
            Msg::ToggleApi => self.selection.active_mut().toggle(&ComponentId::api()),
            Msg::ToggleModule(folder) => self
                .selection
                .active_mut()
                .toggle(&ComponentId::new(ComponentType::Module, folder)),
            Msg::ToggleTheme(folder) => self
                .selection
                .active_mut()
                .toggle(&ComponentId::new(ComponentType::Theme, folder)),
            Msg::SelectAllModules => {
                if let Some(feed) = self.feed.as_ref() {
                    self.selection.active_mut().select_all_modules(feed);
                }
            }
            Msg::DeselectAllModules => self.selection.active_mut().deselect_all_modules(),
            Msg::InitSelectedComponents(selection) => self.selection.init(selection),
            Msg::EditSelectedComponentList => self.selection.edit(),
            Msg::SaveSelectedComponentList => self.selection.save(),
            Msg::CancelEditSelectedComponentList => self.selection.cancel(),
            Msg::SelectComponentTypeSection(kind) => {
                self.sections.clear();
                self.sections.insert(kind);
            }
            Msg::SelectComponentTypeSections(kinds) => {
                self.sections = kinds.into_iter().collect();
            }
            Msg::ToggleComponentTypeSection(kind) => {
                if !self.sections.remove(&kind) {
                    self.sections.insert(kind);
                }
            }
            Msg::ShowComponentChangelogModal(id) => self.info_modal = Some(id),
            Msg::ComponentHistoryLoaded { id, changelog } => self.changelogs.insert(id, changelog),
            Msg::CloseComponentChangelogModal => self.info_modal = None,
            Msg::StartDownloadCompatibleComponents(report) => self.handle_download_started(report),
            Msg::ComponentDownloadUnpackResponse { run, id, response } => {
                self.handle_download_response(run, id, response)
            }
            Msg::ToggleShowDetailedDownloadLog => self.show_detailed_log = !self.show_detailed_log,
            Msg::InstalledComponentsLoaded(installed) => {
                self.installed = Some(installed);
                self.installed_error = None;
            }
            Msg::InstalledComponentsLoadError(reason) => {
                self.push_notification(format!("could not load installed components: {reason}"));
                self.installed_error = Some(reason);
            }
            Msg::Quit => self.should_quit = true,
        }
    }

    fn handle_feed_loaded(&mut self, core_version: String, feed: CompatibilityFeed) {
        info!(
            core_version = %core_version,
            modules = feed.modules.len(),
            themes = feed.themes.len(),
            "compatible components loaded"
        );
        self.push_notification(format!(
            "core {core_version}: {} modules, {} themes available",
            feed.modules.len(),
            feed.themes.len()
        ));
        self.core_version = Some(core_version);
        self.feed = Some(feed);
        if matches!(
            self.phase,
            Phase::Idle | Phase::FeedLoading | Phase::FeedError(_)
        ) {
            self.phase = Phase::Selecting;
        }
    }

    fn handle_download_started(&mut self, report: DownloadReport) {
        self.download_run += 1;
        self.phase = if report.is_complete() {
            Phase::Complete
        } else {
            Phase::Downloading
        };
        self.report = report;
    }

    fn handle_download_response(&mut self, run: u64, id: ComponentId, response: DownloadResponse) {
        if run != self.download_run {
            debug!(
                component = %id,
                run,
                current = self.download_run,
                "ignoring response from an earlier download run"
            );
            return;
        }
        let success = response.success.unwrap_or(false);
        if !self.report.apply(&id, response) {
            debug!(component = %id, "ignoring download response outside the report");
            return;
        }

        info!(component = %id, success, "component download finished");
        self.push_notification(format!(
            "{id}: {}",
            if success { "installed" } else { "failed" }
        ));

        if self.phase == Phase::Downloading && self.report.is_complete() {
            info!(
                succeeded = self.report.succeeded(),
                failed = self.report.failed(),
                "all component downloads finished"
            );
            self.phase = Phase::Complete;
        }
    }

    fn push_notification(&mut self, message: String) {
        self.notifications.push_back(message);
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }

    // ── Actions ──────────────────────────────────────────────────

    /// Load the feed for the configured core version and seed the recommended selection.
    pub fn load_installation_components(&mut self) {
        let core_version = self.config.general.core_version.clone();
        self.update(Msg::SetCoreVersion(core_version.clone()));
        self.update(Msg::SelectComponentTypeSections(vec![ComponentType::Module]));
        self.request_feed(core_version, true);
    }

    /// Load the feed for the configured core version without touching the selection.
    pub fn load_manage_components(&mut self) {
        let core_version = self.config.general.core_version.clone();
        self.update(Msg::SetCoreVersion(core_version.clone()));
        self.request_feed(core_version, false);
    }

    fn request_feed(&mut self, core_version: String, seed_defaults: bool) {
        self.update(Msg::FeedRequested);

        let url = feed_url(&self.config.general.data_source_url, &core_version);
        let source = Arc::clone(&self.source);
        let tx = self.event_tx.clone();
        info!(%url, "loading compatible components");

        tokio::spawn(async move {
            match source.fetch_feed(&url).await {
                Ok(feed) => {
                    let defaults = seed_defaults.then(|| feed.default_selection());
                    post(&tx, Msg::CompatibleComponentsLoaded { core_version, feed });
                    if let Some(selection) = defaults {
                        post(&tx, Msg::InitSelectedComponents(selection));
                    }
                }
                Err(err) => {
                    warn!("compatible components request failed: {err}");
                    post(&tx, Msg::CompatibleComponentsLoadError(err.to_string()));
                }
            }
        });
    }

    pub fn toggle_component(&mut self, kind: ComponentType, folder: &str) {
        let msg = match kind {
            ComponentType::Api => Msg::ToggleApi,
            ComponentType::Module => Msg::ToggleModule(folder.to_string()),
            ComponentType::Theme => Msg::ToggleTheme(folder.to_string()),
            ComponentType::Core => {
                debug!("core is always installed, ignoring toggle");
                return;
            }
        };
        self.update(msg);
    }

    /// Select every module unless all of them already are, in which case deselect them all.
    pub fn toggle_all_modules_selected(&mut self) {
        let msg = if self.all_modules_selected() {
            Msg::DeselectAllModules
        } else {
            Msg::SelectAllModules
        };
        self.update(msg);
    }

    pub fn edit_selected_component_list(&mut self) {
        self.update(Msg::EditSelectedComponentList);
    }

    pub fn save_selected_component_list(&mut self) {
        self.update(Msg::SaveSelectedComponentList);
    }

    pub fn cancel_edit_selected_component_list(&mut self) {
        self.update(Msg::CancelEditSelectedComponentList);
    }

    pub fn select_component_type_section(&mut self, kind: ComponentType) {
        self.update(Msg::SelectComponentTypeSection(kind));
    }

    pub fn select_component_type_sections(&mut self, kinds: Vec<ComponentType>) {
        self.update(Msg::SelectComponentTypeSections(kinds));
    }

    pub fn toggle_component_type_section(&mut self, kind: ComponentType) {
        self.update(Msg::ToggleComponentTypeSection(kind));
    }

    /// Open the changelog modal, fetching the changelog the first time it is viewed.
    pub fn show_info_modal(&mut self, id: ComponentId) {
        if !self.changelogs.contains(&id) {
            self.query_component_info(id.clone());
        }
        self.update(Msg::ShowComponentChangelogModal(id));
    }

    pub fn close_info_modal(&mut self) {
        self.update(Msg::CloseComponentChangelogModal);
    }

    fn query_component_info(&self, id: ComponentId) {
        let source = Arc::clone(&self.source);
        let tx = self.event_tx.clone();
        debug!(component = %id, "loading changelog");

        tokio::spawn(async move {
            match source.fetch_component_info(id.kind, &id.folder).await {
                Ok(response) => {
                    let changelog = Changelog::from(response);
                    post(&tx, Msg::ComponentHistoryLoaded { id, changelog });
                }
                // Not surfaced: the modal keeps showing without history.
                Err(err) => warn!(component = %id, "changelog request failed: {err}"),
            }
        });
    }

    /// Move the changelog modal to a neighbouring component. No-op at either end.
    pub fn on_prev_next(&mut self, dir: Direction) {
        let neighbours = self.prev_next();
        let target = match dir {
            Direction::Prev => neighbours.prev,
            Direction::Next => neighbours.next,
        };
        if let Some(id) = target {
            self.show_info_modal(id);
        }
    }

    /// Publish the report skeleton, then request every selected non-core component.
    pub fn download_compatible_components(&mut self) {
        let components = self.selected_components();
        self.update(Msg::StartDownloadCompatibleComponents(
            DownloadReport::skeleton(&components),
        ));

        let run = self.download_run;
        let data_source_url = self.config.general.data_source_url.clone();
        for component in components {
            let Some(archive_url) = component.archive_url(&data_source_url) else {
                continue;
            };
            self.download_and_unpack_component(run, component, archive_url);
        }
    }

    fn download_and_unpack_component(
        &self,
        run: u64,
        component: SelectedComponent,
        archive_url: String,
    ) {
        let source = Arc::clone(&self.source);
        let tx = self.event_tx.clone();
        let id = component.id();
        info!(component = %id, version = %component.version, "requesting download");

        tokio::spawn(async move {
            match source.download_component(id.kind, &archive_url).await {
                Ok(response) => {
                    post(&tx, Msg::ComponentDownloadUnpackResponse { run, id, response })
                }
                // The report entry stays unknown.
                Err(err) => warn!(component = %id, "download request failed: {err}"),
            }
        });
    }

    pub fn toggle_show_detailed_download_log(&mut self) {
        self.update(Msg::ToggleShowDetailedDownloadLog);
    }

    /// Load the installed inventory and mark everything installed as selected.
    pub fn load_installed_components(&mut self) {
        let source = Arc::clone(&self.source);
        let tx = self.event_tx.clone();
        info!("loading installed components");

        tokio::spawn(async move {
            match source.fetch_installed().await {
                Ok(installed) => {
                    let selection = installed.to_selection();
                    post(&tx, Msg::InstalledComponentsLoaded(installed));
                    post(&tx, Msg::InitSelectedComponents(selection));
                }
                Err(err) => {
                    warn!("installed components request failed: {err}");
                    post(&tx, Msg::InstalledComponentsLoadError(err.to_string()));
                }
            }
        });
    }

    // ── Selectors ────────────────────────────────────────────────

    pub fn core_version(&self) -> Option<&str> {
        self.core_version.as_deref()
    }

    pub fn feed(&self) -> Option<&CompatibilityFeed> {
        self.feed.as_ref()
    }

    pub fn feed_error(&self) -> Option<&str> {
        match &self.phase {
            Phase::FeedError(reason) => Some(reason),
            _ => None,
        }
    }

    /// The selection as currently displayed, including any unsaved edit.
    pub fn selection(&self) -> &Selection {
        self.selection.active()
    }

    pub fn saved_selection(&self) -> &Selection {
        self.selection.saved()
    }

    pub fn is_editing_selection(&self) -> bool {
        self.selection.is_editing()
    }

    pub fn is_selected(&self, id: &ComponentId) -> bool {
        self.selection.active().is_selected(id)
    }

    pub fn all_modules_selected(&self) -> bool {
        self.feed
            .as_ref()
            .is_none_or(|feed| self.selection.active().all_modules_selected(feed))
    }

    /// Saved selection resolved to concrete versions.
    pub fn selected_components(&self) -> Vec<SelectedComponent> {
        let empty = CompatibilityFeed::default();
        let feed = self.feed.as_ref().unwrap_or(&empty);
        let core_version = self
            .core_version
            .as_deref()
            .unwrap_or(&self.config.general.core_version);
        self.selection.saved().resolve(feed, core_version)
    }

    pub fn visible_sections(&self) -> &BTreeSet<ComponentType> {
        &self.sections
    }

    pub fn is_section_visible(&self, kind: ComponentType) -> bool {
        self.sections.contains(&kind)
    }

    /// Components listed in the visible sections: api, then modules and themes in feed order.
    pub fn displayed_components(&self) -> Vec<ComponentId> {
        let Some(feed) = self.feed.as_ref() else {
            return Vec::new();
        };

        let mut displayed = Vec::new();
        if feed.api.is_some() && self.is_section_visible(ComponentType::Api) {
            displayed.push(ComponentId::api());
        }
        for kind in [ComponentType::Module, ComponentType::Theme] {
            if self.is_section_visible(kind) {
                displayed.extend(
                    feed.components(kind)
                        .iter()
                        .map(|c| ComponentId::new(kind, c.folder.clone())),
                );
            }
        }
        displayed
    }

    pub fn info_modal(&self) -> Option<&ComponentId> {
        self.info_modal.as_ref()
    }

    pub fn changelogs(&self) -> &ChangelogCache {
        &self.changelogs
    }

    pub fn changelog(&self, id: &ComponentId) -> Option<&Changelog> {
        self.changelogs.get(id)
    }

    pub fn prev_next(&self) -> PrevNext {
        let Some(current) = self.info_modal.as_ref() else {
            return PrevNext::default();
        };
        let displayed = self.displayed_components();
        let Some(pos) = displayed.iter().position(|id| id == current) else {
            return PrevNext::default();
        };

        PrevNext {
            prev: pos.checked_sub(1).and_then(|i| displayed.get(i)).cloned(),
            next: displayed.get(pos + 1).cloned(),
        }
    }

    pub fn report(&self) -> &DownloadReport {
        &self.report
    }

    pub fn show_detailed_log(&self) -> bool {
        self.show_detailed_log
    }

    pub fn installed(&self) -> Option<&InstalledComponents> {
        self.installed.as_ref()
    }

    pub fn installed_error(&self) -> Option<&str> {
        self.installed_error.as_deref()
    }
}

fn post(tx: &UnboundedSender<Msg>, msg: Msg) {
    if tx.send(msg).is_err() {
        debug!("store is gone, dropping message");
    }
}
