use crate::model::changelog::Changelog;
use crate::model::component::{ComponentId, ComponentType};
use crate::model::feed::CompatibilityFeed;
use crate::model::installed::InstalledComponents;
use crate::model::report::{DownloadReport, DownloadResponse};
use crate::model::selection::Selection;

/// Direction for changelog navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// All possible messages that drive state transitions.
#[derive(Debug, Clone)]
pub enum Msg {
    // -- Compatibility feed
    SetCoreVersion(String),
    FeedRequested,
    CompatibleComponentsLoaded {
        core_version: String,
        feed: CompatibilityFeed,
    },
    CompatibleComponentsLoadError(String),

    // -- Selection
    ToggleApi,
    ToggleModule(String),
    ToggleTheme(String),
    SelectAllModules,
    DeselectAllModules,
    InitSelectedComponents(Selection),
    EditSelectedComponentList,
    SaveSelectedComponentList,
    CancelEditSelectedComponentList,

    // -- Section visibility
    SelectComponentTypeSection(ComponentType),
    SelectComponentTypeSections(Vec<ComponentType>),
    ToggleComponentTypeSection(ComponentType),

    // -- Changelog modal
    ShowComponentChangelogModal(ComponentId),
    ComponentHistoryLoaded {
        id: ComponentId,
        changelog: Changelog,
    },
    CloseComponentChangelogModal,

    // -- Downloads
    StartDownloadCompatibleComponents(DownloadReport),
    /// `run` is the download run the request was sent in.
    ComponentDownloadUnpackResponse {
        run: u64,
        id: ComponentId,
        response: DownloadResponse,
    },
    ToggleShowDetailedDownloadLog,

    // -- Installed inventory
    InstalledComponentsLoaded(InstalledComponents),
    InstalledComponentsLoadError(String),

    // -- System
    Quit,
}
