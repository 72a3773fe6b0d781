//! Headless workflows: feed the store's channel into [`App::update`] and advance the
//! chosen workflow whenever the state allows it.

use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::app::App;
use crate::model::component::{ComponentId, ComponentType};
use crate::model::phase::Phase;
use crate::msg::Msg;
use crate::source::ComponentSource;

/// Choices layered on top of the recommended selection before downloading.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub all_modules: bool,
    pub modules: Vec<String>,
    pub themes: Vec<String>,
    pub no_api: bool,
    pub verbose: bool,
}

#[derive(Debug)]
pub enum Workflow {
    Install {
        options: InstallOptions,
        started: bool,
    },
    Manage,
    Info(ComponentId),
}

impl Workflow {
    pub fn install(options: InstallOptions) -> Self {
        Workflow::Install {
            options,
            started: false,
        }
    }

    fn start<S: ComponentSource>(&self, app: &mut App<S>) {
        match self {
            Workflow::Install { options, .. } => {
                if options.verbose {
                    app.toggle_show_detailed_download_log();
                }
                app.load_installation_components();
            }
            Workflow::Manage => {
                app.load_installed_components();
                app.load_manage_components();
            }
            Workflow::Info(id) => app.show_info_modal(id.clone()),
        }
    }

    fn step<S: ComponentSource>(&mut self, app: &mut App<S>) -> Result<()> {
        if let Some(reason) = app.feed_error() {
            bail!("could not load compatible components: {reason}");
        }

        match self {
            Workflow::Install { options, started } => {
                if !*started && app.phase == Phase::Selecting {
                    apply_choices(app, options);
                    let count = app
                        .selected_components()
                        .iter()
                        .filter(|c| c.kind != ComponentType::Core)
                        .count();
                    println!("Downloading {count} components...");
                    info!(count, "starting downloads");
                    app.download_compatible_components();
                    *started = true;
                }
                if *started && app.phase == Phase::Complete {
                    app.update(Msg::Quit);
                }
            }
            Workflow::Manage => {
                let installed_known = app.installed().is_some() || app.installed_error().is_some();
                if installed_known && app.feed().is_some() {
                    app.update(Msg::Quit);
                }
            }
            Workflow::Info(id) => {
                if app.changelog(id).is_some() {
                    app.update(Msg::Quit);
                }
            }
        }
        Ok(())
    }

    fn finish<S: ComponentSource>(&self, app: &App<S>) -> Result<()> {
        match self {
            Workflow::Install { .. } => print_report(app),
            Workflow::Manage => {
                print_inventory(app);
                Ok(())
            }
            Workflow::Info(id) => print_changelog(app, id),
        }
    }
}

/// Run `workflow` to completion. Gives up once nothing arrives for `idle_timeout`.
pub async fn drive<S: ComponentSource>(
    app: &mut App<S>,
    rx: &mut UnboundedReceiver<Msg>,
    mut workflow: Workflow,
    idle_timeout: Duration,
) -> Result<()> {
    workflow.start(app);

    // ── Main event loop ──
    loop {
        flush_notifications(app);
        if app.should_quit {
            break;
        }

        let first = match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(msg)) => msg,
            Ok(None) => break,
            Err(_) => {
                warn!(
                    phase = app.phase.label(),
                    "no response for {}s, giving up on outstanding requests",
                    idle_timeout.as_secs()
                );
                println!("  [{}] no response, giving up", app.phase.label());
                break;
            }
        };

        // Batch-drain all pending messages
        app.update(first);
        while let Ok(msg) = rx.try_recv() {
            app.update(msg);
        }

        workflow.step(app)?;
    }

    flush_notifications(app);
    workflow.finish(app)
}

fn flush_notifications<S: ComponentSource>(app: &mut App<S>) {
    while let Some(note) = app.notifications.pop_front() {
        println!("  {note}");
    }
}

fn apply_choices<S: ComponentSource>(app: &mut App<S>, options: &InstallOptions) {
    if options.all_modules && !app.all_modules_selected() {
        app.toggle_all_modules_selected();
    }
    for folder in &options.modules {
        select(app, ComponentId::new(ComponentType::Module, folder.clone()));
    }
    for folder in &options.themes {
        select(app, ComponentId::new(ComponentType::Theme, folder.clone()));
    }
    if options.no_api && app.is_selected(&ComponentId::api()) {
        app.toggle_component(ComponentType::Api, "api");
    }
}

fn select<S: ComponentSource>(app: &mut App<S>, id: ComponentId) {
    let offered = app
        .feed()
        .and_then(|feed| feed.version_of(id.kind, &id.folder))
        .is_some();
    if !offered {
        println!("  {id} is not offered for this core version, skipping");
        return;
    }
    if !app.is_selected(&id) {
        app.toggle_component(id.kind, &id.folder);
    }
}

fn print_report<S: ComponentSource>(app: &App<S>) -> Result<()> {
    let report = app.report();
    println!();
    for (id, entry) in report.entries() {
        let status = match entry.download_success {
            Some(true) => "ok",
            Some(false) => "FAILED",
            None => "no response",
        };
        println!("{:<40} {status}", id.to_string());
        if app.show_detailed_log() || entry.download_success == Some(false) {
            for line in &entry.log {
                println!("    {line}");
            }
        }
    }
    println!(
        "\n{} installed, {} failed, {} without response",
        report.succeeded(),
        report.failed(),
        report.pending()
    );

    if report.failed() > 0 || report.pending() > 0 {
        bail!(
            "{} of {} components were not installed",
            report.failed() + report.pending(),
            report.len()
        );
    }
    Ok(())
}

fn print_inventory<S: ComponentSource>(app: &App<S>) {
    let Some(feed) = app.feed() else {
        println!("no compatibility feed loaded");
        return;
    };
    if let Some(reason) = app.installed_error() {
        println!("installed components unavailable: {reason}");
    }

    let core_version = app.core_version().unwrap_or("?");
    println!("core {core_version}");
    if let Some(api) = feed.api.as_ref() {
        println!(
            "[{}] api {}",
            mark(app.is_selected(&ComponentId::api())),
            api.version
        );
    }
    for kind in [ComponentType::Module, ComponentType::Theme] {
        for component in feed.components(kind) {
            let id = ComponentId::new(kind, component.folder.clone());
            println!(
                "[{}] {kind:<6} {:<30} {}",
                mark(app.is_selected(&id)),
                component.display_name(),
                component.version
            );
        }
    }
}

fn mark(installed: bool) -> char {
    if installed { 'x' } else { ' ' }
}

fn print_changelog<S: ComponentSource>(app: &App<S>, id: &ComponentId) -> Result<()> {
    let Some(changelog) = app.changelog(id) else {
        bail!("no changelog available for {id}");
    };
    if !changelog.load_success {
        bail!("the server has no information about {id}");
    }

    if let Some(desc) = changelog.desc.as_deref() {
        println!("{desc}\n");
    }
    for version in &changelog.versions {
        let name = version.version().unwrap_or_else(|| "?".to_string());
        match version.release_date() {
            Some(date) => println!("{name:<12} {date}"),
            None => println!("{name}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::AppConfig;
    use crate::source::fake::{Call, FakeSource};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    const IDLE: Duration = Duration::from_millis(200);

    fn feed() -> crate::model::feed::CompatibilityFeed {
        serde_json::from_value(json!({
            "api": { "version": "2.0.0" },
            "modules": [
                { "folder": "m1", "version": "2" },
                { "folder": "m2", "version": "1.4" },
                { "folder": "m3", "version": "0.9" }
            ],
            "themes": [{ "folder": "opal", "version": "2.0.3" }],
            "default_components": { "api": true, "modules": ["m1"], "themes": [] }
        }))
        .unwrap()
    }

    fn ok(log: &str) -> serde_json::Value {
        json!({ "success": true, "log": [log] })
    }

    async fn run(
        source: FakeSource,
        workflow: Workflow,
    ) -> (Result<()>, App<FakeSource>, Arc<FakeSource>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut config = AppConfig::defaults().unwrap();
        config.general.data_source_url = "https://x".into();
        let source = Arc::new(source);
        let mut app = App::new(config, Arc::clone(&source), tx);
        let result = drive(&mut app, &mut rx, workflow, IDLE).await;
        (result, app, source)
    }

    fn downloads(source: &FakeSource) -> Vec<String> {
        let mut urls: Vec<_> = source
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Download(_, url) => Some(url),
                _ => None,
            })
            .collect();
        urls.sort();
        urls
    }

    #[tokio::test]
    async fn install_downloads_recommended_and_requested_components_once() {
        let mut archives = HashMap::new();
        archives.insert("https://x/modules/m1-2.zip".to_string(), ok("m1"));
        archives.insert("https://x/modules/m2-1.4.zip".to_string(), ok("m2"));
        let source = FakeSource {
            feed: Some(feed()),
            downloads: archives,
            ..Default::default()
        };
        let options = InstallOptions {
            modules: vec!["m2".into()],
            themes: vec!["retired".into()],
            no_api: true,
            ..Default::default()
        };

        let (result, app, source) = run(source, Workflow::install(options)).await;

        assert!(result.is_ok(), "{result:?}");
        assert!(app.should_quit);
        assert_eq!(app.phase, Phase::Complete);
        assert_eq!(
            downloads(&source),
            vec!["https://x/modules/m1-2.zip", "https://x/modules/m2-1.4.zip"]
        );
        assert!(!app.is_selected(&ComponentId::api()));
        assert!(!app.is_selected(&ComponentId::new(ComponentType::Theme, "retired")));
    }

    #[tokio::test]
    async fn all_modules_flag_selects_every_module() {
        let mut archives = HashMap::new();
        for url in [
            "https://x/api/api-2.0.0.zip",
            "https://x/modules/m1-2.zip",
            "https://x/modules/m2-1.4.zip",
            "https://x/modules/m3-0.9.zip",
        ] {
            archives.insert(url.to_string(), ok(url));
        }
        let source = FakeSource {
            feed: Some(feed()),
            downloads: archives,
            ..Default::default()
        };
        let options = InstallOptions {
            all_modules: true,
            ..Default::default()
        };

        let (result, app, source) = run(source, Workflow::install(options)).await;

        assert!(result.is_ok(), "{result:?}");
        assert_eq!(app.report().succeeded(), 4);
        assert_eq!(downloads(&source).len(), 4);
    }

    #[tokio::test]
    async fn failed_download_makes_install_fail() {
        let mut archives = HashMap::new();
        archives.insert("https://x/api/api-2.0.0.zip".to_string(), ok("api"));
        archives.insert(
            "https://x/modules/m1-2.zip".to_string(),
            json!({ "success": false, "log": ["could not unzip"] }),
        );
        let source = FakeSource {
            feed: Some(feed()),
            downloads: archives,
            ..Default::default()
        };

        let (result, app, _source) = run(source, Workflow::install(InstallOptions::default())).await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("1 of 2 components were not installed"), "{err}");
        assert_eq!(app.phase, Phase::Complete);
    }

    #[tokio::test]
    async fn unanswered_download_times_out_as_failure() {
        let mut archives = HashMap::new();
        archives.insert("https://x/api/api-2.0.0.zip".to_string(), ok("api"));
        let source = FakeSource {
            feed: Some(feed()),
            downloads: archives,
            ..Default::default()
        };

        let (result, app, _source) = run(source, Workflow::install(InstallOptions::default())).await;

        assert!(result.is_err());
        assert_eq!(app.phase, Phase::Downloading);
        assert_eq!(app.report().pending(), 1);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn feed_error_aborts_before_any_download() {
        let (result, _app, source) =
            run(FakeSource::default(), Workflow::install(InstallOptions::default())).await;

        let err = result.unwrap_err().to_string();
        assert!(err.starts_with("could not load compatible components"), "{err}");
        assert_eq!(source.calls().len(), 1);
        assert!(downloads(&source).is_empty());
    }

    #[tokio::test]
    async fn manage_finishes_even_without_installed_list() {
        let source = FakeSource {
            feed: Some(feed()),
            ..Default::default()
        };

        let (result, app, source) = run(source, Workflow::Manage).await;

        assert!(result.is_ok(), "{result:?}");
        assert!(app.should_quit);
        assert!(app.installed_error().is_some());
        assert!(source.calls().contains(&Call::Installed));
    }

    #[tokio::test]
    async fn info_reports_unknown_component() {
        let mut info = HashMap::new();
        info.insert(
            "m9".to_string(),
            json!({ "success": false, "data": "no such component" }),
        );
        let source = FakeSource {
            info,
            ..Default::default()
        };
        let id = ComponentId::new(ComponentType::Module, "m9");

        let (result, app, _source) = run(source, Workflow::Info(id.clone())).await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("no information about module_m9"), "{err}");
        assert!(app.changelog(&id).is_some());
    }
}
