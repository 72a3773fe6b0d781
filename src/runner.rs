//! Wires the HTTP source and the store together and hands the parsed command to
//! [`workflow::drive`].

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use component_manager::app::App;
use component_manager::model::component::ComponentId;
use component_manager::model::config::AppConfig;
use component_manager::msg::Msg;
use component_manager::source::HttpComponentSource;
use component_manager::workflow::{self, InstallOptions, Workflow};

use crate::Command;

pub async fn run(command: Command, config: AppConfig) -> Result<()> {
    let source = HttpComponentSource::new(
        config.general.actions_url.clone(),
        config.request_timeout(),
    )?;
    let idle_timeout = config.idle_timeout();
    let (tx, mut rx) = mpsc::unbounded_channel::<Msg>();
    let mut app = App::new(config, Arc::new(source), tx);

    workflow::drive(&mut app, &mut rx, to_workflow(command), idle_timeout).await
}

fn to_workflow(command: Command) -> Workflow {
    match command {
        Command::Install {
            all_modules,
            modules,
            themes,
            no_api,
            verbose,
        } => Workflow::install(InstallOptions {
            all_modules,
            modules,
            themes,
            no_api,
            verbose,
        }),
        Command::Manage => Workflow::Manage,
        Command::Info { kind, folder } => Workflow::Info(ComponentId::new(kind, folder)),
    }
}
