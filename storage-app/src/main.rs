// SPDX-License-Identifier: GPL-3.0-only

mod config;
mod logging;
mod printer;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use futures::StreamExt;
use storage_contracts::SnapshotSource;
use storage_details::{
    Action, ControllerConfig, DetailController, Dispatcher, Request, Selection, SelectionKind,
    ViewState,
};
use storage_types::StorageSnapshot;
use storage_udisks::UDisksDaemon;

/// Detail page of a disk, RAID array or volume group
#[derive(Parser)]
#[command(name = "storage-details")]
#[command(about = "Show and manage one storage object through UDisks2", long_about = None)]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (default: $XDG_CONFIG_HOME/storage-details/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the page once
    Show {
        /// block, mdraid or vgroup
        kind: SelectionKind,
        /// Device name, array UUID or group name
        name: String,
    },
    /// Print the page on every change until interrupted
    Watch {
        /// block, mdraid or vgroup
        kind: SelectionKind,
        /// Device name, array UUID or group name
        name: String,
    },
    /// Run an action that needs no dialog input
    Act {
        /// Action name (mount, unmount, lock, mdraid_start, job_cancel, ...)
        action: String,
        /// Object path, or a device name for block actions
        target: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("storage-details: {e:#}; using defaults");
            Config::default()
        }
    };
    logging::init(&config);

    let daemon = Arc::new(
        UDisksDaemon::new()
            .await
            .context("Failed to connect to UDisks2")?,
    );

    match cli.command {
        Commands::Show { kind, name } => {
            let snapshot = load(daemon.as_ref()).await?;
            let mut controller =
                DetailController::new(daemon, config.controller(), snapshot);
            controller.show(Selection::new(kind, name));
            print(&controller.state(), cli.json)?;
        }
        Commands::Watch { kind, name } => {
            watch(daemon, config.controller(), Selection::new(kind, name), cli.json).await?;
        }
        Commands::Act { action, target } => {
            let snapshot = load(daemon.as_ref()).await?;
            let target = resolve_target(&snapshot, &target);
            let action = Action::direct(&action, target)
                .with_context(|| format!("\"{action}\" is not an action without dialog"))?;

            let outcome = Dispatcher::new(daemon)
                .execute_offered(&snapshot, &Request::direct(action))
                .await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{outcome:?}");
            }
        }
    }

    Ok(())
}

async fn load(daemon: &UDisksDaemon) -> Result<StorageSnapshot> {
    daemon
        .snapshot()
        .await
        .context("Failed to read storage objects")
}

async fn watch(
    daemon: Arc<UDisksDaemon>,
    config: ControllerConfig,
    selection: Selection,
    json: bool,
) -> Result<()> {
    let changes = daemon
        .watch()
        .await
        .context("Failed to subscribe to UDisks2 signals")?;
    let snapshot = load(daemon.as_ref()).await?;

    let mut controller = DetailController::new(Arc::clone(&daemon), config, snapshot);
    let mut states = controller.subscribe();
    controller.show(selection);
    print(&controller.state(), json)?;
    states.mark_unchanged();

    let printer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            if let Err(e) = print(&state, json) {
                tracing::error!("Failed to print view: {e:#}");
            }
        }
    });

    tokio::select! {
        _ = controller.follow(daemon.as_ref(), changes.map(|event| {
            tracing::trace!("{event:?}");
        })) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("Interrupted");
        }
    }

    drop(controller);
    let _ = printer.await;
    Ok(())
}

fn print(state: &ViewState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(state)?);
    } else {
        print!("{}", printer::print_state(state));
    }
    Ok(())
}

/// Object paths pass through; device names become the path of their block
fn resolve_target(snapshot: &StorageSnapshot, target: &str) -> String {
    if target.starts_with("/org/") {
        return target.to_string();
    }
    match snapshot.block_by_name(target) {
        Some(block) => block.path.clone(),
        None => target.to_string(),
    }
}
