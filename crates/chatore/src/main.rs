// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chatore - a tiered AI chat companion with permanent memory.
//!
//! Binary entry point: configuration loading, logging setup, and the
//! maintenance subcommands. The chat surface itself attaches through the
//! library's `ChatEngine`.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use chatore::engine::{ChatEngine, DisconnectedProvider};
use chatore::shutdown;
use chatore::status::run_status;
use chatore::sweep::SweepRunner;
use chatore_config::model::ChatoreConfig;
use chatore_core::ChatoreError;

/// Chatore - a tiered AI chat companion with permanent memory.
#[derive(Parser, Debug)]
#[command(name = "chatore", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show tier and memory statistics from the stored snapshots.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Run the inactivity decay sweep over stored conversations.
    Sweep {
        /// Keep sweeping on the configured interval until interrupted.
        #[arg(long)]
        watch: bool,
    },
    /// Grant a user a premium subscription.
    Grant {
        /// Platform user id to upgrade.
        user: String,
        /// Subscription length in 30-day months.
        #[arg(long, default_value_t = 1)]
        months: u32,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match chatore_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            chatore_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Status { json }) => run_status(&config, json).await,
        Some(Commands::Sweep { watch }) => run_sweep(&config, watch).await,
        Some(Commands::Grant { user, months }) => run_grant(&config, &user, months).await,
        None => {
            println!("chatore: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("chatore: {e}");
        std::process::exit(1);
    }
}

/// Run the decay sweep: one pass by default, a cancellable loop with
/// `--watch`.
async fn run_sweep(config: &ChatoreConfig, watch: bool) -> Result<(), ChatoreError> {
    let engine = Arc::new(ChatEngine::new(config, Arc::new(DisconnectedProvider), None).await);

    if watch {
        let cancel = shutdown::install_signal_handler();
        let interval = Duration::from_secs(config.sweep.interval_secs);
        SweepRunner::new(engine, interval).run(cancel).await;
        return Ok(());
    }

    let decayed = engine.sweep_once().await;
    info!(decayed = decayed.len(), "sweep pass complete");
    println!("sweep: {} user context(s) decayed", decayed.len());
    Ok(())
}

/// Grant a premium subscription and deliver the welcome notification
/// through the log notifier before exiting.
async fn run_grant(config: &ChatoreConfig, user: &str, months: u32) -> Result<(), ChatoreError> {
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let notifier = tokio::spawn(chatore::run_notifier(rx, Arc::new(chatore::LogNotifier)));

    let engine = ChatEngine::new(config, Arc::new(DisconnectedProvider), Some(tx)).await;
    let user = chatore_core::UserId::from(user);
    let expires_at = engine.grant_premium(&user, months).await;
    println!("premium granted to {user} until {expires_at}");

    // Dropping the engine closes the event channel and ends the notifier.
    drop(engine);
    let _ = notifier.await;
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chatore={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
