use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;
use tokio::signal;
use tokio::sync::watch;

use datadog_alert_tracker::autostart::{AutoStart, AutoStartEntry};
use datadog_alert_tracker::cli::{AutostartAction, Cli, Command};
use datadog_alert_tracker::config::Config;
use datadog_alert_tracker::credentials::{CredentialStore, JsonSettingsFile};
use datadog_alert_tracker::error::AppError;
use datadog_alert_tracker::logging::init_logging;
use datadog_alert_tracker::presentation::PresentationState;
use datadog_alert_tracker::region::REGIONS;
use datadog_alert_tracker::scheduler::spawn_monitor;
use datadog_alert_tracker::services::DatadogClient;

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_env()
        .and_then(|config| config.with_overrides(cli.interval, cli.settings.clone()))
        .map_err(AppError::Config)?;

    tracing::debug!("Running with config: {:?}", config);

    let store = CredentialStore::new(JsonSettingsFile::new(&config.settings_path));

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch_alerts(store, &config).await,
        Command::Once => fetch_once(store).await,
        Command::Configure {
            api_key,
            app_key,
            region,
        } => {
            let mut store = store;
            store.save(&api_key, &app_key, region)?;
            println!(
                "Saved credentials for {} to {}",
                region.display_name(),
                config.settings_path.display()
            );
            Ok(())
        }
        Command::Regions => {
            for row in &REGIONS {
                println!(
                    "{:<4} {:<20} {:<42} {}",
                    row.code, row.display_name, row.api_base, row.web_url
                );
            }
            Ok(())
        }
        Command::Autostart { action } => manage_autostart(action),
    }
}

/// Poll until Ctrl+C, logging each settled snapshot.
async fn watch_alerts(store: CredentialStore, config: &Config) -> Result<(), AppError> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (handle, task) = spawn_monitor(
        store,
        Arc::new(DatadogClient::new()),
        Duration::from_secs(config.poll_interval_seconds),
        shutdown_rx,
    );

    let mut updates = handle.subscribe();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if !state.is_loading {
                    tracing::info!("{}", summary_line(&state));
                }
            }

            _ = signal::ctrl_c() => {
                let _ = shutdown_tx.send(true);
                break;
            }
        }
    }

    task.await
        .map_err(|err| AppError::Engine(format!("polling task failed: {}", err)))
}

/// One fetch through the scheduler, printed as a list.
async fn fetch_once(store: CredentialStore) -> Result<(), AppError> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (handle, task) = spawn_monitor(
        store,
        Arc::new(DatadogClient::new()),
        Duration::from_secs(3600),
        shutdown_rx,
    );

    let result = handle.fetch().await;
    let state = handle.snapshot();
    let _ = shutdown_tx.send(true);
    let _ = task.await;

    let alerts = result?;
    println!("{}", summary_line(&state));
    for alert in &alerts {
        println!(
            "  [{}] {} (#{}){}",
            alert.state.as_str(),
            alert.name,
            alert.id,
            alert
                .priority
                .map(|p| format!(" P{}", p))
                .unwrap_or_default()
        );
    }
    println!("{}", state.web_url());
    Ok(())
}

fn summary_line(state: &PresentationState) -> String {
    let badge = state.badge();
    match &state.error {
        Some(err) => format!(
            "[{}] {} (showing {} stale alerts)",
            badge.label(),
            err,
            state.alerts.len()
        ),
        None => {
            let names: Vec<&str> = state.alerts.iter().take(3).map(|a| a.name.as_str()).collect();
            let more = state.alerts.len().saturating_sub(names.len());
            let mut line = format!("[{}] {} alerting", badge.label(), state.alerts.len());
            if !names.is_empty() {
                line.push_str(": ");
                line.push_str(&names.join(", "));
            }
            if more > 0 {
                line.push_str(&format!(" and {} more", more));
            }
            line
        }
    }
}

fn manage_autostart(action: AutostartAction) -> Result<(), AppError> {
    let entry = AutoStartEntry::for_current_user()?;

    let ok = match action {
        AutostartAction::Enable => entry.enable_auto_start(),
        AutostartAction::Disable => entry.disable_auto_start(),
        AutostartAction::Status => {
            let state = if entry.is_auto_start_enabled() { "enabled" } else { "disabled" };
            println!("Auto-start is {} ({})", state, entry.path().display());
            true
        }
    };

    if ok {
        Ok(())
    } else {
        Err(AppError::Engine(format!(
            "could not update login entry at {}",
            entry.path().display()
        )))
    }
}
