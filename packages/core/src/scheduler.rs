//! Alert polling scheduler.
//!
//! A single task owns the credential store and the published
//! [`PresentationState`]. Everything else talks to it by message:
//!
//! - [`MonitorHandle`] sends commands (refresh, save credentials, queries)
//! - spawned fetch tasks post their outcome back on an internal channel
//! - renderers read snapshots from a `watch` channel
//!
//! At most one fetch is in flight. A refresh requested while one is running
//! waits on that fetch's result instead of starting another; timer ticks
//! that land during a fetch are folded into it. Saving credentials during a
//! fetch queues exactly one follow-up fetch so the new keys get used.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::credentials::CredentialStore;
use crate::error::{AlertError, AppError};
use crate::monitors::Alert;
use crate::presentation::PresentationState;
use crate::provider::AlertSource;
use crate::region::RegionId;

/// Default refresh period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

const COMMAND_BUFFER: usize = 32;

pub type FetchOutcome = Result<Vec<Alert>, AlertError>;

enum Command {
    Refresh {
        reply: Option<oneshot::Sender<FetchOutcome>>,
    },
    SaveCredentials {
        api_key: String,
        app_key: String,
        region: RegionId,
        reply: oneshot::Sender<Result<(), AppError>>,
    },
    CurrentRegion {
        reply: oneshot::Sender<RegionId>,
    },
    HasValidCredentials {
        reply: oneshot::Sender<bool>,
    },
}

/// Cloneable front door to a running monitor.
#[derive(Clone)]
pub struct MonitorHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<PresentationState>,
}

impl MonitorHandle {
    /// Run a fetch (or join the one in flight) and wait for its result.
    pub async fn fetch(&self) -> Result<Vec<Alert>, AppError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Refresh { reply: Some(reply) }).await?;
        let outcome = rx.await.map_err(|_| engine_gone())?;
        outcome.map_err(AppError::from)
    }

    /// Ask for a refresh without waiting for it.
    pub async fn trigger_refresh(&self) -> Result<(), AppError> {
        self.send(Command::Refresh { reply: None }).await
    }

    /// Persist new credentials and refresh with them.
    pub async fn save_credentials(
        &self,
        api_key: &str,
        app_key: &str,
        region: RegionId,
    ) -> Result<(), AppError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SaveCredentials {
            api_key: api_key.to_string(),
            app_key: app_key.to_string(),
            region,
            reply,
        })
        .await?;
        rx.await.map_err(|_| engine_gone())?
    }

    pub async fn current_region(&self) -> Result<RegionId, AppError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CurrentRegion { reply }).await?;
        rx.await.map_err(|_| engine_gone())
    }

    pub async fn has_valid_credentials(&self) -> Result<bool, AppError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::HasValidCredentials { reply }).await?;
        rx.await.map_err(|_| engine_gone())
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PresentationState> {
        self.state.clone()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> PresentationState {
        self.state.borrow().clone()
    }

    async fn send(&self, command: Command) -> Result<(), AppError> {
        self.commands.send(command).await.map_err(|_| engine_gone())
    }
}

fn engine_gone() -> AppError {
    AppError::Engine("alert monitor is not running".into())
}

/// Start the polling task.
///
/// The task fetches immediately, then every `poll_interval`, until
/// `true` is sent on `shutdown` or every [`MonitorHandle`] has been
/// dropped. Dropping the shutdown sender does not stop the task.
pub fn spawn_monitor(
    store: CredentialStore,
    source: Arc<dyn AlertSource>,
    poll_interval: Duration,
    shutdown: watch::Receiver<bool>,
) -> (MonitorHandle, JoinHandle<()>) {
    let initial = PresentationState::new(store.current_region());
    let (state_tx, state_rx) = watch::channel(initial);
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (done_tx, done_rx) = mpsc::channel(1);

    let poller = Poller {
        store,
        source,
        state: state_tx,
        done_tx,
        in_flight: false,
        rerun: false,
        waiters: Vec::new(),
    };

    let task = tokio::spawn(run_alert_polling(
        poller,
        command_rx,
        done_rx,
        poll_interval,
        shutdown,
    ));

    let handle = MonitorHandle {
        commands: command_tx,
        state: state_rx,
    };

    (handle, task)
}

async fn run_alert_polling(
    mut poller: Poller,
    mut commands: mpsc::Receiver<Command>,
    mut done: mpsc::Receiver<FetchOutcome>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    if *shutdown.borrow_and_update() {
        tracing::info!("Shutdown already signalled. Not polling.");
        return;
    }
    let mut shutdown_open = true;

    let mut interval = time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        "Alert polling started (interval: {}s, source: {})",
        poll_interval.as_secs(),
        poller.source.source_name()
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                poller.start_fetch(None);
            }

            command = commands.recv() => match command {
                Some(command) => poller.handle(command),
                None => {
                    tracing::info!("All monitor handles dropped. Stopping polling.");
                    break;
                }
            },

            Some(outcome) = done.recv() => {
                poller.finish_fetch(outcome);
            }

            changed = shutdown.changed(), if shutdown_open => match changed {
                Ok(()) if *shutdown.borrow_and_update() => {
                    tracing::info!("Shutdown signal received. Stopping polling.");
                    break;
                }
                Ok(()) => {}
                // Sender gone: keep polling until the handles are dropped.
                Err(_) => shutdown_open = false,
            },
        }
    }

    tracing::info!("Alert polling stopped cleanly");
}

/// State owned by the polling task.
struct Poller {
    store: CredentialStore,
    source: Arc<dyn AlertSource>,
    state: watch::Sender<PresentationState>,
    done_tx: mpsc::Sender<FetchOutcome>,
    in_flight: bool,
    /// Fetch again once the current one lands.
    rerun: bool,
    waiters: Vec<oneshot::Sender<FetchOutcome>>,
}

impl Poller {
    fn handle(&mut self, command: Command) {
        match command {
            Command::Refresh { reply } => self.start_fetch(reply),
            Command::SaveCredentials {
                api_key,
                app_key,
                region,
                reply,
            } => {
                let result = self.store.save(&api_key, &app_key, region);
                if let Err(err) = &result {
                    tracing::error!("Failed to persist credentials: {}", err);
                }
                let _ = reply.send(result);

                self.sync_region(region);
                if self.in_flight {
                    self.rerun = true;
                } else {
                    self.start_fetch(None);
                }
            }
            Command::CurrentRegion { reply } => {
                let _ = reply.send(self.store.current_region());
            }
            Command::HasValidCredentials { reply } => {
                let _ = reply.send(self.store.has_valid_credentials());
            }
        }
    }

    fn start_fetch(&mut self, waiter: Option<oneshot::Sender<FetchOutcome>>) {
        if let Some(waiter) = waiter {
            self.waiters.push(waiter);
        }

        if self.in_flight {
            tracing::debug!("Fetch already in flight; joining it");
            return;
        }

        let credentials = self.store.load();
        let region = credentials.region();
        self.sync_region(region);

        let Some(keys) = credentials.api_keys() else {
            self.complete(Err(AlertError::MissingCredentials));
            return;
        };

        self.in_flight = true;
        let loading = self.state.borrow().loading();
        self.state.send_replace(loading);

        tracing::debug!(%region, "Fetching alerts");

        let source = self.source.clone();
        let done = self.done_tx.clone();
        tokio::spawn(async move {
            let fetch = tokio::spawn(async move { source.fetch_alerts(&keys, region).await });
            let outcome = match fetch.await {
                Ok(outcome) => outcome,
                Err(err) => Err(AlertError::InvalidResponse(format!(
                    "fetch task failed: {}",
                    err
                ))),
            };
            let _ = done.send(outcome).await;
        });
    }

    fn finish_fetch(&mut self, outcome: FetchOutcome) {
        self.in_flight = false;
        self.complete(outcome);

        if std::mem::take(&mut self.rerun) {
            self.start_fetch(None);
        }
    }

    /// Publish the outcome and answer everyone waiting on it.
    fn complete(&mut self, outcome: FetchOutcome) {
        let current = self.state.borrow().clone();
        let next = match &outcome {
            Ok(alerts) => current.succeeded(alerts.clone(), Utc::now()),
            Err(err) => current.failed(err.to_string()),
        };

        match &outcome {
            Ok(_) => tracing::info!(
                "Alerts updated: {} alerting, badge {}",
                next.alerts.len(),
                next.badge().label()
            ),
            Err(err) => tracing::warn!(
                "Alert fetch failed, keeping {} stale alerts: {}",
                next.alerts.len(),
                err
            ),
        }

        self.state.send_replace(next);

        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(outcome.clone());
        }
    }

    fn sync_region(&mut self, region: RegionId) {
        self.state.send_if_modified(|state| {
            if state.region == region {
                false
            } else {
                state.region = region;
                true
            }
        });
    }
}
