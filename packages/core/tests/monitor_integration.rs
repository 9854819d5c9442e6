//! End-to-end tests: credential store + scheduler + `DatadogClient` against
//! a wiremocked Datadog API.

use std::sync::Arc;
use std::time::Duration;

use datadog_alert_tracker::credentials::{CredentialStore, MemorySettings, PersistedSettings};
use datadog_alert_tracker::presentation::ERROR_SENTINEL;
use datadog_alert_tracker::scheduler::{spawn_monitor, DEFAULT_POLL_INTERVAL};
use datadog_alert_tracker::services::DatadogClient;
use datadog_alert_tracker::{AlertError, AppError, BadgeTier, MonitorHandle, RegionId};
use tokio::sync::watch;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

// ---- Helpers ----------------------------------------------------------------

fn monitors_json(alerting: usize, ok: usize) -> String {
    let mut entries = Vec::new();
    for i in 0..alerting {
        entries.push(format!(
            r#"{{"id": {}, "name": "alerting {}", "message": "", "overall_state": "Alert",
                "created": "", "modified": "", "tags": [], "priority": 1}}"#,
            1000 + i,
            i
        ));
    }
    for i in 0..ok {
        entries.push(format!(
            r#"{{"id": {}, "name": "fine {}", "message": "", "overall_state": "OK",
                "created": "", "modified": "", "tags": []}}"#,
            2000 + i,
            i
        ));
    }
    format!("[{}]", entries.join(","))
}

fn store(api_key: Option<&str>, app_key: Option<&str>) -> CredentialStore {
    CredentialStore::with_env(
        MemorySettings::new(PersistedSettings {
            api_key: api_key.map(String::from),
            app_key: app_key.map(String::from),
            region: Some("US3".into()),
        }),
        |_| None,
    )
}

fn start(store: CredentialStore, server: &MockServer) -> (MonitorHandle, watch::Sender<bool>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (handle, _task) = spawn_monitor(
        store,
        Arc::new(DatadogClient::with_base_url(server.uri())),
        DEFAULT_POLL_INTERVAL,
        shutdown_rx,
    );
    (handle, shutdown_tx)
}

// ---- Tests ------------------------------------------------------------------

#[tokio::test]
async fn missing_credentials_make_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .expect(0)
        .mount(&server)
        .await;

    let (handle, _shutdown) = start(store(Some("api"), None), &server);

    let err = handle.fetch().await.unwrap_err();

    assert!(matches!(err, AppError::Fetch(AlertError::MissingCredentials)));
    let state = handle.snapshot();
    assert!(state.alerts.is_empty());
    assert_eq!(state.badge_count(), ERROR_SENTINEL);
    assert_eq!(state.region, RegionId::Us3);
}

#[tokio::test]
async fn outage_keeps_last_known_alerts_until_recovery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/monitor"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(monitors_json(7, 3), "application/json"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/monitor"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/monitor"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(monitors_json(3, 1), "application/json"),
        )
        .mount(&server)
        .await;

    let (handle, _shutdown) = start(store(Some("api"), Some("app")), &server);

    // Startup fetch.
    let mut rx = handle.subscribe();
    let first = rx
        .wait_for(|s| s.last_updated.is_some())
        .await
        .unwrap()
        .clone();
    assert_eq!(first.alerts.len(), 7);
    assert_eq!(first.badge(), BadgeTier::Critical(7));

    // Provider outage.
    let err = handle.fetch().await.unwrap_err();
    assert!(matches!(err, AppError::Fetch(AlertError::HttpError(500))));
    let degraded = handle.snapshot();
    assert_eq!(degraded.alerts, first.alerts);
    assert_eq!(degraded.badge(), BadgeTier::Error);
    assert!(!degraded.is_loading);

    // Recovery replaces the list wholesale.
    let alerts = handle.fetch().await.unwrap();
    assert_eq!(alerts.len(), 3);
    let recovered = handle.snapshot();
    assert!(recovered.error.is_none());
    assert_eq!(recovered.badge(), BadgeTier::Warning(3));
}

#[tokio::test]
async fn concurrent_refreshes_issue_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/monitor"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(monitors_json(1, 0), "application/json")
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (handle, _shutdown) = start(store(Some("api"), Some("app")), &server);

    let (a, b, c) = tokio::join!(handle.fetch(), handle.fetch(), handle.fetch());

    let a = a.unwrap();
    assert_eq!(a.len(), 1);
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
}

#[tokio::test]
async fn saving_credentials_recovers_from_missing_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/monitor"))
        .and(query_param("api_key", "saved-api"))
        .and(query_param("application_key", "saved-app"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(monitors_json(2, 2), "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (handle, _shutdown) = start(store(None, None), &server);
    let mut rx = handle.subscribe();
    rx.wait_for(|s| s.error.is_some()).await.unwrap();

    handle
        .save_credentials("saved-api", "saved-app", RegionId::Ap1)
        .await
        .unwrap();

    let state = rx
        .wait_for(|s| s.last_updated.is_some())
        .await
        .unwrap()
        .clone();
    assert_eq!(state.alerts.len(), 2);
    assert!(state.error.is_none());
    assert_eq!(state.region, RegionId::Ap1);
    assert_eq!(state.web_url(), "https://ap1.datadoghq.com/monitors/manage");
}
