//! HTTP behaviour of `DatadogClient` against a wiremocked `/monitor`
//! endpoint. No live Datadog account needed.

use datadog_alert_tracker::credentials::ApiKeys;
use datadog_alert_tracker::provider::AlertSource;
use datadog_alert_tracker::services::DatadogClient;
use datadog_alert_tracker::{AlertError, MonitorState, RegionId};
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

// ---- Helpers ----------------------------------------------------------------

const MONITORS: &str = r#"[
    {"id": 101, "name": "CPU High", "message": "cpu above 90% @pagerduty",
     "overall_state": "Alert", "created": "2024-03-01T10:00:00.000000+00:00",
     "modified": "2024-03-02T11:00:00.000000+00:00", "tags": ["env:prod", "team:core"],
     "priority": 2, "type": "metric alert"},
    {"id": 102, "name": "Disk ok", "message": "", "overall_state": "OK",
     "created": "", "modified": "", "tags": [], "priority": null},
    {"id": 103, "name": "Queue lag", "message": "lag rising", "overall_state": "Warn",
     "created": "", "modified": "", "tags": ["env:staging"]},
    {"id": 104, "name": "Heartbeat", "message": "", "overall_state": "No Data",
     "created": "", "modified": "", "tags": []},
    {"id": 105, "name": "New state", "message": "", "overall_state": "Ignored",
     "created": "", "modified": "", "tags": []}
]"#;

fn keys() -> ApiKeys {
    ApiKeys::new("test-api-key", "test-app-key")
}

async fn server_responding(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/monitor"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

// ---- Tests ------------------------------------------------------------------

#[tokio::test]
async fn sends_credentials_and_filters_as_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/monitor"))
        .and(query_param("api_key", "test-api-key"))
        .and(query_param("application_key", "test-app-key"))
        .and(query_param("group_states", "alert,warn"))
        .and(query_param("with_downtimes", "false"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = DatadogClient::with_base_url(server.uri());
    let monitors = client.fetch_monitors(&keys(), RegionId::Us1).await.unwrap();

    assert!(monitors.is_empty());
}

#[tokio::test]
async fn fetch_alerts_keeps_only_alert_and_warn() {
    let server =
        server_responding(ResponseTemplate::new(200).set_body_raw(MONITORS, "application/json"))
            .await;

    let client = DatadogClient::with_base_url(server.uri());
    let alerts = client.fetch_alerts(&keys(), RegionId::Eu1).await.unwrap();

    let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["101", "103"]);

    let cpu = &alerts[0];
    assert_eq!(cpu.name, "CPU High");
    assert_eq!(cpu.state, MonitorState::Alert);
    assert_eq!(cpu.tags, vec!["env:prod".to_string(), "team:core".to_string()]);
    assert_eq!(cpu.priority, Some(2));
    assert_eq!(cpu.created, "2024-03-01T10:00:00.000000+00:00");

    assert_eq!(alerts[1].state, MonitorState::Warn);
    assert_eq!(alerts[1].priority, None);
}

#[tokio::test]
async fn non_ok_status_is_http_error() {
    for status in [401_u16, 403, 429, 500, 503] {
        let server = server_responding(ResponseTemplate::new(status)).await;
        let client = DatadogClient::with_base_url(server.uri());

        let err = client.fetch_alerts(&keys(), RegionId::Us1).await.unwrap_err();

        assert_eq!(err, AlertError::HttpError(status));
    }
}

#[tokio::test]
async fn other_success_codes_are_not_accepted() {
    let server =
        server_responding(ResponseTemplate::new(202).set_body_raw("[]", "application/json")).await;
    let client = DatadogClient::with_base_url(server.uri());

    let err = client.fetch_alerts(&keys(), RegionId::Us1).await.unwrap_err();

    assert_eq!(err, AlertError::HttpError(202));
}

#[tokio::test]
async fn malformed_body_is_decoding_error() {
    let server =
        server_responding(ResponseTemplate::new(200).set_body_raw("[{", "application/json")).await;
    let client = DatadogClient::with_base_url(server.uri());

    let err = client.fetch_alerts(&keys(), RegionId::Us1).await.unwrap_err();

    assert!(matches!(err, AlertError::DecodingError(_)), "got {:?}", err);
}

#[tokio::test]
async fn object_instead_of_array_is_decoding_error() {
    let server = server_responding(
        ResponseTemplate::new(200)
            .set_body_raw(r#"{"errors": ["Forbidden"]}"#, "application/json"),
    )
    .await;
    let client = DatadogClient::with_base_url(server.uri());

    let err = client.fetch_alerts(&keys(), RegionId::Us1).await.unwrap_err();

    assert!(matches!(err, AlertError::DecodingError(_)), "got {:?}", err);
}

#[tokio::test]
async fn makes_exactly_one_attempt_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/monitor"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let client = DatadogClient::with_base_url(server.uri());
    let result = client.fetch_alerts(&keys(), RegionId::Us1).await;

    assert_eq!(result.unwrap_err(), AlertError::HttpError(502));
}
