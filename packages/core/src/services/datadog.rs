use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};

use crate::credentials::ApiKeys;
use crate::error::AlertError;
use crate::monitors::{classify, Alert, RawMonitor};
use crate::provider::AlertSource;
use crate::region::{self, RegionId};

/// Datadog monitors API client.
#[derive(Clone)]
pub struct DatadogClient {
    http: Client,
    base_url_override: Option<String>,
}

impl DatadogClient {
    /// Client that talks to the API base of whichever region it is asked for.
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            base_url_override: None,
        }
    }

    /// Client pinned to `base_url` regardless of region, e.g. a local mock
    /// server or a proxy.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url_override: Some(base_url.into()),
        }
    }

    pub fn api_base(&self, region: RegionId) -> String {
        match &self.base_url_override {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => region::resolve(region).api_base.to_string(),
        }
    }

    /// `{api_base}/monitor` with auth and filter query parameters.
    pub fn monitors_url(&self, keys: &ApiKeys, region: RegionId) -> Result<Url, AlertError> {
        let endpoint = format!("{}/monitor", self.api_base(region));
        Url::parse_with_params(
            &endpoint,
            &[
                ("api_key", keys.api_key()),
                ("application_key", keys.app_key()),
                ("group_states", "alert,warn"),
                ("with_downtimes", "false"),
            ],
        )
        .map_err(|err| AlertError::InvalidUrl(format!("{}: {}", endpoint, err)))
    }

    /// Issue one `GET /monitor` and decode the body.
    pub async fn fetch_monitors(
        &self,
        keys: &ApiKeys,
        region: RegionId,
    ) -> Result<Vec<RawMonitor>, AlertError> {
        let url = self.monitors_url(keys, region)?;

        // The URL carries the keys, so only the region is logged.
        tracing::debug!(%region, "Requesting Datadog monitors");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| {
                if err.is_builder() {
                    AlertError::InvalidUrl(err.without_url().to_string())
                } else {
                    AlertError::Transport(err.without_url().to_string())
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AlertError::HttpError(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| AlertError::InvalidResponse(err.without_url().to_string()))?;

        serde_json::from_slice::<Vec<RawMonitor>>(&body)
            .map_err(|err| AlertError::DecodingError(err.to_string()))
    }
}

impl Default for DatadogClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSource for DatadogClient {
    async fn fetch_alerts(
        &self,
        keys: &ApiKeys,
        region: RegionId,
    ) -> Result<Vec<Alert>, AlertError> {
        let monitors = self.fetch_monitors(keys, region).await?;
        let total = monitors.len();
        let alerts = classify(monitors);

        tracing::debug!(
            "Datadog returned {} monitors, {} alerting",
            total,
            alerts.len()
        );

        Ok(alerts)
    }

    fn source_name(&self) -> &str {
        "Datadog"
    }
}
