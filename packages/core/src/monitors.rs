//! Monitor wire shape and the alert filter.

use serde::{Deserialize, Serialize};

/// Evaluated state of a monitor.
///
/// Unknown wire strings decode as `Ok`, so a state the provider adds later
/// is never mistaken for an alerting one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MonitorState {
    Alert,
    Warn,
    NoData,
    Ok,
}

impl MonitorState {
    pub fn as_str(self) -> &'static str {
        match self {
            MonitorState::Alert => "Alert",
            MonitorState::Warn => "Warn",
            MonitorState::NoData => "No Data",
            MonitorState::Ok => "OK",
        }
    }

    /// Alert and Warn are the only states surfaced to presentation.
    pub fn is_alerting(self) -> bool {
        matches!(self, MonitorState::Alert | MonitorState::Warn)
    }
}

impl From<&str> for MonitorState {
    fn from(value: &str) -> Self {
        match value {
            "Alert" => MonitorState::Alert,
            "Warn" => MonitorState::Warn,
            "No Data" | "NoData" => MonitorState::NoData,
            _ => MonitorState::Ok,
        }
    }
}

impl From<String> for MonitorState {
    fn from(value: String) -> Self {
        MonitorState::from(value.as_str())
    }
}

impl From<MonitorState> for String {
    fn from(state: MonitorState) -> Self {
        state.as_str().to_string()
    }
}

/// One entry of `GET /monitor`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMonitor {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
    pub overall_state: MonitorState,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub modified: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: Option<i64>,
}

/// A monitor currently in Alert or Warn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub name: String,
    pub message: String,
    pub state: MonitorState,
    pub created: String,
    pub modified: String,
    pub tags: Vec<String>,
    pub priority: Option<i64>,
}

impl From<RawMonitor> for Alert {
    fn from(monitor: RawMonitor) -> Self {
        Self {
            id: monitor.id.to_string(),
            name: monitor.name,
            message: monitor.message,
            state: monitor.overall_state,
            created: monitor.created,
            modified: monitor.modified,
            tags: monitor.tags,
            priority: monitor.priority,
        }
    }
}

/// Keep alerting monitors, in response order, and convert them to alerts.
pub fn classify(monitors: Vec<RawMonitor>) -> Vec<Alert> {
    monitors
        .into_iter()
        .filter(|m| m.overall_state.is_alerting())
        .map(Alert::from)
        .collect()
}
