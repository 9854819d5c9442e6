//! Published state and badge derivation.
//!
//! `PresentationState` is the immutable snapshot the scheduler hands to
//! renderers. Everything a renderer draws (icon tier, title, list) can be
//! derived from a snapshot alone, without another fetch.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::monitors::Alert;
use crate::region::{self, RegionId};

/// Highest alert count that still renders in the warning tier.
pub const WARNING_MAX: usize = 5;

/// Badge count used by renderers to mean "fetch failed".
pub const ERROR_SENTINEL: i64 = -1;

/// Snapshot of the monitoring state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PresentationState {
    pub alerts: Vec<Alert>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub region: RegionId,
    /// Completion time of the last successful fetch.
    pub last_updated: Option<DateTime<Utc>>,
}

impl PresentationState {
    pub fn new(region: RegionId) -> Self {
        Self {
            region,
            ..Self::default()
        }
    }

    pub fn badge(&self) -> BadgeTier {
        BadgeTier::from_state(self)
    }

    /// Alert count, or [`ERROR_SENTINEL`] when the last fetch failed.
    pub fn badge_count(&self) -> i64 {
        if self.error.is_some() {
            ERROR_SENTINEL
        } else {
            self.alerts.len() as i64
        }
    }

    /// Datadog monitor management page for the active region.
    pub fn web_url(&self) -> &'static str {
        region::resolve(self.region).web_url
    }

    /// State after a successful fetch: alerts replaced wholesale, error cleared.
    pub(crate) fn succeeded(&self, alerts: Vec<Alert>, at: DateTime<Utc>) -> Self {
        Self {
            alerts,
            is_loading: false,
            error: None,
            region: self.region,
            last_updated: Some(at),
        }
    }

    /// State after a failed fetch: last known alerts kept, error set.
    pub(crate) fn failed(&self, message: String) -> Self {
        Self {
            alerts: self.alerts.clone(),
            is_loading: false,
            error: Some(message),
            region: self.region,
            last_updated: self.last_updated,
        }
    }

    pub(crate) fn loading(&self) -> Self {
        Self {
            is_loading: true,
            ..self.clone()
        }
    }
}

/// Coarse severity bucket shown on the badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", content = "count", rename_all = "snake_case")]
pub enum BadgeTier {
    Clear,
    Warning(usize),
    Critical(usize),
    Error,
}

impl BadgeTier {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => BadgeTier::Clear,
            1..=WARNING_MAX => BadgeTier::Warning(count),
            _ => BadgeTier::Critical(count),
        }
    }

    /// A failed last fetch wins over any count.
    pub fn from_state(state: &PresentationState) -> Self {
        if state.error.is_some() {
            BadgeTier::Error
        } else {
            BadgeTier::from_count(state.alerts.len())
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BadgeTier::Clear => "clear",
            BadgeTier::Warning(_) => "warning",
            BadgeTier::Critical(_) => "critical",
            BadgeTier::Error => "error",
        }
    }

    /// SF Symbol name used by the macOS menu-bar renderer.
    pub fn symbol(self) -> &'static str {
        match self {
            BadgeTier::Clear => "checkmark.circle.fill",
            BadgeTier::Warning(_) => "exclamationmark.triangle.fill",
            BadgeTier::Critical(_) => "exclamationmark.octagon.fill",
            BadgeTier::Error => "xmark.circle.fill",
        }
    }

    /// Text next to the icon: the count, or nothing when there is none.
    pub fn title(self) -> String {
        match self {
            BadgeTier::Warning(n) | BadgeTier::Critical(n) => n.to_string(),
            BadgeTier::Clear => String::new(),
            BadgeTier::Error => "!".to_string(),
        }
    }
}
