//! Datadog deployment regions.
//!
//! The region set is closed and compiled in. Each [`RegionId`] indexes
//! straight into [`REGIONS`], so there is no fallback branch that could
//! quietly route an unknown region to some default site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A Datadog site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(usize)]
pub enum RegionId {
    #[default]
    #[serde(rename = "US1")]
    Us1 = 0,
    #[serde(rename = "EU1")]
    Eu1 = 1,
    #[serde(rename = "US3")]
    Us3 = 2,
    #[serde(rename = "US5")]
    Us5 = 3,
    #[serde(rename = "AP1")]
    Ap1 = 4,
    #[serde(rename = "GOV")]
    Gov = 5,
}

/// One row of the region table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionInfo {
    pub id: RegionId,
    pub code: &'static str,
    pub display_name: &'static str,
    pub api_base: &'static str,
    pub web_url: &'static str,
}

/// Base URLs for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: &'static str,
    pub web_url: &'static str,
}

/// Region table, ordered by `RegionId` discriminant.
pub const REGIONS: [RegionInfo; 6] = [
    RegionInfo {
        id: RegionId::Us1,
        code: "US1",
        display_name: "US1 (Default)",
        api_base: "https://api.datadoghq.com/api/v1",
        web_url: "https://app.datadoghq.com/monitors/manage",
    },
    RegionInfo {
        id: RegionId::Eu1,
        code: "EU1",
        display_name: "EU1 (Europe)",
        api_base: "https://api.datadoghq.eu/api/v1",
        web_url: "https://app.datadoghq.eu/monitors/manage",
    },
    RegionInfo {
        id: RegionId::Us3,
        code: "US3",
        display_name: "US3",
        api_base: "https://api.us3.datadoghq.com/api/v1",
        web_url: "https://us3.datadoghq.com/monitors/manage",
    },
    RegionInfo {
        id: RegionId::Us5,
        code: "US5",
        display_name: "US5",
        api_base: "https://api.us5.datadoghq.com/api/v1",
        web_url: "https://us5.datadoghq.com/monitors/manage",
    },
    RegionInfo {
        id: RegionId::Ap1,
        code: "AP1",
        display_name: "AP1 (Asia Pacific)",
        api_base: "https://api.ap1.datadoghq.com/api/v1",
        web_url: "https://ap1.datadoghq.com/monitors/manage",
    },
    RegionInfo {
        id: RegionId::Gov,
        code: "GOV",
        display_name: "GOV (Government)",
        api_base: "https://api.ddog-gov.com/api/v1",
        web_url: "https://app.ddog-gov.com/monitors/manage",
    },
];

/// Table row for `region`.
pub fn info(region: RegionId) -> &'static RegionInfo {
    &REGIONS[region as usize]
}

/// Map a region to its API and web base URLs.
pub fn resolve(region: RegionId) -> Endpoints {
    let row = info(region);
    Endpoints {
        api_base: row.api_base,
        web_url: row.web_url,
    }
}

impl RegionId {
    pub fn code(self) -> &'static str {
        info(self).code
    }

    pub fn display_name(self) -> &'static str {
        info(self).display_name
    }

    /// Parse a region code, returning `None` for anything outside the table.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        REGIONS
            .iter()
            .find(|row| row.code.eq_ignore_ascii_case(value))
            .map(|row| row.id)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RegionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegionId::parse(s).ok_or_else(|| {
            let known: Vec<&str> = REGIONS.iter().map(|row| row.code).collect();
            format!("Unknown region '{}'. Must be one of: {}", s, known.join(", "))
        })
    }
}
