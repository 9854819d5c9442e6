//! Alert source interface.
//!
//! The scheduler only knows about this trait, so the HTTP client can be
//! swapped for an in-process source in tests.

use async_trait::async_trait;

use crate::credentials::ApiKeys;
use crate::error::AlertError;
use crate::monitors::Alert;
use crate::region::RegionId;

/// Something that can produce the current alert list in one attempt.
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// Fetch and classify alerts. Implementations make a single attempt;
    /// retrying is the scheduler's job.
    async fn fetch_alerts(
        &self,
        keys: &ApiKeys,
        region: RegionId,
    ) -> Result<Vec<Alert>, AlertError>;

    /// Name used in log lines.
    fn source_name(&self) -> &str;
}
