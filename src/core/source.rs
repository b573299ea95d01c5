//! Upstream data source abstractions

use async_trait::async_trait;

use crate::core::allocation::AllocationRow;
use crate::core::error::FundError;
use crate::core::fund::{DateRange, FundKind, InfoRow};

/// Cookie state established by the upstream handshake. Valid for one
/// orchestration run only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
pub trait FundDataSource: Send + Sync {
    async fn bootstrap_session(&self) -> Result<SessionToken, FundError>;

    /// Daily info rows for `range`. Without a `code` every fund of `kind` is
    /// returned, which is how fund discovery works.
    async fn fetch_info(
        &self,
        range: DateRange,
        code: Option<&str>,
        kind: FundKind,
        session: &SessionToken,
    ) -> Result<Vec<InfoRow>, FundError>;

    async fn fetch_allocation(
        &self,
        range: DateRange,
        code: &str,
        kind: FundKind,
        session: &SessionToken,
    ) -> Result<Vec<AllocationRow>, FundError>;
}
