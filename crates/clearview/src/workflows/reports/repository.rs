use super::domain::{NewReport, Report, ReportId, ReportStatus, UserId, UserProfile};

/// Document store holding the report collection.
///
/// Creation is append-only and must be all-or-nothing: a failed `create` leaves
/// no document behind, and a single call never produces more than one document.
pub trait ReportStore: Send + Sync {
    fn create(&self, report: NewReport) -> Result<ReportId, StoreError>;
    fn query_by_status(&self, status: ReportStatus) -> Result<Vec<Report>, StoreError>;
    fn query_all(&self) -> Result<Vec<Report>, StoreError>;
    fn get_by_id(&self, id: &ReportId) -> Result<Report, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("report {0} not found")]
    NotFound(ReportId),
    #[error("report store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only user lookup.
pub trait UserDirectory: Send + Sync {
    fn get_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}
