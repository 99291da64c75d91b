//! Pollution report intake, automatic moderation and aggregated read views.
//!
//! Submissions flow through form validation, an optional photo upload and
//! classification step, and a single store write. The aggregator reads the
//! same store to build the public map, the review queue and the leaderboard.

pub mod aggregation;
pub mod classifier;
pub mod domain;
pub mod http;
pub mod moderation;
pub mod repository;
pub mod router;
pub mod submission;
pub mod upload;
pub mod validation;

#[cfg(test)]
mod tests;

pub use aggregation::{count_approved_by_user, LeaderboardEntry, ReportAggregator, ReportView};
pub use classifier::{
    detect_pollution, ClassificationOutcome, ClassifierAdapter, ClassifierError, ImageClassifier,
    ImageRef, POLLUTION_KEYWORDS,
};
pub use domain::{
    ApprovalStatus, GeoPoint, IncidentType, NewReport, Prediction, Report, ReportId,
    ReportStatus, UserId, UserProfile, UserRole,
};
pub use http::{HttpImageClassifier, HttpPhotoUploader};
pub use moderation::{decide_status, PhotoEvidence, StatusDecision};
pub use repository::{DirectoryError, ReportStore, StoreError, UserDirectory};
pub use router::{report_router, ReportServices};
pub use submission::{
    ReportSubmissionService, SubmissionError, SubmissionReceipt, SubmissionRequest,
};
pub use upload::{PhotoUpload, PhotoUploader, UploadError, UploadedPhoto};
pub use validation::{validate, FieldError, ReportForm, ValidatedForm, ValidationErrors};
