use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use super::classifier::{ClassifierAdapter, ImageClassifier, ImageRef};
use super::domain::{GeoPoint, NewReport, Prediction, ReportId, ReportStatus, UserId, UserRole};
use super::moderation::{decide_status, PhotoEvidence};
use super::repository::{ReportStore, StoreError, UserDirectory};
use super::upload::{PhotoUpload, PhotoUploader, UploadError};
use super::validation::{ReportForm, ValidationErrors};

/// Everything a single submission needs, passed explicitly.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub form: ReportForm,
    pub photo: Option<PhotoUpload>,
    pub location: Option<GeoPoint>,
    pub user_id: UserId,
}

/// Outcome returned to the observer after the report is stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub report_id: ReportId,
    pub status: ReportStatus,
    pub auto_approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_results: Option<Vec<Prediction>>,
    pub message: &'static str,
}

/// Runs validation, photo verification and persistence for new reports.
///
/// Stateless between calls; concurrent submissions only share the store.
pub struct ReportSubmissionService<S, D, U, C> {
    store: Arc<S>,
    directory: Arc<D>,
    uploader: Arc<U>,
    classifier: ClassifierAdapter<C>,
}

impl<S, D, U, C> ReportSubmissionService<S, D, U, C>
where
    S: ReportStore + 'static,
    D: UserDirectory + 'static,
    U: PhotoUploader + 'static,
    C: ImageClassifier + 'static,
{
    pub fn new(store: Arc<S>, directory: Arc<D>, uploader: Arc<U>, classifier: Arc<C>) -> Self {
        Self {
            store,
            directory,
            uploader,
            classifier: ClassifierAdapter::new(classifier),
        }
    }

    pub fn with_top_k(mut self, top_k: Option<usize>) -> Self {
        self.classifier = self.classifier.with_top_k(top_k);
        self
    }

    pub fn submit(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let SubmissionRequest {
            form,
            photo,
            location,
            user_id,
        } = request;

        let validated = form.validate()?;

        let location = location.ok_or(SubmissionError::LocationRequired)?;
        if !location.is_valid() {
            return Err(SubmissionError::InvalidLocation {
                latitude: location.latitude,
                longitude: location.longitude,
            });
        }

        self.ensure_submitter_allowed(&user_id)?;

        let (photo_url, evidence, classification_results) = match photo {
            Some(photo) => {
                let uploaded = self.uploader.upload(&photo).map_err(|err| {
                    warn!(error = %err, file = %photo.file_name, "photo upload failed");
                    SubmissionError::PhotoUploadFailed(err)
                })?;
                let outcome = self.classifier.classify(ImageRef {
                    url: &uploaded.url,
                    bytes: &photo.bytes,
                });
                let evidence = outcome.evidence();
                (uploaded.url, evidence, outcome.into_predictions())
            }
            None => (String::new(), PhotoEvidence::Absent, None),
        };

        let decision = decide_status(evidence);
        let report = NewReport {
            incident_type: validated.incident_type,
            description: validated.description,
            photo_url: photo_url.clone(),
            location,
            user_id,
            status: decision.status,
            auto_approved: decision.auto_approved,
            classification_results: classification_results.clone(),
        };

        let report_id = self.store.create(report).map_err(|err| {
            error!(error = %err, "failed to persist report");
            SubmissionError::Persistence(err)
        })?;

        info!(
            report_id = %report_id,
            status = decision.status.label(),
            auto_approved = decision.auto_approved,
            "report submitted"
        );

        Ok(SubmissionReceipt {
            report_id,
            status: decision.status,
            auto_approved: decision.auto_approved,
            photo_url: (!photo_url.is_empty()).then_some(photo_url),
            classification_results,
            message: decision.summary(),
        })
    }

    fn ensure_submitter_allowed(&self, user_id: &UserId) -> Result<(), SubmissionError> {
        if user_id.is_anonymous() {
            return Ok(());
        }

        match self.directory.get_by_id(user_id) {
            Ok(Some(profile)) if profile.role == UserRole::Admin => {
                warn!(user_id = %user_id, "admin attempted to submit a report");
                Err(SubmissionError::SubmitterForbidden)
            }
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "role lookup failed; accepting submission");
                Ok(())
            }
        }
    }
}

/// Typed failure of a submission; nothing is persisted when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("report form invalid: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("location data is required; enable location services and retry")]
    LocationRequired,
    #[error("location ({latitude}, {longitude}) is outside the valid coordinate range")]
    InvalidLocation { latitude: f64, longitude: f64 },
    #[error("admin users cannot submit reports")]
    SubmitterForbidden,
    #[error("failed to upload photo: {0}")]
    PhotoUploadFailed(#[source] UploadError),
    #[error("failed to store report: {0}")]
    Persistence(#[source] StoreError),
}
