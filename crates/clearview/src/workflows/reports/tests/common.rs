use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::IntegrationConfig;
use crate::workflows::reports::classifier::{ClassifierError, ImageClassifier, ImageRef};
use crate::workflows::reports::domain::{
    GeoPoint, IncidentType, NewReport, Prediction, Report, ReportId, ReportStatus, UserId,
    UserProfile, UserRole,
};
use crate::workflows::reports::repository::{
    DirectoryError, ReportStore, StoreError, UserDirectory,
};
use crate::workflows::reports::upload::{PhotoUpload, PhotoUploader, UploadError, UploadedPhoto};
use crate::workflows::reports::validation::ReportForm;
use crate::workflows::reports::{
    report_router, ReportAggregator, ReportServices, ReportSubmissionService, SubmissionRequest,
};

pub(super) const DESCRIPTION: &str = "Black smoke pouring from the factory chimney";

pub(super) fn form() -> ReportForm {
    ReportForm::new("Air Emission", DESCRIPTION)
}

pub(super) fn location() -> GeoPoint {
    GeoPoint::new(18.5204, 73.8567)
}

pub(super) fn photo() -> PhotoUpload {
    PhotoUpload {
        file_name: "chimney.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
    }
}

pub(super) fn request(photo: Option<PhotoUpload>) -> SubmissionRequest {
    SubmissionRequest {
        form: form(),
        photo,
        location: Some(location()),
        user_id: UserId("user-a".to_string()),
    }
}

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn stored_report(id: &str, user: &str, status: ReportStatus, auto: bool) -> Report {
    Report {
        id: ReportId(id.to_string()),
        incident_type: IncidentType::WasteDumping,
        description: "Mattresses dumped beside the creek".to_string(),
        photo_url: String::new(),
        location: Some(location()),
        user_id: UserId(user.to_string()),
        created_at: Some(base_time()),
        status,
        auto_approved: auto,
        classification_results: None,
    }
}

pub(super) fn user(id: &str, name: &str, points: i64) -> UserProfile {
    UserProfile {
        id: UserId(id.to_string()),
        name: name.to_string(),
        role: UserRole::User,
        points,
        approval_status: None,
    }
}

#[derive(Default)]
pub(super) struct MemoryReportStore {
    reports: Mutex<Vec<Report>>,
    creates: AtomicUsize,
}

impl MemoryReportStore {
    pub(super) fn with_reports(reports: Vec<Report>) -> Self {
        Self {
            reports: Mutex::new(reports),
            creates: AtomicUsize::new(0),
        }
    }

    pub(super) fn reports(&self) -> Vec<Report> {
        self.reports.lock().expect("store mutex poisoned").clone()
    }

    pub(super) fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

impl ReportStore for MemoryReportStore {
    fn create(&self, report: NewReport) -> Result<ReportId, StoreError> {
        let mut guard = self.reports.lock().expect("store mutex poisoned");
        let sequence = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        let id = ReportId(format!("rep-{sequence:06}"));
        let created_at = base_time() + Duration::seconds(sequence as i64);
        guard.push(Report::from_new(id.clone(), created_at, report));
        Ok(id)
    }

    fn query_by_status(&self, status: ReportStatus) -> Result<Vec<Report>, StoreError> {
        Ok(self
            .reports()
            .into_iter()
            .filter(|report| report.status == status)
            .collect())
    }

    fn query_all(&self) -> Result<Vec<Report>, StoreError> {
        Ok(self.reports())
    }

    fn get_by_id(&self, id: &ReportId) -> Result<Report, StoreError> {
        self.reports()
            .into_iter()
            .find(|report| &report.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

pub(super) struct UnavailableStore;

impl ReportStore for UnavailableStore {
    fn create(&self, _report: NewReport) -> Result<ReportId, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn query_by_status(&self, _status: ReportStatus) -> Result<Vec<Report>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn query_all(&self) -> Result<Vec<Report>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn get_by_id(&self, _id: &ReportId) -> Result<Report, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    users: HashMap<UserId, UserProfile>,
    lookups: AtomicUsize,
}

impl MemoryDirectory {
    pub(super) fn with_users(users: Vec<UserProfile>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|profile| (profile.id.clone(), profile))
                .collect(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub(super) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl UserDirectory for MemoryDirectory {
    fn get_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, DirectoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.get(id).cloned())
    }
}

pub(super) struct UnavailableDirectory;

impl UserDirectory for UnavailableDirectory {
    fn get_by_id(&self, _id: &UserId) -> Result<Option<UserProfile>, DirectoryError> {
        Err(DirectoryError::Unavailable("directory offline".to_string()))
    }
}

pub(super) struct ScriptedUploader {
    fail: bool,
    calls: AtomicUsize,
}

impl ScriptedUploader {
    pub(super) fn succeeding() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PhotoUploader for ScriptedUploader {
    fn upload(&self, photo: &PhotoUpload) -> Result<UploadedPhoto, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(UploadError::Rejected {
                status: 400,
                message: "Upload preset not found".to_string(),
            });
        }
        Ok(UploadedPhoto {
            url: format!("https://img.example.test/clear-view/{}", photo.file_name),
        })
    }
}

pub(super) struct ScriptedClassifier {
    predictions: Option<Vec<Prediction>>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub(super) fn labels(labels: &[(&str, f64)]) -> Self {
        Self {
            predictions: Some(
                labels
                    .iter()
                    .map(|(label, confidence)| Prediction::new(*label, *confidence))
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            predictions: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageClassifier for ScriptedClassifier {
    fn classify(&self, _image: ImageRef<'_>) -> Result<Vec<Prediction>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.predictions
            .clone()
            .ok_or_else(|| ClassifierError::Transport("model failed to load".to_string()))
    }
}

pub(super) type TestService =
    ReportSubmissionService<MemoryReportStore, MemoryDirectory, ScriptedUploader, ScriptedClassifier>;

pub(super) struct Harness {
    pub(super) service: TestService,
    pub(super) store: Arc<MemoryReportStore>,
    pub(super) directory: Arc<MemoryDirectory>,
    pub(super) uploader: Arc<ScriptedUploader>,
    pub(super) classifier: Arc<ScriptedClassifier>,
}

pub(super) fn harness(uploader: ScriptedUploader, classifier: ScriptedClassifier) -> Harness {
    harness_with_users(uploader, classifier, Vec::new())
}

pub(super) fn harness_with_users(
    uploader: ScriptedUploader,
    classifier: ScriptedClassifier,
    users: Vec<UserProfile>,
) -> Harness {
    let store = Arc::new(MemoryReportStore::default());
    let directory = Arc::new(MemoryDirectory::with_users(users));
    let uploader = Arc::new(uploader);
    let classifier = Arc::new(classifier);
    let service = ReportSubmissionService::new(
        store.clone(),
        directory.clone(),
        uploader.clone(),
        classifier.clone(),
    );
    Harness {
        service,
        store,
        directory,
        uploader,
        classifier,
    }
}

pub(super) fn router_with(
    store: MemoryReportStore,
    users: Vec<UserProfile>,
    classifier: ScriptedClassifier,
) -> axum::Router {
    router_with_limit(
        Arc::new(store),
        users,
        classifier,
        IntegrationConfig::default().max_submission_bytes,
    )
}

pub(super) fn router_with_limit(
    store: Arc<MemoryReportStore>,
    users: Vec<UserProfile>,
    classifier: ScriptedClassifier,
    submission_body_limit: usize,
) -> axum::Router {
    let directory = Arc::new(MemoryDirectory::with_users(users));
    let submissions = ReportSubmissionService::new(
        store.clone(),
        directory.clone(),
        Arc::new(ScriptedUploader::succeeding()),
        Arc::new(classifier),
    );
    report_router(
        ReportServices {
            submissions: Arc::new(submissions),
            aggregator: Arc::new(ReportAggregator::new(store, directory)),
        },
        submission_body_limit,
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
