use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::aggregation::ReportAggregator;
use super::classifier::ImageClassifier;
use super::domain::{GeoPoint, ReportId, ReportStatus, UserId};
use super::repository::{ReportStore, StoreError, UserDirectory};
use super::submission::{ReportSubmissionService, SubmissionError, SubmissionRequest};
use super::upload::{PhotoUpload, PhotoUploader};
use super::validation::ReportForm;

/// Shared handles used by the report endpoints.
pub struct ReportServices<S, D, U, C> {
    pub submissions: Arc<ReportSubmissionService<S, D, U, C>>,
    pub aggregator: Arc<ReportAggregator<S, D>>,
}

impl<S, D, U, C> Clone for ReportServices<S, D, U, C> {
    fn clone(&self) -> Self {
        Self {
            submissions: Arc::clone(&self.submissions),
            aggregator: Arc::clone(&self.aggregator),
        }
    }
}

/// JSON body accepted by the submission endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReportRequest {
    #[serde(flatten)]
    pub form: ReportForm,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub photo: Option<PhotoPayload>,
}

/// Photo attached to a submission, base64 encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoPayload {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<ReportStatus>,
}

/// Router builder exposing the submission, moderation queue and map endpoints.
///
/// `submission_body_limit` caps the JSON body of `POST /api/v1/reports`, which carries the
/// photo as base64.
pub fn report_router<S, D, U, C>(
    services: ReportServices<S, D, U, C>,
    submission_body_limit: usize,
) -> Router
where
    S: ReportStore + 'static,
    D: UserDirectory + 'static,
    U: PhotoUploader + 'static,
    C: ImageClassifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/reports",
            get(list_handler::<S, D, U, C>)
                .post(submit_handler::<S, D, U, C>)
                .layer(DefaultBodyLimit::max(submission_body_limit)),
        )
        .route("/api/v1/reports/public", get(public_handler::<S, D, U, C>))
        .route("/api/v1/reports/pending", get(pending_handler::<S, D, U, C>))
        .route("/api/v1/reports/:report_id", get(report_handler::<S, D, U, C>))
        .route(
            "/api/v1/users/:user_id/reports",
            get(user_reports_handler::<S, D, U, C>),
        )
        .route("/api/v1/leaderboard", get(leaderboard_handler::<S, D, U, C>))
        .with_state(services)
}

impl SubmitReportRequest {
    fn into_submission(self) -> Result<SubmissionRequest, Response> {
        let photo = match self.photo {
            Some(payload) => {
                let bytes = STANDARD.decode(payload.data.trim()).map_err(|err| {
                    let body = json!({ "error": format!("photo data is not valid base64: {err}") });
                    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(body)).into_response()
                })?;
                Some(PhotoUpload {
                    file_name: payload.file_name,
                    content_type: payload.content_type,
                    bytes,
                })
            }
            None => None,
        };

        let location = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint::new(latitude, longitude)),
            _ => None,
        };

        Ok(SubmissionRequest {
            form: self.form,
            photo,
            location,
            user_id: UserId::from_optional(self.user_id),
        })
    }
}

pub(crate) async fn submit_handler<S, D, U, C>(
    State(services): State<ReportServices<S, D, U, C>>,
    axum::Json(request): axum::Json<SubmitReportRequest>,
) -> Response
where
    S: ReportStore + 'static,
    D: UserDirectory + 'static,
    U: PhotoUploader + 'static,
    C: ImageClassifier + 'static,
{
    let submission = match request.into_submission() {
        Ok(submission) => submission,
        Err(response) => return response,
    };

    let service = Arc::clone(&services.submissions);
    let result = match tokio::task::spawn_blocking(move || service.submit(submission)).await {
        Ok(result) => result,
        Err(err) => return worker_failure(err),
    };

    match result {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(err) => submission_error_response(err),
    }
}

pub(crate) fn submission_error_response(err: SubmissionError) -> Response {
    let (status, payload) = match &err {
        SubmissionError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": "report form invalid", "fields": errors.views() }),
        ),
        SubmissionError::LocationRequired | SubmissionError::InvalidLocation { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": err.to_string() }),
        ),
        SubmissionError::SubmitterForbidden => {
            (StatusCode::FORBIDDEN, json!({ "error": err.to_string() }))
        }
        SubmissionError::PhotoUploadFailed(_) => {
            (StatusCode::BAD_GATEWAY, json!({ "error": err.to_string() }))
        }
        SubmissionError::Persistence(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": err.to_string() }),
        ),
    };

    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn list_handler<S, D, U, C>(
    State(services): State<ReportServices<S, D, U, C>>,
    Query(query): Query<StatusQuery>,
) -> Response
where
    S: ReportStore + 'static,
    D: UserDirectory + 'static,
    U: PhotoUploader + 'static,
    C: ImageClassifier + 'static,
{
    let aggregator = Arc::clone(&services.aggregator);
    read_json(move || match query.status {
        Some(status) => aggregator.list_by_status(status),
        None => aggregator.list_all(),
    })
    .await
}

pub(crate) async fn public_handler<S, D, U, C>(
    State(services): State<ReportServices<S, D, U, C>>,
) -> Response
where
    S: ReportStore + 'static,
    D: UserDirectory + 'static,
    U: PhotoUploader + 'static,
    C: ImageClassifier + 'static,
{
    let aggregator = Arc::clone(&services.aggregator);
    read_json(move || aggregator.list_public()).await
}

pub(crate) async fn pending_handler<S, D, U, C>(
    State(services): State<ReportServices<S, D, U, C>>,
) -> Response
where
    S: ReportStore + 'static,
    D: UserDirectory + 'static,
    U: PhotoUploader + 'static,
    C: ImageClassifier + 'static,
{
    let aggregator = Arc::clone(&services.aggregator);
    read_json(move || aggregator.pending_reports()).await
}

pub(crate) async fn user_reports_handler<S, D, U, C>(
    State(services): State<ReportServices<S, D, U, C>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: ReportStore + 'static,
    D: UserDirectory + 'static,
    U: PhotoUploader + 'static,
    C: ImageClassifier + 'static,
{
    let aggregator = Arc::clone(&services.aggregator);
    let user_id = UserId(user_id);
    read_json(move || aggregator.list_by_user(&user_id)).await
}

pub(crate) async fn leaderboard_handler<S, D, U, C>(
    State(services): State<ReportServices<S, D, U, C>>,
) -> Response
where
    S: ReportStore + 'static,
    D: UserDirectory + 'static,
    U: PhotoUploader + 'static,
    C: ImageClassifier + 'static,
{
    let aggregator = Arc::clone(&services.aggregator);
    read_json(move || aggregator.compute_leaderboard()).await
}

pub(crate) async fn report_handler<S, D, U, C>(
    State(services): State<ReportServices<S, D, U, C>>,
    Path(report_id): Path<String>,
) -> Response
where
    S: ReportStore + 'static,
    D: UserDirectory + 'static,
    U: PhotoUploader + 'static,
    C: ImageClassifier + 'static,
{
    let aggregator = Arc::clone(&services.aggregator);
    let id = ReportId(report_id);
    let result = tokio::task::spawn_blocking(move || aggregator.report(&id)).await;

    match result {
        Ok(Ok(view)) => (StatusCode::OK, axum::Json(view)).into_response(),
        Ok(Err(StoreError::NotFound(id))) => {
            let payload = json!({ "error": format!("report {id} not found") });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Ok(Err(err)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(err) => worker_failure(err),
    }
}

/// Run a store read on the blocking pool and serialise its result.
async fn read_json<T, F>(read: F) -> Response
where
    F: FnOnce() -> T + Send + 'static,
    T: serde::Serialize + Send + 'static,
{
    match tokio::task::spawn_blocking(read).await {
        Ok(body) => (StatusCode::OK, axum::Json(body)).into_response(),
        Err(err) => worker_failure(err),
    }
}

fn worker_failure(err: tokio::task::JoinError) -> Response {
    error!(error = %err, "report worker task failed");
    let payload = json!({ "error": "internal error" });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
