use crate::cli::ServeArgs;
use crate::infra::{load_reports, load_users, AppState, InMemoryReportStore, InMemoryUserDirectory};
use crate::routes::with_report_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use clearview::config::{AppConfig, IntegrationConfig};
use clearview::error::AppError;
use clearview::telemetry;
use clearview::workflows::reports::{
    HttpImageClassifier, HttpPhotoUploader, ReportAggregator, ReportServices,
    ReportSubmissionService,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

type ProductionServices =
    ReportServices<InMemoryReportStore, InMemoryUserDirectory, HttpPhotoUploader, HttpImageClassifier>;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = match args.reports.take() {
        Some(path) => {
            let reports = load_reports(&path)?;
            info!(count = reports.len(), path = %path.display(), "seeded report store");
            InMemoryReportStore::with_reports(reports)
        }
        None => InMemoryReportStore::default(),
    };
    let directory = match args.users.take() {
        Some(path) => {
            let users = load_users(&path)?;
            info!(count = users.len(), path = %path.display(), "seeded user directory");
            InMemoryUserDirectory::with_users(users)
        }
        None => InMemoryUserDirectory::default(),
    };

    if config.integrations.upload_url.is_none() {
        warn!("CLEARVIEW_UPLOAD_URL not set; submissions with photos will be rejected");
    }
    if config.integrations.classifier_url.is_none() {
        warn!("CLEARVIEW_CLASSIFIER_URL not set; photo reports will wait for manual review");
    }

    // Blocking HTTP clients must be constructed off the async worker threads.
    let integrations = config.integrations.clone();
    let services = tokio::task::spawn_blocking(move || build_services(store, directory, &integrations))
        .await
        .map_err(|err| AppError::Io(std::io::Error::other(err)))??;

    let app = with_report_routes(services, config.integrations.max_submission_bytes)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "clear view report service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_services(
    store: InMemoryReportStore,
    directory: InMemoryUserDirectory,
    integrations: &IntegrationConfig,
) -> Result<ProductionServices, AppError> {
    let store = Arc::new(store);
    let directory = Arc::new(directory);
    let uploader = Arc::new(HttpPhotoUploader::new(integrations)?);
    let classifier = Arc::new(HttpImageClassifier::new(integrations)?);

    let submissions = ReportSubmissionService::new(store.clone(), directory.clone(), uploader, classifier)
        .with_top_k(integrations.classifier_top_k);

    Ok(ReportServices {
        submissions: Arc::new(submissions),
        aggregator: Arc::new(ReportAggregator::new(store, directory)),
    })
}
