use chrono::{DateTime, Utc};
use clearview::error::AppError;
use clearview::workflows::reports::{
    DirectoryError, NewReport, Report, ReportId, ReportStatus, ReportStore, StoreError,
    UserDirectory, UserId, UserProfile,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

const ID_PREFIX: &str = "rep-";

fn sequence_of(id: &ReportId) -> Option<u64> {
    id.0.strip_prefix(ID_PREFIX)?.parse().ok()
}

#[derive(Default)]
struct StoreState {
    reports: Vec<Report>,
    sequence: u64,
    last_created: Option<DateTime<Utc>>,
}

/// Process-local report collection.
///
/// Ids are sequential, continue after the highest seeded `rep-` id, and are never
/// reissued. Creation timestamps never move backwards, even if the wall clock does.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReportStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryReportStore {
    pub(crate) fn with_reports(reports: Vec<Report>) -> Self {
        let last_created = reports.iter().filter_map(|report| report.created_at).max();
        let sequence = reports
            .iter()
            .filter_map(|report| sequence_of(&report.id))
            .max()
            .unwrap_or(0);
        let state = StoreState {
            sequence,
            reports,
            last_created,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> Result<T, StoreError> {
        let guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("report store lock poisoned".to_string()))?;
        Ok(f(&guard))
    }
}

impl ReportStore for InMemoryReportStore {
    fn create(&self, report: NewReport) -> Result<ReportId, StoreError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("report store lock poisoned".to_string()))?;

        let now = Utc::now();
        let created_at = match guard.last_created {
            Some(last) if last > now => last,
            _ => now,
        };
        let id = loop {
            guard.sequence += 1;
            let candidate = ReportId(format!("{}{:06}", ID_PREFIX, guard.sequence));
            if !guard.reports.iter().any(|existing| existing.id == candidate) {
                break candidate;
            }
        };

        guard.last_created = Some(created_at);
        guard
            .reports
            .push(Report::from_new(id.clone(), created_at, report));
        Ok(id)
    }

    fn query_by_status(&self, status: ReportStatus) -> Result<Vec<Report>, StoreError> {
        self.read(|state| {
            state
                .reports
                .iter()
                .filter(|report| report.status == status)
                .cloned()
                .collect()
        })
    }

    fn query_all(&self) -> Result<Vec<Report>, StoreError> {
        self.read(|state| state.reports.clone())
    }

    fn get_by_id(&self, id: &ReportId) -> Result<Report, StoreError> {
        self.read(|state| state.reports.iter().find(|report| &report.id == id).cloned())?
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryUserDirectory {
    pub(crate) fn with_users(users: Vec<UserProfile>) -> Self {
        let users = users
            .into_iter()
            .map(|profile| (profile.id.clone(), profile))
            .collect();
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn get_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, DirectoryError> {
        let guard = self
            .users
            .read()
            .map_err(|_| DirectoryError::Unavailable("user directory lock poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }
}

/// Read a JSON array of exported report documents.
pub(crate) fn load_reports(path: &Path) -> Result<Vec<Report>, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Read a JSON array of exported user records.
pub(crate) fn load_users(path: &Path) -> Result<Vec<UserProfile>, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
