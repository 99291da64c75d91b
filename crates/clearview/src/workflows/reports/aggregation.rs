use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};

use super::domain::{
    IncidentType, Prediction, Report, ReportId, ReportStatus, UserId,
};
use super::repository::{ReportStore, StoreError, UserDirectory};

/// Map-ready projection of a stored report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub id: ReportId,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub description: String,
    pub photo_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub user_id: UserId,
    pub status: ReportStatus,
    pub auto_approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_results: Option<Vec<Prediction>>,
    pub timestamp: DateTime<Utc>,
}

impl ReportView {
    /// Missing coordinates flatten to 0 and a missing timestamp to `now`.
    pub fn from_report(report: Report, now: DateTime<Utc>) -> Self {
        let (latitude, longitude) = report
            .location
            .map(|point| (point.latitude, point.longitude))
            .unwrap_or((0.0, 0.0));

        Self {
            id: report.id,
            incident_type: report.incident_type,
            description: report.description,
            photo_url: report.photo_url,
            latitude,
            longitude,
            user_id: report.user_id,
            status: report.status,
            auto_approved: report.auto_approved,
            classification_results: report.classification_results,
            timestamp: report.created_at.unwrap_or(now),
        }
    }
}

/// Contributor standing derived from approved reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub name: String,
    pub points: i64,
    pub approved_report_count: usize,
}

/// Read-side projections over the report collection.
///
/// Reads are best effort: store failures are logged and yield empty results.
pub struct ReportAggregator<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
}

impl<S, D> ReportAggregator<S, D>
where
    S: ReportStore + 'static,
    D: UserDirectory + 'static,
{
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self { store, directory }
    }

    pub fn compute_leaderboard(&self) -> Vec<LeaderboardEntry> {
        let reports = match self.store.query_all() {
            Ok(reports) => reports,
            Err(err) => {
                error!(error = %err, "failed to read reports for leaderboard");
                return Vec::new();
            }
        };

        let mut leaderboard = Vec::new();
        for (user_id, approved_report_count) in count_approved_by_user(&reports) {
            match self.directory.get_by_id(&user_id) {
                Ok(Some(profile)) => leaderboard.push(LeaderboardEntry {
                    user_id,
                    name: profile.name,
                    points: profile.points,
                    approved_report_count,
                }),
                Ok(None) => warn!(user_id = %user_id, "leaderboard user missing from directory"),
                Err(err) => {
                    warn!(user_id = %user_id, error = %err, "leaderboard user lookup failed")
                }
            }
        }

        // stable: equal points keep first-appearance order
        leaderboard.sort_by(|left, right| right.points.cmp(&left.points));
        leaderboard
    }

    pub fn list_by_status(&self, status: ReportStatus) -> Vec<ReportView> {
        let reports = self.store.query_by_status(status);
        project(reports, status.label())
    }

    /// Reports visible on the public map.
    ///
    /// Pending reports are included alongside approved and resolved ones.
    pub fn list_public(&self) -> Vec<ReportView> {
        let mut views = project(self.store.query_all(), "public");
        views.retain(|view| {
            matches!(
                view.status,
                ReportStatus::Approved | ReportStatus::Resolved | ReportStatus::Pending
            ) || view.auto_approved
        });
        views
    }

    pub fn list_all(&self) -> Vec<ReportView> {
        project(self.store.query_all(), "all")
    }

    /// Queue of reports awaiting a moderator.
    pub fn pending_reports(&self) -> Vec<ReportView> {
        self.list_by_status(ReportStatus::Pending)
    }

    pub fn list_by_user(&self, user_id: &UserId) -> Vec<ReportView> {
        let mut views = project(self.store.query_all(), "by user");
        views.retain(|view| &view.user_id == user_id);
        views
    }

    pub fn report(&self, id: &ReportId) -> Result<ReportView, StoreError> {
        let report = self.store.get_by_id(id)?;
        Ok(ReportView::from_report(report, Utc::now()))
    }
}

/// Approved-report counts per identified user, in order of first appearance.
pub fn count_approved_by_user(reports: &[Report]) -> Vec<(UserId, usize)> {
    let mut counts: Vec<(UserId, usize)> = Vec::new();
    let mut positions: HashMap<&UserId, usize> = HashMap::new();

    for report in reports {
        if report.status != ReportStatus::Approved
            || report.user_id.is_anonymous()
            || report.user_id.0.is_empty()
        {
            continue;
        }

        match positions.get(&report.user_id) {
            Some(&index) => counts[index].1 += 1,
            None => {
                positions.insert(&report.user_id, counts.len());
                counts.push((report.user_id.clone(), 1));
            }
        }
    }

    counts
}

fn project(reports: Result<Vec<Report>, StoreError>, scope: &str) -> Vec<ReportView> {
    match reports {
        Ok(reports) => {
            let now = Utc::now();
            reports
                .into_iter()
                .map(|report| ReportView::from_report(report, now))
                .collect()
        }
        Err(err) => {
            error!(scope, error = %err, "failed to fetch reports");
            Vec::new()
        }
    }
}
