use serde::Serialize;

use super::domain::ReportStatus;

/// What the submitted photo (if any) established about the incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoEvidence {
    Absent,
    Unverified,
    Verified,
}

/// Initial moderation state assigned to a new report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDecision {
    pub status: ReportStatus,
    pub auto_approved: bool,
}

impl StatusDecision {
    pub fn summary(&self) -> &'static str {
        if self.auto_approved {
            "Your report has been auto-approved and will appear on the map immediately."
        } else {
            "Your report is pending review and will appear on the map after approval."
        }
    }
}

/// Only a verified photo earns auto-approval; everything else waits for a moderator.
pub fn decide_status(evidence: PhotoEvidence) -> StatusDecision {
    match evidence {
        PhotoEvidence::Verified => StatusDecision {
            status: ReportStatus::Approved,
            auto_approved: true,
        },
        PhotoEvidence::Absent | PhotoEvidence::Unverified => StatusDecision {
            status: ReportStatus::Pending,
            auto_approved: false,
        },
    }
}
