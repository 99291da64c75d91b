use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a persisted report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub String);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the submitting user, or the anonymous sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub const ANONYMOUS: &'static str = "anonymous";

    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_string())
    }

    /// Normalise an optional caller identity; blank ids count as anonymous.
    pub fn from_optional(raw: Option<String>) -> Self {
        match raw {
            Some(id) if !id.trim().is_empty() => Self(id),
            _ => Self::anonymous(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == Self::ANONYMOUS
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed set of incident categories offered on the report form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentType {
    #[serde(rename = "Water Discharge")]
    WaterDischarge,
    #[serde(rename = "Air Emission")]
    AirEmission,
    #[serde(rename = "Waste Dumping")]
    WasteDumping,
    #[serde(rename = "Oil Spill")]
    OilSpill,
    #[serde(rename = "Chemical Leak")]
    ChemicalLeak,
    #[serde(rename = "Noise Pollution")]
    NoisePollution,
    #[serde(rename = "Deforestation")]
    Deforestation,
    #[serde(rename = "Illegal Mining")]
    IllegalMining,
    #[serde(rename = "Soil Contamination")]
    SoilContamination,
    #[serde(rename = "Other")]
    Other,
}

impl IncidentType {
    pub const ALL: [IncidentType; 10] = [
        IncidentType::WaterDischarge,
        IncidentType::AirEmission,
        IncidentType::WasteDumping,
        IncidentType::OilSpill,
        IncidentType::ChemicalLeak,
        IncidentType::NoisePollution,
        IncidentType::Deforestation,
        IncidentType::IllegalMining,
        IncidentType::SoilContamination,
        IncidentType::Other,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            IncidentType::WaterDischarge => "Water Discharge",
            IncidentType::AirEmission => "Air Emission",
            IncidentType::WasteDumping => "Waste Dumping",
            IncidentType::OilSpill => "Oil Spill",
            IncidentType::ChemicalLeak => "Chemical Leak",
            IncidentType::NoisePollution => "Noise Pollution",
            IncidentType::Deforestation => "Deforestation",
            IncidentType::IllegalMining => "Illegal Mining",
            IncidentType::SoilContamination => "Soil Contamination",
            IncidentType::Other => "Other",
        }
    }

    /// Exact match against the form labels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|incident_type| incident_type.label() == label)
    }
}

/// Moderation status of a report.
///
/// The pipeline only ever assigns `Pending` or `Approved`; `Resolved` is set by
/// moderators outside this crate and is read back by the aggregated views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Approved,
    Resolved,
}

impl ReportStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Approved => "approved",
            ReportStatus::Resolved => "resolved",
        }
    }
}

/// Raw coordinates attached to a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the geographic ranges accepted by the document store.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One ranked label emitted by the image classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "className")]
    pub label: String,
    #[serde(rename = "probability")]
    pub confidence: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Fully assembled report handed to the store; identity and timestamp are
/// assigned on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    pub incident_type: IncidentType,
    pub description: String,
    pub photo_url: String,
    pub location: GeoPoint,
    pub user_id: UserId,
    pub status: ReportStatus,
    pub auto_approved: bool,
    pub classification_results: Option<Vec<Prediction>>,
}

/// Persisted report document.
///
/// `location` and `created_at` are optional because documents written by other
/// clients, or read back before the server timestamp materialises, may lack them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub description: String,
    #[serde(default)]
    pub photo_url: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    pub user_id: UserId,
    #[serde(rename = "timestamp", default)]
    pub created_at: Option<DateTime<Utc>>,
    pub status: ReportStatus,
    #[serde(rename = "autoApproved", default)]
    pub auto_approved: bool,
    #[serde(rename = "classificationResults", default)]
    pub classification_results: Option<Vec<Prediction>>,
}

impl Report {
    pub fn from_new(id: ReportId, created_at: DateTime<Utc>, report: NewReport) -> Self {
        let NewReport {
            incident_type,
            description,
            photo_url,
            location,
            user_id,
            status,
            auto_approved,
            classification_results,
        } = report;

        Self {
            id,
            incident_type,
            description,
            photo_url,
            location: Some(location),
            user_id,
            created_at: Some(created_at),
            status,
            auto_approved,
            classification_results,
        }
    }

    pub fn has_photo(&self) -> bool {
        !self.photo_url.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Ngo,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Read-only view of a user record owned by the user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub role: UserRole,
    #[serde(default)]
    pub points: i64,
    #[serde(rename = "approvalStatus", default)]
    pub approval_status: Option<ApprovalStatus>,
}
