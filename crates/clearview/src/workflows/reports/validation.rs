use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::IncidentType;

pub const MIN_DESCRIPTION_CHARS: usize = 10;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Raw report form fields as entered by the observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportForm {
    #[serde(rename = "type", default)]
    pub incident_type: String,
    #[serde(default)]
    pub description: String,
}

impl ReportForm {
    pub fn new(incident_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            incident_type: incident_type.into(),
            description: description.into(),
        }
    }

    pub fn validate(&self) -> Result<ValidatedForm, ValidationErrors> {
        validate(&self.incident_type, &self.description)
    }
}

/// Form input that passed every field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedForm {
    pub incident_type: IncidentType,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Type,
    Description,
}

/// Field-level rule violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Please select a pollution type")]
    MissingType,
    #[error("Description is required")]
    MissingDescription,
    #[error("Description must be at least {min} characters")]
    TooShort { min: usize },
    #[error("Description must be at most {max} characters")]
    TooLong { max: usize },
}

impl FieldError {
    pub const fn field(self) -> FormField {
        match self {
            FieldError::MissingType => FormField::Type,
            FieldError::MissingDescription
            | FieldError::TooShort { .. }
            | FieldError::TooLong { .. } => FormField::Description,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            FieldError::MissingType => "missing_type",
            FieldError::MissingDescription => "missing_description",
            FieldError::TooShort { .. } => "too_short",
            FieldError::TooLong { .. } => "too_long",
        }
    }
}

/// Every rule violation found in a form, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn contains(&self, error: FieldError) -> bool {
        self.errors.contains(&error)
    }

    pub fn views(&self) -> Vec<FieldErrorView> {
        self.errors
            .iter()
            .map(|error| FieldErrorView {
                field: error.field(),
                code: error.code(),
                message: error.to_string(),
            })
            .collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, Serialize)]
pub struct FieldErrorView {
    pub field: FormField,
    pub code: &'static str,
    pub message: String,
}

/// Check the form fields against the static rules, collecting every failure.
pub fn validate(incident_type: &str, description: &str) -> Result<ValidatedForm, ValidationErrors> {
    let mut errors = Vec::new();

    let parsed_type = IncidentType::from_label(incident_type);
    if parsed_type.is_none() {
        errors.push(FieldError::MissingType);
    }

    let length = description.chars().count();
    if description.is_empty() {
        errors.push(FieldError::MissingDescription);
    } else if length < MIN_DESCRIPTION_CHARS {
        errors.push(FieldError::TooShort {
            min: MIN_DESCRIPTION_CHARS,
        });
    } else if length > MAX_DESCRIPTION_CHARS {
        errors.push(FieldError::TooLong {
            max: MAX_DESCRIPTION_CHARS,
        });
    }

    match parsed_type {
        Some(incident_type) if errors.is_empty() => Ok(ValidatedForm {
            incident_type,
            description: description.to_string(),
        }),
        _ => Err(ValidationErrors { errors }),
    }
}
