//! Blocking HTTP adapters for the image hosting and classification services.

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use super::classifier::{ClassifierError, ImageClassifier, ImageRef};
use super::domain::Prediction;
use super::upload::{PhotoUpload, PhotoUploader, UploadError, UploadedPhoto};
use crate::config::IntegrationConfig;

const USER_AGENT_VALUE: &str = concat!("clearview/", env!("CARGO_PKG_VERSION"));

fn build_client(config: &IntegrationConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.http_timeout)
        .user_agent(USER_AGENT_VALUE)
        .build()
}

/// Uploads photos as multipart forms tagged with the configured preset.
pub struct HttpPhotoUploader {
    client: Client,
    endpoint: Option<String>,
    preset: String,
}

impl HttpPhotoUploader {
    pub fn new(config: &IntegrationConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(config)?,
            endpoint: config.upload_url.clone(),
            preset: config.upload_preset.clone(),
        })
    }
}

impl PhotoUploader for HttpPhotoUploader {
    fn upload(&self, photo: &PhotoUpload) -> Result<UploadedPhoto, UploadError> {
        let endpoint = self.endpoint.as_deref().ok_or(UploadError::NotConfigured)?;
        if photo.bytes.is_empty() {
            return Err(UploadError::EmptyPayload);
        }

        let part = Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone())
            .mime_str(&photo.content_type)
            .map_err(|err| UploadError::Transport(err.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.preset.clone());

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .map_err(|err| UploadError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| UploadError::Transport(err.to_string()))?;

        parse_upload_response(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponseBody {
    secure_url: Option<String>,
    error: Option<ServiceErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    message: String,
}

pub(crate) fn parse_upload_response(status: u16, body: &str) -> Result<UploadedPhoto, UploadError> {
    let parsed: Result<UploadResponseBody, _> = serde_json::from_str(body);

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .and_then(|body| body.error)
            .map(|error| error.message)
            .unwrap_or_else(|| "upload failed".to_string());
        return Err(UploadError::Rejected { status, message });
    }

    let parsed = parsed.map_err(|err| UploadError::MalformedResponse(err.to_string()))?;
    match parsed.secure_url {
        Some(url) if !url.is_empty() => Ok(UploadedPhoto { url }),
        _ => Err(UploadError::MalformedResponse(
            "response did not include secure_url".to_string(),
        )),
    }
}

/// Sends the hosted image URL to a classification endpoint.
pub struct HttpImageClassifier {
    client: Client,
    endpoint: Option<String>,
}

impl HttpImageClassifier {
    pub fn new(config: &IntegrationConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(config)?,
            endpoint: config.classifier_url.clone(),
        })
    }
}

impl ImageClassifier for HttpImageClassifier {
    fn classify(&self, image: ImageRef<'_>) -> Result<Vec<Prediction>, ClassifierError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(ClassifierError::NotConfigured)?;

        let response = self
            .client
            .post(endpoint)
            .json(&json!({ "image_url": image.url }))
            .send()
            .map_err(|err| ClassifierError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| ClassifierError::Transport(err.to_string()))?;

        parse_predictions(status, &body)
    }
}

pub(crate) fn parse_predictions(status: u16, body: &str) -> Result<Vec<Prediction>, ClassifierError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<UploadResponseBody>(body)
            .ok()
            .and_then(|body| body.error)
            .map(|error| error.message)
            .unwrap_or_else(|| body.trim().to_string());
        return Err(ClassifierError::Rejected { status, message });
    }

    serde_json::from_str(body).map_err(|err| ClassifierError::MalformedResponse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_response_yields_secure_url() {
        let body = r#"{"secure_url":"https://img.example.test/v1/smoke.jpg","bytes":1024}"#;
        let uploaded = parse_upload_response(200, body).expect("upload parses");
        assert_eq!(uploaded.url, "https://img.example.test/v1/smoke.jpg");
    }

    #[test]
    fn upload_rejection_surfaces_service_message() {
        let body = r#"{"error":{"message":"Upload preset not found"}}"#;
        match parse_upload_response(400, body) {
            Err(UploadError::Rejected { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Upload preset not found");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn upload_without_url_is_malformed() {
        assert!(matches!(
            parse_upload_response(200, "{}"),
            Err(UploadError::MalformedResponse(_))
        ));
    }

    #[test]
    fn predictions_parse_model_output() {
        let body = r#"[{"className":"smokestack, chimney","probability":0.91},{"className":"volcano","probability":0.04}]"#;
        let predictions = parse_predictions(200, body).expect("predictions parse");
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].label, "smokestack, chimney");
        assert!((predictions[0].confidence - 0.91).abs() < f64::EPSILON);
    }

    #[test]
    fn classifier_errors_keep_status() {
        match parse_predictions(503, "model loading") {
            Err(ClassifierError::Rejected { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "model loading");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn unconfigured_uploader_refuses_before_network() {
        let uploader =
            HttpPhotoUploader::new(&IntegrationConfig::default()).expect("client builds");
        let photo = PhotoUpload {
            file_name: "spill.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        };
        assert!(matches!(
            uploader.upload(&photo),
            Err(UploadError::NotConfigured)
        ));
    }
}
