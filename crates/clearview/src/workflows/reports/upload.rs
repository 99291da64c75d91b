use serde::{Deserialize, Serialize};

/// Photo bytes selected by the observer, prior to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Durable location of an uploaded photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedPhoto {
    pub url: String,
}

/// Image hosting boundary. Implementations perform at most one upload per call.
pub trait PhotoUploader: Send + Sync {
    fn upload(&self, photo: &PhotoUpload) -> Result<UploadedPhoto, UploadError>;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("photo upload endpoint is not configured")]
    NotConfigured,
    #[error("photo is empty")]
    EmptyPayload,
    #[error("upload transport failed: {0}")]
    Transport(String),
    #[error("upload rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("upload response malformed: {0}")]
    MalformedResponse(String),
}
