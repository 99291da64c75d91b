use std::sync::Arc;

use tracing::{debug, warn};

use super::domain::Prediction;
use super::moderation::PhotoEvidence;

/// Label fragments that mark an image as depicting pollution.
pub const POLLUTION_KEYWORDS: [&str; 5] = ["smoke", "waste", "pollution", "garbage", "trash"];

/// Image handed to the classifier: the hosted URL plus the original bytes.
#[derive(Debug, Clone, Copy)]
pub struct ImageRef<'a> {
    pub url: &'a str,
    pub bytes: &'a [u8],
}

/// External image classification model.
pub trait ImageClassifier: Send + Sync {
    fn classify(&self, image: ImageRef<'_>) -> Result<Vec<Prediction>, ClassifierError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("image classifier endpoint is not configured")]
    NotConfigured,
    #[error("classifier transport failed: {0}")]
    Transport(String),
    #[error("classifier rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("classifier response malformed: {0}")]
    MalformedResponse(String),
}

/// Result of running the classifier over an uploaded photo.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationOutcome {
    Classified {
        predictions: Vec<Prediction>,
        pollution: bool,
    },
    ClassificationFailed {
        reason: String,
    },
}

impl ClassificationOutcome {
    /// Fail-closed: a failed classification never signals pollution.
    pub fn pollution_detected(&self) -> bool {
        matches!(
            self,
            ClassificationOutcome::Classified {
                pollution: true,
                ..
            }
        )
    }

    pub fn evidence(&self) -> PhotoEvidence {
        if self.pollution_detected() {
            PhotoEvidence::Verified
        } else {
            PhotoEvidence::Unverified
        }
    }

    pub fn into_predictions(self) -> Option<Vec<Prediction>> {
        match self {
            ClassificationOutcome::Classified { predictions, .. } => Some(predictions),
            ClassificationOutcome::ClassificationFailed { .. } => None,
        }
    }
}

pub fn is_pollution_label(label: &str) -> bool {
    let lowered = label.to_lowercase();
    POLLUTION_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

pub fn detect_pollution(predictions: &[Prediction]) -> bool {
    predictions
        .iter()
        .any(|prediction| is_pollution_label(&prediction.label))
}

/// Wraps the external classifier and derives the pollution signal from its output.
pub struct ClassifierAdapter<C> {
    classifier: Arc<C>,
    top_k: Option<usize>,
}

impl<C> ClassifierAdapter<C>
where
    C: ImageClassifier,
{
    pub fn new(classifier: Arc<C>) -> Self {
        Self {
            classifier,
            top_k: None,
        }
    }

    /// Keep at most `top_k` predictions; `None` keeps the model's full list.
    pub fn with_top_k(mut self, top_k: Option<usize>) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn classify(&self, image: ImageRef<'_>) -> ClassificationOutcome {
        match self.classifier.classify(image) {
            Ok(predictions) => {
                let predictions = rank_predictions(predictions, self.top_k);
                let pollution = detect_pollution(&predictions);
                debug!(
                    url = image.url,
                    predictions = predictions.len(),
                    pollution,
                    "photo classified"
                );
                ClassificationOutcome::Classified {
                    predictions,
                    pollution,
                }
            }
            Err(err) => {
                warn!(url = image.url, error = %err, "photo classification failed");
                ClassificationOutcome::ClassificationFailed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// Order by confidence, highest first, keeping the model's order for ties.
fn rank_predictions(mut predictions: Vec<Prediction>, top_k: Option<usize>) -> Vec<Prediction> {
    predictions.sort_by(|left, right| right.confidence.total_cmp(&left.confidence));
    if let Some(limit) = top_k {
        predictions.truncate(limit);
    }
    predictions
}
