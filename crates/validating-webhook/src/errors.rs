use thiserror::Error;

use crate::admission_review::GroupVersionResource;

pub type Result<T> = std::result::Result<T, AdmissionReviewError>;

#[derive(Debug, Error)]
pub enum AdmissionReviewError {
    #[error("expected application/json content-type, got {}", .0.as_deref().unwrap_or("none"))]
    UnsupportedMediaType(Option<String>),

    #[error("cannot decode AdmissionReview: {0}")]
    DecodeEnvelope(#[source] serde_json::Error),

    #[error("unsupported envelope {api_version}, Kind={kind}")]
    UnsupportedEnvelope { api_version: String, kind: String },

    #[error("no Request object defined inside AdmissionReview object")]
    MissingRequest,

    #[error("did not receive pod, got {got}")]
    TypeMismatch { got: GroupVersionResource },

    #[error("no object defined inside AdmissionRequest")]
    MissingObject,

    #[error("error decoding raw pod: {0}")]
    DecodeObject(#[source] serde_json::Error),

    #[error("error marshalling response json: {0}")]
    Encode(#[source] serde_json::Error),
}

impl AdmissionReviewError {
    /// Errors caused by what the caller sent, as opposed to failures that
    /// happen once the envelope has been accepted.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AdmissionReviewError::UnsupportedMediaType(_)
                | AdmissionReviewError::DecodeEnvelope(_)
                | AdmissionReviewError::UnsupportedEnvelope { .. }
                | AdmissionReviewError::MissingRequest
                | AdmissionReviewError::TypeMismatch { .. }
        )
    }
}
