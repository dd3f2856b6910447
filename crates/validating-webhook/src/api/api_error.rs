use axum::{
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::errors::AdmissionReviewError;

#[derive(Debug)]
/// An error that can be returned by the API
/// and will be converted into a plain text response.
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl From<AdmissionReviewError> for ApiError {
    fn from(error: AdmissionReviewError) -> Self {
        let status = if error.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())],
            self.message,
        )
            .into_response()
    }
}
