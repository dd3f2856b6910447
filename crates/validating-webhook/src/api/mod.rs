use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub mod api_error;
pub mod handlers;

use handlers::{readiness_handler, validate_handler};

pub const VALIDATE_PATH: &str = "/validate";
pub const READINESS_PATH: &str = "/readiness";

/// Largest AdmissionReview accepted on `POST /validate`. An UPDATE review
/// carries both `object` and `oldObject`, each up to the 3 MiB the API server
/// accepts for a single request.
pub const MAX_ADMISSION_REVIEW_SIZE: usize = 8 * 1024 * 1024;

pub fn router() -> Router {
    Router::new()
        .route(
            VALIDATE_PATH,
            post(validate_handler).layer(DefaultBodyLimit::max(MAX_ADMISSION_REVIEW_SIZE)),
        )
        .route(READINESS_PATH, get(readiness_handler))
        .layer(TraceLayer::new_for_http())
}
