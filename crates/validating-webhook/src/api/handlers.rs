use std::error::Error as StdError;

use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{Span, debug, error, warn};

use crate::{
    admission_review::{
        AdmissionRequest, AdmissionResponse, build_response_envelope, check_resource_type,
        decode_pod, decode_request, encode_response,
    },
    api::api_error::ApiError,
    errors::Result,
    policy,
};

#[tracing::instrument(
    name = "validation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        subresource=tracing::field::Empty,
        kind_group=tracing::field::Empty,
        kind_version=tracing::field::Empty,
        kind=tracing::field::Empty,
        resource_group=tracing::field::Empty,
        resource_version=tracing::field::Empty,
        resource=tracing::field::Empty,
        allowed=tracing::field::Empty,
        warnings=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Validate a Pod creation request sent by the Kubernetes API server.
///
/// Denials are still answered with `200 OK`: the decision travels inside of
/// the AdmissionReview.
pub async fn validate_handler(headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()));

    match validate(content_type.as_deref(), &body) {
        Ok(encoded) => (
            [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
            encoded,
        )
            .into_response(),
        Err(err) => {
            if err.is_client_error() {
                warn!({ error = &err as &dyn StdError }, "bad AdmissionReview request");
            } else {
                error!({ error = &err as &dyn StdError }, "cannot process AdmissionReview");
            }
            ApiError::from(err).into_response()
        }
    }
}

pub async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

fn validate(content_type: Option<&str>, body: &[u8]) -> Result<Vec<u8>> {
    let review = decode_request(body, content_type)?;
    debug!(admission_review = ?review);

    let request = review.admission_request()?;
    populate_span_with_admission_request_data(request);

    check_resource_type(request)?;
    let pod = decode_pod(request)?;
    let verdict = policy::evaluate(&pod);

    let response = build_response_envelope(&review, request, verdict);
    populate_span_with_policy_evaluation_results(&response.response);
    debug!(response = ?response, "policy evaluated");

    encode_response(&response)
}

fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    let span = Span::current();
    span.record("kind", adm_req.kind.kind.as_str());
    span.record("kind_group", adm_req.kind.group.as_str());
    span.record("kind_version", adm_req.kind.version.as_str());
    span.record("name", adm_req.name.as_deref().unwrap_or_default());
    span.record("namespace", adm_req.namespace.as_deref().unwrap_or_default());
    span.record("operation", adm_req.operation.as_str());
    span.record("request_uid", adm_req.uid.as_str());
    span.record("resource", adm_req.resource.resource.as_str());
    span.record("resource_group", adm_req.resource.group.as_str());
    span.record("resource_version", adm_req.resource.version.as_str());
    span.record(
        "subresource",
        adm_req.sub_resource.as_deref().unwrap_or_default(),
    );
}

fn populate_span_with_policy_evaluation_results(response: &AdmissionResponse) {
    let span = Span::current();
    span.record("allowed", response.allowed);
    span.record(
        "warnings",
        response.warnings.as_ref().map_or(0, |warnings| warnings.len()),
    );
    if let Some(message) = response
        .status
        .as_ref()
        .and_then(|status| status.message.as_deref())
    {
        span.record("response_message", message);
    }
}
