use std::fmt;

use k8s_openapi::api::{authentication::v1::UserInfo, core::v1::Pod};
use mime::APPLICATION_JSON;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::errors::{AdmissionReviewError, Result};
use crate::policy::Verdict;

pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

/// Envelope versions accepted by the webhook. Both share the same layout for
/// every field read or written here.
pub const SUPPORTED_API_VERSIONS: [&str; 2] =
    ["admission.k8s.io/v1", "admission.k8s.io/v1beta1"];

const POD_GROUP: &str = "";
const POD_VERSION: &str = "v1";
const POD_RESOURCE: &str = "pods";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn pods() -> Self {
        GroupVersionResource {
            group: POD_GROUP.to_owned(),
            version: POD_VERSION.to_owned(),
            resource: POD_RESOURCE.to_owned(),
        }
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}, Resource={}", self.version, self.resource)
        } else {
            write!(
                f,
                "{}/{}, Resource={}",
                self.group, self.version, self.resource
            )
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    pub api_version: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
}

impl AdmissionReviewRequest {
    /// The request member, which `decode_request` guarantees to be present.
    pub fn admission_request(&self) -> Result<&AdmissionRequest> {
        self.request
            .as_ref()
            .ok_or(AdmissionReviewError::MissingRequest)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    #[serde(default)]
    pub kind: GroupVersionKind,
    pub resource: GroupVersionResource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
    /// The object under review, kept undecoded until the resource type has
    /// been checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<Box<RawValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_object: Option<Box<RawValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    pub api_version: String,
    pub kind: String,
    pub response: AdmissionResponse,
}

/// This models the admission/v1/AdmissionResponse object of Kubernetes,
/// restricted to the fields a validating webhook fills.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// Copied over from the corresponding AdmissionRequest.
    pub uid: String,

    pub allowed: bool,

    /// Why the request was denied. Not consulted by the API server when
    /// `allowed` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,

    /// Warning messages returned to the requesting API client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionResponseStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Parses the body of an admission webhook call.
///
/// The body is only looked at when `content_type` is exactly
/// `application/json`.
pub fn decode_request(body: &[u8], content_type: Option<&str>) -> Result<AdmissionReviewRequest> {
    if content_type != Some(APPLICATION_JSON.essence_str()) {
        return Err(AdmissionReviewError::UnsupportedMediaType(
            content_type.map(str::to_owned),
        ));
    }

    let review: AdmissionReviewRequest =
        serde_json::from_slice(body).map_err(AdmissionReviewError::DecodeEnvelope)?;

    if review.kind != ADMISSION_REVIEW_KIND
        || !SUPPORTED_API_VERSIONS.contains(&review.api_version.as_str())
    {
        return Err(AdmissionReviewError::UnsupportedEnvelope {
            api_version: review.api_version,
            kind: review.kind,
        });
    }
    if review.request.is_none() {
        return Err(AdmissionReviewError::MissingRequest);
    }

    Ok(review)
}

pub fn check_resource_type(request: &AdmissionRequest) -> Result<()> {
    if request.resource == GroupVersionResource::pods() {
        Ok(())
    } else {
        Err(AdmissionReviewError::TypeMismatch {
            got: request.resource.clone(),
        })
    }
}

pub fn decode_embedded_object(raw: &RawValue) -> Result<Pod> {
    serde_json::from_str(raw.get()).map_err(AdmissionReviewError::DecodeObject)
}

/// Decodes the Pod carried by `request`, failing when the request has none.
pub fn decode_pod(request: &AdmissionRequest) -> Result<Pod> {
    let raw = request
        .object
        .as_deref()
        .ok_or(AdmissionReviewError::MissingObject)?;
    decode_embedded_object(raw)
}

/// Wraps `verdict` into an envelope of the same apiVersion and kind as
/// `review`, correlated with `request` through its uid.
pub fn build_response_envelope(
    review: &AdmissionReviewRequest,
    request: &AdmissionRequest,
    verdict: Verdict,
) -> AdmissionReviewResponse {
    let Verdict {
        allowed,
        message,
        warnings,
    } = verdict;

    AdmissionReviewResponse {
        api_version: review.api_version.clone(),
        kind: review.kind.clone(),
        response: AdmissionResponse {
            uid: request.uid.clone(),
            allowed,
            status: message.map(|message| AdmissionResponseStatus {
                message: Some(message),
            }),
            warnings: if warnings.is_empty() {
                None
            } else {
                Some(warnings)
            },
        },
    }
}

pub fn encode_response(review: &AdmissionReviewResponse) -> Result<Vec<u8>> {
    serde_json::to_vec(review).map_err(AdmissionReviewError::Encode)
}
