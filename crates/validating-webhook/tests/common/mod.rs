use std::net::SocketAddr;

use axum::Router;
use rcgen::{CertifiedKey, generate_simple_self_signed};
use serde_json::{Value, json};
use tempfile::TempDir;
use validating_webhook::{
    WebhookServer,
    config::{Config, TlsConfig},
};

pub(crate) const REQUEST_UID: &str = "705ab4f5-6393-11e8-b7cc-42010a800002";

/// Writes a self signed certificate for `localhost` into a fresh directory.
/// The directory is removed when the returned `TempDir` is dropped.
pub(crate) fn tls_identity() -> (TempDir, TlsConfig) {
    let CertifiedKey { cert, key_pair } =
        generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();

    let certs_dir = tempfile::tempdir().unwrap();
    let cert_file = certs_dir.path().join("tls.crt");
    let key_file = certs_dir.path().join("tls.key");
    std::fs::write(&cert_file, cert.pem()).unwrap();
    std::fs::write(&key_file, key_pair.serialize_pem()).unwrap();

    (
        certs_dir,
        TlsConfig {
            cert_file,
            key_file,
        },
    )
}

pub(crate) fn default_test_config(tls_config: TlsConfig) -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        tls_config,
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) async fn app() -> Router {
    let (_certs_dir, tls_config) = tls_identity();
    let server = WebhookServer::new_from_config(default_test_config(tls_config))
        .await
        .unwrap();

    server.router()
}

pub(crate) fn pods_resource() -> Value {
    json!({"group": "", "version": "v1", "resource": "pods"})
}

pub(crate) fn pod(labels: Option<Value>) -> Value {
    let mut metadata = json!({
        "name": "nginx",
        "namespace": "default"
    });
    if let Some(labels) = labels {
        metadata["labels"] = labels;
    }

    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": metadata,
        "spec": {
            "containers": [{"name": "nginx", "image": "nginx:1.27"}]
        }
    })
}

pub(crate) fn admission_review(
    api_version: &str,
    resource: Value,
    object: Option<Value>,
) -> Value {
    let mut request = json!({
        "uid": REQUEST_UID,
        "kind": {"group": "", "version": "v1", "kind": "Pod"},
        "resource": resource,
        "name": "nginx",
        "namespace": "default",
        "operation": "CREATE",
        "userInfo": {
            "username": "kubernetes-admin",
            "groups": ["system:masters", "system:authenticated"]
        },
        "dryRun": false
    });
    if let Some(object) = object {
        request["object"] = object;
    }

    json!({
        "apiVersion": api_version,
        "kind": "AdmissionReview",
        "request": request
    })
}

pub(crate) fn pod_admission_review(labels: Option<Value>) -> Value {
    admission_review("admission.k8s.io/v1", pods_resource(), Some(pod(labels)))
}
