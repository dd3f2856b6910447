//! Kubernetes validating admission webhook for Pods.
//!
//! The server exposes `POST /validate`, decodes the incoming `AdmissionReview`,
//! evaluates the embedded Pod against the label policy and answers with an
//! `AdmissionReview` carrying the verdict.

pub mod admission_review;
pub mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod errors;
pub mod policy;
pub mod tracing;

use std::{net::SocketAddr, time::Duration};

use ::tracing::info;
use anyhow::{Context, Result};
use axum::Router;
use axum_server::{Handle, tls_rustls::RustlsConfig};

use crate::config::Config;

/// How long in-flight admission reviews are given to complete once a
/// shutdown has been requested.
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

pub struct WebhookServer {
    router: Router,
    addr: SocketAddr,
    tls_config: RustlsConfig,
    handle: Handle,
}

impl WebhookServer {
    /// Loads the TLS identity referenced by `config` and builds the HTTP router.
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let tls_config = certs::create_tls_config(&config.tls_config)
            .await
            .with_context(|| {
                format!(
                    "cannot load TLS identity from {} and {}",
                    config.tls_config.cert_file.display(),
                    config.tls_config.key_file.display()
                )
            })?;

        Ok(Self {
            router: api::router(),
            addr: config.addr,
            tls_config,
            handle: Handle::new(),
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle used to observe the listening address and to trigger a
    /// graceful shutdown of a running server.
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    pub async fn run(self) -> Result<()> {
        info!(address = %self.addr, "started HTTPS server");

        axum_server::bind_rustls(self.addr, self.tls_config)
            .handle(self.handle)
            .serve(self.router.into_make_service())
            .await
            .context("HTTPS server error")?;

        info!("HTTPS server stopped");
        Ok(())
    }
}

/// Waits for Ctrl-C or SIGTERM, then asks the server behind `handle` to stop
/// accepting connections and drain the in-flight ones.
pub async fn shutdown_on_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            ::tracing::error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                ::tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(
        grace_period_seconds = SHUTDOWN_GRACE_PERIOD.as_secs(),
        "shutdown requested"
    );
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}
