use anyhow::Result;
use tracing::info;

use validating_webhook::{WebhookServer, cli, config::Config, shutdown_on_signal};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    validating_webhook::tracing::setup_tracing(
        &config.log_level,
        &config.log_fmt,
        config.log_no_color,
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting validating webhook"
    );

    let server = WebhookServer::new_from_config(config).await?;
    tokio::spawn(shutdown_on_signal(server.handle()));

    server.run().await
}
