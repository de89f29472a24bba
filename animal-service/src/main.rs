use animal_service::config::AnimalConfig;
use animal_service::services::init_metrics;
use animal_service::Application;
use service_core::observability::{init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AnimalConfig::load()?;

    init_tracing(
        "animal-service",
        &config.common.log_level,
        config.common.otel_exporter_otlp_endpoint.as_deref(),
    );

    if let Err(e) = init_metrics() {
        tracing::warn!("Metrics recorder unavailable: {}", e);
    }

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    shutdown_tracing();
    Ok(())
}
