use anyhow::Result;
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tempo_dsp::server::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    info!("Configuration:");
    info!("  bind: {}", config.bind_address());
    info!("  max upload: {} MiB", config.max_upload_mb);
    info!(
        "  analysis: {:.1}s at {} Hz",
        config.max_analysis_seconds, config.analysis_sample_rate
    );
    if config.cors_origins.is_empty() {
        info!("  CORS: any origin");
    } else {
        info!("  CORS: {}", config.cors_origins.join(", "));
    }

    run_server(config).await
}
