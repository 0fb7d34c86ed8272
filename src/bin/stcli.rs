//! Storage subnet operator CLI entrypoint.

use bittensor_db::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep CLI output clean; only warnings from the library surface.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    cli::run().await
}
