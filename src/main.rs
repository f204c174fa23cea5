use std::error::Error;

use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from a .env file when one is present.
    let _ = dotenvy::dotenv();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    // The LLM service brings its own formatting layer (timestamps, span
    // durations); everything else goes through the plain app layer.
    let app_logs = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(filter::filter_fn(|meta| {
            !meta.target().starts_with(llm_service::telemetry::TARGET_PREFIX)
        }));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(llm_service::telemetry::layer())
        .with(app_logs)
        .init();

    api::start().await?;

    Ok(())
}
