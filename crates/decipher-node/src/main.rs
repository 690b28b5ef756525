//! Decipher node binary.

use decipher_node::{run_server, NodeConfig};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = NodeConfig::from_env()?;
    tracing::info!(
        research = %config.research.base_url,
        internal_routes = config.internal_api_key.is_some(),
        "decipher node starting"
    );

    run_server(config).await
}
