//! Storage validator entrypoint.

use bittensor_db::neuron::{validator, NeuronConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NeuronConfig::parse();
    validator::run(config).await?;
    Ok(())
}
