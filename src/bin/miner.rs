//! Storage miner entrypoint.

use bittensor_db::neuron::{miner, NeuronConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NeuronConfig::parse();
    miner::run(config).await?;
    Ok(())
}
