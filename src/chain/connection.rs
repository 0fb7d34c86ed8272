//! Chain connection with retry.

use crate::errors::{ChainConnectionError, SubnetResult};
use backoff::{future::retry, Error as BackoffError, ExponentialBackoff};
use std::time::Duration;
use subxt::{OnlineClient, PolkadotConfig};
use tracing::{info, warn};

/// How long to keep retrying an initial connection before giving up.
const MAX_CONNECT_ELAPSED: Duration = Duration::from_secs(60);

/// Connect to a subtensor endpoint, retrying with exponential backoff.
///
/// Websocket endpoints drop routinely during chain restarts; every
/// connection failure is treated as transient until the elapsed budget
/// runs out.
pub async fn connect(endpoint: &str) -> SubnetResult<OnlineClient<PolkadotConfig>> {
    connect_with_budget(endpoint, MAX_CONNECT_ELAPSED).await
}

/// Connect with a caller-supplied retry budget.
pub async fn connect_with_budget(
    endpoint: &str,
    max_elapsed: Duration,
) -> SubnetResult<OnlineClient<PolkadotConfig>> {
    let policy = ExponentialBackoff {
        initial_interval: Duration::from_millis(500),
        max_interval: Duration::from_secs(10),
        max_elapsed_time: Some(max_elapsed),
        ..Default::default()
    };

    let api = retry(policy, || async {
        match OnlineClient::<PolkadotConfig>::from_url(endpoint).await {
            Ok(api) => Ok(api),
            Err(e) => {
                warn!("Connection to {} failed, retrying: {}", endpoint, e);
                Err(BackoffError::transient(e))
            }
        }
    })
    .await
    .map_err(|e| ChainConnectionError::new(endpoint, e.to_string()))?;

    info!("Connected to subtensor at {}", endpoint);
    Ok(api)
}
