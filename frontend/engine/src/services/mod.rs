use std::sync::Arc;

use anyhow::Result;
use redis::aio::ConnectionManager;

use crate::config::Config;

pub mod checkpoint_service;
pub mod content_service;
pub mod round_controller;
pub mod score_service;
pub mod session_service;

pub use checkpoint_service::{CheckpointStore, MemoryCheckpointStore, RedisCheckpointStore};
pub use content_service::ContentClient;
pub use round_controller::{ResumeOutcome, RoundController, Transition};
pub use score_service::ScoreClient;
pub use session_service::{GameService, PlayerInput, SessionStart};

/// Connect the shared Redis checkpoint store, verifying the connection with
/// a PING before handing it out.
pub async fn connect_checkpoint_store(config: &Config) -> Result<Arc<dyn CheckpointStore>> {
    let client = redis::Client::open(config.redis_uri.clone())?;

    tracing::info!("Connecting to Redis checkpoint store...");
    let redis = tokio::time::timeout(
        std::time::Duration::from_secs(30),
        ConnectionManager::new(client),
    )
    .await
    .map_err(|_| anyhow::anyhow!("Redis connection timeout after 30s"))??;

    let mut conn = redis.clone();
    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        redis::cmd("PING").query_async::<String>(&mut conn),
    )
    .await
    .map_err(|_| anyhow::anyhow!("Redis PING timeout after 5s"))??;

    tracing::info!("Redis checkpoint store connected");
    Ok(Arc::new(RedisCheckpointStore::new(redis)))
}
