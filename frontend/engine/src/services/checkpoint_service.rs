use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::metrics::CHECKPOINT_OPERATIONS_TOTAL;
use crate::models::{Checkpoint, GameType};

/// Key-value persistence for session snapshots, keyed by
/// `"<game_type>_state_<user_id>"`. One live session exists per user and
/// game, so there is never a concurrent writer for a key.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// A missing key and a snapshot that fails to deserialize both come back
    /// as `Ok(None)`: a bad checkpoint is discarded, never an error the
    /// session has to handle.
    async fn load(&self, game_type: GameType, user_id: i64) -> Result<Option<Checkpoint>>;

    async fn clear(&self, game_type: GameType, user_id: i64) -> Result<()>;
}

fn decode(key: &str, raw: &str) -> Option<Checkpoint> {
    match serde_json::from_str(raw) {
        Ok(checkpoint) => Some(checkpoint),
        Err(e) => {
            tracing::warn!("Discarding malformed checkpoint {}: {}", key, e);
            None
        }
    }
}

/// Redis-backed store shared by the kiosk stations.
pub struct RedisCheckpointStore {
    redis: ConnectionManager,
}

impl RedisCheckpointStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CheckpointStore for RedisCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let mut conn = self.redis.clone();
        let key = checkpoint.key();
        let json = serde_json::to_string(checkpoint).context("Failed to serialize checkpoint")?;

        let result = redis::cmd("SET")
            .arg(&key)
            .arg(json)
            .query_async::<()>(&mut conn)
            .await
            .context("Failed to save checkpoint to Redis");

        record_operation("save", &result);
        result
    }

    async fn load(&self, game_type: GameType, user_id: i64) -> Result<Option<Checkpoint>> {
        let mut conn = self.redis.clone();
        let key = Checkpoint::storage_key(game_type, user_id);

        let raw: Result<Option<String>> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .context("Failed to load checkpoint from Redis");

        record_operation("load", &raw);
        Ok(raw?.and_then(|json| decode(&key, &json)))
    }

    async fn clear(&self, game_type: GameType, user_id: i64) -> Result<()> {
        let mut conn = self.redis.clone();
        let key = Checkpoint::storage_key(game_type, user_id);

        let result = redis::cmd("DEL")
            .arg(&key)
            .query_async::<()>(&mut conn)
            .await
            .context("Failed to clear checkpoint from Redis");

        record_operation("clear", &result);
        result
    }
}

fn record_operation<T>(operation: &str, result: &Result<T>) {
    let status = if result.is_ok() { "success" } else { "error" };
    CHECKPOINT_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
}

/// In-memory store for tests and single-station setups without Redis.
/// Values are kept as JSON strings so the serialization path is identical
/// to the Redis store's.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw value under a checkpoint key, bypassing serialization.
    /// Lets tests exercise the malformed-snapshot path.
    pub fn seed_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("checkpoint map poisoned")
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let json = serde_json::to_string(checkpoint).context("Failed to serialize checkpoint")?;
        self.entries
            .lock()
            .expect("checkpoint map poisoned")
            .insert(checkpoint.key(), json);
        CHECKPOINT_OPERATIONS_TOTAL
            .with_label_values(&["save", "success"])
            .inc();
        Ok(())
    }

    async fn load(&self, game_type: GameType, user_id: i64) -> Result<Option<Checkpoint>> {
        let key = Checkpoint::storage_key(game_type, user_id);
        let raw = self
            .entries
            .lock()
            .expect("checkpoint map poisoned")
            .get(&key)
            .cloned();
        CHECKPOINT_OPERATIONS_TOTAL
            .with_label_values(&["load", "success"])
            .inc();
        Ok(raw.and_then(|json| decode(&key, &json)))
    }

    async fn clear(&self, game_type: GameType, user_id: i64) -> Result<()> {
        let key = Checkpoint::storage_key(game_type, user_id);
        self.entries
            .lock()
            .expect("checkpoint map poisoned")
            .remove(&key);
        CHECKPOINT_OPERATIONS_TOTAL
            .with_label_values(&["clear", "success"])
            .inc();
        Ok(())
    }
}
