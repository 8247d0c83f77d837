use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::models::job::Provider;

const QUEUE_KEY: &str = "scan_relay:tracking";
const PROCESSING_KEY: &str = "scan_relay:tracking_inflight";

/// Tracking task serialized into Redis: everything the worker needs to
/// poll one provider-side job to a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingTask {
    pub local_id: String,
    pub provider: Provider,
    pub external_id: String,
    /// Provider-supplied status URL, when submission returns one.
    pub result_url: Option<String>,
}

/// Redis-backed queue decoupling job submission from completion tracking.
pub struct TrackingQueue {
    client: redis::Client,
}

impl TrackingQueue {
    pub fn new(redis_url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url).map_err(QueueError::Redis)?;
        Ok(Self { client })
    }

    /// Enqueue a tracking task for the worker.
    pub async fn enqueue(&self, task: &TrackingTask) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let payload = serde_json::to_string(task).map_err(QueueError::Serialize)?;
        conn.lpush::<_, _, ()>(QUEUE_KEY, &payload)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Dequeue a task for tracking (pop with move to the in-flight list).
    pub async fn dequeue(&self) -> Result<Option<TrackingTask>, QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let result: Option<String> = conn
            .rpoplpush(QUEUE_KEY, PROCESSING_KEY)
            .await
            .map_err(QueueError::Redis)?;

        match result {
            Some(payload) => {
                let task: TrackingTask =
                    serde_json::from_str(&payload).map_err(QueueError::Serialize)?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    /// Check Redis connectivity (for health checks).
    pub async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Get the current queue depth (tasks awaiting a worker).
    pub async fn queue_depth(&self) -> Result<u64, QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let depth: u64 = conn.llen(QUEUE_KEY).await.map_err(QueueError::Redis)?;
        Ok(depth)
    }

    /// Remove a finished task from the in-flight list.
    pub async fn complete(&self, task: &TrackingTask) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let payload = serde_json::to_string(task).map_err(QueueError::Serialize)?;
        conn.lrem::<_, _, ()>(PROCESSING_KEY, 1, &payload)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_task_roundtrips_through_json() {
        let task = TrackingTask {
            local_id: "scan-1700000000000".to_string(),
            provider: Provider::Gladia,
            external_id: "g-123".to_string(),
            result_url: Some("https://api.gladia.io/v2/pre-recorded/g-123".to_string()),
        };
        let encoded = serde_json::to_string(&task).unwrap();
        let decoded: TrackingTask = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, task);
    }
}
