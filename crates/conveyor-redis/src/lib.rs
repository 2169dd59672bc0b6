//! Redis-backed task source and result sink.
//!
//! Deployment shape: producers `LPUSH` task payloads onto a list, each worker
//! drains it with `BLPOP`, and result records land in a hash keyed by task
//! id. Source and sink hold separate connections so the blocking pop never
//! stalls record writes.

use async_trait::async_trait;
use conveyor_core::{CoreError, Result, ResultSink, TaskSource};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

fn transport(err: redis::RedisError) -> CoreError {
    CoreError::Transport(err.to_string())
}

async fn manager(url: &str) -> Result<ConnectionManager> {
    let client = redis::Client::open(url).map_err(transport)?;
    ConnectionManager::new(client).await.map_err(transport)
}

/// Task source that drains one Redis list with `BLPOP`.
pub struct RedisTaskSource {
    conn: ConnectionManager,
    input_key: String,
}

impl RedisTaskSource {
    /// Connect to `url` and bind to the list `input_key`.
    pub async fn connect(url: &str, input_key: &str) -> Result<Self> {
        Ok(RedisTaskSource {
            conn: manager(url).await?,
            input_key: input_key.to_string(),
        })
    }
}

#[async_trait]
impl TaskSource for RedisTaskSource {
    async fn pop_blocking(&self) -> Result<Vec<u8>> {
        // Zero timeout: block until a message arrives.
        let mut conn = self.conn.clone();
        let (_key, raw): (String, Vec<u8>) = conn
            .blpop(&self.input_key, 0.0)
            .await
            .map_err(transport)?;

        debug!(key = %self.input_key, bytes = raw.len(), "message dequeued");
        Ok(raw)
    }
}

/// Result sink that writes records into a Redis hash with `HSET`.
pub struct RedisResultSink {
    conn: ConnectionManager,
    output_key: String,
}

impl RedisResultSink {
    /// Connect to `url` and bind to the hash `output_key`.
    pub async fn connect(url: &str, output_key: &str) -> Result<Self> {
        Ok(RedisResultSink {
            conn: manager(url).await?,
            output_key: output_key.to_string(),
        })
    }
}

#[async_trait]
impl ResultSink for RedisResultSink {
    async fn set(&self, field: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(&self.output_key, field, value)
            .await
            .map_err(transport)?;
        Ok(())
    }
}
