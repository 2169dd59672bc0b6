use crate::{CoreError, Result, ResultSink, TaskSource};
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;

/// In-process task source backed by an unbounded channel.
///
/// Stands in for the external queue in tests and embedded setups; producers
/// push raw messages, the dispatcher blocks on `pop_blocking`.
pub struct MemoryQueue {
    tx: UnboundedSender<Vec<u8>>,
    rx: Mutex<UnboundedReceiver<Vec<u8>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        MemoryQueue {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Enqueue one raw message.
    pub fn push(&self, raw: impl Into<Vec<u8>>) {
        // The receiver lives as long as the queue, so the send cannot fail.
        let _ = self.tx.send(raw.into());
    }

    /// Number of messages currently waiting (inspection use).
    pub async fn len(&self) -> usize {
        self.rx.lock().await.len()
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskSource for MemoryQueue {
    async fn pop_blocking(&self) -> Result<Vec<u8>> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(CoreError::SourceClosed)
    }
}

/// In-process result sink: a concurrent field → value map.
///
/// `get`/`len` exist for test assertions and inspection; the dispatch loop
/// itself never reads.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<String> {
        self.entries.get(field).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ResultSink for MemoryStore {
    async fn set(&self, field: &str, value: &str) -> Result<()> {
        self.entries.insert(field.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn queue_delivers_in_push_order() {
        let queue = MemoryQueue::new();
        queue.push(b"first".to_vec());
        queue.push(b"second".to_vec());

        assert_eq!(queue.pop_blocking().await.unwrap(), b"first");
        assert_eq!(queue.pop_blocking().await.unwrap(), b"second");
        assert_eq!(queue.len().await, 0);
    }

    #[tokio::test]
    async fn pop_blocks_until_a_message_arrives() {
        let queue = Arc::new(MemoryQueue::new());

        let producer = queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.push(b"late".to_vec());
        });

        let raw = tokio::time::timeout(Duration::from_secs(1), queue.pop_blocking())
            .await
            .expect("pop should unblock once the message lands")
            .unwrap();
        assert_eq!(raw, b"late");
    }

    #[tokio::test]
    async fn store_set_overwrites() {
        let store = MemoryStore::new();
        store.set("t1", "stale").await.unwrap();
        store.set("t1", "fresh").await.unwrap();

        assert_eq!(store.get("t1").as_deref(), Some("fresh"));
        assert_eq!(store.len(), 1);
    }
}
