use crate::Result;
use async_trait::async_trait;

/// Blocking queue the dispatcher drains raw task messages from.
///
/// The queue key is fixed per deployment and lives in the implementation.
/// One call removes exactly one message: delivery to this consumer is
/// at-most-once.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Block until the next raw message is available, then take it.
    ///
    /// No timeout: an idle worker parks here indefinitely. Transport
    /// failures are returned so the caller can retry the fetch.
    async fn pop_blocking(&self) -> Result<Vec<u8>>;
}

/// Keyed store that per-task result records are written into.
///
/// The store key is fixed per deployment; `field` is the task id. The core
/// never reads back what it wrote.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Associate `value` with `field` under the store's key, overwriting any
    /// existing value for that field.
    async fn set(&self, field: &str, value: &str) -> Result<()>;
}
