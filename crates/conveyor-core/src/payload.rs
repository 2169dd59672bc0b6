use crate::{CoreError, Result, TERMINATION_SIGNAL};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The unit of work dequeued from the task source.
///
/// `task` is opaque to the dispatch loop; only the selected parser gives it a
/// shape. It defaults to `null` when absent so the bare termination message
/// `{"id":"TERMINATION_SIGNAL"}` decodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Unique task identifier, used as the result-sink field key.
    pub id: String,

    /// Opaque task value, passed unexamined to the parser.
    #[serde(default)]
    pub task: Value,

    /// Informational creation timestamp; never used for ordering or expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit_ts: Option<i64>,
}

impl TaskPayload {
    /// Decode one raw source message.
    ///
    /// A missing or empty `id` is a decode error: without a valid id there is
    /// no field to report a result under.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let payload: TaskPayload = serde_json::from_slice(raw)?;
        if payload.id.is_empty() {
            return Err(CoreError::MissingId);
        }
        Ok(payload)
    }

    /// Whether this payload is the reserved shutdown sentinel.
    pub fn is_termination(&self) -> bool {
        self.id == TERMINATION_SIGNAL
    }
}
