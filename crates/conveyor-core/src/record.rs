use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome tag of a result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Error,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Success => "success",
            TaskStatus::Error => "error",
        }
    }
}

/// The record written to the result sink for one finished task.
///
/// Exactly one of `result`/`error` is present, determined by `status`; the
/// constructors are the only way to build one. Writes are set/overwrite, so a
/// later record for the same id replaces any stale one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub status: TaskStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultRecord {
    /// Record for a task whose pipeline completed.
    pub fn success(result: Value) -> Self {
        ResultRecord {
            status: TaskStatus::Success,
            result: Some(result),
            error: None,
        }
    }

    /// Record for a task whose pipeline failed at some stage.
    pub fn error(message: impl Into<String>) -> Self {
        ResultRecord {
            status: TaskStatus::Error,
            result: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_record_has_no_error_field() {
        let record = ResultRecord::success(json!(10));
        let encoded = serde_json::to_value(&record).unwrap();
        assert_eq!(encoded, json!({ "status": "success", "result": 10 }));
    }

    #[test]
    fn error_record_has_no_result_field() {
        let record = ResultRecord::error("parse error: task should be a list, got string");
        let encoded = serde_json::to_value(&record).unwrap();
        assert_eq!(
            encoded,
            json!({
                "status": "error",
                "error": "parse error: task should be a list, got string"
            })
        );
    }

    #[test]
    fn status_round_trips_lowercase() {
        assert_eq!(TaskStatus::Success.as_str(), "success");
        assert_eq!(TaskStatus::Error.as_str(), "error");

        let decoded: ResultRecord =
            serde_json::from_str(r#"{"status":"error","error":"boom"}"#).unwrap();
        assert_eq!(decoded.status, TaskStatus::Error);
        assert_eq!(decoded.error.as_deref(), Some("boom"));
    }
}
