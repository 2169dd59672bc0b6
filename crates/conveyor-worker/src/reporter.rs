use conveyor_core::{ResultRecord, ResultSink, StageError, TERMINATION_ACK, TERMINATION_SIGNAL};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

/// Writes one status-tagged record per finished task.
///
/// Each write is attempted once; a failed write is logged and dropped rather
/// than retried, so reporting is at-most-once.
pub struct ResultReporter {
    sink: Arc<dyn ResultSink>,
}

impl ResultReporter {
    pub fn new(sink: Arc<dyn ResultSink>) -> Self {
        ResultReporter { sink }
    }

    /// Report a successful pipeline run.
    pub async fn report_success(&self, task_id: &str, result: Value) {
        self.write(task_id, ResultRecord::success(result)).await;
    }

    /// Report a stage-tagged pipeline failure.
    pub async fn report_failure(&self, task_id: &str, error: &StageError) {
        self.write(task_id, ResultRecord::error(error.to_string()))
            .await;
    }

    /// Acknowledge a completed drain: the fixed exit value under the
    /// sentinel id.
    pub async fn report_termination(&self) {
        if let Err(e) = self.sink.set(TERMINATION_SIGNAL, TERMINATION_ACK).await {
            error!("failed to write termination record: {e}");
        }
    }

    async fn write(&self, task_id: &str, record: ResultRecord) {
        let json = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                error!(task = task_id, "failed to serialize result record: {e}");
                return;
            }
        };

        if let Err(e) = self.sink.set(task_id, &json).await {
            error!(task = task_id, "failed to write result record: {e}");
        } else {
            debug!(
                task = task_id,
                status = record.status.as_str(),
                "result recorded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conveyor_core::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn success_and_failure_records_land_under_the_task_id() {
        let store = Arc::new(MemoryStore::new());
        let reporter = ResultReporter::new(store.clone());

        reporter.report_success("t1", json!(10)).await;
        reporter
            .report_failure("t2", &StageError::Parse("task should be a list, got string".into()))
            .await;

        let ok: Value = serde_json::from_str(&store.get("t1").unwrap()).unwrap();
        assert_eq!(ok, json!({ "status": "success", "result": 10 }));

        let failed: Value = serde_json::from_str(&store.get("t2").unwrap()).unwrap();
        assert_eq!(
            failed,
            json!({
                "status": "error",
                "error": "parse error: task should be a list, got string"
            })
        );
    }

    #[tokio::test]
    async fn rewriting_an_id_overwrites_the_stale_record() {
        let store = Arc::new(MemoryStore::new());
        let reporter = ResultReporter::new(store.clone());

        reporter.report_success("t1", json!(1)).await;
        reporter.report_success("t1", json!(2)).await;

        let record: Value = serde_json::from_str(&store.get("t1").unwrap()).unwrap();
        assert_eq!(record["result"], json!(2));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn termination_ack_is_the_bare_exit_value() {
        let store = Arc::new(MemoryStore::new());
        let reporter = ResultReporter::new(store.clone());

        reporter.report_termination().await;

        assert_eq!(
            store.get(TERMINATION_SIGNAL).as_deref(),
            Some(TERMINATION_ACK)
        );
    }
}
