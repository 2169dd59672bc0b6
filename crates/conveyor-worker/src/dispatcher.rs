use crate::reporter::ResultReporter;
use conveyor_core::{
    ArgList, CoreError, Result, StageError, TaskParser, TaskPayload, TaskProcessor, TaskSource,
};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

/// Completed/failed counters, logged when the loop drains out.
#[derive(Default)]
struct DispatchStats {
    completed: AtomicU64,
    failed: AtomicU64,
}

/// The single long-running control loop: blocking fetch, decode, admission,
/// spawn, and the graceful-termination protocol.
///
/// One dispatcher owns one source; parallelism comes from the spawned
/// execution units, capped by the admission semaphore.
pub struct Dispatcher {
    source: Arc<dyn TaskSource>,
    reporter: Arc<ResultReporter>,
    parser: Arc<dyn TaskParser>,
    processor: Arc<dyn TaskProcessor>,
    limit: usize,
    semaphore: Arc<Semaphore>,
    stats: Arc<DispatchStats>,
}

impl Dispatcher {
    /// `limit` is the fixed admission bound for the process lifetime.
    pub fn new(
        source: Arc<dyn TaskSource>,
        reporter: ResultReporter,
        parser: Arc<dyn TaskParser>,
        processor: Arc<dyn TaskProcessor>,
        limit: usize,
    ) -> Self {
        let limit = limit.max(1);
        Dispatcher {
            source,
            reporter: Arc::new(reporter),
            parser,
            processor,
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
            stats: Arc::new(DispatchStats::default()),
        }
    }

    /// Drain the task source until the termination sentinel arrives.
    ///
    /// Bad messages and failed tasks never end the loop; the sentinel is the
    /// only graceful exit.
    pub async fn run(&self) -> Result<()> {
        info!(concurrency = self.limit, "dispatcher started");

        loop {
            let raw = match self.source.pop_blocking().await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("task source fetch failed, retrying: {e}");
                    continue;
                }
            };

            let payload = match TaskPayload::from_slice(&raw) {
                Ok(payload) => payload,
                Err(e) => {
                    // No valid id, so there is no field to report under.
                    warn!("dropping undecodable message: {e}");
                    continue;
                }
            };

            if payload.is_termination() {
                self.drain().await;
                return Ok(());
            }

            // Admission caps system-wide parallelism; the fetch never does.
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| CoreError::Transport("admission limiter closed".to_string()))?;

            debug!(
                task = %payload.id,
                in_flight = self.limit - self.semaphore.available_permits(),
                "task admitted"
            );

            let unit = ExecutionUnit {
                reporter: self.reporter.clone(),
                parser: self.parser.clone(),
                processor: self.processor.clone(),
                stats: self.stats.clone(),
            };
            tokio::spawn(unit.run(payload, permit));
        }
    }

    /// Stop admitting, wait for every in-flight unit, then acknowledge.
    async fn drain(&self) {
        let in_flight = self.limit - self.semaphore.available_permits();
        info!(in_flight, "termination signal received, draining");

        // All permits back means every execution unit has finished; the
        // semaphore is never closed.
        let _drained = self.semaphore.acquire_many(self.limit as u32).await;

        self.reporter.report_termination().await;

        info!(
            completed = self.stats.completed.load(Ordering::Relaxed),
            failed = self.stats.failed.load(Ordering::Relaxed),
            "worker exiting"
        );
    }
}

/// One task's isolated Parse → Process run.
///
/// Owns its admission permit; the permit drops on every exit path, including
/// a panic inside either stage.
struct ExecutionUnit {
    reporter: Arc<ResultReporter>,
    parser: Arc<dyn TaskParser>,
    processor: Arc<dyn TaskProcessor>,
    stats: Arc<DispatchStats>,
}

impl ExecutionUnit {
    async fn run(self, payload: TaskPayload, _permit: OwnedSemaphorePermit) {
        let started = Instant::now();
        let TaskPayload { id, task, .. } = payload;

        match self.pipeline(task).await {
            Ok(result) => {
                info!(
                    task = %id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "task completed"
                );
                self.reporter.report_success(&id, result).await;
                self.stats.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(stage_error) => {
                error!(
                    task = %id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "{stage_error}"
                );
                self.reporter.report_failure(&id, &stage_error).await;
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Run both stages inside their own task so a panic surfaces as a
    /// reportable failure instead of a lost record.
    async fn pipeline(&self, task: Value) -> std::result::Result<Value, StageError> {
        let parser = self.parser.clone();
        let processor = self.processor.clone();

        let handle = tokio::spawn(async move {
            let args: ArgList = parser
                .parse(&task)
                .map_err(|e| StageError::Parse(e.to_string()))?;
            processor
                .process(args)
                .await
                .map_err(|e| StageError::Process(e.to_string()))
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) if join_error.is_panic() => Err(StageError::Process(
                "task panicked during execution".to_string(),
            )),
            Err(_) => Err(StageError::Process("task was cancelled".to_string())),
        }
    }
}
