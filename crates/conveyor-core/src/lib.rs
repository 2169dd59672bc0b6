mod error;
mod memory;
mod payload;
mod pipeline;
mod record;
mod source;

pub use error::{CoreError, PipelineError, Result, StageError};
pub use memory::{MemoryQueue, MemoryStore};
pub use payload::TaskPayload;
pub use pipeline::{value_kind, ArgList, TaskParser, TaskProcessor};
pub use record::{ResultRecord, TaskStatus};
pub use source::{ResultSink, TaskSource};

/// Reserved task id that triggers the graceful drain-and-exit sequence.
/// Never a real task.
pub const TERMINATION_SIGNAL: &str = "TERMINATION_SIGNAL";

/// Value written under [`TERMINATION_SIGNAL`] once every in-flight task has
/// finished and the worker is about to exit.
pub const TERMINATION_ACK: &str = "Worker exiting";
