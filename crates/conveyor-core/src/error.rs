use thiserror::Error;

/// Errors surfaced to the dispatch loop by its collaborators.
///
/// None of these abort the loop: decode failures drop the message, transport
/// failures are retried on the next fetch.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("message has no task id")]
    MissingId,

    #[error("task source closed")]
    SourceClosed,

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// A failure produced inside a parser or processor for a single task.
///
/// Reported to the result sink under the failing task's id; never propagated
/// past that task's execution unit.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("task should be a {expected}, got {got}")]
    UnexpectedShape {
        expected: &'static str,
        got: &'static str,
    },

    #[error("expected {expected} argument(s), got {actual}")]
    WrongArgumentCount { expected: usize, actual: usize },

    #[error("argument at index {index} is not a {expected}")]
    InvalidArgument {
        index: usize,
        expected: &'static str,
    },

    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Domain failure with a caller-supplied message.
    pub fn failed(message: impl Into<String>) -> Self {
        PipelineError::Failed(message.into())
    }
}

/// A pipeline failure tagged with the stage that produced it.
///
/// The `Display` form is the exact `error` string written into the result
/// record.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("processing error: {0}")]
    Process(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_messages_carry_the_stage_tag() {
        let parse = StageError::Parse("task should be a list, got string".to_string());
        assert_eq!(
            parse.to_string(),
            "parse error: task should be a list, got string"
        );

        let process = StageError::Process("n must be a positive integer".to_string());
        assert_eq!(
            process.to_string(),
            "processing error: n must be a positive integer"
        );
    }

    #[test]
    fn shape_error_names_both_variants() {
        let err = PipelineError::UnexpectedShape {
            expected: "list",
            got: "string",
        };
        assert_eq!(err.to_string(), "task should be a list, got string");
    }
}
