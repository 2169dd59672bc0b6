use crate::PipelineError;
use async_trait::async_trait;
use serde_json::Value;

/// Arguments handed from a parser to a processor.
pub type ArgList = Vec<Value>;

/// Human-readable name of a JSON value's variant, for shape errors.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Turns a raw opaque task value into processor arguments.
///
/// Parsers are pure shape validation and declare exactly which value variants
/// they accept; anything that needs I/O belongs in the processor.
pub trait TaskParser: Send + Sync {
    fn parse(&self, task: &Value) -> std::result::Result<ArgList, PipelineError>;
}

/// Turns parsed arguments into one opaque result value.
///
/// Invocations run concurrently with each other; implementations must not
/// share unsynchronized mutable state across calls.
#[async_trait]
pub trait TaskProcessor: Send + Sync {
    async fn process(&self, args: ArgList) -> std::result::Result<Value, PipelineError>;
}
