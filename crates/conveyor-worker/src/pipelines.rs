//! Example parser/processor pairs.
//!
//! These are deployment collaborators, not core: each worker binary selects
//! one pair at startup and every task it dequeues flows through that pair.
//! They double as the reference implementations the contract surface is
//! exercised against in tests.

use async_trait::async_trait;
use conveyor_core::{value_kind, ArgList, PipelineError, TaskParser, TaskProcessor};
use serde_json::{json, Value};
use std::sync::Arc;

/// Accepts a JSON list and passes its elements through unchanged, for
/// variadic processors.
pub struct SequenceParser;

impl TaskParser for SequenceParser {
    fn parse(&self, task: &Value) -> Result<ArgList, PipelineError> {
        match task {
            Value::Array(items) => Ok(items.clone()),
            other => Err(PipelineError::UnexpectedShape {
                expected: "list",
                got: value_kind(other),
            }),
        }
    }
}

/// Accepts a single JSON number and wraps it as a one-element argument list.
pub struct NumberParser;

impl TaskParser for NumberParser {
    fn parse(&self, task: &Value) -> Result<ArgList, PipelineError> {
        match task {
            Value::Number(_) => Ok(vec![task.clone()]),
            other => Err(PipelineError::UnexpectedShape {
                expected: "number",
                got: value_kind(other),
            }),
        }
    }
}

fn integer_arg(args: &[Value], index: usize) -> Result<i64, PipelineError> {
    args[index].as_i64().ok_or(PipelineError::InvalidArgument {
        index,
        expected: "integer",
    })
}

fn string_arg<'a>(args: &'a [Value], index: usize) -> Result<&'a str, PipelineError> {
    args[index].as_str().ok_or(PipelineError::InvalidArgument {
        index,
        expected: "string",
    })
}

/// Sums any number of integer arguments.
pub struct Sum;

#[async_trait]
impl TaskProcessor for Sum {
    async fn process(&self, args: ArgList) -> Result<Value, PipelineError> {
        let mut total: i64 = 0;
        for index in 0..args.len() {
            let n = integer_arg(&args, index)?;
            total = total
                .checked_add(n)
                .ok_or_else(|| PipelineError::failed("sum overflows a 64-bit integer"))?;
        }
        Ok(json!(total))
    }
}

/// Adds 100 to its single integer argument.
pub struct Add100;

#[async_trait]
impl TaskProcessor for Add100 {
    async fn process(&self, args: ArgList) -> Result<Value, PipelineError> {
        if args.len() != 1 {
            return Err(PipelineError::WrongArgumentCount {
                expected: 1,
                actual: args.len(),
            });
        }
        let n = integer_arg(&args, 0)?;
        let total = n
            .checked_add(100)
            .ok_or_else(|| PipelineError::failed("sum overflows a 64-bit integer"))?;
        Ok(json!(total))
    }
}

/// Computes the n-th Fibonacci number for a positive `n`.
pub struct Fibonacci;

#[async_trait]
impl TaskProcessor for Fibonacci {
    async fn process(&self, args: ArgList) -> Result<Value, PipelineError> {
        if args.len() != 1 {
            return Err(PipelineError::WrongArgumentCount {
                expected: 1,
                actual: args.len(),
            });
        }
        let n = integer_arg(&args, 0)?;
        if n <= 0 {
            return Err(PipelineError::failed("n must be a positive integer"));
        }

        let mut pair: (u64, u64) = (0, 1);
        for _ in 1..n {
            pair = (
                pair.1,
                pair.0.checked_add(pair.1).ok_or_else(|| {
                    PipelineError::failed("result exceeds a 64-bit integer")
                })?,
            );
        }
        Ok(json!(pair.1))
    }
}

/// Downloads a URL to a local file path: two string arguments (url, path).
pub struct Download {
    client: reqwest::Client,
}

impl Download {
    pub fn new() -> Self {
        Download {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for Download {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskProcessor for Download {
    async fn process(&self, args: ArgList) -> Result<Value, PipelineError> {
        if args.len() != 2 {
            return Err(PipelineError::WrongArgumentCount {
                expected: 2,
                actual: args.len(),
            });
        }
        let url = string_arg(&args, 0)?;
        let path = string_arg(&args, 1)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::failed(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::failed(format!(
                "HTTP error: status code {}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PipelineError::failed(format!("HTTP body read failed: {e}")))?;
        tokio::fs::write(path, &body).await?;

        Ok(json!({ "path": path, "bytes": body.len() }))
    }
}

/// Look up a named parser/processor pair.
///
/// Names are what deployments put in config; an unknown name is a startup
/// error, not a per-task one.
pub fn build_pipeline(name: &str) -> Option<(Arc<dyn TaskParser>, Arc<dyn TaskProcessor>)> {
    match name {
        "sum" => Some((Arc::new(SequenceParser), Arc::new(Sum))),
        "add100" => Some((Arc::new(NumberParser), Arc::new(Add100))),
        "fibonacci" => Some((Arc::new(NumberParser), Arc::new(Fibonacci))),
        "download" => Some((Arc::new(SequenceParser), Arc::new(Download::new()))),
        _ => None,
    }
}

/// Names accepted by [`build_pipeline`].
pub fn pipeline_names() -> &'static [&'static str] {
    &["sum", "add100", "fibonacci", "download"]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn sequence_parser_passes_lists_through() {
        let args = SequenceParser.parse(&json!([2, 3, 5])).unwrap();
        assert_eq!(args, vec![json!(2), json!(3), json!(5)]);
    }

    #[test]
    fn sequence_parser_rejects_scalars() {
        let err = SequenceParser.parse(&json!("not-a-list")).unwrap_err();
        assert_eq!(err.to_string(), "task should be a list, got string");
    }

    #[test]
    fn number_parser_wraps_the_scalar() {
        let args = NumberParser.parse(&json!(7)).unwrap();
        assert_eq!(args, vec![json!(7)]);

        let err = NumberParser.parse(&json!([7])).unwrap_err();
        assert_eq!(err.to_string(), "task should be a number, got list");
    }

    #[tokio::test]
    async fn sum_adds_all_arguments() {
        let result = Sum.process(vec![json!(2), json!(3), json!(5)]).await.unwrap();
        assert_eq!(result, json!(10));

        let empty = Sum.process(vec![]).await.unwrap();
        assert_eq!(empty, json!(0));
    }

    #[tokio::test]
    async fn sum_reports_the_offending_index() {
        let err = Sum
            .process(vec![json!(1), json!("two")])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "argument at index 1 is not a integer");
    }

    #[tokio::test]
    async fn add100_requires_exactly_one_argument() {
        let result = Add100.process(vec![json!(1)]).await.unwrap();
        assert_eq!(result, json!(101));

        let err = Add100.process(vec![json!(1), json!(2)]).await.unwrap_err();
        assert_eq!(err.to_string(), "expected 1 argument(s), got 2");
    }

    #[tokio::test]
    async fn fibonacci_matches_the_series() {
        for (n, expected) in [(1, 1), (2, 1), (3, 2), (7, 13), (10, 55)] {
            let result = Fibonacci.process(vec![json!(n)]).await.unwrap();
            assert_eq!(result, json!(expected), "fib({n})");
        }
    }

    #[tokio::test]
    async fn fibonacci_rejects_non_positive_input() {
        for n in [0, -1] {
            let err = Fibonacci.process(vec![json!(n)]).await.unwrap_err();
            assert_eq!(err.to_string(), "n must be a positive integer");
        }
    }

    #[tokio::test]
    async fn download_validates_its_arguments() {
        let err = Download::new().process(vec![json!("url")]).await.unwrap_err();
        assert_eq!(err.to_string(), "expected 2 argument(s), got 1");

        let err = Download::new()
            .process(vec![json!("url"), json!(5)])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "argument at index 1 is not a string");
    }

    /// Serve one canned HTTP response on a local port.
    async fn serve_once(body: &'static [u8]) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;

            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(header.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
        });

        format!("http://{addr}/file")
    }

    #[tokio::test]
    async fn download_writes_the_body_to_the_target_path() {
        let url = serve_once(b"payload bytes").await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let path = path.to_str().unwrap().to_string();

        let result = Download::new()
            .process(vec![json!(url), json!(path.clone())])
            .await
            .unwrap();

        assert_eq!(result["bytes"], json!(13));
        assert_eq!(std::fs::read(&path).unwrap(), b"payload bytes");
    }

    #[test]
    fn registry_knows_every_advertised_pipeline() {
        for name in pipeline_names() {
            assert!(build_pipeline(name).is_some(), "missing pipeline {name}");
        }
        assert!(build_pipeline("no-such-pipeline").is_none());
    }
}
