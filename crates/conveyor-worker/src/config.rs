use serde::{Deserialize, Serialize};

/// Worker deployment configuration.
///
/// Defaults target a local Redis; any field can come from a YAML file, with
/// CLI flags taking precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Redis connection URL.
    pub redis_url: String,

    /// List the worker drains task payloads from.
    pub input_key: String,

    /// Hash result records are written into.
    pub output_key: String,

    /// Maximum number of concurrently executing tasks.
    pub concurrency: usize,

    /// Name of the parser/processor pair to run.
    pub pipeline: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            input_key: "conveyor:input".to_string(),
            output_key: "conveyor:output".to_string(),
            concurrency: 4,
            pipeline: "sum".to_string(),
        }
    }
}

impl WorkerConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: WorkerConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}
