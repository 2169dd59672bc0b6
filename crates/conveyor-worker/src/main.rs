use clap::Parser;
use conveyor_redis::{RedisResultSink, RedisTaskSource};
use conveyor_worker::pipelines::{build_pipeline, pipeline_names};
use conveyor_worker::{Dispatcher, ResultReporter, WorkerConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "conveyor-worker")]
#[command(about = "Bounded-concurrency queue worker", long_about = None)]
struct Args {
    /// Redis connection URL
    #[arg(long)]
    redis_url: Option<String>,

    /// List to drain task payloads from
    #[arg(long)]
    input_key: Option<String>,

    /// Hash to write result records into
    #[arg(long)]
    output_key: Option<String>,

    /// Number of concurrent tasks
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Parser/processor pair to run
    #[arg(short, long)]
    pipeline: Option<String>,

    /// Path to configuration file
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration, then let CLI flags override file values
    let mut config = if let Some(config_path) = &args.config {
        WorkerConfig::from_file(config_path)?
    } else {
        WorkerConfig::default()
    };

    if let Some(redis_url) = args.redis_url {
        config.redis_url = redis_url;
    }
    if let Some(input_key) = args.input_key {
        config.input_key = input_key;
    }
    if let Some(output_key) = args.output_key {
        config.output_key = output_key;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(pipeline) = args.pipeline {
        config.pipeline = pipeline;
    }

    let (parser, processor) = build_pipeline(&config.pipeline).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown pipeline {:?} (available: {:?})",
            config.pipeline,
            pipeline_names()
        )
    })?;

    let source = Arc::new(RedisTaskSource::connect(&config.redis_url, &config.input_key).await?);
    let sink = Arc::new(RedisResultSink::connect(&config.redis_url, &config.output_key).await?);

    tracing::info!(
        pipeline = %config.pipeline,
        input = %config.input_key,
        output = %config.output_key,
        "worker starting"
    );

    let dispatcher = Dispatcher::new(
        source,
        ResultReporter::new(sink),
        parser,
        processor,
        config.concurrency,
    );
    dispatcher.run().await?;

    Ok(())
}
