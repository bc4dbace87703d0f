///
/// This module implements the CLI interface for dataset-uploader: flag parsing
/// with environment fallbacks, and the async `run` entrypoint that wires the
/// concrete HTTP, S3 and AMQP clients into the core pipeline.
///
/// All pipeline logic (validation, upload loop, summary, ordering guarantees)
/// lives in [`dataset-uploader-core`]. This module is CLI glue only.
///
/// ## Exit behaviour
/// Pipeline failures are printed as a single `Error: ...` line and `run`
/// still returns `Ok(())`. Only setup failures surface as `Err`.
///
/// [`dataset-uploader-core`]: ../../dataset-uploader-core/
use crate::broker::AmqpAnnouncer;
use crate::console::{upload_progress_bar, ConsoleNotifier};
use crate::load_config::resolve_config;
use crate::upload::S3ObjectStore;
use anyhow::Result;
use clap::Parser;
use dataset_uploader_core::config::DEFAULT_METADATA_FILE;
use dataset_uploader_core::pipeline::run_pipeline;
use dataset_uploader_core::schema::HttpSchemaRegistry;
use std::path::PathBuf;

pub const DEFAULT_LOG_FILE: &str = "dataset_uploader.log";

/// Upload a dataset to the object store and announce its metadata on the queue.
#[derive(Parser, Debug)]
#[clap(
    name = "dataset-uploader",
    version,
    about = "Validate, upload and announce a dataset and its per-file metadata"
)]
pub struct Cli {
    /// The path to the directory containing the dataset.
    #[clap(long = "dir-path", alias = "dir_path", value_parser = existing_dir)]
    pub dir_path: PathBuf,

    /// The name of the metadata file inside the dataset directory.
    #[clap(long, default_value = DEFAULT_METADATA_FILE)]
    pub metadatafile: String,

    /// The dataclass of the dataset.
    #[clap(long)]
    pub dataclass: String,

    /// The bucket to upload the files to. Derived from the directory name when empty.
    #[clap(long, default_value = "")]
    pub bucket: String,

    /// Base URL of the schema service.
    #[clap(long, env = "API")]
    pub api: String,

    /// The object store endpoint (host:port, plain HTTP).
    #[clap(long, env = "MINIO_ENDPOINT")]
    pub endpoint: String,

    /// The access key for the object store.
    #[clap(long = "access-key", env = "MINIO_ACCESS_KEY", hide_env_values = true)]
    pub access_key: String,

    /// The secret key for the object store.
    #[clap(long = "secret-key", env = "MINIO_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Signing region for the object store.
    #[clap(long, env = "MINIO_REGION", default_value = "us-east-1")]
    pub region: String,

    /// The queue to send the metadata to.
    #[clap(long, env = "RM_QUEUE")]
    pub queue: String,

    /// The message broker hostname.
    #[clap(long, env = "RM_HOST")]
    pub host: String,

    /// The message broker port.
    #[clap(long, env = "RM_PORT", default_value_t = 5672)]
    pub port: u16,

    /// The message broker username.
    #[clap(long, env = "RM_USERNAME")]
    pub username: String,

    /// The message broker password.
    #[clap(long, env = "RM_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Where to write the diagnostic log. Overwritten on every run.
    #[clap(long = "log-file", env = "UPLOADER_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
}

fn existing_dir(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("Path '{raw}' does not exist."))
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = resolve_config(cli);
    config.trace_loaded();

    let progress = upload_progress_bar()?;
    let notifier = ConsoleNotifier::new(progress.clone());

    let registry = HttpSchemaRegistry::new(config.api_url.clone());
    let store = S3ObjectStore::new(&config.storage);
    let announcer = AmqpAnnouncer::new(config.broker.clone());

    match run_pipeline(
        &config.dataset,
        &registry,
        &store,
        &announcer,
        &progress,
        &notifier,
    )
    .await
    {
        Ok(report) => {
            tracing::info!(
                bucket = %report.bucket,
                files = report.files_uploaded,
                size = report.dataset_details.size,
                "Dataset upload complete"
            );
        }
        Err(e) => {
            progress.abandon();
            tracing::error!(stage = e.stage(), error = ?e, "Dataset upload failed");
            notifier.error(&e);
        }
    }

    Ok(())
}
