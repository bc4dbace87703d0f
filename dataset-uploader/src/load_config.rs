/// `load_config` module: turns parsed CLI flags into the explicit run configuration.
///
/// Environment fallbacks are already applied by clap (after `main` loads the
/// local `.env`), so this is the one place that splits the flat flag set into
/// the dataset request and the per-backend connection settings. Nothing here
/// is global: the resulting [`UploadConfig`] is built once and passed down.
///
/// Secrets (object-store secret key, broker password) are redacted from every
/// `Debug` rendering so they never reach the log file.
use crate::cli::Cli;
use dataset_uploader_core::config::DatasetRequest;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dataset: DatasetRequest,
    pub api_url: String,
    pub storage: StorageConfig,
    pub broker: BrokerConfig,
    pub log_file: PathBuf,
}

impl UploadConfig {
    pub fn trace_loaded(&self) {
        self.dataset.trace_loaded();
        info!(
            api_url = %self.api_url,
            endpoint = %self.storage.endpoint,
            broker_host = %self.broker.host,
            broker_port = self.broker.port,
            queue = %self.broker.queue,
            "Loaded UploadConfig"
        );
    }
}

/// Object store connection settings.
#[derive(Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Message broker connection settings.
#[derive(Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub queue: String,
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("queue", &self.queue)
            .finish()
    }
}

/// Split the parsed flags into an [`UploadConfig`].
pub fn resolve_config(cli: Cli) -> UploadConfig {
    let dataset = DatasetRequest::new(cli.dir_path, cli.dataclass)
        .with_metadata_file(cli.metadatafile)
        .with_bucket(cli.bucket);

    UploadConfig {
        dataset,
        api_url: cli.api,
        storage: StorageConfig {
            endpoint: cli.endpoint,
            access_key: cli.access_key,
            secret_key: cli.secret_key,
            region: cli.region,
        },
        broker: BrokerConfig {
            host: cli.host,
            port: cli.port,
            username: cli.username,
            password: cli.password,
            queue: cli.queue,
        },
        log_file: cli.log_file,
    }
}
