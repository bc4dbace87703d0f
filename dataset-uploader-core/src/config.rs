use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_METADATA_FILE: &str = "metadata.json";

/// What to upload: one dataset directory, its metadata file and dataclass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRequest {
    pub dir_path: PathBuf,
    pub metadata_file: String,
    pub dataclass: String,
    /// Explicit bucket name. Empty means "derive from the directory".
    #[serde(default)]
    pub bucket: String,
}

impl DatasetRequest {
    pub fn new(dir_path: impl Into<PathBuf>, dataclass: impl Into<String>) -> Self {
        Self {
            dir_path: dir_path.into(),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            dataclass: dataclass.into(),
            bucket: String::new(),
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_metadata_file(mut self, metadata_file: impl Into<String>) -> Self {
        self.metadata_file = metadata_file.into();
        self
    }

    /// Full path of the metadata file inside the dataset directory.
    pub fn metadata_path(&self) -> PathBuf {
        self.dir_path.join(&self.metadata_file)
    }

    pub fn trace_loaded(&self) {
        info!(
            dir_path = %self.dir_path.display(),
            metadata_file = %self.metadata_file,
            dataclass = %self.dataclass,
            bucket = %self.bucket,
            "Loaded DatasetRequest"
        );
        debug!(?self, "DatasetRequest loaded (full debug)");
    }
}
