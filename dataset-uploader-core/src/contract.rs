#![allow(unused)]

//! # contract: data model and collaborator interfaces
//!
//! This module defines the records that flow through a dataset upload and the
//! three traits behind which the external systems sit:
//!
//! - [`SchemaRegistry`]: fetches the JSON schema for a dataclass.
//! - [`ObjectStore`]: bucket existence/creation and object upload.
//! - [`Announcer`]: publishes the finished indexing metadata.
//!
//! A fourth, [`Notifier`], receives the user-facing progress lines so the
//! pipeline never writes to stdout itself.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`; mocks are exported behind the
//!   `test-export-mocks` feature so the CLI crate's tests can use them too.
//!
//! ## Errors
//! - Storage and broker calls return boxed errors; the pipeline folds them into
//!   [`crate::error::PipelineError`].
//! - Schema fetches return [`SchemaFetchError`] because the pipeline must tell
//!   an unreachable service apart from an unknown dataclass.

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const IMAGE_PATH_KEY: &str = "image_path";
pub const IMAGE_TYPE_KEY: &str = "image_type";
pub const BUCKET_KEY: &str = "bucket";

/// One entry of the metadata document.
///
/// Kept as a loosely-typed JSON object: the shape is governed by a schema that
/// is only known at run time. Unknown fields are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileDetail(Map<String, Value>);

impl FileDetail {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Relative path of the file inside the dataset directory.
    pub fn image_path(&self) -> Result<&str, MissingField> {
        self.required_str(IMAGE_PATH_KEY)
    }

    pub fn image_type(&self) -> Result<&str, MissingField> {
        self.required_str(IMAGE_TYPE_KEY)
    }

    pub fn bucket(&self) -> Option<&str> {
        self.0.get(BUCKET_KEY).and_then(Value::as_str)
    }

    pub fn set_bucket(&mut self, bucket: &str) {
        self.0
            .insert(BUCKET_KEY.to_string(), Value::String(bucket.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    fn required_str(&self, key: &'static str) -> Result<&str, MissingField> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .ok_or(MissingField(key))
    }
}

/// A required string field was absent (or not a string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("missing required string field `{0}`")]
pub struct MissingField(pub &'static str);

/// Per-dataset summary computed after all files are uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDetails {
    /// The dataset directory path as given on the command line.
    pub name: String,
    pub bucket: String,
    /// Upload date, `YYYY-MM-DD`.
    pub date: String,
    /// Total bytes of every regular file under the dataset directory.
    pub size: u64,
    /// Distinct `image_type` values, in no particular order.
    pub filetype: Vec<String>,
}

/// The outbound message published for downstream indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingMetadata {
    pub files: Vec<FileDetail>,
    pub dataset_name: String,
    pub dataset_details: DatasetDetails,
}

/// A single object upload: the file at `path` is streamed to `bucket/key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUpload {
    pub bucket: String,
    pub key: String,
    pub path: PathBuf,
    /// Byte length of the file as reported by the filesystem.
    pub length: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaFetchError {
    /// The service could not be reached at all.
    #[error("schema service unreachable: {0}")]
    Unreachable(String),
    /// The service answered, but not with a usable schema.
    #[error("schema unavailable (status {status:?}): {reason}")]
    Unavailable { status: Option<u16>, reason: String },
}

/// Source of JSON schemas, one per dataclass.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    async fn fetch_schema(&self, dataclass: &str) -> Result<Value, SchemaFetchError>;
}

/// Trait for the object store that receives the dataset files.
///
/// Implementors open their connection once and reuse it for every call of a
/// run. Existence check and creation are separate calls and not atomic.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BoxError>;

    async fn make_bucket(&self, bucket: &str) -> Result<(), BoxError>;

    /// Upload one file. Must not return before the whole file is stored.
    async fn put_object(&self, upload: ObjectUpload) -> Result<(), BoxError>;
}

/// Publishes finished indexing metadata to downstream consumers.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, message: &IndexingMetadata) -> Result<(), BoxError>;

    /// Where announcements end up, for user-facing messages (e.g. the queue name).
    fn destination(&self) -> String;
}

/// Receives the user-facing progress lines of a run.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, line: &str);
}
