//! Loading the per-file metadata document of a dataset.

use crate::contract::{FileDetail, MissingField};
use crate::error::PipelineError;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

/// The parsed metadata file: an ordered list of file records.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataDocument {
    records: Vec<FileDetail>,
}

impl MetadataDocument {
    pub fn new(records: Vec<FileDetail>) -> Self {
        Self { records }
    }

    /// Build a document from an already-parsed JSON value.
    ///
    /// The value must be an array of objects; anything else cannot be uploaded.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Array(entries) = value else {
            return Err("expected a JSON array of file records".to_string());
        };
        let records = entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| match entry {
                Value::Object(fields) => Ok(FileDetail::new(fields)),
                other => Err(format!(
                    "entry {idx} is not a JSON object (found {})",
                    json_kind(&other)
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    /// The document as a JSON value, for schema validation.
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.records
                .iter()
                .map(|r| Value::Object(r.fields().clone()))
                .collect(),
        )
    }

    /// Checks that every record carries the keys the uploader relies on.
    /// Returns one message per offending record.
    pub fn check_required_fields(&self) -> Result<(), Vec<String>> {
        let problems: Vec<String> = self
            .records
            .iter()
            .enumerate()
            .flat_map(|(idx, record)| {
                [record.image_path().err(), record.image_type().err()]
                    .into_iter()
                    .flatten()
                    .map(move |MissingField(key)| {
                        format!("entry {idx}: missing required string field `{key}`")
                    })
            })
            .collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    pub fn records(&self) -> &[FileDetail] {
        &self.records
    }

    pub fn into_records(self) -> Vec<FileDetail> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read and parse `dir/filename`.
///
/// A missing file is reported as [`PipelineError::MetadataMissing`] before any
/// other work happens.
pub fn load_metadata(dir: &Path, filename: &str) -> Result<MetadataDocument, PipelineError> {
    let path = dir.join(filename);
    info!(metadata_path = %path.display(), "Loading metadata file");

    if !path.is_file() {
        error!(metadata_path = %path.display(), "Metadata file does not exist");
        return Err(PipelineError::MetadataMissing { path });
    }

    let content = fs::read_to_string(&path).map_err(|e| {
        error!(error = ?e, metadata_path = %path.display(), "Failed to read metadata file");
        PipelineError::MetadataMalformed {
            path: path.clone(),
            reason: e.to_string(),
        }
    })?;

    let value: Value = serde_json::from_str(&content).map_err(|e| {
        error!(error = ?e, metadata_path = %path.display(), "Failed to parse metadata JSON");
        PipelineError::MetadataMalformed {
            path: path.clone(),
            reason: e.to_string(),
        }
    })?;

    let document = MetadataDocument::from_value(value).map_err(|reason| {
        error!(reason = %reason, metadata_path = %path.display(), "Metadata has unexpected shape");
        PipelineError::MetadataMalformed {
            path: path.clone(),
            reason,
        }
    })?;

    debug!(records = document.len(), "Metadata file parsed");
    Ok(document)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
