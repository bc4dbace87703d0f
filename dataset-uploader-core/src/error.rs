//! Errors surfaced by the dataset pipeline.
//!
//! Every variant renders as the flat, user-facing line the CLI prints. The
//! underlying cause (where there is one) is kept in a field for the log.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("metadata file {} does not exist.", path.display())]
    MetadataMissing { path: PathBuf },

    #[error("metadata file {} could not be parsed: {reason}", path.display())]
    MetadataMalformed { path: PathBuf, reason: String },

    #[error("failed to connect to server.")]
    SchemaServiceUnreachable { reason: String },

    #[error("cannot retrieve schema for dataclass {dataclass} from the database.")]
    SchemaNotFound { dataclass: String, reason: String },

    #[error("metadata file {} does not match the schema.", path.display())]
    SchemaMismatch {
        path: PathBuf,
        violations: Vec<String>,
    },

    #[error("error uploading file: {reason}")]
    Upload { reason: String },

    #[error("error sending metadata to the message broker.")]
    Announce { reason: String },
}

impl PipelineError {
    /// Name of the pipeline stage that produced the error.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::MetadataMissing { .. } | PipelineError::MetadataMalformed { .. } => {
                "load_metadata"
            }
            PipelineError::SchemaServiceUnreachable { .. }
            | PipelineError::SchemaNotFound { .. } => "fetch_schema",
            PipelineError::SchemaMismatch { .. } => "validate",
            PipelineError::Upload { .. } => "upload",
            PipelineError::Announce { .. } => "announce",
        }
    }

    /// True when the run stopped before touching the object store.
    pub fn is_pre_upload(&self) -> bool {
        !matches!(
            self,
            PipelineError::Upload { .. } | PipelineError::Announce { .. }
        )
    }

    pub(crate) fn upload(e: impl std::fmt::Display) -> Self {
        PipelineError::Upload {
            reason: e.to_string(),
        }
    }
}
