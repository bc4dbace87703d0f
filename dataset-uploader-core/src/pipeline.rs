//! High-level pipeline: load → validate → resolve bucket → upload → announce.
//!
//! This module composes the individual stages for one dataset. Each stage
//! returns a [`PipelineError`] on failure and the run stops there.
//!
//! # Guarantees
//! - Metadata loading, schema fetch and validation all happen before the
//!   object store is touched. A failure in any of them leaves no side effects.
//! - An upload failure stops the run with the objects uploaded so far left in
//!   place. Nothing is published.
//! - An announce failure is returned as an error, but the upload it follows is
//!   not undone.
//!
//! # Callable From
//! - The CLI crate, with the real HTTP, S3 and AMQP clients.
//! - Tests, with the `mockall` mocks from [`crate::contract`].

use crate::bucket::resolve_bucket;
use crate::config::DatasetRequest;
use crate::contract::{
    Announcer, DatasetDetails, IndexingMetadata, Notifier, ObjectStore, SchemaFetchError,
    SchemaRegistry,
};
use crate::error::PipelineError;
use crate::metadata::{load_metadata, MetadataDocument};
use crate::schema::validate_metadata;
use crate::upload::{upload_dataset, BucketStatus};
use indicatif::ProgressBar;
use tracing::{error, info};

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub bucket: String,
    pub bucket_status: BucketStatus,
    pub files_uploaded: usize,
    pub dataset_details: DatasetDetails,
}

/// Metadata that passed validation, with its resolved bucket.
#[derive(Debug, Clone)]
pub struct ValidatedDataset {
    pub document: MetadataDocument,
    pub bucket: String,
}

/// Stages 2-4: load the metadata, validate it, pick the bucket.
pub async fn prepare<R>(
    request: &DatasetRequest,
    registry: &R,
    notifier: &dyn Notifier,
) -> Result<ValidatedDataset, PipelineError>
where
    R: SchemaRegistry + ?Sized,
{
    let metadata_path = request.metadata_path();
    let document = load_metadata(&request.dir_path, &request.metadata_file)?;

    let schema = registry
        .fetch_schema(&request.dataclass)
        .await
        .map_err(|e| {
            error!(error = %e, dataclass = %request.dataclass, "[PIPELINE][ERROR] Schema fetch failed");
            match e {
                SchemaFetchError::Unreachable(reason) => {
                    PipelineError::SchemaServiceUnreachable { reason }
                }
                SchemaFetchError::Unavailable { reason, .. } => PipelineError::SchemaNotFound {
                    dataclass: request.dataclass.clone(),
                    reason,
                },
            }
        })?;

    validate_metadata(&document, &schema)
        .and_then(|()| document.check_required_fields())
        .map_err(|violations| {
            error!(
                metadata_path = %metadata_path.display(),
                violations = ?violations,
                "[PIPELINE][ERROR] Metadata does not match schema"
            );
            PipelineError::SchemaMismatch {
                path: metadata_path.clone(),
                violations,
            }
        })?;

    notifier.notify(&format!(
        "Validated metadata file {} against the schema.",
        metadata_path.display()
    ));

    let bucket = resolve_bucket(&request.bucket, &request.dir_path.to_string_lossy());
    Ok(ValidatedDataset { document, bucket })
}

/// Stage 7: hand the finished message to the announcer.
pub async fn announce<A>(
    announcer: &A,
    request: &DatasetRequest,
    message: &IndexingMetadata,
    notifier: &dyn Notifier,
) -> Result<(), PipelineError>
where
    A: Announcer + ?Sized,
{
    info!(
        dataset_name = %message.dataset_name,
        files = message.files.len(),
        "[PIPELINE] Announcing indexing metadata"
    );
    announcer.announce(message).await.map_err(|e| {
        error!(error = ?e, "[PIPELINE][ERROR] Announce failed");
        PipelineError::Announce {
            reason: e.to_string(),
        }
    })?;
    notifier.notify(&format!(
        "Successfully sent metadata for {} to {} on the message broker.",
        request.dir_path.display(),
        announcer.destination()
    ));
    Ok(())
}

/// Run every stage for one dataset.
pub async fn run_pipeline<R, S, A>(
    request: &DatasetRequest,
    registry: &R,
    store: &S,
    announcer: &A,
    progress: &ProgressBar,
    notifier: &dyn Notifier,
) -> Result<PipelineReport, PipelineError>
where
    R: SchemaRegistry + ?Sized,
    S: ObjectStore + ?Sized,
    A: Announcer + ?Sized,
{
    info!(dataclass = %request.dataclass, dir_path = %request.dir_path.display(), "[PIPELINE] Starting dataset upload");

    let ValidatedDataset { document, bucket } = prepare(request, registry, notifier).await?;

    let outcome = upload_dataset(
        store,
        &bucket,
        &request.dir_path,
        document,
        progress,
        notifier,
    )
    .await?;

    announce(announcer, request, &outcome.indexing, notifier).await?;

    let report = PipelineReport {
        bucket,
        bucket_status: outcome.bucket_status,
        files_uploaded: outcome.indexing.files.len(),
        dataset_details: outcome.indexing.dataset_details,
    };
    info!(?report, "[PIPELINE] Dataset upload complete");
    Ok(report)
}
