//! Uploading dataset files and summarising the dataset.
//!
//! Files are uploaded one at a time in metadata order. A failure stops the
//! loop; objects stored before the failure stay in the bucket.

use crate::contract::{
    DatasetDetails, FileDetail, IndexingMetadata, Notifier, ObjectStore, ObjectUpload,
};
use crate::error::PipelineError;
use crate::metadata::MetadataDocument;
use indicatif::ProgressBar;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Existing,
    Created,
}

/// Result of a completed upload step.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub bucket_status: BucketStatus,
    pub indexing: IndexingMetadata,
}

/// Create `bucket` unless it already exists.
pub async fn ensure_bucket<S>(
    store: &S,
    bucket: &str,
    notifier: &dyn Notifier,
) -> Result<BucketStatus, PipelineError>
where
    S: ObjectStore + ?Sized,
{
    let exists = store.bucket_exists(bucket).await.map_err(|e| {
        error!(error = ?e, bucket, "[UPLOAD][ERROR] bucket_exists failed");
        PipelineError::upload(e)
    })?;

    if exists {
        info!(bucket, "[UPLOAD] Bucket already exists");
        notifier.notify(&format!("Bucket {bucket} already exists on the object store."));
        return Ok(BucketStatus::Existing);
    }

    info!(bucket, "[UPLOAD] Creating bucket");
    store.make_bucket(bucket).await.map_err(|e| {
        error!(error = ?e, bucket, "[UPLOAD][ERROR] make_bucket failed");
        PipelineError::upload(e)
    })?;
    notifier.notify(&format!("Bucket {bucket} created on the object store."));
    Ok(BucketStatus::Created)
}

/// Upload every file listed in `document` to `bucket`, then summarise.
pub async fn upload_dataset<S>(
    store: &S,
    bucket: &str,
    dir_path: &Path,
    document: MetadataDocument,
    progress: &ProgressBar,
    notifier: &dyn Notifier,
) -> Result<UploadOutcome, PipelineError>
where
    S: ObjectStore + ?Sized,
{
    let bucket_status = ensure_bucket(store, bucket, notifier).await?;

    info!(
        dir_path = %dir_path.display(),
        bucket,
        files = document.len(),
        "[UPLOAD] Uploading dataset files"
    );
    progress.set_length(document.len() as u64);

    let mut files: Vec<FileDetail> = Vec::with_capacity(document.len());
    let mut filetypes: BTreeSet<String> = BTreeSet::new();

    for mut record in document.into_records() {
        let relative = record.image_path().map_err(PipelineError::upload)?.to_string();
        let image_type = record.image_type().map_err(PipelineError::upload)?.to_string();
        let path = dir_path.join(&relative);
        filetypes.insert(image_type);

        let length = std::fs::metadata(&path)
            .map_err(|e| {
                error!(error = ?e, path = %path.display(), "[UPLOAD][ERROR] Cannot stat file");
                PipelineError::upload(format!("{}: {e}", path.display()))
            })?
            .len();

        let upload = ObjectUpload {
            bucket: bucket.to_string(),
            key: path.to_string_lossy().into_owned(),
            path: path.clone(),
            length,
        };
        info!(path = %path.display(), bucket, length, "[UPLOAD] Uploading file");
        store.put_object(upload).await.map_err(|e| {
            error!(error = ?e, path = %path.display(), "[UPLOAD][ERROR] put_object failed");
            PipelineError::upload(e)
        })?;
        info!(path = %path.display(), bucket, "[UPLOAD] Successfully uploaded file");

        record.set_bucket(bucket);
        files.push(record);
        progress.inc(1);
    }
    progress.finish();

    notifier.notify(&format!(
        "Successfully uploaded {} to {bucket} on the object store.",
        dir_path.display()
    ));

    let dataset_details = DatasetDetails {
        name: dir_path.display().to_string(),
        bucket: bucket.to_string(),
        date: today(),
        size: dataset_size(dir_path),
        filetype: filetypes.into_iter().collect(),
    };
    debug!(?dataset_details, "[UPLOAD] Dataset summarised");

    Ok(UploadOutcome {
        bucket_status,
        indexing: IndexingMetadata {
            files,
            dataset_name: bucket.to_string(),
            dataset_details,
        },
    })
}

/// Sum of the sizes of every regular file under `path`, recursively.
///
/// Independent of the metadata list: files that are present but not listed
/// (the metadata file itself included) are counted too. A symlink to a file
/// counts with its target's size; symlinked directories are not descended into.
pub fn dataset_size(path: &Path) -> u64 {
    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry while sizing dataset");
                None
            }
        })
        .filter_map(|e| {
            let metadata = if e.path_is_symlink() {
                std::fs::metadata(e.path())
            } else {
                e.metadata().map_err(std::io::Error::from)
            };
            match metadata {
                Ok(m) if m.is_file() => Some(m.len()),
                Ok(_) => None,
                Err(err) => {
                    warn!(error = %err, path = %e.path().display(), "Skipping entry while sizing dataset");
                    None
                }
            }
        })
        .sum()
}

/// Current local date as `YYYY-MM-DD`.
pub fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}
