#![doc = "Object store client: implements the core `ObjectStore` trait on top of aws-sdk-s3 for MinIO and other S3-compatible servers."]
//
//! # Object Store Integration (CLI <-> Core)
//!
//! [`S3ObjectStore`] is the concrete store used by the CLI. It talks plain
//! HTTP to a single endpoint with static credentials and path-style
//! addressing, which is what a MinIO deployment expects.
//!
//! - Construct it from a [`StorageConfig`]; the client connects lazily.
//! - Files are streamed from disk with their filesystem length declared up front.
//! - See [`dataset_uploader_core::contract::ObjectStore`] for the trait contract.

use crate::load_config::StorageConfig;
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use dataset_uploader_core::contract::{BoxError, ObjectStore, ObjectUpload};

pub struct S3ObjectStore {
    client: Client,
    endpoint_url: String,
}

impl S3ObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        let endpoint_url = endpoint_url(&config.endpoint);
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "dataset-uploader",
        );
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&endpoint_url)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            // Required for MinIO.
            .force_path_style(true)
            .build();

        tracing::info!(endpoint = %endpoint_url, "Initialized S3 client");
        Self {
            client: Client::from_conf(s3_config),
            endpoint_url,
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }
}

/// MinIO endpoints are usually given as `host:port`. Without a scheme they
/// are reached over plain HTTP.
fn endpoint_url(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BoxError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadBucketError::NotFound(_)) =>
            {
                Ok(false)
            }
            Err(e) => {
                tracing::error!(error = %e, bucket, "HeadBucket failed");
                Err(Box::new(e))
            }
        }
    }

    async fn make_bucket(&self, bucket: &str) -> Result<(), BoxError> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket, "CreateBucket failed");
                Box::new(e) as BoxError
            })?;
        tracing::info!(bucket, "Created bucket");
        Ok(())
    }

    async fn put_object(&self, upload: ObjectUpload) -> Result<(), BoxError> {
        let start = std::time::Instant::now();
        let body = ByteStream::from_path(&upload.path).await?;
        let length = i64::try_from(upload.length)?;

        self.client
            .put_object()
            .bucket(&upload.bucket)
            .key(&upload.key)
            .body(body)
            .content_length(length)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %upload.bucket,
                    key = %upload.key,
                    size_bytes = upload.length,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                Box::new(e) as BoxError
            })?;

        tracing::debug!(
            bucket = %upload.bucket,
            key = %upload.key,
            size_bytes = upload.length,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_port_gets_http_scheme() {
        assert_eq!(endpoint_url("localhost:9000"), "http://localhost:9000");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        assert_eq!(endpoint_url("http://minio:9000"), "http://minio:9000");
        assert_eq!(endpoint_url("https://s3.example.com"), "https://s3.example.com");
    }

    #[test]
    fn store_reports_normalised_endpoint() {
        let store = S3ObjectStore::new(&StorageConfig {
            endpoint: "127.0.0.1:9000".into(),
            access_key: "minio".into(),
            secret_key: "minio123".into(),
            region: "us-east-1".into(),
        });
        assert_eq!(store.endpoint_url(), "http://127.0.0.1:9000");
    }
}
