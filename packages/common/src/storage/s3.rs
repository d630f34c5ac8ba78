use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::key::ObjectKey;
use super::traits::BlobStore;

/// S3-backed blob store.
///
/// Credentials are resolved from the environment (`AWS_ACCESS_KEY_ID`,
/// `AWS_SECRET_ACCESS_KEY`, instance profile, ...). A custom `endpoint`
/// switches to path-style addressing for S3-compatible stores (MinIO,
/// localstack).
pub struct S3BlobStore {
    bucket: Box<Bucket>,
}

impl S3BlobStore {
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: Option<&str>,
    ) -> Result<Self, StorageError> {
        let region = match endpoint {
            Some(endpoint) => Region::Custom {
                region: region.to_string(),
                endpoint: endpoint.to_string(),
            },
            None => region
                .parse::<Region>()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::default()
            .map_err(|e| StorageError::Backend(format!("credential resolution failed: {e}")))?;

        let mut bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        if endpoint.is_some() {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &ObjectKey, data: &[u8]) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object(key.as_str(), data)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        match response.status_code() {
            200..=299 => Ok(()),
            status => Err(StorageError::Backend(format!(
                "put returned status {status}"
            ))),
        }
    }

    async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, StorageError> {
        let response = self
            .bucket
            .get_object(key.as_str())
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        match response.status_code() {
            200..=299 => Ok(response.bytes().to_vec()),
            404 => Err(StorageError::NotFound(key.to_string())),
            status => Err(StorageError::Backend(format!(
                "get returned status {status}"
            ))),
        }
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        let (_, status) = self
            .bucket
            .head_object(key.as_str())
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        match status {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(StorageError::Backend(format!(
                "head returned status {status}"
            ))),
        }
    }

    async fn delete(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        let response = self
            .bucket
            .delete_object(key.as_str())
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        // S3 reports 204 for deletes of both present and absent keys, so a
        // success here only means the object is gone now.
        match response.status_code() {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(StorageError::Backend(format!(
                "delete returned status {status}"
            ))),
        }
    }
}
