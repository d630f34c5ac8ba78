use async_trait::async_trait;

use super::error::StorageError;
use super::key::ObjectKey;

/// Key-addressed blob storage.
///
/// Implementations must be safe for concurrent use; the service holds a
/// single shared handle for its whole lifetime.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under the given key, overwriting any previous object.
    async fn put(&self, key: &ObjectKey, data: &[u8]) -> Result<(), StorageError>;

    /// Retrieve all bytes for an object.
    async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError>;

    /// Delete an object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not
    /// exist.
    async fn delete(&self, key: &ObjectKey) -> Result<bool, StorageError>;
}
