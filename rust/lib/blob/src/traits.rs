use crate::error::BlobError;

/// BlobStore holds raw media bytes (uploaded images, video, audio).
///
/// Keys are path-like strings such as `images/65f0c2a1e4b0d3f1a2b3c4d5`.
/// The blob store is a separate system from the document store: nothing here
/// participates in KV transactions.
pub trait BlobStore: Send + Sync {
    /// Store a blob. Overwrites if the key already exists.
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError>;

    /// Retrieve a blob. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError>;

    /// Delete a blob. No-op if the key does not exist.
    fn delete(&self, key: &str) -> Result<(), BlobError>;

    fn exists(&self, key: &str) -> Result<bool, BlobError>;
}
