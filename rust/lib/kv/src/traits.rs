use crate::error::KVError;

/// KVStore provides a key-value storage interface with atomic multi-key
/// transactions.
///
/// Keys follow a namespaced convention: `publication:{id}`, `likes:{id}`,
/// `media:{id}`. Values are opaque bytes; callers own the encoding.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair, overwriting any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. No-op if the key does not exist.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Run `f` inside a single write transaction.
    ///
    /// Every read and write made through the [`KVTxn`] handle is isolated from
    /// concurrent transactions. The writes are committed together if `f`
    /// returns `Ok`, and discarded if it returns `Err`.
    fn transaction(
        &self,
        f: &mut dyn FnMut(&mut dyn KVTxn) -> Result<(), KVError>,
    ) -> Result<(), KVError>;
}

/// Handle to an open write transaction. See [`KVStore::transaction`].
pub trait KVTxn {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Returns whether the key existed.
    fn delete(&mut self, key: &str) -> Result<bool, KVError>;

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;
}
