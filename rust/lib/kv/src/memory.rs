use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::KVError;
use crate::traits::{KVStore, KVTxn};

/// MemoryKV is an in-process KVStore over a sorted map.
///
/// Transactions run against a copy of the map under the write lock and swap
/// it in on success, so a failed transaction leaves no trace. Intended for
/// tests and throwaway instances; nothing is persisted.
#[derive(Default)]
pub struct MemoryKV {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKV {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> KVError {
    KVError::Storage("memory store lock poisoned".into())
}

impl KVStore for MemoryKV {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let mut data = self.data.write().map_err(poisoned)?;
        data.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        let mut data = self.data.write().map_err(poisoned)?;
        data.remove(key);
        Ok(())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(scan_map(&data, prefix))
    }

    fn transaction(
        &self,
        f: &mut dyn FnMut(&mut dyn KVTxn) -> Result<(), KVError>,
    ) -> Result<(), KVError> {
        let mut data = self.data.write().map_err(poisoned)?;
        let mut working = data.clone();
        f(&mut MapTxn { map: &mut working })?;
        *data = working;
        Ok(())
    }
}

struct MapTxn<'a> {
    map: &'a mut BTreeMap<String, Vec<u8>>,
}

impl KVTxn for MapTxn<'_> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        Ok(self.map.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, KVError> {
        Ok(self.map.remove(key).is_some())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        Ok(scan_map(&*self.map, prefix))
    }
}

fn scan_map(map: &BTreeMap<String, Vec<u8>>, prefix: &str) -> Vec<(String, Vec<u8>)> {
    map.range(prefix.to_string()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
