use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, Table, TableDefinition};

use crate::error::KVError;
use crate::traits::{KVStore, KVTxn};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// RedbStore is a KVStore implementation backed by redb, a pure-Rust embedded
/// key-value database with serialisable write transactions.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(|e| KVError::Storage(e.to_string()))?;

        // Ensure the table exists by doing a write transaction.
        let write_txn = db
            .begin_write()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        {
            let _table = write_txn
                .open_table(TABLE)
                .map_err(|e| KVError::Storage(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| KVError::Storage(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
        })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(TABLE)
            .map_err(|e| KVError::Storage(e.to_string()))?;

        match table.get(key) {
            Ok(Some(val)) => Ok(Some(val.value().to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(KVError::Storage(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.transaction(&mut |txn| txn.set(key, value))
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        self.transaction(&mut |txn| txn.delete(key).map(|_| ()))
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(TABLE)
            .map_err(|e| KVError::Storage(e.to_string()))?;

        scan_table(&table, prefix)
    }

    fn transaction(
        &self,
        f: &mut dyn FnMut(&mut dyn KVTxn) -> Result<(), KVError>,
    ) -> Result<(), KVError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(TABLE)
                .map_err(|e| KVError::Storage(e.to_string()))?;
            let mut txn = RedbTxn { table: &mut table };
            if let Err(e) = f(&mut txn) {
                // Dropping an uncommitted WriteTransaction aborts it.
                tracing::debug!("kv transaction rolled back: {}", e);
                return Err(e);
            }
        }
        write_txn
            .commit()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        Ok(())
    }
}

struct RedbTxn<'a, 'txn> {
    table: &'a mut Table<'txn, &'static str, &'static [u8]>,
}

impl KVTxn for RedbTxn<'_, '_> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        match self.table.get(key) {
            Ok(Some(val)) => Ok(Some(val.value().to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(KVError::Storage(e.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.table
            .insert(key, value)
            .map_err(|e| KVError::Storage(e.to_string()))?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, KVError> {
        let existed = self
            .table
            .remove(key)
            .map_err(|e| KVError::Storage(e.to_string()))?
            .is_some();
        Ok(existed)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        scan_table(&*self.table, prefix)
    }
}

fn scan_table<T>(table: &T, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut results = Vec::new();
    let iter = table
        .range(prefix..)
        .map_err(|e| KVError::Storage(e.to_string()))?;

    for entry in iter {
        let entry = entry.map_err(|e| KVError::Storage(e.to_string()))?;
        let key = entry.0.value().to_string();
        if !key.starts_with(prefix) {
            break;
        }
        let value = entry.1.value().to_vec();
        results.push((key, value));
    }

    Ok(results)
}
