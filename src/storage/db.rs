// Database - Abstraction RocksDB
use super::kv::{KvPair, KvStore, Order, StoreError, WriteOp};
use rocksdb::{Direction, IteratorMode, Options, DB};
use std::path::Path;
use std::sync::Arc;

/// Wrapper autour de RocksDB
pub struct Database {
    db: Arc<DB>,
}

impl Database {
    /// Ouvre ou crée une base de données
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        // Limiter l'accumulation de fichiers
        opts.set_keep_log_file_num(5);
        opts.set_max_manifest_file_size(64 * 1024 * 1024);
        opts.set_max_background_jobs(2);
        opts.set_recycle_log_file_num(2);

        let db = DB::open(&opts, path).map_err(|e| DatabaseError::OpenFailed(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Ouvre une base existante en lecture seule
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let opts = Options::default();
        let db = DB::open_for_read_only(&opts, path, false)
            .map_err(|e| DatabaseError::OpenFailed(e.to_string()))?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Batch write (transaction atomique)
    pub fn batch_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut batch = rocksdb::WriteBatch::default();

        for op in ops {
            match op {
                WriteOp::Put { key, value } => batch.put(&key, &value),
                WriteOp::Delete { key } => batch.delete(&key),
            }
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))
    }

    fn scan_forward(&self, prefix: &[u8]) -> Result<Vec<KvPair>, StoreError> {
        let mut out = Vec::new();
        for item in self.db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item.map_err(|e| StoreError::ReadFailed(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key.to_vec(), value.to_vec()));
        }
        Ok(out)
    }
}

impl KvStore for Database {
    /// Lit une valeur
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.db
            .get(key)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))
    }

    /// Écrit une valeur
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db
            .put(key, value)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))
    }

    /// Supprime une clé
    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.db
            .delete(key)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))
    }

    /// Itère sur toutes les clés avec un préfixe donné
    fn scan(&self, prefix: &[u8], order: Order) -> Result<Vec<KvPair>, StoreError> {
        let mut pairs = self.scan_forward(prefix)?;
        if order == Order::Descending {
            pairs.reverse();
        }
        Ok(pairs)
    }

    fn first(&self, prefix: &[u8], order: Order) -> Result<Option<KvPair>, StoreError> {
        match order {
            Order::Ascending => {
                let mut iter = self.db.iterator(IteratorMode::From(prefix, Direction::Forward));
                match iter.next() {
                    Some(item) => {
                        let (key, value) = item.map_err(|e| StoreError::ReadFailed(e.to_string()))?;
                        if key.starts_with(prefix) {
                            Ok(Some((key.to_vec(), value.to_vec())))
                        } else {
                            Ok(None)
                        }
                    }
                    None => Ok(None),
                }
            }
            Order::Descending => Ok(self.scan_forward(prefix)?.pop()),
        }
    }

    fn apply_batch(&mut self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        self.batch_write(ops)
    }
}

/// Erreurs d'ouverture de la base
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Échec d'ouverture de la DB: {0}")]
    OpenFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_database_basic_ops() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = Database::open(temp_dir.path()).unwrap();

        db.set(b"key1", b"value1").unwrap();
        assert_eq!(db.get(b"key1").unwrap(), Some(b"value1".to_vec()));

        assert!(db.has(b"key1").unwrap());
        assert!(!db.has(b"key2").unwrap());

        db.delete(b"key1").unwrap();
        assert!(!db.has(b"key1").unwrap());
    }

    #[test]
    fn test_database_prefix_scan() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path()).unwrap();

        db.batch_write(vec![
            WriteOp::Put { key: vec![1, 2], value: b"b".to_vec() },
            WriteOp::Put { key: vec![1, 1], value: b"a".to_vec() },
            WriteOp::Put { key: vec![2, 1], value: b"c".to_vec() },
        ])
        .unwrap();

        let asc = db.scan(&[1], Order::Ascending).unwrap();
        assert_eq!(asc, vec![(vec![1, 1], b"a".to_vec()), (vec![1, 2], b"b".to_vec())]);

        let last = db.first(&[1], Order::Descending).unwrap();
        assert_eq!(last, Some((vec![1, 2], b"b".to_vec())));
        assert_eq!(db.first(&[3], Order::Ascending).unwrap(), None);
    }

    #[test]
    fn test_block_context_commits_as_one_batch() {
        use crate::storage::{BlockInfo, StateContext};

        let temp_dir = TempDir::new().unwrap();
        let mut db = Database::open(temp_dir.path()).unwrap();
        db.set(b"stale", b"x").unwrap();
        {
            let mut ctx = StateContext::new(&mut db, BlockInfo::default());
            ctx.set(b"fresh", b"y").unwrap();
            ctx.delete(b"stale").unwrap();
            ctx.commit().unwrap();
        }
        assert_eq!(db.get(b"fresh").unwrap(), Some(b"y".to_vec()));
        assert!(!db.has(b"stale").unwrap());
    }
}
