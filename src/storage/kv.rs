// KV - Ordered key-value substrate
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Bound;

pub type KvPair = (Vec<u8>, Vec<u8>);

/// Iteration direction over a key range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Ordered byte-keyed store
///
/// Scans are lexicographic over raw key bytes; `Descending` yields the exact
/// reverse of `Ascending`.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError>;

    /// All entries whose key starts with `prefix`, in `order`
    fn scan(&self, prefix: &[u8], order: Order) -> Result<Vec<KvPair>, StoreError>;

    /// First entry under `prefix` in `order`
    fn first(&self, prefix: &[u8], order: Order) -> Result<Option<KvPair>, StoreError> {
        Ok(self.scan(prefix, order)?.into_iter().next())
    }

    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Apply several writes; backends with native batches make this atomic
    fn apply_batch(&mut self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        for op in ops {
            match op {
                WriteOp::Put { key, value } => self.set(&key, &value)?,
                WriteOp::Delete { key } => self.delete(&key)?,
            }
        }
        Ok(())
    }
}

/// Opération d'écriture pour batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Lit une valeur encodée en bincode
pub fn get_value<T: DeserializeOwned>(store: &dyn KvStore, key: &[u8]) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(data) => bincode::deserialize(&data)
            .map(Some)
            .map_err(|e| StoreError::DeserializationFailed(e.to_string())),
        None => Ok(None),
    }
}

/// Écrit une valeur encodée en bincode
pub fn set_value<T: Serialize>(store: &mut dyn KvStore, key: &[u8], value: &T) -> Result<(), StoreError> {
    let data = bincode::serialize(value).map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
    store.set(key, &data)
}

/// Smallest key strictly greater than every key starting with `prefix`,
/// or `None` when the prefix is all `0xff`.
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

pub(crate) fn prefix_bounds(prefix: &[u8]) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let start = Bound::Included(prefix.to_vec());
    let end = match prefix_end(prefix) {
        Some(end) => Bound::Excluded(end),
        None => Bound::Unbounded,
    };
    (start, end)
}

/// In-memory store backed by a `BTreeMap`
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn scan(&self, prefix: &[u8], order: Order) -> Result<Vec<KvPair>, StoreError> {
        let range = self.entries.range(prefix_bounds(prefix));
        let pairs = match order {
            Order::Ascending => range.map(|(k, v)| (k.clone(), v.clone())).collect(),
            Order::Descending => range.rev().map(|(k, v)| (k.clone(), v.clone())).collect(),
        };
        Ok(pairs)
    }

    fn first(&self, prefix: &[u8], order: Order) -> Result<Option<KvPair>, StoreError> {
        let mut range = self.entries.range(prefix_bounds(prefix));
        let entry = match order {
            Order::Ascending => range.next(),
            Order::Descending => range.next_back(),
        };
        Ok(entry.map(|(k, v)| (k.clone(), v.clone())))
    }
}

/// Erreurs du store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Échec de lecture: {0}")]
    ReadFailed(String),

    #[error("Échec d'écriture: {0}")]
    WriteFailed(String),

    #[error("Sérialisation échouée: {0}")]
    SerializationFailed(String),

    #[error("Désérialisation échouée: {0}")]
    DeserializationFailed(String),

    #[error("Clé invalide: {0}")]
    InvalidKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_end() {
        assert_eq!(prefix_end(b"ab"), Some(b"ac".to_vec()));
        assert_eq!(prefix_end(&[0x01, 0xff]), Some(vec![0x02]));
        assert_eq!(prefix_end(&[0xff, 0xff]), None);
        assert_eq!(prefix_end(b""), None);
    }

    #[test]
    fn test_memory_store_scan_order() {
        let mut store = MemoryStore::new();
        store.set(b"p/2", b"two").unwrap();
        store.set(b"p/1", b"one").unwrap();
        store.set(b"q/1", b"other").unwrap();

        let asc: Vec<Vec<u8>> = store.scan(b"p/", Order::Ascending).unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(asc, vec![b"p/1".to_vec(), b"p/2".to_vec()]);

        let last = store.first(b"p/", Order::Descending).unwrap().unwrap();
        assert_eq!(last.1, b"two".to_vec());
        assert!(store.first(b"z/", Order::Ascending).unwrap().is_none());
    }

    #[test]
    fn test_typed_values() {
        let mut store = MemoryStore::new();
        set_value(&mut store, b"ids", &vec![3u64, 1, 2]).unwrap();
        assert_eq!(get_value::<Vec<u64>>(&store, b"ids").unwrap(), Some(vec![3, 1, 2]));
        assert_eq!(get_value::<Vec<u64>>(&store, b"missing").unwrap(), None);

        store.set(b"junk", &[0xff]).unwrap();
        assert!(matches!(
            get_value::<Vec<u64>>(&store, b"junk"),
            Err(StoreError::DeserializationFailed(_))
        ));
    }

    #[test]
    fn test_apply_batch() {
        let mut store = MemoryStore::new();
        store.set(b"old", b"x").unwrap();
        store
            .apply_batch(vec![
                WriteOp::Put { key: b"new".to_vec(), value: b"y".to_vec() },
                WriteOp::Delete { key: b"old".to_vec() },
            ])
            .unwrap();
        assert_eq!(store.get(b"new").unwrap(), Some(b"y".to_vec()));
        assert!(!store.has(b"old").unwrap());
    }

    #[test]
    fn test_memory_store_delete() {
        let mut store = MemoryStore::new();
        store.set(b"k", b"v").unwrap();
        assert!(store.has(b"k").unwrap());
        store.delete(b"k").unwrap();
        assert!(!store.has(b"k").unwrap());
        // Deleting a missing key is a no-op
        store.delete(b"k").unwrap();
        assert!(store.is_empty());
    }
}
