// Context - Branched, copy-on-write view of chain state
// Principle: A failed call leaves no trace, neither writes nor events

use super::kv::{prefix_bounds, KvPair, KvStore, Order, StoreError, WriteOp};
use crate::types::{BlockHeight, Event, Timestamp};
use std::collections::BTreeMap;

/// Write overlay on top of a parent store
///
/// Reads fall through to the parent for keys the overlay has not touched.
/// `None` in the overlay records a deletion.
pub struct CacheStore<'a> {
    parent: &'a mut dyn KvStore,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheStore<'a> {
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Flush pending writes into the parent as one batch, in key order
    pub fn write(self) -> Result<(), StoreError> {
        let CacheStore { parent, writes } = self;
        let ops = writes
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => WriteOp::Put { key, value },
                None => WriteOp::Delete { key },
            })
            .collect();
        parent.apply_batch(ops)
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn scan(&self, prefix: &[u8], order: Order) -> Result<Vec<KvPair>, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self
            .parent
            .scan(prefix, Order::Ascending)?
            .into_iter()
            .collect();

        for (key, value) in self.writes.range(prefix_bounds(prefix)) {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        let pairs: Vec<KvPair> = match order {
            Order::Ascending => merged.into_iter().collect(),
            Order::Descending => merged.into_iter().rev().collect(),
        };
        Ok(pairs)
    }

    /// Edge entry of the overlay against the parent's edge entry.
    ///
    /// Only when the overlay deletes the parent's edge key does this fall
    /// back to a merged scan.
    fn first(&self, prefix: &[u8], order: Order) -> Result<Option<KvPair>, StoreError> {
        let range = self.writes.range(prefix_bounds(prefix));
        let live = |(key, value): (&Vec<u8>, &Option<Vec<u8>>)| value.as_ref().map(|v| (key.clone(), v.clone()));
        let overlay = match order {
            Order::Ascending => range.filter_map(live).next(),
            Order::Descending => range.rev().filter_map(live).next(),
        };

        let parent = match self.parent.first(prefix, order)? {
            Some(pair) => pair,
            None => return Ok(overlay),
        };
        match self.writes.get(&parent.0) {
            Some(Some(_)) => return Ok(overlay),
            Some(None) => return Ok(self.scan(prefix, order)?.into_iter().next()),
            None => {}
        }

        let pick = match (&overlay, order) {
            (None, _) => parent,
            (Some(o), Order::Ascending) if o.0 < parent.0 => o.clone(),
            (Some(o), Order::Descending) if o.0 > parent.0 => o.clone(),
            _ => parent,
        };
        Ok(Some(pick))
    }
}

/// Block being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockInfo {
    pub height: BlockHeight,
    pub time: Timestamp,
}

/// State view handed to every operation of a block
///
/// The root context overlays the node's store for one block. `branch()`
/// opens a nested context: its writes and events reach the parent only
/// through `commit()`, and simply dropping it discards both.
pub struct StateContext<'a> {
    store: CacheStore<'a>,
    events: Vec<Event>,
    parent_events: Option<&'a mut Vec<Event>>,
    block: BlockInfo,
    depth: usize,
}

impl<'a> StateContext<'a> {
    pub fn new(base: &'a mut dyn KvStore, block: BlockInfo) -> Self {
        Self {
            store: CacheStore::new(base),
            events: Vec::new(),
            parent_events: None,
            block,
            depth: 0,
        }
    }

    /// Open a nested, discardable view of this context
    pub fn branch(&mut self) -> StateContext<'_> {
        StateContext {
            store: CacheStore::new(&mut self.store),
            events: Vec::new(),
            parent_events: Some(&mut self.events),
            block: self.block,
            depth: self.depth + 1,
        }
    }

    /// Merge writes and events into the parent.
    ///
    /// For a branch the returned list is empty; for the root context the
    /// writes land in the base store and the block's events are returned.
    pub fn commit(self) -> Result<Vec<Event>, StoreError> {
        let StateContext {
            store,
            events,
            parent_events,
            ..
        } = self;
        store.write()?;
        match parent_events {
            Some(parent) => {
                parent.extend(events);
                Ok(Vec::new())
            }
            None => Ok(events),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Events emitted in this context and not yet committed upward
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn block(&self) -> BlockInfo {
        self.block
    }

    /// 0 for the block context, +1 per nested branch
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl KvStore for StateContext<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.store.get(key)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.store.set(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.store.delete(key)
    }

    fn scan(&self, prefix: &[u8], order: Order) -> Result<Vec<KvPair>, StoreError> {
        self.store.scan(prefix, order)
    }

    fn first(&self, prefix: &[u8], order: Order) -> Result<Option<KvPair>, StoreError> {
        self.store.first(prefix, order)
    }
}
