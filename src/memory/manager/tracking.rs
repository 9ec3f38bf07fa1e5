/*!
 * Block Tracking
 * Address -> reclamation record map, coarse or sharded
 */

use super::super::config::TrackingMode;
use crate::core::types::{Address, Size, Ticket};
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::alloc::Layout;
use std::collections::HashMap;

/// Reclamation record for one live block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRecord {
    pub size: Size,
    pub layout: Layout,
    pub ticket: Ticket,
}

/// Live-address map
///
/// Removal is the single point of truth for "who frees this block": exactly
/// one caller gets the record back and only that caller runs the free.
pub(crate) enum TrackingMap {
    /// Free runs while the map lock is held
    Coarse(Mutex<HashMap<Address, BlockRecord, RandomState>>),
    /// `remove_if` hands the record to one caller; free runs after the shard unlocks
    Sharded(DashMap<Address, BlockRecord, RandomState>),
}

impl TrackingMap {
    pub fn new(mode: TrackingMode) -> Self {
        match mode {
            TrackingMode::Coarse => {
                TrackingMap::Coarse(Mutex::new(HashMap::with_hasher(RandomState::new())))
            }
            TrackingMode::Sharded { shards } => {
                TrackingMap::Sharded(DashMap::with_capacity_and_hasher_and_shard_amount(
                    0,
                    RandomState::new(),
                    shards,
                ))
            }
        }
    }

    /// Track a new block; `false` if the address is already tracked
    pub fn insert(&self, address: Address, record: BlockRecord) -> bool {
        match self {
            TrackingMap::Coarse(map) => {
                let mut map = map.lock();
                if map.contains_key(&address) {
                    return false;
                }
                map.insert(address, record);
                true
            }
            TrackingMap::Sharded(map) => match map.entry(address) {
                dashmap::mapref::entry::Entry::Occupied(_) => false,
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(record);
                    true
                }
            },
        }
    }

    /// Untrack `address` and run `free` on its record
    ///
    /// With `Some(ticket)` the entry is only removed if its ticket matches.
    /// Returns the removed record; `None` means nothing was tracked (or the
    /// ticket was stale) and `free` was not called.
    pub fn remove_with<F>(&self, address: Address, ticket: Option<Ticket>, free: F) -> Option<BlockRecord>
    where
        F: FnOnce(&BlockRecord),
    {
        let matches = |record: &BlockRecord| ticket.map_or(true, |t| record.ticket == t);

        match self {
            TrackingMap::Coarse(map) => {
                let mut map = map.lock();
                if !map.get(&address).is_some_and(matches) {
                    return None;
                }
                let record = map.remove(&address)?;
                free(&record);
                Some(record)
            }
            TrackingMap::Sharded(map) => {
                let (_, record) = map.remove_if(&address, |_, record| matches(record))?;
                free(&record);
                Some(record)
            }
        }
    }

    pub fn get(&self, address: Address) -> Option<BlockRecord> {
        match self {
            TrackingMap::Coarse(map) => map.lock().get(&address).copied(),
            TrackingMap::Sharded(map) => map.get(&address).map(|entry| *entry.value()),
        }
    }

    pub fn contains(&self, address: Address) -> bool {
        match self {
            TrackingMap::Coarse(map) => map.lock().contains_key(&address),
            TrackingMap::Sharded(map) => map.contains_key(&address),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TrackingMap::Coarse(map) => map.lock().len(),
            TrackingMap::Sharded(map) => map.len(),
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of tracked addresses
    pub fn addresses(&self) -> Vec<Address> {
        match self {
            TrackingMap::Coarse(map) => map.lock().keys().copied().collect(),
            TrackingMap::Sharded(map) => map.iter().map(|entry| *entry.key()).collect(),
        }
    }

    /// Bytes held by tracked blocks
    pub fn bytes(&self) -> Size {
        match self {
            TrackingMap::Coarse(map) => map.lock().values().map(|r| r.size).sum(),
            TrackingMap::Sharded(map) => map.iter().map(|entry| entry.value().size).sum(),
        }
    }
}
