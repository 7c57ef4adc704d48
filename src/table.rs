//! The Ordered Key-Value Table: the concurrency primitive this whole server
//! exists to demonstrate.
//!
//! A single committed `primary` map sits behind an `RwLock`, with a
//! `deferred` side buffer behind a plain `Mutex` for writes that arrive
//! while a reader is mid-scan. Readers never wait on writers and never
//! observe a half-applied insert; writers that race a reader pay one
//! uncontended shared lock plus one mutex instead of blocking. See `insert`
//! and `try_drain` for the three-phase protocol that makes this safe.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use parking_lot::{Mutex, RwLock, RwLockReadGuard};

use crate::error::CommandError;

pub type Key = u64;
pub type Value = Vec<u8>;

/// A single table's committed rows plus its buffer of not-yet-visible
/// inserts.
///
/// `primary_rw` must always be acquired before `deferred_mu` when both are
/// held at once (see `insert`'s deferred path); reversing this order is the
/// one thing that would make this type deadlock-prone.
#[derive(Default)]
pub struct OrderedTable {
    primary: RwLock<BTreeMap<Key, Value>>,
    deferred: Mutex<BTreeMap<Key, Value>>,
}

impl OrderedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `(key, value)`, or fail with `Duplicate` if `key` is already
    /// present in either `primary` or `deferred`. Never blocks indefinitely
    /// on a reader.
    pub fn insert(&self, key: Key, value: Value) -> Result<(), CommandError> {
        // Fast path: no reader is mid-scan, so we can take the primary
        // lock outright and skip the deferred buffer entirely.
        if let Some(mut primary) = self.primary.try_write() {
            return Self::insert_into(&mut primary, key, value);
        }

        // A reader holds primary_rw. Buffer the write instead of blocking.
        self.insert_deferred(key, value)?;

        // The reader that was holding primary_rw may have released it
        // between our shared-lock check above and this point, in which case
        // it already ran its own try_drain and missed our row (we hadn't
        // inserted it yet). Retry the drain ourselves so the row doesn't
        // stay invisible until the next writer or scan happens along.
        self.try_drain();
        Ok(())
    }

    fn insert_into(
        primary: &mut BTreeMap<Key, Value>,
        key: Key,
        value: Value,
    ) -> Result<(), CommandError> {
        match primary.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
            Entry::Occupied(_) => Err(CommandError::Duplicate(key)),
        }
    }

    fn insert_deferred(&self, key: Key, value: Value) -> Result<(), CommandError> {
        // Lock order is global: primary_rw before deferred_mu.
        let primary = self.primary.read();
        let mut deferred = self.deferred.lock();
        if primary.contains_key(&key) || deferred.contains_key(&key) {
            return Err(CommandError::Duplicate(key));
        }
        deferred.insert(key, value);
        Ok(())
    }

    /// Move every deferred row into `primary`, if no reader currently holds
    /// `primary_rw`. Returns `false` (without touching `deferred`) if a
    /// reader is still present; that reader will attempt the same drain on
    /// its way out.
    pub fn try_drain(&self) -> bool {
        let mut primary = match self.primary.try_write() {
            Some(guard) => guard,
            None => return false,
        };
        let mut deferred = self.deferred.lock();
        if !deferred.is_empty() {
            // Duplicates are impossible here: insert_deferred checked
            // `primary` under a shared lock before buffering, and the only
            // way into `primary` is this exclusive lock.
            primary.extend(std::mem::take(&mut *deferred));
        }
        true
    }

    /// A scoped read guard over the committed rows, for joins. Never
    /// observes `deferred`.
    pub fn read(&self) -> RwLockReadGuard<'_, BTreeMap<Key, Value>> {
        self.primary.read()
    }

    #[cfg(test)]
    pub(crate) fn deferred_len(&self) -> usize {
        self.deferred.lock().len()
    }
}
