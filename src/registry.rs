//! The two named tables (`a` and `b`) the server exposes, plus atomic
//! whole-table replacement for `TRUNCATE`.
//!
//! Each slot is an `ArcSwap<OrderedTable>` rather than a plain
//! `OrderedTable`: truncating a table doesn't mutate it in place, it swaps in
//! a brand new empty one. A reader that already loaded the old `Arc` keeps
//! scanning the old snapshot to completion undisturbed; there is nothing to
//! block on and nothing to coordinate.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::CommandError;
use crate::table::OrderedTable;

/// Identifies one of the server's two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableName {
    A,
    B,
}

impl TableName {
    pub fn parse(s: &[u8]) -> Result<Self, CommandError> {
        match s {
            b"A" => Ok(TableName::A),
            b"B" => Ok(TableName::B),
            _ => Err(CommandError::TableNotFound),
        }
    }
}

/// Owns the server's two tables and lets commands look them up by name.
pub struct TableRegistry {
    a: ArcSwap<OrderedTable>,
    b: ArcSwap<OrderedTable>,
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self {
            a: ArcSwap::from_pointee(OrderedTable::new()),
            b: ArcSwap::from_pointee(OrderedTable::new()),
        }
    }
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot of the named table. Holding onto the returned
    /// `Arc` across a long scan is safe even if a concurrent `TRUNCATE`
    /// swaps in a new table underneath it.
    pub fn get(&self, name: TableName) -> Arc<OrderedTable> {
        match name {
            TableName::A => self.a.load_full(),
            TableName::B => self.b.load_full(),
        }
    }

    /// Atomically replace the named table with a fresh, empty one. Always
    /// succeeds, regardless of any reader concurrently scanning the old
    /// snapshot.
    pub fn truncate(&self, name: TableName) {
        let fresh = Arc::new(OrderedTable::new());
        match name {
            TableName::A => self.a.store(fresh),
            TableName::B => self.b.store(fresh),
        }
    }
}
