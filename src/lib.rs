//! A concurrent two-table key-value store reachable over a line-oriented
//! TCP protocol.
//!
//! The interesting part is `table`: an ordered map that lets writers buffer
//! inserts instead of blocking a reader mid-scan, and `join`, which merges
//! two such tables' ascending key streams without materializing the result.
//! Everything else (`registry`, `command`, `executor`, `session`, `server`)
//! is plumbing that gets a request from a socket to those two modules and
//! a response back out.

pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod join;
pub mod logging;
pub mod registry;
pub mod server;
pub mod session;
pub mod table;
pub mod worker_pool;
