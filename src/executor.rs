//! Command dispatch: turns one request line into zero or more result rows
//! plus exactly one trailing status line, writing both straight into the
//! session's response buffer.
//!
//! This is the single place that catches `CommandError` (both parse errors
//! from `command::parse` and execution errors like `Duplicate`) and
//! converts it to the wire-visible `ERR <message>` line; nothing upstream
//! of this needs to know the error vocabulary exists.

use std::time::Duration;

use crate::command::{self, Command};
use crate::error::CommandError;
use crate::join;
use crate::registry::{TableName, TableRegistry};

/// Execute one request line against `registry`, appending result rows and a
/// trailing `OK`/`ERR <message>` line to `out`.
pub fn execute(registry: &TableRegistry, line: &[u8], out: &mut Vec<u8>) {
    match run(registry, line, out) {
        Ok(()) => out.extend_from_slice(b"OK\n"),
        Err(e) => {
            out.extend_from_slice(b"ERR ");
            out.extend_from_slice(e.to_string().as_bytes());
            out.push(b'\n');
        }
    }
}

fn run(registry: &TableRegistry, line: &[u8], out: &mut Vec<u8>) -> Result<(), CommandError> {
    match command::parse(line)? {
        Command::Insert { table, key, value } => {
            registry.get(table).insert(key, value)?;
        }
        Command::Truncate { table } => {
            registry.truncate(table);
        }
        Command::Intersection => {
            let a = registry.get(TableName::A);
            let b = registry.get(TableName::B);
            join::intersection(&a, &b, out);
        }
        Command::SymmetricDifference => {
            let a = registry.get(TableName::A);
            let b = registry.get(TableName::B);
            join::symmetric_difference(&a, &b, out);
        }
        Command::PausedSymmetricDifference { seconds } => {
            let a = registry.get(TableName::A);
            let b = registry.get(TableName::B);
            join::paused_symmetric_difference(&a, &b, Duration::from_secs(seconds), out);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(registry: &TableRegistry, line: &[u8]) -> String {
        let mut out = Vec::new();
        execute(registry, line, &mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn insert_then_duplicate() {
        let registry = TableRegistry::new();
        assert_eq!(response(&registry, b"INSERT A 0 lean"), "OK\n");
        assert_eq!(response(&registry, b"INSERT A 1 lean"), "OK\n");
        assert_eq!(response(&registry, b"INSERT B 0 lean"), "OK\n");
        assert_eq!(response(&registry, b"INSERT A 0 sweat"), "ERR duplicate 0\n");
        assert_eq!(response(&registry, b"INSERT A 1 sweat"), "ERR duplicate 1\n");
    }

    #[test]
    fn intersection_scenario() {
        let registry = TableRegistry::new();
        for line in [
            "INSERT A 0 lean",
            "INSERT A 1 sweater",
            "INSERT A 3 violation",
            "INSERT A 2 frank",
            "INSERT B 2 proposal",
            "INSERT B 3 example",
            "INSERT B 5 flour",
            "INSERT B 4 lake",
        ] {
            assert_eq!(response(&registry, line.as_bytes()), "OK\n");
        }
        assert_eq!(
            response(&registry, b"INTERSECTION"),
            "2,frank,proposal\n3,violation,example\nOK\n"
        );
    }

    #[test]
    fn symmetric_difference_scenario() {
        let registry = TableRegistry::new();
        for line in [
            "INSERT A 0 lean",
            "INSERT A 1 sweater",
            "INSERT A 3 violation",
            "INSERT A 2 frank",
            "INSERT B 2 proposal",
            "INSERT B 3 example",
            "INSERT B 5 flour",
            "INSERT B 4 lake",
        ] {
            assert_eq!(response(&registry, line.as_bytes()), "OK\n");
        }
        assert_eq!(
            response(&registry, b"SYMMETRIC_DIFFERENCE"),
            "0,lean,\n1,sweater,\n4,,lake\n5,,flour\nOK\n"
        );
    }

    #[test]
    fn protocol_errors_scenario() {
        let registry = TableRegistry::new();
        assert_eq!(
            response(&registry, b"INSERT C 0 lean"),
            "ERR Table wasn't found.\n"
        );
        assert_eq!(
            response(&registry, b"INSERT"),
            "ERR Wrong number of parameters was provided.\n"
        );
        assert_eq!(
            response(&registry, b"INSERT A 0 lean extra"),
            "ERR Wrong number of parameters was provided.\n"
        );
        assert_eq!(
            response(&registry, b"SHUFFLE"),
            "ERR Database command is not supported.\n"
        );
        assert_eq!(
            response(&registry, b"INSERT A abc val"),
            "ERR Failed to parse digit.\n"
        );
    }

    #[test]
    fn truncate_is_idempotent_and_allows_reinsertion() {
        let registry = TableRegistry::new();
        assert_eq!(response(&registry, b"INSERT A 0 lean"), "OK\n");
        assert_eq!(response(&registry, b"TRUNCATE A"), "OK\n");
        assert_eq!(response(&registry, b"TRUNCATE A"), "OK\n");
        assert_eq!(response(&registry, b"INSERT A 0 lean"), "OK\n");
    }
}
