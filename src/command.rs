//! Line tokenizing and command parsing.
//!
//! `split` is a byte-for-byte reimplementation of the original tokenizer's
//! `do`/`while` loop, not a call to a library splitter, because the two
//! disagree on edge cases that the protocol's arity checks depend on: a
//! line that is a single space tokenizes to exactly one empty token, while
//! a line ending in one space drops what would otherwise be a trailing
//! empty token. Swapping this for `[u8]::split(b' ')` changes which
//! requests get `ParamCount` vs. succeed.

use crate::error::CommandError;
use crate::registry::TableName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Insert {
        table: TableName,
        key: u64,
        value: Vec<u8>,
    },
    Truncate {
        table: TableName,
    },
    Intersection,
    SymmetricDifference,
    PausedSymmetricDifference {
        seconds: u64,
    },
}

/// Split `line` on single spaces, following the source tokenizer's exact
/// `do { pos = find(' ', prev); ... } while (pos < len && prev < len)` loop.
fn split(line: &[u8]) -> Vec<&[u8]> {
    let mut parts = Vec::new();
    if line.is_empty() {
        return parts;
    }
    let len = line.len();
    let mut prev = 0usize;
    loop {
        let pos = line[prev..].iter().position(|&b| b == b' ').map(|i| i + prev);
        let end = pos.unwrap_or(len);
        parts.push(&line[prev..end]);
        let keep_going = match pos {
            Some(p) => {
                let next_prev = p + 1;
                let cond = p < len && next_prev < len;
                prev = next_prev;
                cond
            }
            None => false,
        };
        if !keep_going {
            break;
        }
    }
    parts
}

/// Parse a decimal, digits-only unsigned integer the way `std::stoull` plus
/// an `isdigit` pre-check does: any non-digit byte, an empty token, or an
/// overflow is `ParseDigit`, never a silent truncation.
fn parse_u64(token: &[u8]) -> Result<u64, CommandError> {
    if token.is_empty() || !token.iter().all(u8::is_ascii_digit) {
        return Err(CommandError::ParseDigit);
    }
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(CommandError::ParseDigit)
}

pub fn parse(line: &[u8]) -> Result<Command, CommandError> {
    let tokens = split(line);
    let verb = tokens.first().ok_or(CommandError::EmptyCommand)?;

    match *verb {
        b"INSERT" => {
            if tokens.len() != 4 {
                return Err(CommandError::ParamCount);
            }
            let table = TableName::parse(tokens[1])?;
            let key = parse_u64(tokens[2])?;
            Ok(Command::Insert {
                table,
                key,
                value: tokens[3].to_vec(),
            })
        }
        b"TRUNCATE" => {
            if tokens.len() != 2 {
                return Err(CommandError::ParamCount);
            }
            let table = TableName::parse(tokens[1])?;
            Ok(Command::Truncate { table })
        }
        b"INTERSECTION" => {
            if tokens.len() != 1 {
                return Err(CommandError::ParamCount);
            }
            Ok(Command::Intersection)
        }
        b"SYMMETRIC_DIFFERENCE" => {
            if tokens.len() != 1 {
                return Err(CommandError::ParamCount);
            }
            Ok(Command::SymmetricDifference)
        }
        b"PAUSED_IN_SYMMETRIC_DIFFERENCE" => {
            if tokens.len() != 2 {
                return Err(CommandError::ParamCount);
            }
            let seconds = parse_u64(tokens[1])?;
            Ok(Command::PausedSymmetricDifference { seconds })
        }
        _ => Err(CommandError::UnsupportedCommand),
    }
}
