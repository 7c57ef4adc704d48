//! The wire-visible error vocabulary.
//!
//! Every variant's `Display` output is the literal message sent back to
//! clients as `ERR <message>` (see the protocol error table). Nothing else
//! in the command path is allowed to produce a response line, so this is the
//! single place new failure modes get named.

/// A failure while parsing or executing a client command.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum CommandError {
    #[error("Command wasn't provided.")]
    EmptyCommand,

    #[error("Database command is not supported.")]
    UnsupportedCommand,

    #[error("Wrong number of parameters was provided.")]
    ParamCount,

    #[error("Failed to parse digit.")]
    ParseDigit,

    #[error("Table wasn't found.")]
    TableNotFound,

    #[error("duplicate {0}")]
    Duplicate(u64),
}
