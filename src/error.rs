//! Error types for instruction parsing and the CLI layer.

use thiserror::Error;

/// Errors that can occur while parsing or processing an instruction
/// sequence.
#[derive(Error, Debug)]
pub enum OptimizerError {
    /// A malformed instruction line: wrong arity or a non-integer
    /// position field. Carries the offending line.
    #[error("invalid instruction {line:?}: {reason}")]
    Parse { line: String, reason: String },

    /// An instruction whose kind word is not INSERT, REMOVE, or
    /// REPLACE.
    #[error("unknown operation: {0:?}")]
    UnknownOperation(String),

    /// File read/write failure on the sequence-file or debug-dump
    /// paths.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl OptimizerError {
    pub(crate) fn parse(line: &str, reason: impl Into<String>) -> Self {
        OptimizerError::Parse {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}
