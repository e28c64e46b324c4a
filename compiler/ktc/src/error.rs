//! Errors that stop a script from running.
//!
//! An assertion that does not hold is not an error; it is reported as a
//! failed outcome (see [`crate::runner::Outcome`]).

use std::path::PathBuf;

use kt_types::notation::NotationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Declarations or a type in an assertion failed to load.
    #[error("{line}:{col}: {source}")]
    Notation {
        line: usize,
        col: usize,
        #[source]
        source: NotationError,
    },

    #[error("line {line}: malformed assertion: {message}")]
    Malformed { line: usize, message: String },

    #[error("line {line}: no callable @{index}")]
    UnknownCallable { line: usize, index: usize },

    #[error("line {line}: `{name}` is not a type variable")]
    UnknownVariable { line: usize, name: String },
}

impl ScriptError {
    /// Locate a notation error whose span is relative to `offset` in `source`.
    pub fn notation(source: &str, offset: usize, err: NotationError) -> Self {
        let offset = u32::try_from(offset).unwrap_or(u32::MAX);
        let (line, col) = err.span().shifted(offset).line_col(source);
        ScriptError::Notation {
            line,
            col,
            source: err,
        }
    }

    #[cold]
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        ScriptError::Malformed {
            line,
            message: message.into(),
        }
    }
}
