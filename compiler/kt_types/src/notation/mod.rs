//! Textual notation for declarations and type references.
//!
//! A declaration script declares classes, free type variables and callable
//! signatures:
//!
//! ```text
//! open class Base_T<T>
//! open class Derived_T<T> : Base_T<T>
//! interface Base_inT<in T>
//! class Star<T : Star<T>>
//! typevar X : Comparable<X>
//! fun <T> Base_T<T>.get(index: Int): T
//! var size: Int
//! ```
//!
//! Type references use `Name<arg, ...>?`, `in T`, `out T`, `*` and
//! `(A & B)`. Loading runs in three passes (declare, resolve supertypes and
//! bounds, resolve signatures) so declarations may refer to each other in
//! any order.

mod lexer;
mod loader;
mod parser;

use kt_ir::Span;

use crate::registry::DeclError;

pub use loader::{load_script, LoadedScript};

/// Errors from lexing, parsing or resolving a script.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("unrecognized input `{text}`")]
    Lex { text: String, span: Span },

    #[error("expected {expected}, found `{found}`")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        span: Span,
    },

    #[error("unresolved name `{name}`")]
    UnresolvedName { name: String, span: Span },

    #[error("`{name}` is already declared")]
    Duplicate { name: String, span: Span },

    #[error(transparent)]
    Decl(#[from] DeclError),
}

impl NotationError {
    pub fn span(&self) -> Span {
        match self {
            NotationError::Lex { span, .. }
            | NotationError::UnexpectedToken { span, .. }
            | NotationError::UnresolvedName { span, .. }
            | NotationError::Duplicate { span, .. } => *span,
            NotationError::Decl(err) => err.span(),
        }
    }
}

#[cfg(test)]
mod tests;
