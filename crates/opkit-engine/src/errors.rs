//! Error taxonomy.
//!
//! Distinct variants so callers can pattern-match recoverable conditions
//! ("no handler resolved this") from fatal ones (wiring bugs caught at
//! registry construction, misuse of the delegation API).

use thiserror::Error;

/// Fatal configuration errors, surfaced at registry construction or on
/// first use of a misdeclared kind. Never recoverable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A handler's declared dependency list names handler types that were
    /// not supplied to the registry.
    #[error("handler `{handler}` requires handlers that are not registered: {missing:?}")]
    MissingDependency {
        handler: &'static str,
        missing: Vec<&'static str>,
    },

    /// A handler's declared constraint still contains a parameter
    /// reference; handlers must be closed implementations.
    #[error("handler `{handler}` declares an open type constraint: {constraint}")]
    OpenConstraint {
        handler: &'static str,
        constraint: String,
    },

    /// A handler's projection binds a different number of type arguments
    /// than its declared kind has parameters.
    #[error("handler `{handler}` binds {given} type arguments for `{kind}`, which declares {expected}")]
    ProjectionArity {
        handler: &'static str,
        kind: String,
        given: usize,
        expected: usize,
    },

    /// An operation kind left its declared result-type parameter
    /// unresolved.
    #[error("operation kind `{kind}` leaves result-type parameter `{param}` unresolved")]
    UnresolvedResultType { kind: String, param: String },

    /// The same hint key was supplied twice in one overlay call.
    #[error("hint key `{key}` supplied twice in one overlay")]
    DuplicateHint { key: String },
}

/// Everything `eval` and its variants can surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The operation is value-equal to one already in progress on the
    /// dispatch stack and not yet successful; it is circularly dependent
    /// on itself and can never complete.
    #[error("{operation} is already in progress and cannot require itself")]
    Recursive { operation: String },

    /// No candidate handler both matched and succeeded.
    #[error("no handler resolved {operation}")]
    Unresolved { operation: String },

    /// `forward_to` was called outside any handler's `perform`.
    #[error("forward_to requires an operation in progress")]
    NoOperationInProgress,

    /// `forward_to` was handed an operation value-equal to the one
    /// currently on top of the stack.
    #[error("{operation} cannot forward to itself")]
    SelfDelegation { operation: String },
}

pub type DispatchResult<T> = Result<T, DispatchError>;
