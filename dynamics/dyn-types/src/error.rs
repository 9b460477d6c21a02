//! Error types for dynamics configuration and topology operations.

use thiserror::Error;

/// Errors that can occur while configuring or restructuring the
/// dynamics model.
///
/// Validation failures raised out of an action's `initialize` are
/// configuration errors: the caller is expected to treat them as fatal.
/// Runtime attach/detach outcomes surface as [`DynError::NotPerformed`]
/// only when the owning action asks for termination on error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DynError {
    /// A required reference was never supplied.
    #[error("{ident}: required {field} was never assigned")]
    NullPointer {
        /// Identity of the object that found the hole.
        ident: String,
        /// Name of the missing field.
        field: String,
    },

    /// A required name string is missing or empty.
    #[error("{ident}: {field} must name a {kind}, but is empty")]
    InvalidName {
        /// Identity of the object that rejected the name.
        ident: String,
        /// Name of the offending field.
        field: String,
        /// What the field was expected to name.
        kind: String,
    },

    /// An object of the wrong dynamic kind was supplied.
    #[error("{ident}: {name} is not a {expected}")]
    InvalidObject {
        /// Identity of the object that rejected the reference.
        ident: String,
        /// Name of the offending object.
        name: String,
        /// The kind that was required.
        expected: String,
    },

    /// An enum or mode value is out of range.
    #[error("{ident}: {detail}")]
    IllegalValue {
        /// Identity of the object that rejected the value.
        ident: String,
        /// Description of the illegal value.
        detail: String,
    },

    /// A name was registered twice.
    #[error("duplicate entry: {name}")]
    DuplicateEntry {
        /// The name that collided.
        name: String,
    },

    /// Redundant fields disagree, or the configuration is otherwise
    /// unrecoverable.
    #[error("{ident}: inconsistent setup: {detail}")]
    InconsistentSetup {
        /// Identity of the object (or manager) that found the conflict.
        ident: String,
        /// Description of the inconsistency.
        detail: String,
    },

    /// An attempted state-changing operation reported failure.
    #[error("{ident}: operation not performed: {detail}")]
    NotPerformed {
        /// Identity of the action whose operation failed.
        ident: String,
        /// Description of the failed operation.
        detail: String,
    },
}
