//! Errors raised while defining simulated classes

use thiserror::Error;

/// Class definition errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimError {
    /// Superclass or referenced class is not loaded
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// A class with this name is already loaded
    #[error("duplicate class: {0}")]
    DuplicateClass(String),

    /// A member descriptor does not parse
    #[error("bad descriptor for {member}: {reason}")]
    BadDescriptor {
        /// Member name
        member: String,
        /// Parse failure
        reason: String,
    },

    /// A static initial value does not match the field's type
    #[error("initial value of {0} does not match its type")]
    BadInitializer(String),
}
