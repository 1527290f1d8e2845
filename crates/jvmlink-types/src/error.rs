//! Descriptor errors

use thiserror::Error;

/// Errors raised while building or parsing type descriptors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// `void` used where a value type is required
    #[error("void is not a valid {position} type")]
    VoidValue {
        /// Where the void type appeared ("parameter", "array element", "field")
        position: &'static str,
    },

    /// A reference type was required
    #[error("expected a reference type, got {found}")]
    NotAReference {
        /// Descriptor of the offending type
        found: String,
    },

    /// Descriptor text could not be parsed
    #[error("malformed descriptor {descriptor:?} at offset {offset}")]
    Malformed {
        /// The full descriptor text
        descriptor: String,
        /// Byte offset of the first unexpected character
        offset: usize,
    },

    /// Class name without any segments
    #[error("empty class name")]
    EmptyName,
}
