//! Error types for jvmlink

use std::fmt;

use jvmlink_types::SignatureError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::exception::ForeignException;
use crate::value::ValueKind;

/// Result type for binding operations
pub type Result<T> = std::result::Result<T, Error>;

/// What a failed lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Instance method
    Method,
    /// Static method
    StaticMethod,
    /// Constructor (`<init>`)
    Constructor,
    /// Instance field
    Field,
    /// Static field
    StaticField,
}

impl MemberKind {
    pub(crate) fn method(is_static: bool) -> Self {
        if is_static {
            MemberKind::StaticMethod
        } else {
            MemberKind::Method
        }
    }

    pub(crate) fn field(is_static: bool) -> Self {
        if is_static {
            MemberKind::StaticField
        } else {
            MemberKind::Field
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MemberKind::Method => "method",
            MemberKind::StaticMethod => "static method",
            MemberKind::Constructor => "constructor",
            MemberKind::Field => "field",
            MemberKind::StaticField => "static field",
        };
        f.write_str(text)
    }
}

/// Binding errors
#[derive(Debug, Error)]
pub enum Error {
    /// An exception raised inside the JVM; its text is the throwable's `toString()`
    #[error("{0}")]
    Exception(#[from] ForeignException),

    /// Lookup returned no id and the JVM reported no exception
    #[error("{kind} {name} {signature} not found")]
    MemberNotFound {
        /// What was being looked up
        kind: MemberKind,
        /// Member name
        name: String,
        /// Descriptor used for the lookup
        signature: String,
    },

    /// Class lookup returned no class and the JVM reported no exception
    #[error("class {0} not found")]
    ClassNotFound(String),

    /// The JVM returned null from an allocation
    #[error("{0} allocation failed")]
    AllocationFailed(&'static str),

    /// An array length or index does not fit a `jint`
    #[error("array length or index {0} out of range")]
    ArrayIndex(usize),

    /// The signature of a call could not be computed
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    /// A name or descriptor cannot be passed to the JVM
    #[error("name contains an interior NUL byte: {0:?}")]
    InvalidName(String),

    /// `RegisterNatives` reported failure without raising an exception
    #[error("registering native {class}.{method} failed with status {code}")]
    NativeRegistration {
        /// Class internal name
        class: String,
        /// Method name
        method: String,
        /// JNI status code
        code: i32,
    },

    /// The runtime answered through a different entry point than requested
    #[error("expected a {expected} value, runtime returned {found}")]
    ValueMismatch {
        /// Requested kind
        expected: ValueKind,
        /// Returned kind
        found: ValueKind,
    },

    /// The JNI environment lacks a function the binding calls
    #[error("JNI function table is missing {0}")]
    IncompleteFunctionTable(&'static str),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// The captured JVM exception, if this error is one.
    pub fn as_exception(&self) -> Option<&ForeignException> {
        match self {
            Error::Exception(e) => Some(e),
            _ => None,
        }
    }

    /// True for lookups that found nothing, whether or not the JVM raised.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Error::MemberNotFound { .. } | Error::ClassNotFound(_))
    }
}
