//! jvmlink type descriptors
//!
//! Models the slice of the JVM type system that the binding needs in order
//! to build member signatures: value kinds, class names, field descriptors
//! and method descriptors.

#![warn(missing_docs)]

pub mod error;
pub mod name;
pub mod signature;
pub mod ty;

pub use error::SignatureError;
pub use name::TypeName;
pub use signature::MethodSignature;
pub use ty::{Kind, Type, Typed};
