//! jvmlink - drive a JVM from Rust
//!
//! Calls methods, reads and writes fields, constructs instances and
//! captures exceptions of a running JVM through its native interface.
//!
//! The core programs against the [`Runtime`] trait, one attached JVM
//! thread. [`jni::JniRuntime`] implements it over a raw `JNIEnv*`; the
//! `jvmlink-sim` crate provides an in-process implementation for tests.
//!
//! # Example
//!
//! ```ignore
//! use jvmlink::prelude::*;
//!
//! let runtime = unsafe { JniRuntime::from_raw(env_ptr)? };
//! let env = Environment::new(runtime);
//!
//! let sb = env.new_instance_str("java.lang.StringBuilder", &[])?;
//! let builder = Type::class("java.lang.StringBuilder");
//! sb.call_object(&env, false, "append", &builder, &["héllo".into()])?;
//! assert_eq!(sb.to_java_string(&env)?.as_deref(), Some("héllo"));
//! ```
//!
//! # References
//!
//! Every JVM reference the binding hands out is owned by a [`Local`] or a
//! [`Global`] guard and deleted exactly once when the guard drops.
//! Temporaries created for a call (strings, arrays, the receiver's class)
//! are released before the call returns, on success and on error alike.
//!
//! # Threads
//!
//! An [`Environment`] belongs to the thread whose `JNIEnv*` it wraps and
//! is `!Send`. Use one environment per attached thread.

#![warn(missing_docs)]

pub mod args;
pub mod config;
pub mod convert;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod exception;
pub mod form;
pub mod handle;
pub mod jni;
mod marshal;
pub mod native;
pub mod receiver;
pub mod resolve;
pub mod runtime;
pub mod value;

pub use args::Arg;
pub use config::{Config, ConfigError};
pub use convert::ArrayElement;
pub use dispatch::FromJava;
pub use env::{Environment, MuteGuard};
pub use error::{Error, MemberKind, Result};
pub use exception::ForeignException;
pub use handle::{Class, Global, Handle, Local, Object};
pub use receiver::Receiver;
pub use resolve::Target;
pub use runtime::Runtime;
pub use value::{FieldId, JValue, MethodId, RawRef, ValueKind, JNI_FALSE, JNI_TRUE};

pub use jvmlink_types::{Kind, MethodSignature, SignatureError, Type, TypeName, Typed};

/// Everything needed to make calls.
pub mod prelude {
    pub use crate::jni::JniRuntime;
    pub use crate::{
        Arg, Class, Environment, Error, Global, Local, Object, Receiver, Result, Type, TypeName,
    };
}
