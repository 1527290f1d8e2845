//! jvmlink-sim - an in-process JVM for testing jvmlink
//!
//! [`SimVm`] is a small object VM with real class hierarchies, virtual
//! dispatch, static and instance fields, arrays, strings and throwables.
//! Each [`SimEnv`] is one attached thread and implements
//! [`jvmlink::Runtime`] with the JNI contract: lookups fail with an
//! exception pending, calls that throw return zero values, and every
//! reference handed out is local to the attachment until promoted.
//!
//! Unlike a real JVM it counts everything it is asked to do. [`Stats`]
//! reports `FindClass` calls per class, live local and global references,
//! pins, and every [`Violation`] of the native interface contract (double
//! deletes, calls with an exception pending, wrong entry points).
//!
//! ```ignore
//! use jvmlink::prelude::*;
//! use jvmlink_sim::{ClassBuilder, SimValue, SimVm};
//!
//! let vm = SimVm::new();
//! vm.define(ClassBuilder::new("demo/Answer").static_method("get", "()I", |_, _| {
//!     Ok(SimValue::Int(42))
//! }))?;
//!
//! let env = Environment::new(vm.attach());
//! let class = env.get_class_str("demo.Answer")?;
//! assert_eq!(class.call_int(&env, true, "get", &[])?, 42);
//! ```

#![warn(missing_docs)]

mod bootstrap;
pub mod class;
pub mod error;
pub mod frame;
mod state;
pub mod stats;
pub mod value;
pub mod vm;

pub use class::{ClassBuilder, FieldInit, MethodBody};
pub use error::SimError;
pub use frame::Frame;
pub use state::NativeBinding;
pub use stats::{Stats, Violation};
pub use value::{ClassId, ObjId, SimValue, Thrown};
pub use vm::{SimEnv, SimVm};
