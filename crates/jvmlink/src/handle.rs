//! Class and object handles and their ownership guards
//!
//! `Class` and `Object` are borrowed views of a reference; they are never
//! `Clone` and carry no release obligation. Ownership lives in the guards:
//!
//! - [`Local`] owns a call-scoped local reference and deletes it on drop.
//! - [`Global`] owns a global reference and deletes it on drop.
//!
//! Because views are only reachable through a guard (or through a borrow
//! the binding hands out), a reference cannot be used after its release,
//! and each reference is released exactly once.

use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::ptr;
use std::rc::Rc;

use crate::env::Environment;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::value::RawRef;

mod private {
    pub trait Sealed {}
}

/// A typed view of a runtime reference.
pub trait Handle: private::Sealed {
    /// The underlying reference.
    fn raw(&self) -> RawRef;

    #[doc(hidden)]
    fn wrap(raw: RawRef) -> Self;
}

/// An instance living in the JVM.
#[repr(transparent)]
#[derive(PartialEq, Eq, Hash)]
pub struct Object {
    raw: RawRef,
}

/// A class object living in the JVM.
#[repr(transparent)]
#[derive(PartialEq, Eq, Hash)]
pub struct Class {
    raw: RawRef,
}

impl Object {
    /// View a reference received from elsewhere (e.g. a native callback).
    ///
    /// # Safety
    /// `raw` must be a live reference of the attachment it is used with,
    /// and must outlive the returned view.
    pub unsafe fn from_raw(raw: RawRef) -> Self {
        Self { raw }
    }

    /// The underlying reference.
    pub fn as_raw(&self) -> RawRef {
        self.raw
    }
}

impl Class {
    /// View a class reference received from elsewhere.
    ///
    /// # Safety
    /// Same contract as [`Object::from_raw`].
    pub unsafe fn from_raw(raw: RawRef) -> Self {
        Self { raw }
    }

    /// The underlying reference.
    pub fn as_raw(&self) -> RawRef {
        self.raw
    }

    /// The class viewed as an instance of `java.lang.Class`.
    pub fn as_object(&self) -> &Object {
        // SAFETY: both views are repr(transparent) over the same RawRef.
        unsafe { &*(self as *const Class as *const Object) }
    }
}

impl private::Sealed for Object {}
impl private::Sealed for Class {}

impl Handle for Object {
    fn raw(&self) -> RawRef {
        self.raw
    }

    fn wrap(raw: RawRef) -> Self {
        Self { raw }
    }
}

impl Handle for Class {
    fn raw(&self) -> RawRef {
        self.raw
    }

    fn wrap(raw: RawRef) -> Self {
        Self { raw }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({:#x})", self.raw.addr())
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({:#x})", self.raw.addr())
    }
}

// ============================================================================
// Local
// ============================================================================

/// Owned local reference, deleted when dropped.
pub struct Local<T: Handle> {
    handle: T,
    runtime: Rc<dyn Runtime>,
}

impl<T: Handle> Local<T> {
    pub(crate) fn new(runtime: Rc<dyn Runtime>, raw: RawRef) -> Self {
        Self {
            handle: T::wrap(raw),
            runtime,
        }
    }

    /// Take ownership of a local reference created outside the binding.
    ///
    /// # Safety
    /// `raw` must be a live local reference of `env`'s attachment that
    /// nothing else will delete.
    pub unsafe fn from_raw(env: &Environment, raw: RawRef) -> Self {
        Self::new(env.runtime().clone(), raw)
    }

    /// Promote to a global reference; `self` is still released on drop.
    pub fn to_global(&self) -> Result<Global<T>> {
        let raw = self
            .runtime
            .new_global_ref(self.handle.raw())
            .ok_or(Error::AllocationFailed("global reference"))?;
        Ok(Global::new(self.runtime.clone(), raw))
    }

    /// Promote to a global reference, releasing the local one.
    pub fn into_global(self) -> Result<Global<T>> {
        self.to_global()
    }

    /// Give up ownership without deleting the reference.
    pub fn into_raw(self) -> RawRef {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the runtime is read exactly once.
        drop(unsafe { ptr::read(&this.runtime) });
        this.handle.raw()
    }
}

impl<T: Handle> Deref for Local<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.handle
    }
}

impl<T: Handle> Drop for Local<T> {
    fn drop(&mut self) {
        self.runtime.delete_local_ref(self.handle.raw());
    }
}

impl<T: Handle> fmt::Debug for Local<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Local({:#x})", self.handle.raw().addr())
    }
}

// ============================================================================
// Global
// ============================================================================

/// Owned global reference, deleted when dropped.
pub struct Global<T: Handle> {
    handle: T,
    runtime: Rc<dyn Runtime>,
}

impl<T: Handle> Global<T> {
    pub(crate) fn new(runtime: Rc<dyn Runtime>, raw: RawRef) -> Self {
        Self {
            handle: T::wrap(raw),
            runtime,
        }
    }

    /// New local reference to the same object.
    pub fn to_local(&self) -> Result<Local<T>> {
        let raw = self
            .runtime
            .new_local_ref(self.handle.raw())
            .ok_or(Error::AllocationFailed("local reference"))?;
        Ok(Local::new(self.runtime.clone(), raw))
    }

    /// Give up ownership without deleting the reference.
    pub fn into_raw(self) -> RawRef {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the runtime is read exactly once.
        drop(unsafe { ptr::read(&this.runtime) });
        this.handle.raw()
    }
}

impl<T: Handle> Deref for Global<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.handle
    }
}

impl<T: Handle> Drop for Global<T> {
    fn drop(&mut self) {
        self.runtime.delete_global_ref(self.handle.raw());
    }
}

impl<T: Handle> fmt::Debug for Global<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Global({:#x})", self.handle.raw().addr())
    }
}
