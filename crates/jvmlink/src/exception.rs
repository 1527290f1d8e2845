//! Exception bridge
//!
//! After every JVM call that can throw, the dispatcher asks the runtime
//! whether an exception is pending. A pending exception is optionally
//! described on the JVM's own console, always cleared, and handed to the
//! caller as a [`ForeignException`].

use std::fmt;
use std::rc::Weak;

use log::{debug, warn};
use once_cell::unsync::OnceCell;

use crate::env::{EnvInner, Environment};
use crate::error::{Error, Result};
use crate::handle::{Local, Object};
use crate::resolve::Target;

/// A throwable captured from the JVM.
///
/// Holds a local reference to the throwable. The text is produced on
/// first use by calling the throwable's own `toString()` and cached.
pub struct ForeignException {
    throwable: Local<Object>,
    env: Weak<EnvInner>,
    message: OnceCell<String>,
}

impl ForeignException {
    pub(crate) fn new(throwable: Local<Object>, env: Weak<EnvInner>) -> Self {
        Self {
            throwable,
            env,
            message: OnceCell::new(),
        }
    }

    /// The throwable object.
    pub fn throwable(&self) -> &Object {
        &self.throwable
    }

    /// Take the throwable, e.g. to rethrow it or inspect its fields.
    pub fn into_throwable(self) -> Local<Object> {
        self.throwable
    }

    /// The throwable's `toString()`.
    pub fn message(&self) -> &str {
        self.message.get_or_init(|| self.render())
    }

    fn render(&self) -> String {
        let Some(env) = Environment::upgrade(&self.env) else {
            return "<exception outlived its environment>".to_string();
        };
        match env.call::<Option<String>>(Target::Object(&self.throwable), false, "toString", &[]) {
            Ok(Some(text)) => text,
            Ok(None) => "null".to_string(),
            Err(err) => {
                warn!("toString() on captured exception failed: {:?}", err);
                "<exception toString() failed>".to_string()
            }
        }
    }
}

impl fmt::Display for ForeignException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl fmt::Debug for ForeignException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message.get() {
            Some(text) => write!(f, "ForeignException({:?})", text),
            None => write!(f, "ForeignException({:?})", self.throwable),
        }
    }
}

impl std::error::Error for ForeignException {}

impl Environment {
    /// True when an exception is pending on this thread.
    pub fn exception_check(&self) -> bool {
        self.runtime().exception_check()
    }

    /// Capture and clear the pending exception, if any.
    ///
    /// With nothing pending this returns `None` and touches nothing else.
    /// Unless muted, the exception is first described on the JVM's
    /// diagnostic stream.
    pub fn exception_occurred(&self) -> Option<ForeignException> {
        let runtime = self.runtime();
        let throwable = runtime.exception_occurred()?;
        if !self.muted() {
            runtime.exception_describe();
        }
        runtime.exception_clear();
        debug!("captured pending exception {:?}", throwable);
        Some(ForeignException::new(
            Local::new(runtime.clone(), throwable),
            self.downgrade(),
        ))
    }

    /// `Err` with the pending exception, if any.
    pub(crate) fn check_exception(&self) -> Result<()> {
        if !self.exception_check() {
            return Ok(());
        }
        match self.exception_occurred() {
            Some(exception) => Err(Error::Exception(exception)),
            None => Ok(()),
        }
    }

    /// The pending exception if there is one, otherwise `fallback`.
    ///
    /// Used after lookups that returned null.
    pub(crate) fn pending_or(&self, fallback: Error) -> Error {
        match self.exception_occurred() {
            Some(exception) => Error::Exception(exception),
            None => fallback,
        }
    }
}
