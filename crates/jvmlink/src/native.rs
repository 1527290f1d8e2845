//! Native method registration

use std::ffi::c_void;

use jvmlink_types::MethodSignature;
use log::debug;

use crate::env::{c_string, Environment};
use crate::error::{Error, Result};
use crate::handle::{Class, Handle};

impl Environment {
    /// Bind `fn_ptr` as the implementation of the native method
    /// `class_name.method` declared with `signature`.
    ///
    /// The class is looked up through the class cache.
    ///
    /// # Safety
    /// `fn_ptr` must point to an `extern "system"` function whose
    /// parameters are the JNI environment, the receiver (or class, for
    /// static methods) and the JNI forms of `signature`'s parameters, and
    /// whose return type matches.
    pub unsafe fn register_native(
        &self,
        class_name: &str,
        method: &str,
        signature: &MethodSignature,
        fn_ptr: *mut c_void,
    ) -> Result<()> {
        let class = self.get_class_str(class_name)?;
        let c_method = c_string(method)?;
        let c_sig = c_string(&signature.to_string())?;
        debug!("registering native {}.{} {}", class_name, method, signature);
        let code = self
            .runtime()
            .register_native(class.raw(), &c_method, &c_sig, fn_ptr);
        if code == 0 {
            return Ok(());
        }
        Err(self.pending_or(Error::NativeRegistration {
            class: class_name.to_string(),
            method: method.to_string(),
            code,
        }))
    }

    /// Remove every native binding of `class`.
    pub fn unregister_natives(&self, class: &Class) -> Result<()> {
        let code = self.runtime().unregister_natives(class.raw());
        if code == 0 {
            return Ok(());
        }
        Err(self.pending_or(Error::NativeRegistration {
            class: format!("{:?}", class),
            method: "*".to_string(),
            code,
        }))
    }
}
