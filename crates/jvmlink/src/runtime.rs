//! Runtime trait: the foreign call primitive
//!
//! Defines the interface a JVM attachment implements. The binding core
//! programs against this trait only; [`crate::jni::JniRuntime`] provides
//! the JNI implementation and `jvmlink-sim` an in-process one.
//!
//! The methods mirror the JNI function table one-to-one and share its
//! contract: none of them clear exceptions, lookups that fail return
//! `None` with an exception pending, and references returned are *local*
//! unless the method says otherwise.

use std::ffi::{c_void, CStr};
use std::ptr::NonNull;

use crate::value::{FieldId, JValue, MethodId, RawRef, ValueKind};

/// Abstract per-thread JVM attachment.
///
/// One value corresponds to one attached thread (a `JNIEnv*`); it is not
/// required to be `Send` and the binding never shares it across threads.
///
/// # Reference arguments
///
/// Every `RawRef` passed in must be a live local or global reference
/// obtained from the same attachment. The binding's ownership guards
/// guarantee this for references it manages.
pub trait Runtime {
    // ========================================================================
    // Classes and members
    // ========================================================================

    /// `FindClass`: look up a class by internal name (`java/lang/String`).
    fn find_class(&self, path: &CStr) -> Option<RawRef>;

    /// `GetObjectClass`: local reference to the runtime class of `obj`.
    fn get_object_class(&self, obj: RawRef) -> Option<RawRef>;

    /// `GetMethodID` / `GetStaticMethodID`.
    fn get_method_id(
        &self,
        class: RawRef,
        name: &CStr,
        signature: &CStr,
        is_static: bool,
    ) -> Option<MethodId>;

    /// `GetFieldID` / `GetStaticFieldID`.
    fn get_field_id(
        &self,
        class: RawRef,
        name: &CStr,
        signature: &CStr,
        is_static: bool,
    ) -> Option<FieldId>;

    // ========================================================================
    // Invocation
    // ========================================================================

    /// `Call<kind>MethodA` / `CallStatic<kind>MethodA`.
    ///
    /// `target` is the receiver object for instance calls and the class
    /// for static calls. `args` is contiguous and in declaration order.
    /// Returns [`JValue::zero`] for `kind` when the call threw.
    fn call_method(
        &self,
        kind: ValueKind,
        target: RawRef,
        method: MethodId,
        is_static: bool,
        args: &[JValue],
    ) -> JValue;

    /// `NewObjectA`: allocate and run the constructor `ctor`.
    fn new_object(&self, class: RawRef, ctor: MethodId, args: &[JValue]) -> Option<RawRef>;

    /// `Get<kind>Field` / `GetStatic<kind>Field`.
    fn get_field(&self, kind: ValueKind, target: RawRef, field: FieldId, is_static: bool) -> JValue;

    /// `Set<kind>Field` / `SetStatic<kind>Field`; the kind is taken from `value`.
    fn set_field(&self, target: RawRef, field: FieldId, is_static: bool, value: JValue);

    // ========================================================================
    // Exceptions
    // ========================================================================

    /// `ExceptionCheck`
    fn exception_check(&self) -> bool;

    /// `ExceptionOccurred`: local reference to the pending throwable.
    fn exception_occurred(&self) -> Option<RawRef>;

    /// `ExceptionDescribe`: print the pending exception to the runtime's
    /// diagnostic stream.
    fn exception_describe(&self);

    /// `ExceptionClear`
    fn exception_clear(&self);

    // ========================================================================
    // References
    // ========================================================================

    /// `NewLocalRef`
    fn new_local_ref(&self, obj: RawRef) -> Option<RawRef>;

    /// `DeleteLocalRef`
    fn delete_local_ref(&self, obj: RawRef);

    /// `NewGlobalRef`
    fn new_global_ref(&self, obj: RawRef) -> Option<RawRef>;

    /// `DeleteGlobalRef`
    fn delete_global_ref(&self, obj: RawRef);

    /// `IsSameObject`
    fn is_same_object(&self, a: Option<RawRef>, b: Option<RawRef>) -> bool;

    // ========================================================================
    // Strings and arrays
    // ========================================================================

    /// `NewStringUTF` (modified UTF-8 input).
    fn new_string_utf(&self, text: &CStr) -> Option<RawRef>;

    /// `GetArrayLength`
    fn get_array_length(&self, array: RawRef) -> i32;

    /// `NewByteArray`
    fn new_byte_array(&self, len: i32) -> Option<RawRef>;

    /// `SetByteArrayRegion`
    fn set_byte_array_region(&self, array: RawRef, start: i32, bytes: &[i8]);

    /// `NewObjectArray`
    fn new_object_array(
        &self,
        len: i32,
        element_class: RawRef,
        init: Option<RawRef>,
    ) -> Option<RawRef>;

    /// `GetObjectArrayElement`
    fn get_object_array_element(&self, array: RawRef, index: i32) -> Option<RawRef>;

    /// `SetObjectArrayElement`
    fn set_object_array_element(&self, array: RawRef, index: i32, value: Option<RawRef>);

    /// `Get<element>ArrayElements`: pin the array's elements.
    ///
    /// The returned pointer addresses `get_array_length(array)` contiguous
    /// elements of `element` and stays valid until the matching
    /// [`Runtime::release_array_elements`].
    fn get_array_elements(&self, array: RawRef, element: ValueKind) -> Option<NonNull<c_void>>;

    /// `Release<element>ArrayElements` without copying back.
    fn release_array_elements(&self, array: RawRef, element: ValueKind, elements: NonNull<c_void>);

    // ========================================================================
    // Native methods
    // ========================================================================

    /// `RegisterNatives` for a single method; returns the JNI status code.
    fn register_native(
        &self,
        class: RawRef,
        name: &CStr,
        signature: &CStr,
        fn_ptr: *mut c_void,
    ) -> i32;

    /// `UnregisterNatives`; returns the JNI status code.
    fn unregister_natives(&self, class: RawRef) -> i32;
}
