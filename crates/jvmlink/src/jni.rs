//! JNI backend
//!
//! [`JniRuntime`] implements [`Runtime`] by calling through the raw JNI
//! function table. Creating the JVM and attaching threads is left to the
//! host; this type only wraps a `JNIEnv*` it is handed.

use std::ffi::{c_void, CStr};
use std::ptr::{self, NonNull};

use jni_sys::{jarray, jclass, jfieldID, jmethodID, jobject, jvalue, JNIEnv, JNINativeMethod};

use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::value::{FieldId, JValue, MethodId, RawRef, ValueKind, JNI_FALSE};

/// Call a JNI table entry; `None` if the entry is missing.
macro_rules! jni {
    ($self:ident, $name:ident $(, $arg:expr)* $(,)?) => {
        // SAFETY: `env` was checked non-null in `from_raw` and stays valid
        // for the attachment's lifetime; arguments are live references of
        // this attachment per the `Runtime` contract.
        unsafe { ((**$self.env).$name).map(|f| f($self.env $(, $arg)*)) }
    };
}

/// Fail `from_raw` if any listed table entry is missing.
macro_rules! require_entries {
    ($table:expr, $($name:ident),* $(,)?) => {
        $(
            if $table.$name.is_none() {
                return Err(Error::IncompleteFunctionTable(stringify!($name)));
            }
        )*
    };
}

/// A `JNIEnv*` as a [`Runtime`].
///
/// `!Send`: a `JNIEnv*` is only valid on the thread it belongs to.
pub struct JniRuntime {
    env: *mut JNIEnv,
}

impl JniRuntime {
    /// Wrap an attached thread's `JNIEnv*`.
    ///
    /// Fails if the pointer is null or the function table lacks an entry
    /// the binding uses.
    ///
    /// # Safety
    /// `env` must be the `JNIEnv*` of the current thread and stay valid for
    /// as long as the returned value (and every environment built on it)
    /// is used.
    pub unsafe fn from_raw(env: *mut JNIEnv) -> Result<Self> {
        if env.is_null() || (*env).is_null() {
            return Err(Error::IncompleteFunctionTable("JNIEnv"));
        }
        let table = &**env;
        require_entries!(
            table,
            FindClass,
            GetObjectClass,
            GetMethodID,
            GetStaticMethodID,
            GetFieldID,
            GetStaticFieldID,
            NewObjectA,
            ExceptionCheck,
            ExceptionOccurred,
            ExceptionDescribe,
            ExceptionClear,
            NewLocalRef,
            DeleteLocalRef,
            NewGlobalRef,
            DeleteGlobalRef,
            IsSameObject,
            NewStringUTF,
            GetArrayLength,
            NewByteArray,
            SetByteArrayRegion,
            NewObjectArray,
            GetObjectArrayElement,
            SetObjectArrayElement,
            RegisterNatives,
            UnregisterNatives,
        );
        Ok(Self { env })
    }

    /// The wrapped `JNIEnv*`.
    pub fn as_raw(&self) -> *mut JNIEnv {
        self.env
    }
}

fn obj(r: RawRef) -> jobject {
    r.as_ptr().cast()
}

fn opt_obj(r: Option<RawRef>) -> jobject {
    r.map_or(ptr::null_mut(), obj)
}

fn raw(o: jobject) -> Option<RawRef> {
    RawRef::new(o.cast())
}

fn cell(value: &JValue) -> jvalue {
    match *value {
        JValue::Void => jvalue { j: 0 },
        JValue::Boolean(z) => jvalue { z },
        JValue::Byte(b) => jvalue { b },
        JValue::Char(c) => jvalue { c },
        JValue::Short(s) => jvalue { s },
        JValue::Int(i) => jvalue { i },
        JValue::Long(j) => jvalue { j },
        JValue::Float(f) => jvalue { f },
        JValue::Double(d) => jvalue { d },
        JValue::Object(l) => jvalue { l: opt_obj(l) },
    }
}

impl Runtime for JniRuntime {
    fn find_class(&self, path: &CStr) -> Option<RawRef> {
        jni!(self, FindClass, path.as_ptr()).and_then(raw)
    }

    fn get_object_class(&self, o: RawRef) -> Option<RawRef> {
        jni!(self, GetObjectClass, obj(o)).and_then(raw)
    }

    fn get_method_id(
        &self,
        class: RawRef,
        name: &CStr,
        signature: &CStr,
        is_static: bool,
    ) -> Option<MethodId> {
        let class: jclass = obj(class);
        let id = if is_static {
            jni!(self, GetStaticMethodID, class, name.as_ptr(), signature.as_ptr())
        } else {
            jni!(self, GetMethodID, class, name.as_ptr(), signature.as_ptr())
        };
        id.and_then(|id| MethodId::new(id.cast()))
    }

    fn get_field_id(
        &self,
        class: RawRef,
        name: &CStr,
        signature: &CStr,
        is_static: bool,
    ) -> Option<FieldId> {
        let class: jclass = obj(class);
        let id = if is_static {
            jni!(self, GetStaticFieldID, class, name.as_ptr(), signature.as_ptr())
        } else {
            jni!(self, GetFieldID, class, name.as_ptr(), signature.as_ptr())
        };
        id.and_then(|id| FieldId::new(id.cast()))
    }

    fn call_method(
        &self,
        kind: ValueKind,
        target: RawRef,
        method: MethodId,
        is_static: bool,
        args: &[JValue],
    ) -> JValue {
        let target = obj(target);
        let method: jmethodID = method.as_ptr().cast();
        let cells: Vec<jvalue> = args.iter().map(cell).collect();
        let argv = cells.as_ptr();

        macro_rules! call {
            ($instance:ident, $static_:ident) => {
                if is_static {
                    jni!(self, $static_, target, method, argv)
                } else {
                    jni!(self, $instance, target, method, argv)
                }
            };
        }

        match kind {
            ValueKind::Void => {
                call!(CallVoidMethodA, CallStaticVoidMethodA);
                JValue::Void
            }
            ValueKind::Boolean => JValue::Boolean(
                call!(CallBooleanMethodA, CallStaticBooleanMethodA).unwrap_or(JNI_FALSE),
            ),
            ValueKind::Byte => {
                JValue::Byte(call!(CallByteMethodA, CallStaticByteMethodA).unwrap_or(0))
            }
            ValueKind::Char => {
                JValue::Char(call!(CallCharMethodA, CallStaticCharMethodA).unwrap_or(0))
            }
            ValueKind::Short => {
                JValue::Short(call!(CallShortMethodA, CallStaticShortMethodA).unwrap_or(0))
            }
            ValueKind::Int => JValue::Int(call!(CallIntMethodA, CallStaticIntMethodA).unwrap_or(0)),
            ValueKind::Long => {
                JValue::Long(call!(CallLongMethodA, CallStaticLongMethodA).unwrap_or(0))
            }
            ValueKind::Float => {
                JValue::Float(call!(CallFloatMethodA, CallStaticFloatMethodA).unwrap_or(0.0))
            }
            ValueKind::Double => {
                JValue::Double(call!(CallDoubleMethodA, CallStaticDoubleMethodA).unwrap_or(0.0))
            }
            ValueKind::Object => {
                JValue::Object(call!(CallObjectMethodA, CallStaticObjectMethodA).and_then(raw))
            }
        }
    }

    fn new_object(&self, class: RawRef, ctor: MethodId, args: &[JValue]) -> Option<RawRef> {
        let cells: Vec<jvalue> = args.iter().map(cell).collect();
        let ctor: jmethodID = ctor.as_ptr().cast();
        jni!(self, NewObjectA, obj(class), ctor, cells.as_ptr()).and_then(raw)
    }

    fn get_field(
        &self,
        kind: ValueKind,
        target: RawRef,
        field: FieldId,
        is_static: bool,
    ) -> JValue {
        let target = obj(target);
        let field: jfieldID = field.as_ptr().cast();

        macro_rules! get {
            ($instance:ident, $static_:ident) => {
                if is_static {
                    jni!(self, $static_, target, field)
                } else {
                    jni!(self, $instance, target, field)
                }
            };
        }

        match kind {
            ValueKind::Void => JValue::Void,
            ValueKind::Boolean => JValue::Boolean(
                get!(GetBooleanField, GetStaticBooleanField).unwrap_or(JNI_FALSE),
            ),
            ValueKind::Byte => JValue::Byte(get!(GetByteField, GetStaticByteField).unwrap_or(0)),
            ValueKind::Char => JValue::Char(get!(GetCharField, GetStaticCharField).unwrap_or(0)),
            ValueKind::Short => {
                JValue::Short(get!(GetShortField, GetStaticShortField).unwrap_or(0))
            }
            ValueKind::Int => JValue::Int(get!(GetIntField, GetStaticIntField).unwrap_or(0)),
            ValueKind::Long => JValue::Long(get!(GetLongField, GetStaticLongField).unwrap_or(0)),
            ValueKind::Float => {
                JValue::Float(get!(GetFloatField, GetStaticFloatField).unwrap_or(0.0))
            }
            ValueKind::Double => {
                JValue::Double(get!(GetDoubleField, GetStaticDoubleField).unwrap_or(0.0))
            }
            ValueKind::Object => {
                JValue::Object(get!(GetObjectField, GetStaticObjectField).and_then(raw))
            }
        }
    }

    fn set_field(&self, target: RawRef, field: FieldId, is_static: bool, value: JValue) {
        let target = obj(target);
        let field: jfieldID = field.as_ptr().cast();

        macro_rules! set {
            ($instance:ident, $static_:ident, $value:expr) => {
                if is_static {
                    jni!(self, $static_, target, field, $value);
                } else {
                    jni!(self, $instance, target, field, $value);
                }
            };
        }

        match value {
            JValue::Void => {}
            JValue::Boolean(z) => set!(SetBooleanField, SetStaticBooleanField, z),
            JValue::Byte(b) => set!(SetByteField, SetStaticByteField, b),
            JValue::Char(c) => set!(SetCharField, SetStaticCharField, c),
            JValue::Short(s) => set!(SetShortField, SetStaticShortField, s),
            JValue::Int(i) => set!(SetIntField, SetStaticIntField, i),
            JValue::Long(j) => set!(SetLongField, SetStaticLongField, j),
            JValue::Float(f) => set!(SetFloatField, SetStaticFloatField, f),
            JValue::Double(d) => set!(SetDoubleField, SetStaticDoubleField, d),
            JValue::Object(l) => set!(SetObjectField, SetStaticObjectField, opt_obj(l)),
        }
    }

    fn exception_check(&self) -> bool {
        jni!(self, ExceptionCheck).is_some_and(|pending| pending != JNI_FALSE)
    }

    fn exception_occurred(&self) -> Option<RawRef> {
        jni!(self, ExceptionOccurred).and_then(raw)
    }

    fn exception_describe(&self) {
        jni!(self, ExceptionDescribe);
    }

    fn exception_clear(&self) {
        jni!(self, ExceptionClear);
    }

    fn new_local_ref(&self, o: RawRef) -> Option<RawRef> {
        jni!(self, NewLocalRef, obj(o)).and_then(raw)
    }

    fn delete_local_ref(&self, o: RawRef) {
        jni!(self, DeleteLocalRef, obj(o));
    }

    fn new_global_ref(&self, o: RawRef) -> Option<RawRef> {
        jni!(self, NewGlobalRef, obj(o)).and_then(raw)
    }

    fn delete_global_ref(&self, o: RawRef) {
        jni!(self, DeleteGlobalRef, obj(o));
    }

    fn is_same_object(&self, a: Option<RawRef>, b: Option<RawRef>) -> bool {
        jni!(self, IsSameObject, opt_obj(a), opt_obj(b)).is_some_and(|same| same != JNI_FALSE)
    }

    fn new_string_utf(&self, text: &CStr) -> Option<RawRef> {
        jni!(self, NewStringUTF, text.as_ptr()).and_then(raw)
    }

    fn get_array_length(&self, array: RawRef) -> i32 {
        let array: jarray = obj(array);
        jni!(self, GetArrayLength, array).unwrap_or(0)
    }

    fn new_byte_array(&self, len: i32) -> Option<RawRef> {
        jni!(self, NewByteArray, len).and_then(raw)
    }

    fn set_byte_array_region(&self, array: RawRef, start: i32, bytes: &[i8]) {
        let Ok(len) = i32::try_from(bytes.len()) else {
            return;
        };
        jni!(self, SetByteArrayRegion, obj(array), start, len, bytes.as_ptr());
    }

    fn new_object_array(
        &self,
        len: i32,
        element_class: RawRef,
        init: Option<RawRef>,
    ) -> Option<RawRef> {
        jni!(self, NewObjectArray, len, obj(element_class), opt_obj(init)).and_then(raw)
    }

    fn get_object_array_element(&self, array: RawRef, index: i32) -> Option<RawRef> {
        jni!(self, GetObjectArrayElement, obj(array), index).and_then(raw)
    }

    fn set_object_array_element(&self, array: RawRef, index: i32, value: Option<RawRef>) {
        jni!(self, SetObjectArrayElement, obj(array), index, opt_obj(value));
    }

    fn get_array_elements(&self, array: RawRef, element: ValueKind) -> Option<NonNull<c_void>> {
        let array = obj(array);
        let is_copy = ptr::null_mut();
        let elements: Option<*mut c_void> = match element {
            ValueKind::Boolean => {
                jni!(self, GetBooleanArrayElements, array, is_copy).map(|p| p.cast())
            }
            ValueKind::Byte => jni!(self, GetByteArrayElements, array, is_copy).map(|p| p.cast()),
            ValueKind::Char => jni!(self, GetCharArrayElements, array, is_copy).map(|p| p.cast()),
            ValueKind::Short => {
                jni!(self, GetShortArrayElements, array, is_copy).map(|p| p.cast())
            }
            ValueKind::Int => jni!(self, GetIntArrayElements, array, is_copy).map(|p| p.cast()),
            ValueKind::Long => jni!(self, GetLongArrayElements, array, is_copy).map(|p| p.cast()),
            ValueKind::Float => {
                jni!(self, GetFloatArrayElements, array, is_copy).map(|p| p.cast())
            }
            ValueKind::Double => {
                jni!(self, GetDoubleArrayElements, array, is_copy).map(|p| p.cast())
            }
            ValueKind::Void | ValueKind::Object => None,
        };
        elements.and_then(NonNull::new)
    }

    fn release_array_elements(&self, array: RawRef, element: ValueKind, elements: NonNull<c_void>) {
        let array = obj(array);
        let p = elements.as_ptr();
        let mode = jni_sys::JNI_ABORT;
        match element {
            ValueKind::Boolean => {
                jni!(self, ReleaseBooleanArrayElements, array, p.cast(), mode);
            }
            ValueKind::Byte => {
                jni!(self, ReleaseByteArrayElements, array, p.cast(), mode);
            }
            ValueKind::Char => {
                jni!(self, ReleaseCharArrayElements, array, p.cast(), mode);
            }
            ValueKind::Short => {
                jni!(self, ReleaseShortArrayElements, array, p.cast(), mode);
            }
            ValueKind::Int => {
                jni!(self, ReleaseIntArrayElements, array, p.cast(), mode);
            }
            ValueKind::Long => {
                jni!(self, ReleaseLongArrayElements, array, p.cast(), mode);
            }
            ValueKind::Float => {
                jni!(self, ReleaseFloatArrayElements, array, p.cast(), mode);
            }
            ValueKind::Double => {
                jni!(self, ReleaseDoubleArrayElements, array, p.cast(), mode);
            }
            ValueKind::Void | ValueKind::Object => {}
        }
    }

    fn register_native(
        &self,
        class: RawRef,
        name: &CStr,
        signature: &CStr,
        fn_ptr: *mut c_void,
    ) -> i32 {
        let method = JNINativeMethod {
            name: name.as_ptr().cast_mut(),
            signature: signature.as_ptr().cast_mut(),
            fnPtr: fn_ptr,
        };
        jni!(self, RegisterNatives, obj(class), &method, 1).unwrap_or(jni_sys::JNI_ERR)
    }

    fn unregister_natives(&self, class: RawRef) -> i32 {
        jni!(self, UnregisterNatives, obj(class)).unwrap_or(jni_sys::JNI_ERR)
    }
}
