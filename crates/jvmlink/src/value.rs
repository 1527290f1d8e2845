//! Raw values crossing the call interface
//!
//! `RawRef`, `MethodId` and `FieldId` are the opaque pointers handed out by
//! the foreign runtime. `JValue` is one argument cell (or one raw result)
//! in the runtime's calling convention.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

use jvmlink_types::{Kind, Type, Typed};

/// A non-null reference as handed out by the runtime.
///
/// Whether it is a local or a global reference is tracked by the owning
/// guard ([`crate::Local`] / [`crate::Global`]), not by the pointer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RawRef(NonNull<c_void>);

impl RawRef {
    /// Wrap a pointer; `None` for null.
    #[inline]
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Wrap an integer reference id (for runtimes that hand out ids).
    #[inline]
    pub fn from_addr(addr: usize) -> Option<Self> {
        Self::new(addr as *mut c_void)
    }

    /// The raw pointer.
    #[inline]
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    /// The pointer as an integer id.
    #[inline]
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl fmt::Debug for RawRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawRef({:#x})", self.addr())
    }
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name(NonNull<c_void>);

        impl $name {
            /// Wrap a pointer; `None` for null.
            #[inline]
            pub fn new(ptr: *mut c_void) -> Option<Self> {
                NonNull::new(ptr).map(Self)
            }

            /// Wrap an integer id.
            #[inline]
            pub fn from_addr(addr: usize) -> Option<Self> {
                Self::new(addr as *mut c_void)
            }

            /// The raw pointer.
            #[inline]
            pub fn as_ptr(self) -> *mut c_void {
                self.0.as_ptr()
            }

            /// The pointer as an integer id.
            #[inline]
            pub fn addr(self) -> usize {
                self.0.as_ptr() as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#x})"), self.addr())
            }
        }
    };
}

opaque_id!(
    /// Resolved method identifier. Not reference counted.
    MethodId
);

opaque_id!(
    /// Resolved field identifier. Not reference counted.
    FieldId
);

/// Which entry point of the call matrix a value travels through.
///
/// Class and array results share the `Object` entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `Call*VoidMethodA`
    Void,
    /// `jboolean`
    Boolean,
    /// `jbyte`
    Byte,
    /// `jchar`
    Char,
    /// `jshort`
    Short,
    /// `jint`
    Int,
    /// `jlong`
    Long,
    /// `jfloat`
    Float,
    /// `jdouble`
    Double,
    /// `jobject`
    Object,
}

impl ValueKind {
    /// Entry point for a declared type.
    pub fn of(ty: &Type) -> Self {
        Self::from(ty.kind())
    }
}

impl From<Kind> for ValueKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Void => ValueKind::Void,
            Kind::Boolean => ValueKind::Boolean,
            Kind::Byte => ValueKind::Byte,
            Kind::Char => ValueKind::Char,
            Kind::Short => ValueKind::Short,
            Kind::Int => ValueKind::Int,
            Kind::Long => ValueKind::Long,
            Kind::Float => ValueKind::Float,
            Kind::Double => ValueKind::Double,
            Kind::Class | Kind::Array => ValueKind::Object,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Void => "void",
            ValueKind::Boolean => "boolean",
            ValueKind::Byte => "byte",
            ValueKind::Char => "char",
            ValueKind::Short => "short",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// `jboolean` false sentinel.
pub const JNI_FALSE: u8 = 0;
/// `jboolean` true value written by the host.
pub const JNI_TRUE: u8 = 1;

/// One argument cell or raw result.
///
/// Booleans keep the runtime's byte representation; the dispatcher maps
/// the false sentinel to `false` and everything else to `true`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JValue {
    /// No value
    Void,
    /// `jboolean`
    Boolean(u8),
    /// `jbyte`
    Byte(i8),
    /// `jchar`
    Char(u16),
    /// `jshort`
    Short(i16),
    /// `jint`
    Int(i32),
    /// `jlong`
    Long(i64),
    /// `jfloat`
    Float(f32),
    /// `jdouble`
    Double(f64),
    /// `jobject`, possibly null
    Object(Option<RawRef>),
}

impl JValue {
    /// Host boolean as a cell.
    pub fn from_bool(b: bool) -> Self {
        JValue::Boolean(if b { JNI_TRUE } else { JNI_FALSE })
    }

    /// The entry point this value belongs to.
    pub fn kind(&self) -> ValueKind {
        match self {
            JValue::Void => ValueKind::Void,
            JValue::Boolean(_) => ValueKind::Boolean,
            JValue::Byte(_) => ValueKind::Byte,
            JValue::Char(_) => ValueKind::Char,
            JValue::Short(_) => ValueKind::Short,
            JValue::Int(_) => ValueKind::Int,
            JValue::Long(_) => ValueKind::Long,
            JValue::Float(_) => ValueKind::Float,
            JValue::Double(_) => ValueKind::Double,
            JValue::Object(_) => ValueKind::Object,
        }
    }

    /// Zero value for a kind; what a runtime reports when a call threw.
    pub fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Void => JValue::Void,
            ValueKind::Boolean => JValue::Boolean(JNI_FALSE),
            ValueKind::Byte => JValue::Byte(0),
            ValueKind::Char => JValue::Char(0),
            ValueKind::Short => JValue::Short(0),
            ValueKind::Int => JValue::Int(0),
            ValueKind::Long => JValue::Long(0),
            ValueKind::Float => JValue::Float(0.0),
            ValueKind::Double => JValue::Double(0.0),
            ValueKind::Object => JValue::Object(None),
        }
    }
}
