//! Values of the simulated heap

use jvmlink::ValueKind;
use jvmlink_types::{Type, Typed};

/// Index of a heap object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub(crate) u32);

/// Index of a loaded class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

impl ObjId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl ClassId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A value as seen by simulated method bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimValue {
    /// No value
    Void,
    /// `boolean`
    Boolean(bool),
    /// `byte`
    Byte(i8),
    /// `char`
    Char(u16),
    /// `short`
    Short(i16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// Reference, possibly null
    Ref(Option<ObjId>),
}

impl SimValue {
    /// `null`
    pub const NULL: SimValue = SimValue::Ref(None);

    /// Zero value of a descriptor type.
    pub fn zero(ty: &Type) -> Self {
        match ty {
            Type::Void => SimValue::Void,
            Type::Boolean => SimValue::Boolean(false),
            Type::Byte => SimValue::Byte(0),
            Type::Char => SimValue::Char(0),
            Type::Short => SimValue::Short(0),
            Type::Int => SimValue::Int(0),
            Type::Long => SimValue::Long(0),
            Type::Float => SimValue::Float(0.0),
            Type::Double => SimValue::Double(0.0),
            Type::Class(_) | Type::Array(_) => SimValue::NULL,
        }
    }

    /// The call-matrix entry this value travels through.
    pub fn kind(&self) -> ValueKind {
        match self {
            SimValue::Void => ValueKind::Void,
            SimValue::Boolean(_) => ValueKind::Boolean,
            SimValue::Byte(_) => ValueKind::Byte,
            SimValue::Char(_) => ValueKind::Char,
            SimValue::Short(_) => ValueKind::Short,
            SimValue::Int(_) => ValueKind::Int,
            SimValue::Long(_) => ValueKind::Long,
            SimValue::Float(_) => ValueKind::Float,
            SimValue::Double(_) => ValueKind::Double,
            SimValue::Ref(_) => ValueKind::Object,
        }
    }

    /// True if the value can be stored in a slot of type `ty`.
    pub fn fits(&self, ty: &Type) -> bool {
        self.kind() == ValueKind::from(ty.kind())
    }

    /// The `int`, if this is one.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            SimValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The reference, if this is one.
    pub fn as_object(&self) -> Option<Option<ObjId>> {
        match self {
            SimValue::Ref(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<i32> for SimValue {
    fn from(v: i32) -> Self {
        SimValue::Int(v)
    }
}

impl From<i64> for SimValue {
    fn from(v: i64) -> Self {
        SimValue::Long(v)
    }
}

impl From<bool> for SimValue {
    fn from(v: bool) -> Self {
        SimValue::Boolean(v)
    }
}

impl From<f64> for SimValue {
    fn from(v: f64) -> Self {
        SimValue::Double(v)
    }
}

impl From<ObjId> for SimValue {
    fn from(v: ObjId) -> Self {
        SimValue::Ref(Some(v))
    }
}

/// A throwable raised by a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thrown(pub ObjId);
