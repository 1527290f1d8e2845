//! Call arguments
//!
//! An [`Arg`] is one host-side argument of a method or constructor call.
//! Its kind decides both the descriptor fragment it contributes to the
//! computed signature and how it is marshalled into an argument cell.

use jvmlink_types::{Type, TypeName};

use crate::handle::{Global, Local, Object};

/// One argument of a JVM call.
#[derive(Debug, Clone)]
pub enum Arg<'a> {
    /// `boolean`
    Boolean(bool),
    /// `byte`
    Byte(i8),
    /// `char` (a UTF-16 code unit)
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
    /// Host text, passed as a new `java.lang.String`
    Str(&'a str),
    /// Host bytes, passed as a new `byte[]`
    Bytes(&'a [u8]),
    /// An object, typed by its runtime class
    Object(&'a Object),
    /// An object passed as a declared type (e.g. an interface it implements)
    Typed(&'a Object, Type),
    /// Host list of objects, passed as a new array of the named class
    ObjectArray(&'a [&'a Object], TypeName),
    /// `null` of the given reference type
    Null(Type),
}

impl<'a> Arg<'a> {
    /// An object passed as `java.lang.Object` regardless of its runtime class.
    pub fn as_object(obj: &'a Object) -> Self {
        Arg::Typed(obj, Type::object())
    }

    /// An object passed as the named class.
    pub fn typed(obj: &'a Object, class: &str) -> Self {
        Arg::Typed(obj, Type::class(class))
    }

    /// `null` of the named class.
    pub fn null(class: &str) -> Self {
        Arg::Null(Type::class(class))
    }
}

macro_rules! arg_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Arg<'_> {
                fn from(value: $ty) -> Self {
                    Arg::$variant(value)
                }
            }
        )*
    };
}

arg_from! {
    bool => Boolean,
    i8 => Byte,
    u16 => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Str(value)
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(value: &'a String) -> Self {
        Arg::Str(value)
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(value: &'a [u8]) -> Self {
        Arg::Bytes(value)
    }
}

impl<'a> From<&'a Object> for Arg<'a> {
    fn from(value: &'a Object) -> Self {
        Arg::Object(value)
    }
}

impl<'a> From<&'a Local<Object>> for Arg<'a> {
    fn from(value: &'a Local<Object>) -> Self {
        Arg::Object(value)
    }
}

impl<'a> From<&'a Global<Object>> for Arg<'a> {
    fn from(value: &'a Global<Object>) -> Self {
        Arg::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert!(matches!(Arg::from(true), Arg::Boolean(true)));
        assert!(matches!(Arg::from(7i32), Arg::Int(7)));
        assert!(matches!(Arg::from(7i64), Arg::Long(7)));
        assert!(matches!(Arg::from(b'a' as u16), Arg::Char(97)));
        assert!(matches!(Arg::from(1.5f64), Arg::Double(_)));
    }

    #[test]
    fn test_text_and_bytes() {
        let owned = String::from("hi");
        assert!(matches!(Arg::from("hi"), Arg::Str("hi")));
        assert!(matches!(Arg::from(&owned), Arg::Str("hi")));
        let bytes: &[u8] = &[1, 2];
        assert!(matches!(Arg::from(bytes), Arg::Bytes([1, 2])));
    }

    #[test]
    fn test_null_helper() {
        match Arg::null("java.util.List") {
            Arg::Null(ty) => assert_eq!(ty.to_string(), "Ljava/util/List;"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
