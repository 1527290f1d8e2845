//! Call dispatch
//!
//! One generic path serves every cell of the call matrix: resolve the
//! member, marshal the arguments, call through the entry point selected by
//! the return kind, check and clear exceptions, release the temporaries,
//! then convert the raw result with [`FromJava`].

use jvmlink_types::{SignatureError, Type, Typed};
use log::trace;

use crate::args::Arg;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::handle::{Local, Object};
use crate::resolve::Target;
use crate::value::{JValue, ValueKind, JNI_FALSE};

/// A host type a JVM result converts into.
pub trait FromJava: Sized {
    /// Return type used to compute the descriptor.
    fn declared_type() -> Type;

    /// Convert a raw result.
    fn from_java(env: &Environment, value: JValue) -> Result<Self>;
}

fn mismatch(expected: ValueKind, value: JValue) -> Error {
    Error::ValueMismatch {
        expected,
        found: value.kind(),
    }
}

impl FromJava for () {
    fn declared_type() -> Type {
        Type::Void
    }

    fn from_java(_env: &Environment, value: JValue) -> Result<Self> {
        match value {
            JValue::Void => Ok(()),
            other => Err(mismatch(ValueKind::Void, other)),
        }
    }
}

impl FromJava for bool {
    fn declared_type() -> Type {
        Type::Boolean
    }

    fn from_java(_env: &Environment, value: JValue) -> Result<Self> {
        match value {
            JValue::Boolean(b) => Ok(b != JNI_FALSE),
            other => Err(mismatch(ValueKind::Boolean, other)),
        }
    }
}

macro_rules! scalar_from_java {
    ($($host:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromJava for $host {
                fn declared_type() -> Type {
                    Type::$variant
                }

                fn from_java(_env: &Environment, value: JValue) -> Result<Self> {
                    match value {
                        JValue::$variant(v) => Ok(v),
                        other => Err(mismatch(ValueKind::$variant, other)),
                    }
                }
            }
        )*
    };
}

scalar_from_java! {
    i8 => Byte,
    u16 => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
}

/// `java.lang.String`; `None` when the JVM returned null.
impl FromJava for Option<String> {
    fn declared_type() -> Type {
        Type::string()
    }

    fn from_java(env: &Environment, value: JValue) -> Result<Self> {
        let string = env.object_result(value)?;
        env.to_string(string.as_deref())
    }
}

/// `int[]`; a null array reads as empty.
impl FromJava for Vec<i32> {
    fn declared_type() -> Type {
        Type::array(Type::Int)
    }

    fn from_java(env: &Environment, value: JValue) -> Result<Self> {
        match env.object_result(value)? {
            Some(array) => env.to_int_array(&array),
            None => Ok(Vec::new()),
        }
    }
}

/// `long[]`; a null array reads as empty.
impl FromJava for Vec<i64> {
    fn declared_type() -> Type {
        Type::array(Type::Long)
    }

    fn from_java(env: &Environment, value: JValue) -> Result<Self> {
        match env.object_result(value)? {
            Some(array) => env.to_long_array(&array),
            None => Ok(Vec::new()),
        }
    }
}

/// `byte[]`; a null array reads as empty.
impl FromJava for Vec<u8> {
    fn declared_type() -> Type {
        Type::array(Type::Byte)
    }

    fn from_java(env: &Environment, value: JValue) -> Result<Self> {
        match env.object_result(value)? {
            Some(array) => env.to_byte_array(&array),
            None => Ok(Vec::new()),
        }
    }
}

fn require_reference(ty: &Type) -> Result<()> {
    if ty.kind().is_reference() {
        Ok(())
    } else {
        Err(SignatureError::NotAReference {
            found: ty.type_string(),
        }
        .into())
    }
}

impl Environment {
    /// Resolve, marshal, call and check; the raw result is returned.
    pub(crate) fn invoke(
        &self,
        target: Target<'_>,
        is_static: bool,
        name: &str,
        ret: &Type,
        args: &[Arg<'_>],
    ) -> Result<JValue> {
        trace!("invoke {} (static: {}, {} args)", name, is_static, args.len());
        let method = self.resolve_method(target, is_static, name, ret, args)?;
        let list = self.marshal(args)?;
        let value = self.runtime().call_method(
            ValueKind::of(ret),
            method.target,
            method.id,
            is_static,
            list.cells(),
        );
        let outcome = self.check_exception();
        drop(list);
        outcome.map(|()| value)
    }

    /// Call a method returning a host-convertible value.
    pub(crate) fn call<R: FromJava>(
        &self,
        target: Target<'_>,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<R> {
        let value = self.invoke(target, is_static, name, &R::declared_type(), args)?;
        R::from_java(self, value)
    }

    /// Call a method returning a reference of type `ret`.
    pub(crate) fn call_object(
        &self,
        target: Target<'_>,
        is_static: bool,
        name: &str,
        ret: &Type,
        args: &[Arg<'_>],
    ) -> Result<Option<Local<Object>>> {
        require_reference(ret)?;
        let value = self.invoke(target, is_static, name, ret, args)?;
        self.object_result(value)
    }

    /// Call a method returning an array of `element` references.
    pub(crate) fn call_object_array(
        &self,
        target: Target<'_>,
        is_static: bool,
        name: &str,
        element: &Type,
        args: &[Arg<'_>],
    ) -> Result<Vec<Option<Local<Object>>>> {
        require_reference(element)?;
        let array = self.call_object(target, is_static, name, &Type::array(element.clone()), args)?;
        self.to_object_array(array.as_deref())
    }

    /// Take ownership of a reference result.
    pub(crate) fn object_result(&self, value: JValue) -> Result<Option<Local<Object>>> {
        match value {
            JValue::Object(raw) => Ok(raw.map(|raw| Local::new(self.runtime().clone(), raw))),
            other => Err(mismatch(ValueKind::Object, other)),
        }
    }

    // ========================================================================
    // Fields
    // ========================================================================

    fn read_field(
        &self,
        target: Target<'_>,
        is_static: bool,
        name: &str,
        ty: &Type,
    ) -> Result<JValue> {
        let field = self.resolve_field(target, is_static, name, ty)?;
        let value = self
            .runtime()
            .get_field(ValueKind::of(ty), field.target, field.id, is_static);
        self.check_exception()?;
        Ok(value)
    }

    /// Read a field as a host-convertible value.
    pub(crate) fn get_field<R: FromJava>(
        &self,
        target: Target<'_>,
        is_static: bool,
        name: &str,
    ) -> Result<R> {
        let value = self.read_field(target, is_static, name, &R::declared_type())?;
        R::from_java(self, value)
    }

    /// Read a reference field of type `ty`.
    pub(crate) fn get_object_field(
        &self,
        target: Target<'_>,
        is_static: bool,
        name: &str,
        ty: &Type,
    ) -> Result<Option<Local<Object>>> {
        require_reference(ty)?;
        let value = self.read_field(target, is_static, name, ty)?;
        self.object_result(value)
    }

    /// Write a field of type `ty`.
    pub(crate) fn set_field(
        &self,
        target: Target<'_>,
        is_static: bool,
        name: &str,
        ty: &Type,
        value: JValue,
    ) -> Result<()> {
        if ValueKind::of(ty) != value.kind() {
            return Err(mismatch(ValueKind::of(ty), value));
        }
        let field = self.resolve_field(target, is_static, name, ty)?;
        self.runtime()
            .set_field(field.target, field.id, is_static, value);
        self.check_exception()
    }
}
