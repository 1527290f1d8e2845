//! The call matrix
//!
//! Every method return kind and field kind is reachable from both a
//! [`Class`] and an [`Object`] through the [`Receiver`] trait. The
//! `is_static` flag picks the static or instance flavour; see
//! [`crate::resolve`] for what each combination resolves against.
//!
//! ```ignore
//! use jvmlink::prelude::*;
//!
//! let system = env.get_class_str("java.lang.System")?;
//! let now = system.call_long(&env, true, "currentTimeMillis", &[])?;
//!
//! let list = env.new_instance_str("java.util.ArrayList", &[])?;
//! list.call_boolean(&env, false, "add", &[Arg::as_object(&some_string)])?;
//! let size = list.call_int(&env, false, "size", &[])?;
//! ```

use jvmlink_types::Type;

use crate::args::Arg;
use crate::dispatch::FromJava;
use crate::env::Environment;
use crate::error::Result;
use crate::handle::{Class, Local, Object};
use crate::resolve::Target;
use crate::value::JValue;

/// Something methods can be called on and fields read from.
pub trait Receiver {
    /// The dispatch target.
    fn target(&self) -> Target<'_>;

    /// Call a method whose result converts to `R`.
    fn call<R: FromJava>(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<R> {
        env.call(self.target(), is_static, name, args)
    }

    /// `void` method.
    fn call_void(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<()> {
        self.call(env, is_static, name, args)
    }

    /// `boolean` method.
    fn call_boolean(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<bool> {
        self.call(env, is_static, name, args)
    }

    /// `byte` method.
    fn call_byte(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<i8> {
        self.call(env, is_static, name, args)
    }

    /// `char` method.
    fn call_char(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<u16> {
        self.call(env, is_static, name, args)
    }

    /// `short` method.
    fn call_short(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<i16> {
        self.call(env, is_static, name, args)
    }

    /// `int` method.
    fn call_int(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<i32> {
        self.call(env, is_static, name, args)
    }

    /// `long` method.
    fn call_long(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<i64> {
        self.call(env, is_static, name, args)
    }

    /// `float` method.
    fn call_float(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<f32> {
        self.call(env, is_static, name, args)
    }

    /// `double` method.
    fn call_double(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<f64> {
        self.call(env, is_static, name, args)
    }

    /// Method returning a reference of type `ret`.
    fn call_object(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        ret: &Type,
        args: &[Arg<'_>],
    ) -> Result<Option<Local<Object>>> {
        env.call_object(self.target(), is_static, name, ret, args)
    }

    /// Method returning `java.lang.String`; `None` for null.
    fn call_string(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<Option<String>> {
        self.call(env, is_static, name, args)
    }

    /// Method returning `int[]`.
    fn call_int_array(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<Vec<i32>> {
        self.call(env, is_static, name, args)
    }

    /// Method returning `long[]`.
    fn call_long_array(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        args: &[Arg<'_>],
    ) -> Result<Vec<i64>> {
        self.call(env, is_static, name, args)
    }

    /// Method returning an array of `element` references.
    fn call_object_array(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        element: &Type,
        args: &[Arg<'_>],
    ) -> Result<Vec<Option<Local<Object>>>> {
        env.call_object_array(self.target(), is_static, name, element, args)
    }

    // ========================================================================
    // Fields
    // ========================================================================

    /// Read a field whose value converts to `R`.
    fn get_field<R: FromJava>(&self, env: &Environment, is_static: bool, name: &str) -> Result<R> {
        env.get_field(self.target(), is_static, name)
    }

    /// `boolean` field.
    fn get_boolean_field(&self, env: &Environment, is_static: bool, name: &str) -> Result<bool> {
        self.get_field(env, is_static, name)
    }

    /// `short` field.
    fn get_short_field(&self, env: &Environment, is_static: bool, name: &str) -> Result<i16> {
        self.get_field(env, is_static, name)
    }

    /// `int` field.
    fn get_int_field(&self, env: &Environment, is_static: bool, name: &str) -> Result<i32> {
        self.get_field(env, is_static, name)
    }

    /// `long` field.
    fn get_long_field(&self, env: &Environment, is_static: bool, name: &str) -> Result<i64> {
        self.get_field(env, is_static, name)
    }

    /// `float` field.
    fn get_float_field(&self, env: &Environment, is_static: bool, name: &str) -> Result<f32> {
        self.get_field(env, is_static, name)
    }

    /// `double` field.
    fn get_double_field(&self, env: &Environment, is_static: bool, name: &str) -> Result<f64> {
        self.get_field(env, is_static, name)
    }

    /// `java.lang.String` field; `None` for null.
    fn get_string_field(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
    ) -> Result<Option<String>> {
        self.get_field(env, is_static, name)
    }

    /// `int[]` field; a null array reads as empty.
    fn get_int_array_field(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
    ) -> Result<Vec<i32>> {
        self.get_field(env, is_static, name)
    }

    /// `long[]` field; a null array reads as empty.
    fn get_long_array_field(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
    ) -> Result<Vec<i64>> {
        self.get_field(env, is_static, name)
    }

    /// Reference field of type `ty`.
    fn get_object_field(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        ty: &Type,
    ) -> Result<Option<Local<Object>>> {
        env.get_object_field(self.target(), is_static, name, ty)
    }

    /// Write `boolean` field.
    fn set_boolean_field(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        value: bool,
    ) -> Result<()> {
        env.set_field(self.target(), is_static, name, &Type::Boolean, JValue::from_bool(value))
    }

    /// Write `short` field.
    fn set_short_field(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        value: i16,
    ) -> Result<()> {
        env.set_field(self.target(), is_static, name, &Type::Short, JValue::Short(value))
    }

    /// Write `int` field.
    fn set_int_field(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        value: i32,
    ) -> Result<()> {
        env.set_field(self.target(), is_static, name, &Type::Int, JValue::Int(value))
    }

    /// Write `long` field.
    fn set_long_field(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        value: i64,
    ) -> Result<()> {
        env.set_field(self.target(), is_static, name, &Type::Long, JValue::Long(value))
    }

    /// Write `float` field.
    fn set_float_field(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        value: f32,
    ) -> Result<()> {
        env.set_field(self.target(), is_static, name, &Type::Float, JValue::Float(value))
    }

    /// Write `double` field.
    fn set_double_field(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        value: f64,
    ) -> Result<()> {
        env.set_field(self.target(), is_static, name, &Type::Double, JValue::Double(value))
    }

    /// Write a reference field of type `ty`; `None` stores null.
    fn set_object_field(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        ty: &Type,
        value: Option<&Object>,
    ) -> Result<()> {
        env.set_field(
            self.target(),
            is_static,
            name,
            ty,
            JValue::Object(value.map(Object::as_raw)),
        )
    }

    /// Write a `java.lang.String` field from host text.
    fn set_string_field(
        &self,
        env: &Environment,
        is_static: bool,
        name: &str,
        value: &str,
    ) -> Result<()> {
        let string = env.new_string_object(value)?;
        self.set_object_field(env, is_static, name, &Type::string(), Some(&*string))
    }
}

impl Receiver for Class {
    fn target(&self) -> Target<'_> {
        Target::Class(self)
    }
}

impl Receiver for Object {
    fn target(&self) -> Target<'_> {
        Target::Object(self)
    }
}

impl Class {
    /// The class's name as reported by `Class.getName()`.
    pub fn name(&self, env: &Environment) -> Result<String> {
        env.class_name(self)
    }

    /// Construct an instance of this class.
    pub fn new_instance(&self, env: &Environment, args: &[Arg<'_>]) -> Result<Local<Object>> {
        env.construct(self, args)
    }
}

impl Object {
    /// The object's runtime class.
    pub fn object_class(&self, env: &Environment) -> Result<Local<Class>> {
        env.get_object_class(self)
    }

    /// Name of the object's runtime class.
    pub fn name(&self, env: &Environment) -> Result<String> {
        let class = env.get_object_class(self)?;
        env.class_name(&class)
    }

    /// The object's `toString()`; `None` when it returned null.
    pub fn to_java_string(&self, env: &Environment) -> Result<Option<String>> {
        self.call_string(env, false, "toString", &[])
    }
}

impl Environment {
    /// `getName()` of a class.
    pub(crate) fn class_name(&self, class: &Class) -> Result<String> {
        let name = class
            .as_object()
            .call_string(self, false, "getName", &[])?
            .unwrap_or_default();
        Ok(name)
    }
}

