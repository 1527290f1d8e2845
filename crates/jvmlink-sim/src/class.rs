//! Class definitions
//!
//! Classes are described with a [`ClassBuilder`] and loaded with
//! [`crate::SimVm::define`]. Method bodies are plain closures over a
//! [`Frame`]; a method declared with [`ClassBuilder::native_method`] has no
//! body and must be bound with `RegisterNatives` before it can be called.

use std::sync::Arc;

use jvmlink_types::{MethodSignature, Type, TypeName};

use crate::error::SimError;
use crate::frame::Frame;
use crate::value::{SimValue, Thrown};

/// Body of a simulated method: receives the frame and the arguments.
pub type MethodBody =
    Arc<dyn Fn(&mut Frame<'_>, &[SimValue]) -> Result<SimValue, Thrown> + Send + Sync>;

/// Initial value of a static field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInit {
    /// Zero value of the field type
    Default,
    /// A primitive value
    Value(SimValue),
    /// A new `java.lang.String`
    Str(String),
    /// A new `int[]`
    IntArray(Vec<i32>),
    /// A new `long[]`
    LongArray(Vec<i64>),
    /// A new `byte[]`
    Bytes(Vec<u8>),
}

#[derive(Clone)]
pub(crate) struct MethodDef {
    pub(crate) name: String,
    pub(crate) descriptor: String,
    pub(crate) signature: MethodSignature,
    pub(crate) is_static: bool,
    pub(crate) body: Option<MethodBody>,
}

#[derive(Debug, Clone)]
pub(crate) struct FieldDef {
    pub(crate) name: String,
    pub(crate) descriptor: String,
    pub(crate) ty: Type,
    pub(crate) is_static: bool,
    pub(crate) init: FieldInit,
}

/// Describes a class to load into a [`crate::SimVm`].
///
/// ```ignore
/// vm.define(
///     ClassBuilder::new("com/example/Counter")
///         .constructor("()V", |_, _| Ok(SimValue::Void))
///         .method("answer", "()I", |_, _| Ok(SimValue::Int(42)))
///         .static_field("DATA", "[I", FieldInit::IntArray(vec![1, 2, 3])),
/// )?;
/// ```
pub struct ClassBuilder {
    pub(crate) name: TypeName,
    pub(crate) superclass: Option<TypeName>,
    pub(crate) methods: Vec<MethodDef>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) errors: Vec<SimError>,
}

impl ClassBuilder {
    /// A class extending `java.lang.Object`.
    pub fn new(name: &str) -> Self {
        Self {
            name: TypeName::new(name),
            superclass: Some(TypeName::object()),
            methods: Vec::new(),
            fields: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// `java.lang.Object` itself has no superclass.
    pub(crate) fn root(name: &str) -> Self {
        let mut builder = Self::new(name);
        builder.superclass = None;
        builder
    }

    /// Set the superclass.
    pub fn extends(mut self, name: &str) -> Self {
        self.superclass = Some(TypeName::new(name));
        self
    }

    /// The class name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    fn add_method(
        mut self,
        name: &str,
        descriptor: &str,
        is_static: bool,
        body: Option<MethodBody>,
    ) -> Self {
        match MethodSignature::parse(descriptor) {
            Ok(signature) => self.methods.push(MethodDef {
                name: name.to_string(),
                descriptor: descriptor.to_string(),
                signature,
                is_static,
                body,
            }),
            Err(err) => self.errors.push(SimError::BadDescriptor {
                member: name.to_string(),
                reason: err.to_string(),
            }),
        }
        self
    }

    /// Constructor with the given descriptor (return type `V`).
    pub fn constructor<F>(self, descriptor: &str, body: F) -> Self
    where
        F: Fn(&mut Frame<'_>, &[SimValue]) -> Result<SimValue, Thrown> + Send + Sync + 'static,
    {
        self.add_method("<init>", descriptor, false, Some(Arc::new(body)))
    }

    /// Instance method.
    pub fn method<F>(self, name: &str, descriptor: &str, body: F) -> Self
    where
        F: Fn(&mut Frame<'_>, &[SimValue]) -> Result<SimValue, Thrown> + Send + Sync + 'static,
    {
        self.add_method(name, descriptor, false, Some(Arc::new(body)))
    }

    /// Static method.
    pub fn static_method<F>(self, name: &str, descriptor: &str, body: F) -> Self
    where
        F: Fn(&mut Frame<'_>, &[SimValue]) -> Result<SimValue, Thrown> + Send + Sync + 'static,
    {
        self.add_method(name, descriptor, true, Some(Arc::new(body)))
    }

    /// Method declared `native`, without a body.
    pub fn native_method(self, name: &str, descriptor: &str, is_static: bool) -> Self {
        self.add_method(name, descriptor, is_static, None)
    }

    fn add_field(mut self, name: &str, descriptor: &str, is_static: bool, init: FieldInit) -> Self {
        match Type::parse(descriptor).and_then(|ty| ty.check_value("field").map(|()| ty)) {
            Ok(ty) => self.fields.push(FieldDef {
                name: name.to_string(),
                descriptor: descriptor.to_string(),
                ty,
                is_static,
                init,
            }),
            Err(err) => self.errors.push(SimError::BadDescriptor {
                member: name.to_string(),
                reason: err.to_string(),
            }),
        }
        self
    }

    /// Instance field, zero-initialized in every new instance.
    pub fn field(self, name: &str, descriptor: &str) -> Self {
        self.add_field(name, descriptor, false, FieldInit::Default)
    }

    /// Static field.
    pub fn static_field(self, name: &str, descriptor: &str, init: FieldInit) -> Self {
        self.add_field(name, descriptor, true, init)
    }

    /// `()V` and `(Ljava/lang/String;)V` constructors storing the message,
    /// as every throwable class declares them.
    pub fn throwable_constructors(self) -> Self {
        self.constructor("()V", |_, _| Ok(SimValue::Void))
            .constructor("(Ljava/lang/String;)V", |frame, args| {
                if let (Some(this), Some(message)) = (frame.this(), args.first()) {
                    frame.set_field(this, "detailMessage", *message);
                }
                Ok(SimValue::Void)
            })
    }
}
