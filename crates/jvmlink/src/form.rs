//! Signature computation
//!
//! The descriptor used to look up a member is derived from the arguments
//! actually passed plus the declared return type. An object argument
//! contributes its *runtime* class, so passing an object whose class is a
//! subtype of the declared parameter type needs [`Arg::Typed`].

use jvmlink_types::{MethodSignature, SignatureError, Type, Typed};

use crate::args::Arg;
use crate::env::Environment;
use crate::error::Result;
use crate::handle::Object;

impl Environment {
    /// Descriptor of a method taking `args` and returning `ret`.
    ///
    /// Fails before any member lookup if a parameter is `void` or an
    /// object's class name cannot be turned into a type.
    pub fn form_for(&self, ret: &Type, args: &[Arg<'_>]) -> Result<String> {
        let params = args
            .iter()
            .map(|arg| self.arg_type(arg))
            .collect::<Result<Vec<_>>>()?;
        let signature = MethodSignature::new(params, ret.clone())?;
        Ok(signature.to_string())
    }

    /// The parameter type an argument contributes.
    pub(crate) fn arg_type(&self, arg: &Arg<'_>) -> Result<Type> {
        let ty = match arg {
            Arg::Boolean(_) => Type::Boolean,
            Arg::Byte(_) => Type::Byte,
            Arg::Char(_) => Type::Char,
            Arg::Short(_) => Type::Short,
            Arg::Int(_) => Type::Int,
            Arg::Long(_) => Type::Long,
            Arg::Float(_) => Type::Float,
            Arg::Double(_) => Type::Double,
            Arg::Str(_) => Type::string(),
            Arg::Bytes(_) => Type::array(Type::Byte),
            Arg::Object(obj) => self.runtime_type(obj)?,
            Arg::Typed(_, ty) | Arg::Null(ty) => {
                if !ty.kind().is_reference() {
                    return Err(SignatureError::NotAReference {
                        found: ty.type_string(),
                    }
                    .into());
                }
                ty.clone()
            }
            Arg::ObjectArray(_, element) => Type::array(Type::Class(element.clone())),
        };
        Ok(ty)
    }

    /// Type of `obj`'s runtime class.
    pub(crate) fn runtime_type(&self, obj: &Object) -> Result<Type> {
        let class = self.get_object_class(obj)?;
        let name = self.class_name(&class)?;
        Ok(Type::from_class_name(&name)?)
    }
}
