//! Method descriptors

use std::fmt;
use std::str::FromStr;

use crate::error::SignatureError;
use crate::ty::{Type, Typed};

/// Parameter and return types of a method, e.g. `(ILjava/lang/String;)V`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    params: Vec<Type>,
    ret: Type,
}

impl MethodSignature {
    /// Build a signature, rejecting `void` parameters.
    pub fn new(params: Vec<Type>, ret: Type) -> Result<Self, SignatureError> {
        for param in &params {
            param.check_value("parameter")?;
        }
        if let Type::Array(element) = &ret {
            element.check_value("array element")?;
        }
        Ok(Self { params, ret })
    }

    /// Signature of a constructor taking `params`.
    pub fn constructor(params: Vec<Type>) -> Result<Self, SignatureError> {
        Self::new(params, Type::Void)
    }

    /// Parse a method descriptor.
    pub fn parse(descriptor: &str) -> Result<Self, SignatureError> {
        let malformed = |offset| SignatureError::Malformed {
            descriptor: descriptor.to_string(),
            offset,
        };
        if !descriptor.starts_with('(') {
            return Err(malformed(0));
        }
        let mut params = Vec::new();
        let mut pos = 1;
        loop {
            match descriptor.as_bytes().get(pos) {
                Some(b')') => break,
                Some(_) => {
                    let (param, next) = Type::parse_prefix(descriptor, pos)?;
                    if param == Type::Void {
                        return Err(malformed(pos));
                    }
                    params.push(param);
                    pos = next;
                }
                None => return Err(malformed(pos)),
            }
        }
        let (ret, end) = Type::parse_prefix(descriptor, pos + 1)?;
        if end != descriptor.len() {
            return Err(malformed(end));
        }
        Ok(Self { params, ret })
    }

    /// Parameter types in declaration order.
    pub fn params(&self) -> &[Type] {
        &self.params
    }

    /// Return type.
    pub fn ret(&self) -> &Type {
        &self.ret
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for param in &self.params {
            f.write_str(&param.type_string())?;
        }
        write!(f, "){}", self.ret.type_string())
    }
}

impl FromStr for MethodSignature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let sig = MethodSignature::new(vec![Type::Int, Type::string()], Type::Void).unwrap();
        assert_eq!(sig.to_string(), "(ILjava/lang/String;)V");

        let none = MethodSignature::new(vec![], Type::array(Type::Long)).unwrap();
        assert_eq!(none.to_string(), "()[J");
    }

    #[test]
    fn test_void_parameter_rejected() {
        let err = MethodSignature::new(vec![Type::Void], Type::Int).unwrap_err();
        assert_eq!(err, SignatureError::VoidValue { position: "parameter" });
    }

    #[test]
    fn test_parse() {
        let sig = MethodSignature::parse("([BLjava/lang/String;)V").unwrap();
        assert_eq!(sig.params(), &[Type::array(Type::Byte), Type::string()]);
        assert_eq!(sig.ret(), &Type::Void);

        let sig: MethodSignature = "()[[I".parse().unwrap();
        assert!(sig.params().is_empty());
        assert_eq!(sig.ret(), &Type::array(Type::array(Type::Int)));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(MethodSignature::parse("I)V").is_err());
        assert!(MethodSignature::parse("(I").is_err());
        assert!(MethodSignature::parse("(V)V").is_err());
        assert!(MethodSignature::parse("(I)VV").is_err());
        assert!(MethodSignature::parse("(Ljava/lang/String)V").is_err());
    }

    #[test]
    fn test_constructor_shape() {
        let params = vec![Type::array(Type::Byte), Type::string()];
        let sig = MethodSignature::constructor(params).unwrap();
        assert_eq!(sig.to_string(), "([BLjava/lang/String;)V");
    }
}
