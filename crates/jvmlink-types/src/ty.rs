//! Value kinds and field descriptors

use std::fmt;

use crate::error::SignatureError;
use crate::name::TypeName;

/// Kind of a JVM value, as seen by the call interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// No value (method return only)
    Void,
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `char`
    Char,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// Instance of a named class
    Class,
    /// Array of some element type
    Array,
}

impl Kind {
    /// Single-character descriptor for primitive kinds and `void`.
    pub const fn descriptor(self) -> Option<char> {
        match self {
            Kind::Void => Some('V'),
            Kind::Boolean => Some('Z'),
            Kind::Byte => Some('B'),
            Kind::Char => Some('C'),
            Kind::Short => Some('S'),
            Kind::Int => Some('I'),
            Kind::Long => Some('J'),
            Kind::Float => Some('F'),
            Kind::Double => Some('D'),
            Kind::Class | Kind::Array => None,
        }
    }

    /// True for class and array kinds.
    pub const fn is_reference(self) -> bool {
        matches!(self, Kind::Class | Kind::Array)
    }

    /// True for the eight primitive kinds.
    pub const fn is_primitive(self) -> bool {
        !self.is_reference() && !matches!(self, Kind::Void)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Void => "void",
            Kind::Boolean => "boolean",
            Kind::Byte => "byte",
            Kind::Char => "char",
            Kind::Short => "short",
            Kind::Int => "int",
            Kind::Long => "long",
            Kind::Float => "float",
            Kind::Double => "double",
            Kind::Class => "class",
            Kind::Array => "array",
        };
        f.write_str(name)
    }
}

/// Anything that can describe its own JVM type.
pub trait Typed {
    /// The value kind.
    fn kind(&self) -> Kind;

    /// The field descriptor, e.g. `I`, `Ljava/lang/String;` or `[J`.
    fn type_string(&self) -> String;
}

/// A concrete JVM type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// `void`
    Void,
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `char`
    Char,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// Instance of the named class
    Class(TypeName),
    /// Array of the element type
    Array(Box<Type>),
}

impl Type {
    /// Class type from a name in either spelling.
    pub fn class(name: &str) -> Self {
        Type::Class(TypeName::new(name))
    }

    /// Array of `element`.
    pub fn array(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    /// `java.lang.String`
    pub fn string() -> Self {
        Type::Class(TypeName::string())
    }

    /// `java.lang.Object`
    pub fn object() -> Self {
        Type::Class(TypeName::object())
    }

    /// Type from a name as returned by `Class.getName()`.
    ///
    /// Plain class names come back dotted (`java.lang.String`); array
    /// classes come back in descriptor form (`[I`, `[Ljava.lang.String;`).
    pub fn from_class_name(name: &str) -> Result<Self, SignatureError> {
        if name.starts_with('[') {
            return Self::parse(&name.replace('.', "/"));
        }
        let name: TypeName = name.parse()?;
        Ok(Type::Class(name))
    }

    /// Parse a single complete field descriptor.
    pub fn parse(descriptor: &str) -> Result<Self, SignatureError> {
        let (ty, used) = Self::parse_prefix(descriptor, 0)?;
        if used != descriptor.len() {
            return Err(SignatureError::Malformed {
                descriptor: descriptor.to_string(),
                offset: used,
            });
        }
        Ok(ty)
    }

    /// Parse one descriptor starting at byte `start` of `text`, returning
    /// the type and the offset just past it.
    pub(crate) fn parse_prefix(text: &str, start: usize) -> Result<(Self, usize), SignatureError> {
        let malformed = |offset| SignatureError::Malformed {
            descriptor: text.to_string(),
            offset,
        };
        let bytes = text.as_bytes();
        let Some(&tag) = bytes.get(start) else {
            return Err(malformed(start));
        };
        let ty = match tag {
            b'V' => Type::Void,
            b'Z' => Type::Boolean,
            b'B' => Type::Byte,
            b'C' => Type::Char,
            b'S' => Type::Short,
            b'I' => Type::Int,
            b'J' => Type::Long,
            b'F' => Type::Float,
            b'D' => Type::Double,
            b'L' => {
                let end = text[start..]
                    .find(';')
                    .map(|i| start + i)
                    .ok_or_else(|| malformed(start))?;
                let name = TypeName::new(&text[start + 1..end]);
                if name.is_empty() {
                    return Err(malformed(start + 1));
                }
                return Ok((Type::Class(name), end + 1));
            }
            b'[' => {
                let (element, next) = Self::parse_prefix(text, start + 1)?;
                if element == Type::Void {
                    return Err(malformed(start + 1));
                }
                return Ok((Type::array(element), next));
            }
            _ => return Err(malformed(start)),
        };
        Ok((ty, start + 1))
    }

    /// Reject `void` in value position, including inside arrays.
    pub fn check_value(&self, position: &'static str) -> Result<(), SignatureError> {
        match self {
            Type::Void => Err(SignatureError::VoidValue { position }),
            Type::Array(element) => element.check_value("array element"),
            _ => Ok(()),
        }
    }

    /// The element type, for arrays.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array(element) => Some(element),
            _ => None,
        }
    }
}

impl Typed for Type {
    fn kind(&self) -> Kind {
        match self {
            Type::Void => Kind::Void,
            Type::Boolean => Kind::Boolean,
            Type::Byte => Kind::Byte,
            Type::Char => Kind::Char,
            Type::Short => Kind::Short,
            Type::Int => Kind::Int,
            Type::Long => Kind::Long,
            Type::Float => Kind::Float,
            Type::Double => Kind::Double,
            Type::Class(_) => Kind::Class,
            Type::Array(_) => Kind::Array,
        }
    }

    fn type_string(&self) -> String {
        match self {
            Type::Class(name) => format!("L{};", name.as_path()),
            Type::Array(element) => format!("[{}", element.type_string()),
            other => other.kind().descriptor().map(String::from).unwrap_or_default(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_string())
    }
}

impl From<TypeName> for Type {
    fn from(name: TypeName) -> Self {
        Type::Class(name)
    }
}
