//! Fully qualified class names

use std::fmt;
use std::str::FromStr;

use crate::error::SignatureError;

/// A fully qualified class name, stored as its package/class segments.
///
/// Parsing accepts both the dotted (`java.lang.String`) and the internal
/// slash (`java/lang/String`) spellings; both produce the same value, so
/// [`TypeName::as_path`] is a canonical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    segments: Vec<String>,
}

impl TypeName {
    /// Split `name` on `.` and `/`, dropping empty segments.
    pub fn new(name: &str) -> Self {
        Self {
            segments: name
                .split(['.', '/'])
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Build a name from already separated segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// `java.lang.Object`
    pub fn object() -> Self {
        Self::from_segments(["java", "lang", "Object"])
    }

    /// `java.lang.String`
    pub fn string() -> Self {
        Self::from_segments(["java", "lang", "String"])
    }

    /// `java.lang.Class`
    pub fn class() -> Self {
        Self::from_segments(["java", "lang", "Class"])
    }

    /// Internal form used by `FindClass` and descriptors: `java/lang/String`.
    pub fn as_path(&self) -> String {
        self.segments.join("/")
    }

    /// Source form as returned by `Class.getName()`: `java.lang.String`.
    pub fn as_dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Unqualified class name, if any.
    pub fn simple_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Package segments (everything but the simple name).
    pub fn package(&self) -> &[String] {
        match self.segments.split_last() {
            Some((_, package)) => package,
            None => &[],
        }
    }

    /// The name's segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True when the name has no segments at all.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_path())
    }
}

impl FromStr for TypeName {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = Self::new(s);
        if name.is_empty() {
            return Err(SignatureError::EmptyName);
        }
        Ok(name)
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
