//! Type identity used as the schema cache key.
//!
//! A [`TypeKey`] is a raw type name plus an ordered list of type arguments.
//! Two keys are equal when their names and arguments are equal, no matter
//! whether they were built programmatically or parsed from text.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeKeyParseError;

/// Immutable, cheaply clonable identity of a (possibly generic) type.
///
/// The canonical textual form is `Name<Arg1, Arg2>`:
///
/// ```
/// use modelschema_core::TypeKey;
///
/// let parsed: TypeKey = "Map< String ,List<Node>>".parse().unwrap();
/// let built = TypeKey::parameterized(
///     "Map",
///     [TypeKey::of("String"), TypeKey::parameterized("List", [TypeKey::of("Node")])],
/// );
/// assert_eq!(parsed, built);
/// assert_eq!(parsed.to_string(), "Map<String, List<Node>>");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    inner: Arc<TypeKeyInner>,
}

#[derive(PartialEq, Eq, Hash, PartialOrd, Ord)]
struct TypeKeyInner {
    name: Box<str>,
    arguments: Box<[TypeKey]>,
}

impl TypeKey {
    /// Creates a key for a non-generic type.
    pub fn of(name: impl Into<Box<str>>) -> Self {
        Self::parameterized(name, [])
    }

    /// Creates a key for a generic type with the given arguments.
    pub fn parameterized(
        name: impl Into<Box<str>>,
        arguments: impl IntoIterator<Item = TypeKey>,
    ) -> Self {
        Self {
            inner: Arc::new(TypeKeyInner {
                name: name.into(),
                arguments: arguments.into_iter().collect(),
            }),
        }
    }

    /// The raw type name, without arguments.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The type arguments, in declaration order.
    pub fn arguments(&self) -> &[TypeKey] {
        &self.inner.arguments
    }

    /// Number of type arguments.
    pub fn arity(&self) -> usize {
        self.inner.arguments.len()
    }

    pub fn is_parameterized(&self) -> bool {
        !self.inner.arguments.is_empty()
    }

    /// The key with all type arguments erased.
    pub fn raw(&self) -> TypeKey {
        if self.is_parameterized() {
            TypeKey::of(self.name())
        } else {
            self.clone()
        }
    }

    /// Replaces every argument-less occurrence of a bound name with its binding.
    ///
    /// Used to turn a declared property type such as `List<T>` into the
    /// concrete type for one parameterization of the owning type.
    pub fn substitute(&self, bindings: &HashMap<&str, TypeKey>) -> TypeKey {
        if !self.is_parameterized() {
            return bindings
                .get(self.name())
                .cloned()
                .unwrap_or_else(|| self.clone());
        }
        TypeKey::parameterized(
            self.name(),
            self.arguments().iter().map(|arg| arg.substitute(bindings)),
        )
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        if let Some((first, rest)) = self.arguments().split_first() {
            write!(f, "<{first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({self})")
    }
}

impl FromStr for TypeKey {
    type Err = TypeKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = KeyParser {
            input: s,
            pos: 0,
            depth: 0,
        };
        let key = parser.parse_key()?;
        parser.skip_whitespace();
        match parser.peek() {
            None => Ok(key),
            Some(found) => Err(TypeKeyParseError::unexpected(s, parser.pos, found)),
        }
    }
}

impl Serialize for TypeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '$')
}

/// Deepest argument nesting accepted when parsing.
pub const MAX_KEY_DEPTH: usize = 128;

/// Recursive descent parser for `Name<Arg, ...>` expressions.
struct KeyParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl KeyParser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self, c: char) {
        self.pos += c.len_utf8();
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump(c);
        }
    }

    fn parse_key(&mut self) -> Result<TypeKey, TypeKeyParseError> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_name_char(c) {
                break;
            }
            self.bump(c);
        }
        if start == self.pos {
            return Err(TypeKeyParseError::expected_name(self.input, self.pos));
        }
        let name = &self.input[start..self.pos];

        self.skip_whitespace();
        let mut arguments = Vec::new();
        if self.peek() == Some('<') {
            if self.depth >= MAX_KEY_DEPTH {
                return Err(TypeKeyParseError::too_deep(self.pos));
            }
            self.bump('<');
            self.depth += 1;
            loop {
                arguments.push(self.parse_key()?);
                self.skip_whitespace();
                match self.peek() {
                    Some(',') => self.bump(','),
                    Some('>') => {
                        self.bump('>');
                        self.depth -= 1;
                        break;
                    }
                    Some(found) => {
                        return Err(TypeKeyParseError::unexpected(self.input, self.pos, found));
                    }
                    None => return Err(TypeKeyParseError::unterminated(self.input)),
                }
            }
        }

        Ok(TypeKey::parameterized(name, arguments))
    }
}
