//! Field types and the line-scoped type parser.
//!
//! A field declaration such as `map<string, list<int32>> index;` parses into
//! a [`Field`] whose [`Type`] is a recursive tree. Container children are
//! boxed and exclusively owned; the grammar cannot produce cycles.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::type_map;

/// Built-in scalar and pointer types of the IDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Bool,
    String,
    Bytes,
    Void,
    AnyPointer,
}

impl Primitive {
    /// Resolve a primitive keyword: exact match first, then case-insensitive.
    pub fn from_keyword(identifier: &str) -> Option<Self> {
        type_map::primitive_from_keyword(identifier)
            .or_else(|| type_map::primitive_from_keyword(&identifier.to_ascii_lowercase()))
    }

    pub fn capnp_name(self) -> &'static str {
        type_map::primitive_to_capnp(self)
    }

    pub fn cpp_name(self) -> &'static str {
        type_map::primitive_to_cpp(self)
    }
}

/// The type of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum Type {
    Primitive(Primitive),
    /// Reference to a message or enum by name, not yet resolved.
    Custom(String),
    /// Reference resolved against a declared enum; carries its value names.
    Enum { name: String, values: Vec<String> },
    List(Box<Type>),
    Map(Box<Type>, Box<Type>),
}

impl Type {
    /// Name of a `Custom` or `Enum` reference.
    pub fn custom_name(&self) -> Option<&str> {
        match self {
            Self::Custom(name) | Self::Enum { name, .. } => Some(name),
            _ => None,
        }
    }

    /// C++ spelling, e.g. `std::unordered_map<std::string, int32_t>`.
    pub fn cpp_type(&self) -> String {
        match self {
            Self::Primitive(p) => p.cpp_name().to_string(),
            Self::Custom(name) | Self::Enum { name, .. } => name.clone(),
            Self::List(element) => format!("std::vector<{}>", element.cpp_type()),
            Self::Map(key, value) => format!(
                "std::unordered_map<{}, {}>",
                key.cpp_type(),
                value.cpp_type()
            ),
        }
    }

    /// Cap'n Proto spelling, e.g. `Map(Text, List(Int32))`.
    ///
    /// Maps refer to the generic `Map(Key, Value)` struct that the schema
    /// emitter writes once per file.
    pub fn capnp_type(&self) -> String {
        match self {
            Self::Primitive(p) => p.capnp_name().to_string(),
            Self::Custom(name) | Self::Enum { name, .. } => name.clone(),
            Self::List(element) => format!("List({})", element.capnp_type()),
            Self::Map(key, value) => {
                format!("Map({}, {})", key.capnp_type(), value.capnp_type())
            }
        }
    }
}

/// A named, typed field of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Parse a single declaration line: `TypeExpr Ident [';']`.
    pub fn from_line(line: &str) -> Result<Self> {
        let mut parser = LineParser { line, position: 0 };
        let ty = parser.parse_type()?;
        let name = parser.read_identifier()?;
        parser.try_consume(';');
        Ok(Self::new(name, ty))
    }
}

fn is_list_keyword(lower: &str) -> bool {
    matches!(lower, "list" | "vector" | "std::vector")
}

fn is_map_keyword(lower: &str) -> bool {
    matches!(
        lower,
        "map" | "unordered_map" | "std::map" | "std::unordered_map"
    )
}

/// Character-level recursive-descent parser over one declaration line.
struct LineParser<'a> {
    line: &'a str,
    position: usize,
}

impl LineParser<'_> {
    fn skip_whitespace(&mut self) {
        let rest = &self.line[self.position..];
        self.position += rest.len() - rest.trim_start().len();
    }

    fn try_consume(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.line[self.position..].starts_with(expected) {
            self.position += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.try_consume(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn read_identifier(&mut self) -> Result<String> {
        self.skip_whitespace();
        let rest = &self.line[self.position..];
        let len = rest
            .bytes()
            .take_while(|&b| b.is_ascii_alphanumeric() || b == b'_' || b == b':')
            .count();
        if len == 0 {
            return Err(self.error("expected identifier"));
        }
        self.position += len;
        Ok(rest[..len].to_string())
    }

    fn parse_type(&mut self) -> Result<Type> {
        let identifier = self.read_identifier()?;
        let lower = identifier.to_ascii_lowercase();

        if is_list_keyword(&lower) {
            self.expect('<')?;
            let element = self.parse_type()?;
            self.expect('>')?;
            return Ok(Type::List(Box::new(element)));
        }

        if is_map_keyword(&lower) {
            self.expect('<')?;
            let key = self.parse_type()?;
            self.expect(',')?;
            let value = self.parse_type()?;
            self.expect('>')?;
            return Ok(Type::Map(Box::new(key), Box::new(value)));
        }

        Ok(match Primitive::from_keyword(&identifier) {
            Some(primitive) => Type::Primitive(primitive),
            None => Type::Custom(identifier),
        })
    }

    fn error(&self, message: &str) -> Error {
        Error::Parse(format!(
            "{message} in field declaration '{}'",
            self.line.trim()
        ))
    }
}
