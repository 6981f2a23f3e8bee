//! Schema model and the recursive-descent schema parser.
//!
//! A schema file is a sequence of three declarations:
//!
//! ```text
//! namespace game.net;
//! enum Status @0x9a3c { ok, failed | 10, retry }
//! message PlayerJoined(3) extends Event { string name; list<uint32> items; }
//! ```
//!
//! After the token stream is exhausted, a `MessageType` enum is synthesized
//! (or completed) with one value per message so that every struct can carry a
//! type tag.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token};
use crate::preprocess::{
    normalize_field_line, split_respecting_nesting, starts_with_keyword, strip_comments,
};
use crate::type_map::lower_first;
use crate::types::{Field, Type};

/// Name of the synthesized message-tag enum.
pub const MESSAGE_TYPE_ENUM: &str = "MessageType";

/// The whole parsed catalog.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Schema {
    /// Dotted namespace of the wire-schema types (e.g. `"game.message"`).
    /// Empty when the source declares none.
    pub namespace: String,

    /// Namespace of the C++ wrapper classes. Not part of the grammar; set
    /// from configuration after parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapper_namespace: Option<String>,

    /// Messages keyed by name.
    pub messages: BTreeMap<String, Message>,

    /// Enums keyed by name. Always contains [`MESSAGE_TYPE_ENUM`] after a
    /// successful parse.
    pub enums: BTreeMap<String, EnumDecl>,

    /// Message names in declaration order.
    pub message_order: Vec<String>,
}

/// One `message` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Numeric id from `message Name(<id>)`; also its `MessageType` value.
    pub id: u64,

    pub name: String,

    /// Base message from an `extends` clause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Own fields in declaration order (inherited fields excluded).
    pub fields: Vec<Field>,
}

/// One enumeration value with its resolved integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

/// One `enum` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDecl {
    pub name: String,

    /// Values in declaration order; not necessarily sorted or contiguous.
    pub values: Vec<EnumValue>,

    /// Explicit wire id from `@<id>`. `None` means the id is derived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl EnumDecl {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: Vec::new(),
            id: None,
        }
    }
}

impl Schema {
    /// Parse `source` into a new schema.
    pub fn from_source(source: &str) -> Result<Self> {
        let mut schema = Self::default();
        schema.parse(source)?;
        Ok(schema)
    }

    /// Read and parse a schema file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut schema = Self::default();
        schema.parse_file(path)?;
        Ok(schema)
    }

    /// Read `path` and [`parse`](Self::parse) its content.
    pub fn parse_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.parse(&content)
    }

    /// Populate this schema from IDL text.
    ///
    /// Any previous content is cleared first, so parsing the same text twice
    /// into one instance yields identical results.
    pub fn parse(&mut self, source: &str) -> Result<()> {
        self.namespace.clear();
        self.messages.clear();
        self.enums.clear();
        self.message_order.clear();

        let stripped = strip_comments(source);
        let mut parser = Parser {
            lexer: Lexer::new(&stripped),
            schema: self,
        };
        parser.parse_declarations()?;

        self.synthesize_message_type();
        Ok(())
    }

    /// Ensure `MessageType` exists and has a value for every message.
    ///
    /// Values the user declared are never removed or reordered. A message is
    /// skipped when a value with its exact name or its lower-first name
    /// already exists.
    fn synthesize_message_type(&mut self) {
        let message_type = self
            .enums
            .entry(MESSAGE_TYPE_ENUM.to_string())
            .or_insert_with(|| EnumDecl::named(MESSAGE_TYPE_ENUM));

        if message_type.values.is_empty() {
            message_type.values.push(EnumValue {
                name: "undefined".to_string(),
                value: 0,
            });
        }

        let mut existing: HashSet<String> =
            message_type.values.iter().map(|v| v.name.clone()).collect();

        for message_name in &self.message_order {
            if existing.contains(message_name) {
                continue;
            }
            let value_name = lower_first(message_name);
            if existing.contains(&value_name) {
                continue;
            }
            let Some(value) = self
                .messages
                .get(message_name)
                .and_then(|m| i64::try_from(m.id).ok())
            else {
                continue;
            };
            message_type.values.push(EnumValue {
                name: value_name.clone(),
                value,
            });
            existing.insert(value_name);
        }
    }

    /// A message's fields with inherited ones first, parent to child.
    ///
    /// Unknown parents contribute no fields. An inheritance cycle stops at the
    /// first message seen twice.
    pub fn flattened_fields<'a>(&'a self, message: &'a Message) -> Vec<&'a Field> {
        let mut chain = vec![message];
        let mut seen = BTreeSet::from([message.name.as_str()]);
        let mut current = message;

        while let Some(parent_name) = current.parent.as_deref() {
            let Some(parent) = self.messages.get(parent_name) else {
                eprintln!(
                    "warning: message '{}' extends unknown message '{parent_name}'",
                    current.name
                );
                break;
            };
            if !seen.insert(parent.name.as_str()) {
                eprintln!(
                    "warning: inheritance cycle through message '{}'",
                    parent.name
                );
                break;
            }
            chain.push(parent);
            current = parent;
        }

        chain
            .into_iter()
            .rev()
            .flat_map(|m| m.fields.iter())
            .collect()
    }

    /// Whether `name` is a declared message.
    pub fn is_message(&self, name: &str) -> bool {
        self.messages.contains_key(name)
    }

    /// Resolve custom references naming a declared enum into [`Type::Enum`].
    ///
    /// Other custom names stay [`Type::Custom`]; whether they exist is the
    /// emitter's (or the downstream compiler's) concern.
    pub fn resolve_type(&self, ty: &Type) -> Type {
        match ty {
            Type::Custom(name) => match self.enums.get(name) {
                Some(decl) => Type::Enum {
                    name: name.clone(),
                    values: decl.values.iter().map(|v| v.name.clone()).collect(),
                },
                None => ty.clone(),
            },
            Type::List(element) => Type::List(Box::new(self.resolve_type(element))),
            Type::Map(key, value) => Type::Map(
                Box::new(self.resolve_type(key)),
                Box::new(self.resolve_type(value)),
            ),
            Type::Primitive(_) | Type::Enum { .. } => ty.clone(),
        }
    }
}

// ── Parser ─────────────────────────────────────────────────────────────

struct Parser<'src, 's> {
    lexer: Lexer<'src>,
    schema: &'s mut Schema,
}

impl<'src> Parser<'src, '_> {
    fn parse_declarations(&mut self) -> Result<()> {
        while let Some(token) = self.lexer.peek_token() {
            if token.is_keyword("namespace") {
                self.parse_namespace()?;
            } else if token.is_keyword("enum") {
                self.parse_enum()?;
            } else if token.is_keyword("message") {
                self.parse_message()?;
            } else {
                return Err(parse_error(format!(
                    "expected 'namespace', 'enum', or 'message', found '{}'",
                    token.text
                )));
            }
        }
        Ok(())
    }

    fn expect_symbol(&mut self, symbol: &str, context: &str) -> Result<()> {
        let token = self.lexer.next_token();
        if token.is_keyword(symbol) {
            Ok(())
        } else {
            Err(parse_error(format!(
                "expected '{symbol}' {context}, found {}",
                describe(token)
            )))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<&'src str> {
        let token = self.lexer.next_token();
        if token.is_identifier() {
            Ok(token.text)
        } else {
            Err(parse_error(format!("expected {what}, found {}", describe(token))))
        }
    }

    /// Consume the token if it is `symbol`.
    fn eat(&mut self, symbol: &str) -> bool {
        let matches = self
            .lexer
            .peek_token()
            .is_some_and(|t| t.is_keyword(symbol));
        if matches {
            self.lexer.next_token();
        }
        matches
    }

    /// Read a `{ ... }` block and return its tokens joined by spaces.
    fn read_braced_block(&mut self) -> Result<String> {
        self.expect_symbol("{", "to open a block")?;

        let mut content = String::new();
        let mut depth = 1usize;
        loop {
            let token = self.lexer.next_token();
            if token.eof {
                return Err(parse_error("unexpected end of input inside '{...}'"));
            }
            if token.is_keyword("{") {
                depth += 1;
            } else if token.is_keyword("}") {
                depth -= 1;
                if depth == 0 {
                    return Ok(content);
                }
            }
            content.push_str(token.text);
            content.push(' ');
        }
    }

    fn parse_namespace(&mut self) -> Result<()> {
        self.lexer.next_token();

        let mut namespace = self
            .expect_identifier("identifier after 'namespace'")?
            .to_string();
        while self.eat(".") {
            namespace.push('.');
            namespace.push_str(self.expect_identifier("identifier after '.'")?);
        }
        self.expect_symbol(";", "after namespace")?;

        self.schema.namespace = namespace;
        Ok(())
    }

    fn parse_enum(&mut self) -> Result<()> {
        self.lexer.next_token();

        let name = self.expect_identifier("enum name")?;
        let mut decl = EnumDecl::named(name);

        if self.eat("@") {
            let token = self.lexer.next_token();
            let id = token
                .is_number()
                .then(|| parse_unsigned(token.text))
                .flatten()
                .ok_or_else(|| {
                    parse_error(format!(
                        "expected numeric enum id after '@' (e.g. 0x1234), found {}",
                        describe(token)
                    ))
                })?;
            // `@0` is indistinguishable from "no id" on the wire side.
            decl.id = (id != 0).then_some(id);
        }

        let body = self.read_braced_block()?;
        let mut next_value: i64 = 0;
        for item in split_respecting_nesting(&body, ',') {
            let value = match item.split_once('|') {
                None => EnumValue {
                    name: item.trim().to_string(),
                    value: next_value,
                },
                Some((name_part, value_part)) => {
                    let (name_part, value_part) = (name_part.trim(), value_part.trim());
                    if name_part.is_empty() || value_part.is_empty() {
                        return Err(parse_error(format!(
                            "malformed enum item near '|' in enum '{}'",
                            decl.name
                        )));
                    }
                    let value = parse_signed(value_part).ok_or_else(|| {
                        parse_error(format!(
                            "enum value must be an integer: '{value_part}' in enum '{}'",
                            decl.name
                        ))
                    })?;
                    EnumValue {
                        name: name_part.to_string(),
                        value,
                    }
                }
            };
            next_value = value.value.wrapping_add(1);
            decl.values.push(value);
        }

        self.eat(";");

        self.schema.enums.insert(decl.name.clone(), decl);
        Ok(())
    }

    fn parse_message(&mut self) -> Result<()> {
        self.lexer.next_token();

        let name = self.expect_identifier("message name")?.to_string();

        self.expect_symbol("(", "after message name")?;
        let id_token = self.lexer.next_token();
        let id = id_token
            .is_number()
            .then(|| parse_unsigned(id_token.text))
            .flatten()
            .ok_or_else(|| {
                parse_error(format!(
                    "expected numeric message id for '{name}', found {}",
                    describe(id_token)
                ))
            })?;
        // The id doubles as a signed `MessageType` value.
        if i64::try_from(id).is_err() {
            return Err(parse_error(format!(
                "message id out of range for '{name}': {id} (max {})",
                i64::MAX
            )));
        }
        self.expect_symbol(")", "after message id")?;

        let parent = if self.eat("extends") {
            Some(
                self.expect_identifier("base message name after 'extends'")?
                    .to_string(),
            )
        } else {
            None
        };

        let body = self.read_braced_block()?;
        let mut fields = Vec::new();
        for line in split_respecting_nesting(&body, ';') {
            let line = normalize_field_line(&line);
            if line.is_empty()
                || ["message", "enum", "extends"]
                    .iter()
                    .any(|kw| starts_with_keyword(line, kw))
            {
                continue;
            }
            fields.push(Field::from_line(line)?);
        }

        self.schema.message_order.push(name.clone());
        self.schema.messages.insert(
            name.clone(),
            Message {
                id,
                name,
                parent,
                fields,
            },
        );
        Ok(())
    }
}

fn parse_error(message: impl Into<String>) -> Error {
    Error::Parse(message.into())
}

fn describe(token: Token<'_>) -> String {
    if token.eof {
        "end of input".to_string()
    } else {
        format!("'{}'", token.text)
    }
}

/// Parse an unsigned decimal or `0x` hexadecimal literal.
fn parse_unsigned(text: &str) -> Option<u64> {
    let text = text.strip_prefix('+').unwrap_or(text);
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Parse a signed decimal or `0x` hexadecimal literal.
fn parse_signed(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i128::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i128>().ok()?,
    };
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}
