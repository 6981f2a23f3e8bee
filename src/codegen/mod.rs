//! Artifact generation from a parsed [`Schema`].
//!
//! Produces:
//! - The Cap'n Proto wire schema (`network_msg.capnp` by default)
//! - Optionally, C++ wrappers: one header and one source per message, plus
//!   `enums.hpp`, `message_base.hpp` and `factory_builder.hpp`
//!
//! Output is deterministic for a given schema and root id. The root id is
//! recovered from the existing wire-schema file when there is one, and user
//! slots in existing C++ files are carried over (see [`crate::regen`]), so
//! regenerating an unchanged schema rewrites every file byte-for-byte.

mod capnp;
mod cpp_enums;
mod cpp_header;
mod cpp_source;
mod cpp_support;

pub use capnp::render_capnp;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ids;
use crate::regen::PreservedSlots;
use crate::schema::{MESSAGE_TYPE_ENUM, Message, Schema};
use crate::type_map::{lower_first, to_cpp_namespace};
use crate::types::{Field, Type};

/// File name used when the capnp output path is a directory.
pub const DEFAULT_CAPNP_FILE: &str = "network_msg.capnp";

/// Header generated by the Cap'n Proto compiler for the default schema file.
pub const DEFAULT_CAPNP_HEADER: &str = "network_msg.capnp.h";

const DEFAULT_CAPNP_NAMESPACE: &str = "curious::message";
const DEFAULT_WRAPPER_NAMESPACE: &str = "curious.net";

/// Where and how to write artifacts.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// A `.capnp` file path, or a directory receiving [`DEFAULT_CAPNP_FILE`].
    pub capnp_output: PathBuf,

    /// C++ wrapper outputs; `None` generates the wire schema only.
    pub cpp: Option<CppOutputs>,
}

/// C++ wrapper output configuration.
#[derive(Debug, Clone)]
pub struct CppOutputs {
    pub header_dir: PathBuf,
    pub source_dir: PathBuf,

    /// Prefix for `#include` lines referring to generated headers.
    pub include_prefix: String,

    /// Name of the header the Cap'n Proto compiler generates.
    pub capnp_header: String,

    /// Emit plain data headers instead of `MessageBase` classes. In this
    /// mode no sources, base class or factory are written.
    pub plain_headers: bool,
}

impl CppOutputs {
    /// Defaults: include prefix from the header directory's last component,
    /// [`DEFAULT_CAPNP_HEADER`], class headers.
    pub fn new(header_dir: impl Into<PathBuf>, source_dir: impl Into<PathBuf>) -> Self {
        let header_dir = header_dir.into();
        Self {
            include_prefix: include_prefix(&header_dir),
            header_dir,
            source_dir: source_dir.into(),
            capnp_header: DEFAULT_CAPNP_HEADER.to_string(),
            plain_headers: false,
        }
    }
}

/// Statistics collected during generation for reporting.
#[derive(Debug, Default)]
pub struct GenerationStats {
    pub capnp_path: PathBuf,
    pub root_id: u64,
    pub root_id_reused: bool,
    pub enums_generated: usize,
    pub structs_generated: usize,
    pub headers_written: usize,
    pub sources_written: usize,
    /// Non-empty user slots carried over from previous C++ files.
    pub slots_preserved: usize,
}

/// Write every configured artifact for `schema`.
pub fn generate(schema: &Schema, options: &GenerateOptions) -> Result<GenerationStats> {
    let capnp_path = resolve_capnp_path(&options.capnp_output)?;
    let root = ids::resolve_root_id(&capnp_path);

    let mut stats = GenerationStats {
        root_id: root.value,
        root_id_reused: root.reused,
        enums_generated: schema.enums.len(),
        structs_generated: schema.messages.len(),
        ..GenerationStats::default()
    };

    write_file(&capnp_path, &render_capnp(schema, root.value))?;
    stats.capnp_path = capnp_path;

    if let Some(cpp) = &options.cpp {
        generate_cpp(schema, cpp, &mut stats)?;
    }

    Ok(stats)
}

// ── C++ wrappers ───────────────────────────────────────────────────────

/// Names shared by every C++ emitter.
pub(crate) struct CppContext<'a> {
    /// Wrapper namespace in `::` form.
    pub namespace: String,
    /// Namespace of the Cap'n Proto generated types in `::` form.
    pub capnp_namespace: String,
    pub include_prefix: &'a str,
    pub capnp_header: &'a str,
}

fn generate_cpp(schema: &Schema, cpp: &CppOutputs, stats: &mut GenerationStats) -> Result<()> {
    let ctx = CppContext {
        namespace: wrapper_namespace(schema),
        capnp_namespace: capnp_namespace(schema),
        include_prefix: &cpp.include_prefix,
        capnp_header: &cpp.capnp_header,
    };

    for message in schema.messages.values() {
        let header_path = cpp.header_dir.join(format!("{}.hpp", message.name));
        let header = if cpp.plain_headers {
            let preserved = PreservedSlots::read(&header_path, &cpp_header::PLAIN_SLOTS);
            stats.slots_preserved += preserved.non_empty();
            cpp_header::render_plain_header(schema, message, &ctx, &preserved)
        } else {
            let preserved = PreservedSlots::read(&header_path, &cpp_header::CLASS_SLOTS);
            stats.slots_preserved += preserved.non_empty();
            cpp_header::render_class_header(schema, message, &ctx, &preserved)
        };
        write_file(&header_path, &header)?;
        stats.headers_written += 1;
    }

    let enums_path = cpp.header_dir.join("enums.hpp");
    let preserved = PreservedSlots::read(&enums_path, &cpp_enums::ENUMS_SLOTS);
    stats.slots_preserved += preserved.non_empty();
    write_file(
        &enums_path,
        &cpp_enums::render_enums_header(schema, &ctx, &preserved),
    )?;
    stats.headers_written += 1;

    if cpp.plain_headers {
        return Ok(());
    }

    for message in schema.messages.values() {
        let source_path = cpp.source_dir.join(format!("{}.cpp", message.name));
        let preserved = PreservedSlots::read(&source_path, &cpp_source::SOURCE_SLOTS);
        stats.slots_preserved += preserved.non_empty();
        write_file(
            &source_path,
            &cpp_source::render_source(schema, message, &ctx, &preserved),
        )?;
        stats.sources_written += 1;
    }

    write_file(
        &cpp.header_dir.join("message_base.hpp"),
        &cpp_support::render_message_base(&ctx),
    )?;
    write_file(
        &cpp.header_dir.join("factory_builder.hpp"),
        &cpp_support::render_factory(schema, &ctx),
    )?;
    stats.headers_written += 2;

    Ok(())
}

/// Namespace of the wrapper classes: explicit wrapper namespace, else the
/// schema namespace, else `curious::net`.
pub fn wrapper_namespace(schema: &Schema) -> String {
    let raw = schema
        .wrapper_namespace
        .as_deref()
        .filter(|ns| !ns.is_empty())
        .or_else(|| Some(schema.namespace.as_str()).filter(|ns| !ns.is_empty()))
        .unwrap_or(DEFAULT_WRAPPER_NAMESPACE);
    to_cpp_namespace(raw)
}

/// Namespace bound in the wire schema's `$Cxx.namespace` annotation.
pub fn capnp_namespace(schema: &Schema) -> String {
    if schema.namespace.is_empty() {
        DEFAULT_CAPNP_NAMESPACE.to_string()
    } else {
        to_cpp_namespace(&schema.namespace)
    }
}

/// The `MessageType` value naming `message_name`.
///
/// Synthesis skips a message when a value with its exact name already
/// exists, so that name wins over the lower-first form.
pub(crate) fn message_type_value(schema: &Schema, message_name: &str) -> String {
    let exact = schema
        .enums
        .get(MESSAGE_TYPE_ENUM)
        .is_some_and(|decl| decl.values.iter().any(|v| v.name == message_name));
    if exact {
        message_name.to_string()
    } else {
        lower_first(message_name)
    }
}

/// Whether the flattened field list already starts with `msgType : MessageType`.
pub(crate) fn starts_with_message_type(fields: &[&Field]) -> bool {
    fields.first().is_some_and(|f| {
        f.name == "msgType" && f.ty.custom_name() == Some(MESSAGE_TYPE_ENUM)
    })
}

/// Declared messages referenced by `message`'s own fields, excluding itself.
pub(crate) fn referenced_messages<'a>(schema: &Schema, message: &'a Message) -> BTreeSet<&'a str> {
    fn collect<'a>(schema: &Schema, ty: &'a Type, out: &mut BTreeSet<&'a str>) {
        match ty {
            Type::Custom(name) if schema.is_message(name) => {
                out.insert(name);
            }
            Type::List(element) => collect(schema, element, out),
            Type::Map(key, value) => {
                collect(schema, key, out);
                collect(schema, value, out);
            }
            _ => {}
        }
    }

    let mut out = BTreeSet::new();
    for field in &message.fields {
        collect(schema, &field.ty, &mut out);
    }
    out.remove(message.name.as_str());
    out
}

// ── Paths ──────────────────────────────────────────────────────────────

/// A path ending in `.capnp` is the output file; anything else is a
/// directory that receives [`DEFAULT_CAPNP_FILE`].
pub fn resolve_capnp_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::Codegen("capnp output path is empty".to_string()));
    }
    if path.extension().is_some_and(|ext| ext == "capnp") {
        Ok(path.to_path_buf())
    } else {
        Ok(path.join(DEFAULT_CAPNP_FILE))
    }
}

/// `#include` prefix for generated headers: the header directory's last
/// component plus `/`, or empty.
///
/// - `include/messages/` → `"messages/"`
/// - `.` → `""`
pub fn include_prefix(header_dir: &Path) -> String {
    header_dir
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| format!("{name}/"))
        .unwrap_or_default()
}

/// Write content to a file, creating parent directories as needed.
fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
