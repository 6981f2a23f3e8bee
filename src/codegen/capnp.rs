//! Cap'n Proto wire-schema emitter.

use std::fmt::Write;

use crate::ids::{MSB_FLAG, derive_id, format_hex};
use crate::schema::{EnumDecl, Message, Schema};
use crate::type_map::to_capnp_identifier;

use super::{capnp_namespace, starts_with_message_type};

/// Render the complete `.capnp` file for `schema` under `root_id`.
///
/// Enums and structs are emitted in name order. Struct fields are the
/// flattened inherited-then-own list, numbered from 0, with a leading
/// `msgType @0 : MessageType;` unless the list already starts with it.
pub fn render_capnp(schema: &Schema, root_id: u64) -> String {
    let mut out = String::new();

    write_header(&mut out, schema, root_id);
    for decl in schema.enums.values() {
        write_enum(&mut out, decl, root_id);
    }
    write_map_template(&mut out);
    for message in schema.messages.values() {
        write_struct(&mut out, schema, message, root_id);
    }

    out
}

fn write_header(out: &mut String, schema: &Schema, root_id: u64) {
    writeln!(out, "{};", format_hex(root_id)).unwrap();
    writeln!(out, "using Cxx = import \"/capnp/c++.capnp\";").unwrap();
    writeln!(out, "$Cxx.namespace(\"{}\");", capnp_namespace(schema)).unwrap();
    writeln!(out).unwrap();
}

// ── Enums ──────────────────────────────────────────────────────────────

fn write_enum(out: &mut String, decl: &EnumDecl, root_id: u64) {
    let id = match decl.id {
        Some(explicit) => explicit | MSB_FLAG,
        None => derive_id(root_id, &decl.name),
    };

    writeln!(
        out,
        "enum {} {} {{",
        to_capnp_identifier(&decl.name),
        format_hex(id)
    )
    .unwrap();
    for value in &decl.values {
        writeln!(
            out,
            "  {} @{};",
            to_capnp_identifier(&value.name),
            value.value
        )
        .unwrap();
    }
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();
}

// ── Map template ───────────────────────────────────────────────────────

fn write_map_template(out: &mut String) {
    out.push_str(
        "struct Map(Key, Value) {\n\
         \x20 entries @0 :List(Entry);\n\
         \x20 struct Entry {\n\
         \x20   key @0 :Key;\n\
         \x20   value @1 :Value;\n\
         \x20 }\n\
         }\n\n",
    );
}

// ── Structs ────────────────────────────────────────────────────────────

fn write_struct(out: &mut String, schema: &Schema, message: &Message, root_id: u64) {
    let fields = schema.flattened_fields(message);

    writeln!(
        out,
        "struct {} {} {{",
        to_capnp_identifier(&message.name),
        format_hex(derive_id(root_id, &message.name))
    )
    .unwrap();

    let mut ordinal = 0usize;
    if !starts_with_message_type(&fields) {
        writeln!(out, "  msgType @{ordinal} : MessageType;").unwrap();
        ordinal += 1;
    }
    for field in fields {
        writeln!(
            out,
            "  {} @{ordinal} : {};",
            to_capnp_identifier(&field.name),
            field.ty.capnp_type()
        )
        .unwrap();
        ordinal += 1;
    }

    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::extract_root_id;

    const ROOT: u64 = 0x8123_4567_89ab_cdef;

    fn render(source: &str) -> String {
        render_capnp(&Schema::from_source(source).unwrap(), ROOT)
    }

    #[test]
    fn header_carries_root_id_and_namespace() {
        let out = render("namespace game.message;");
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("@0x8123456789abcdef;"));
        assert_eq!(lines.next(), Some("using Cxx = import \"/capnp/c++.capnp\";"));
        assert_eq!(lines.next(), Some("$Cxx.namespace(\"game::message\");"));
        assert_eq!(extract_root_id(&out), Some(ROOT));
    }

    #[test]
    fn default_namespace() {
        assert!(render("").contains("$Cxx.namespace(\"curious::message\");"));
    }

    #[test]
    fn enums_sorted_with_explicit_and_derived_ids() {
        let out = render("enum Zed { z }\nenum Alpha @0x1234 { a, b | 5 }");
        let alpha = out.find("enum Alpha @0x8000000000001234 {").unwrap();
        let message_type = out
            .find(&format!("enum MessageType {} {{", format_hex(derive_id(ROOT, "MessageType"))))
            .unwrap();
        let zed = out
            .find(&format!("enum Zed {} {{", format_hex(derive_id(ROOT, "Zed"))))
            .unwrap();
        assert!(alpha < message_type && message_type < zed);
        assert!(out.contains("  a @0;\n  b @5;\n}"));
    }

    #[test]
    fn map_template_emitted_once() {
        let out = render(
            "message A(1) { map<string, int32> m; }\nmessage B(2) { map<string, A> n; }",
        );
        assert_eq!(out.matches("struct Map(Key, Value) {").count(), 1);
        assert!(out.contains("  m @1 : Map(Text, Int32);"));
        assert!(out.contains("  n @1 : Map(Text, A);"));
    }

    #[test]
    fn struct_fields_flattened_with_msg_type_first() {
        let out = render(
            "message Base(1) { int32 a; }\nmessage Child(2) extends Base { string b; }",
        );
        let expected = format!(
            "struct Child {} {{\n  msgType @0 : MessageType;\n  a @1 : Int32;\n  b @2 : Text;\n}}\n",
            format_hex(derive_id(ROOT, "Child"))
        );
        assert!(out.contains(&expected), "{out}");
    }

    #[test]
    fn explicit_msg_type_field_is_not_duplicated() {
        let out = render("message Ping(1) { MessageType msgType; uint64 at; }");
        assert_eq!(out.matches("msgType @").count(), 1);
        assert!(out.contains("  msgType @0 : MessageType;\n  at @1 : UInt64;\n"));
    }

    #[test]
    fn whitespace_in_identifiers_is_replaced() {
        let mut schema = Schema::from_source("message A(1) {}").unwrap();
        if let Some(decl) = schema.enums.get_mut("MessageType") {
            decl.values[0].name = "not set".to_string();
        }
        let out = render_capnp(&schema, ROOT);
        assert!(out.contains("  not_set @0;"));
    }
}
