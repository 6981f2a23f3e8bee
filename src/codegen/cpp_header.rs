//! Per-message C++ headers.
//!
//! Class headers declare a `MessageBase`-derived wrapper with the message's
//! own fields and the conversion methods implemented by the generated
//! source. Plain headers declare a bare data class.

use std::fmt::Write;

use crate::regen::{PreservedSlots, Slot, slots, write_slot};
use crate::schema::{Message, Schema};
use crate::type_map::header_guard;

use super::{CppContext, referenced_messages};

pub(super) const CLASS_SLOTS: [Slot; 4] = [
    slots::USER_INCLUDES,
    slots::USER_METHODS,
    slots::USER_PROTECTED,
    slots::USER_PRIVATE,
];

pub(super) const PLAIN_SLOTS: [Slot; 2] = [slots::USER_INCLUDES, slots::USER_PROPERTIES];

const INDENT: &str = "    ";

pub(super) fn render_class_header(
    schema: &Schema,
    message: &Message,
    ctx: &CppContext<'_>,
    preserved: &PreservedSlots,
) -> String {
    let name = &message.name;
    let guard = header_guard(name);
    let capnp_struct = format!("::{}::{name}", ctx.capnp_namespace);
    let mut out = String::new();

    write_guard_open(&mut out, &guard);

    writeln!(out, "#include <cstdint>").unwrap();
    writeln!(out, "#include <memory>").unwrap();
    writeln!(out, "#include <string>").unwrap();
    writeln!(out, "#include <unordered_map>").unwrap();
    writeln!(out, "#include <vector>").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#include <capnp/message.h>").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#include \"{}\"", ctx.capnp_header).unwrap();
    writeln!(out, "#include \"{}message_base.hpp\"", ctx.include_prefix).unwrap();
    writeln!(out, "#include \"{}enums.hpp\"", ctx.include_prefix).unwrap();
    write_message_includes(&mut out, schema, message, ctx);
    writeln!(out).unwrap();

    write_slot(&mut out, "", slots::USER_INCLUDES, preserved.get(slots::USER_INCLUDES));
    writeln!(out).unwrap();

    writeln!(out, "namespace {}", ctx.namespace).unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out).unwrap();

    let base = message.parent.as_deref().unwrap_or("MessageBase");
    writeln!(out, "/// @brief Auto-generated message class for {name}.").unwrap();
    writeln!(out, "/// @details Message ID: {}", message.id).unwrap();
    if let Some(parent) = &message.parent {
        writeln!(out, "///          Inherits from: {parent}").unwrap();
    }
    writeln!(out, "class {name} : public {base}").unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out, "public:").unwrap();

    writeln!(out, "    // ---- Constructors and Destructor ----").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "    {name}();").unwrap();
    writeln!(out, "    {name}(const {name}& other);").unwrap();
    writeln!(out, "    {name}({name}&& other) noexcept;").unwrap();
    writeln!(out, "    {name}& operator=(const {name}& other);").unwrap();
    writeln!(out, "    {name}& operator=({name}&& other) noexcept;").unwrap();
    writeln!(out, "    ~{name}() override;").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "    // ---- MessageBase Interface ----").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "    std::uint64_t get_message_id() const override;").unwrap();
    writeln!(out, "    std::string get_message_name() const override;").unwrap();
    writeln!(out, "    std::vector<std::uint8_t> serialize() const override;").unwrap();
    writeln!(out, "    SerializedData serialize_fast() const override;").unwrap();
    writeln!(
        out,
        "    bool deserialize(const std::vector<std::uint8_t>& data) override;"
    )
    .unwrap();
    writeln!(
        out,
        "    bool deserialize(const std::uint8_t* data, std::size_t size) override;"
    )
    .unwrap();
    writeln!(out).unwrap();

    writeln!(out, "    // ---- Cap'n Proto Conversion Methods ----").unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "    /// @brief Write this message as the root of `message_builder`."
    )
    .unwrap();
    writeln!(
        out,
        "    void to_capnp(::capnp::MessageBuilder& message_builder) const;"
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "    /// @brief Read this message from the root of `message_reader`."
    )
    .unwrap();
    writeln!(
        out,
        "    void from_capnp(::capnp::MessageReader& message_reader);"
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "    /// @brief Fill a struct builder, e.g. when nested in another message."
    )
    .unwrap();
    writeln!(
        out,
        "    void to_capnp_struct({capnp_struct}::Builder builder) const;"
    )
    .unwrap();
    writeln!(out).unwrap();
    writeln!(out, "    /// @brief Populate from a struct reader.").unwrap();
    writeln!(
        out,
        "    void from_capnp_struct({capnp_struct}::Reader reader);"
    )
    .unwrap();
    writeln!(out).unwrap();

    writeln!(out, "    // ---- Generated Fields ----").unwrap();
    writeln!(out).unwrap();
    for field in &message.fields {
        writeln!(out, "    {} {};", field.ty.cpp_type(), field.name).unwrap();
    }
    if !message.fields.is_empty() {
        writeln!(out).unwrap();
    }

    write_slot(&mut out, INDENT, slots::USER_METHODS, preserved.get(slots::USER_METHODS));
    writeln!(out).unwrap();

    writeln!(out, "protected:").unwrap();
    write_slot(
        &mut out,
        INDENT,
        slots::USER_PROTECTED,
        preserved.get(slots::USER_PROTECTED),
    );
    writeln!(out).unwrap();

    writeln!(out, "private:").unwrap();
    writeln!(out, "    void _copy_from(const {name}& other);").unwrap();
    writeln!(out).unwrap();
    write_slot(&mut out, INDENT, slots::USER_PRIVATE, preserved.get(slots::USER_PRIVATE));
    writeln!(out, "}};").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "}} // namespace {}", ctx.namespace).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#endif // {guard}").unwrap();

    out
}

pub(super) fn render_plain_header(
    schema: &Schema,
    message: &Message,
    ctx: &CppContext<'_>,
    preserved: &PreservedSlots,
) -> String {
    let name = &message.name;
    let guard = header_guard(name);
    let mut out = String::new();

    write_guard_open(&mut out, &guard);

    writeln!(out, "#include <cstdint>").unwrap();
    writeln!(out, "#include <string>").unwrap();
    writeln!(out, "#include <unordered_map>").unwrap();
    writeln!(out, "#include <vector>").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#include \"{}enums.hpp\"", ctx.include_prefix).unwrap();
    write_message_includes(&mut out, schema, message, ctx);
    writeln!(out).unwrap();

    write_slot(&mut out, "", slots::USER_INCLUDES, preserved.get(slots::USER_INCLUDES));
    writeln!(out).unwrap();

    writeln!(out, "namespace {}", ctx.namespace).unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "/// @brief Auto-generated data class for {name}.").unwrap();
    match &message.parent {
        Some(parent) => writeln!(out, "class {name} : public {parent}").unwrap(),
        None => writeln!(out, "class {name}").unwrap(),
    }
    writeln!(out, "{{").unwrap();
    writeln!(out, "public:").unwrap();
    writeln!(out, "    {name}() = default;").unwrap();
    writeln!(out, "    ~{name}() = default;").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "    // ---- Generated Fields ----").unwrap();
    writeln!(out).unwrap();
    for field in &message.fields {
        writeln!(out, "    {} {};", field.ty.cpp_type(), field.name).unwrap();
    }
    if !message.fields.is_empty() {
        writeln!(out).unwrap();
    }

    write_slot(
        &mut out,
        INDENT,
        slots::USER_PROPERTIES,
        preserved.get(slots::USER_PROPERTIES),
    );
    writeln!(out, "}};").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "}} // namespace {}", ctx.namespace).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#endif // {guard}").unwrap();

    out
}

fn write_guard_open(out: &mut String, guard: &str) {
    writeln!(out, "#pragma once").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#ifndef {guard}").unwrap();
    writeln!(out, "#define {guard}").unwrap();
    writeln!(out).unwrap();
}

/// Include the parent header and every message header a field refers to.
fn write_message_includes(
    out: &mut String,
    schema: &Schema,
    message: &Message,
    ctx: &CppContext<'_>,
) {
    let mut headers = referenced_messages(schema, message);
    if let Some(parent) = message.parent.as_deref().filter(|p| schema.is_message(p)) {
        headers.insert(parent);
    }
    for header in headers {
        writeln!(out, "#include \"{}{header}.hpp\"", ctx.include_prefix).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CppContext<'static> {
        CppContext {
            namespace: "game::net".to_string(),
            capnp_namespace: "game::message".to_string(),
            include_prefix: "messages/",
            capnp_header: "network_msg.capnp.h",
        }
    }

    fn schema() -> Schema {
        Schema::from_source(
            "enum Status { ok, failed }\n\
             message Base(1) { uint64 timestamp; }\n\
             message Item(2) { string label; }\n\
             message Move(3) extends Base { float32 x; list<Item> items; Status status; }",
        )
        .unwrap()
    }

    #[test]
    fn class_header_layout() {
        let schema = schema();
        let out = render_class_header(
            &schema,
            &schema.messages["Move"],
            &ctx(),
            &PreservedSlots::default(),
        );

        assert!(out.starts_with("#pragma once\n\n#ifndef MOVE_HPP\n#define MOVE_HPP\n"));
        assert!(out.contains("#include \"messages/Base.hpp\"\n#include \"messages/Item.hpp\"\n"));
        assert!(!out.contains("Status.hpp"));
        assert!(out.contains("namespace game::net\n{"));
        assert!(out.contains("class Move : public Base\n{"));
        assert!(out.contains("    float x;\n    std::vector<Item> items;\n    Status status;\n"));
        assert!(!out.contains("timestamp"));
        assert!(
            out.contains("void to_capnp_struct(::game::message::Move::Builder builder) const;")
        );
        assert!(out.contains("    // USER_METHODS_START\n    // USER_METHODS_END\n"));
        assert!(out.contains("// USER_INCLUDES_START\n// USER_INCLUDES_END\n"));
        assert!(out.ends_with("#endif // MOVE_HPP\n"));
    }

    #[test]
    fn root_message_derives_from_message_base() {
        let schema = schema();
        let out = render_class_header(
            &schema,
            &schema.messages["Base"],
            &ctx(),
            &PreservedSlots::default(),
        );
        assert!(out.contains("class Base : public MessageBase\n"));
    }

    #[test]
    fn class_header_splices_preserved_slots() {
        let schema = schema();
        let previous = "    // USER_PRIVATE_START\n    int cache_ = 0;\n    // USER_PRIVATE_END\n";
        let preserved = PreservedSlots::from_text(Some(previous), &CLASS_SLOTS);
        let out = render_class_header(&schema, &schema.messages["Item"], &ctx(), &preserved);
        assert!(
            out.contains("    // USER_PRIVATE_START\n    int cache_ = 0;\n    // USER_PRIVATE_END\n")
        );
    }

    #[test]
    fn plain_header_has_properties_slot() {
        let schema = schema();
        let out = render_plain_header(
            &schema,
            &schema.messages["Item"],
            &ctx(),
            &PreservedSlots::default(),
        );
        assert!(out.contains("class Item\n{"));
        assert!(out.contains("    std::string label;\n"));
        assert!(out.contains("    // USER_PROPERTIES_START\n    // USER_PROPERTIES_END\n"));
        assert!(!out.contains("MessageBase"));
    }
}
