//! Per-message C++ sources.
//!
//! Implements the members declared by the class header. The Cap'n Proto
//! conversions walk the flattened field list so one struct carries the whole
//! inheritance chain, matching the wire schema. `_copy_from` only touches
//! own fields; the parent's copy handles the rest.

use std::fmt::Write;

use crate::regen::{PreservedSlots, Slot, slots, write_slot};
use crate::schema::{MESSAGE_TYPE_ENUM, Message, Schema};
use crate::type_map::upper_first;
use crate::types::{Primitive, Type};

use super::{CppContext, message_type_value, starts_with_message_type};

pub(super) const SOURCE_SLOTS: [Slot; 6] = [
    slots::USER_IMPL_INCLUDES,
    slots::USER_CONSTRUCTOR,
    slots::USER_TO_CAPNP,
    slots::USER_FROM_CAPNP,
    slots::USER_COPY_FROM,
    slots::USER_IMPL,
];

pub(super) fn render_source(
    schema: &Schema,
    message: &Message,
    ctx: &CppContext<'_>,
    preserved: &PreservedSlots,
) -> String {
    let name = &message.name;
    let mut out = String::new();

    writeln!(out, "#include \"{}{name}.hpp\"", ctx.include_prefix).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#include <cstdlib>").unwrap();
    writeln!(out, "#include <cstring>").unwrap();
    writeln!(out, "#include <utility>").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#include <capnp/message.h>").unwrap();
    writeln!(out, "#include <capnp/serialize.h>").unwrap();
    writeln!(out, "#include <kj/array.h>").unwrap();
    writeln!(out).unwrap();

    write_slot(
        &mut out,
        "",
        slots::USER_IMPL_INCLUDES,
        preserved.get(slots::USER_IMPL_INCLUDES),
    );
    writeln!(out).unwrap();

    writeln!(out, "namespace {}", ctx.namespace).unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out).unwrap();

    write_special_members(&mut out, message, preserved);
    write_message_base_interface(&mut out, message);
    write_conversions(&mut out, schema, message, ctx, preserved);
    write_copy_from(&mut out, message, preserved);

    write_slot(&mut out, "", slots::USER_IMPL, preserved.get(slots::USER_IMPL));
    writeln!(out).unwrap();

    writeln!(out, "}} // namespace {}", ctx.namespace).unwrap();

    out
}

// ── Constructors and assignment ────────────────────────────────────────

fn write_special_members(out: &mut String, message: &Message, preserved: &PreservedSlots) {
    let name = &message.name;
    let base = message.parent.as_deref().unwrap_or("MessageBase");

    writeln!(out, "// ---- Constructors and Destructor ----").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "{name}::{name}()").unwrap();
    writeln!(out, "    : {base}()").unwrap();
    writeln!(out, "{{").unwrap();
    write_slot(
        out,
        "",
        slots::USER_CONSTRUCTOR,
        preserved.get(slots::USER_CONSTRUCTOR),
    );
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "{name}::{name}(const {name}& other)").unwrap();
    writeln!(out, "    : {base}(other)").unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out, "    _copy_from(other);").unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "{name}::{name}({name}&& other) noexcept").unwrap();
    writeln!(out, "    : {base}(std::move(other))").unwrap();
    for field in &message.fields {
        writeln!(out, "    , {0}(std::move(other.{0}))", field.name).unwrap();
    }
    writeln!(out, "{{").unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "{name}& {name}::operator=(const {name}& other)").unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out, "    if (this != &other)").unwrap();
    writeln!(out, "    {{").unwrap();
    writeln!(out, "        {base}::operator=(other);").unwrap();
    writeln!(out, "        _copy_from(other);").unwrap();
    writeln!(out, "    }}").unwrap();
    writeln!(out, "    return *this;").unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "{name}& {name}::operator=({name}&& other) noexcept").unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out, "    if (this != &other)").unwrap();
    writeln!(out, "    {{").unwrap();
    writeln!(out, "        {base}::operator=(std::move(other));").unwrap();
    for field in &message.fields {
        writeln!(out, "        {0} = std::move(other.{0});", field.name).unwrap();
    }
    writeln!(out, "    }}").unwrap();
    writeln!(out, "    return *this;").unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "{name}::~{name}() = default;").unwrap();
    writeln!(out).unwrap();
}

// ── MessageBase interface ──────────────────────────────────────────────

fn write_message_base_interface(out: &mut String, message: &Message) {
    let name = &message.name;

    writeln!(out, "// ---- MessageBase Interface ----").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "std::uint64_t {name}::get_message_id() const").unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out, "    return {};", message.id).unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "std::string {name}::get_message_name() const").unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out, "    return \"{name}\";").unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();

    out.push_str(&format!(
        "std::vector<std::uint8_t> {name}::serialize() const\n\
         {{\n\
         \x20   auto fast = serialize_fast();\n\
         \x20   return std::vector<std::uint8_t>(fast.bytes(), fast.bytes() + fast.size);\n\
         }}\n\
         \n\
         SerializedData {name}::serialize_fast() const\n\
         {{\n\
         \x20   ::capnp::MallocMessageBuilder message_builder;\n\
         \x20   to_capnp(message_builder);\n\
         \n\
         \x20   kj::Array<capnp::word> words = capnp::messageToFlatArray(message_builder);\n\
         \x20   const std::size_t byte_size = words.size() * sizeof(capnp::word);\n\
         \n\
         \x20   void* buffer = std::aligned_alloc(alignof(capnp::word), byte_size);\n\
         \x20   if (!buffer)\n\
         \x20   {{\n\
         \x20       return {{}};\n\
         \x20   }}\n\
         \x20   std::memcpy(buffer, words.begin(), byte_size);\n\
         \x20   return SerializedData(buffer, byte_size, words.size());\n\
         }}\n\
         \n\
         bool {name}::deserialize(const std::vector<std::uint8_t>& data)\n\
         {{\n\
         \x20   return deserialize(data.data(), data.size());\n\
         }}\n\
         \n\
         bool {name}::deserialize(const std::uint8_t* data, std::size_t size)\n\
         {{\n\
         \x20   try\n\
         \x20   {{\n\
         \x20       kj::ArrayPtr<const capnp::word> words(\n\
         \x20           reinterpret_cast<const capnp::word*>(data),\n\
         \x20           size / sizeof(capnp::word));\n\
         \x20       ::capnp::FlatArrayMessageReader reader(words);\n\
         \x20       from_capnp(reader);\n\
         \x20       return true;\n\
         \x20   }}\n\
         \x20   catch (...)\n\
         \x20   {{\n\
         \x20       return false;\n\
         \x20   }}\n\
         }}\n\
         \n"
    ));
}

// ── Cap'n Proto conversions ────────────────────────────────────────────

fn write_conversions(
    out: &mut String,
    schema: &Schema,
    message: &Message,
    ctx: &CppContext<'_>,
    preserved: &PreservedSlots,
) {
    let name = &message.name;
    let capnp_struct = format!("::{}::{name}", ctx.capnp_namespace);
    let fields = schema.flattened_fields(message);

    writeln!(out, "// ---- Cap'n Proto Conversion Methods ----").unwrap();
    writeln!(out).unwrap();

    writeln!(
        out,
        "void {name}::to_capnp(::capnp::MessageBuilder& message_builder) const"
    )
    .unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(
        out,
        "    to_capnp_struct(message_builder.initRoot<{capnp_struct}>());"
    )
    .unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();

    writeln!(
        out,
        "void {name}::from_capnp(::capnp::MessageReader& message_reader)"
    )
    .unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(
        out,
        "    from_capnp_struct(message_reader.getRoot<{capnp_struct}>());"
    )
    .unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();

    writeln!(
        out,
        "void {name}::to_capnp_struct({capnp_struct}::Builder builder) const"
    )
    .unwrap();
    writeln!(out, "{{").unwrap();
    if !starts_with_message_type(&fields) {
        writeln!(
            out,
            "    builder.setMsgType(::{}::{MESSAGE_TYPE_ENUM}::{});",
            ctx.capnp_namespace,
            message_type_value(schema, name)
        )
        .unwrap();
        writeln!(out).unwrap();
    }
    for field in &fields {
        let ty = schema.resolve_type(&field.ty);
        writeln!(out, "    // Field: {}", field.name).unwrap();
        write_field_to_capnp(out, &field.name, &ty, ctx);
        writeln!(out).unwrap();
    }
    write_slot(out, "", slots::USER_TO_CAPNP, preserved.get(slots::USER_TO_CAPNP));
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();

    writeln!(
        out,
        "void {name}::from_capnp_struct({capnp_struct}::Reader reader)"
    )
    .unwrap();
    writeln!(out, "{{").unwrap();
    for field in &fields {
        let ty = schema.resolve_type(&field.ty);
        writeln!(out, "    // Field: {}", field.name).unwrap();
        write_field_from_capnp(out, &field.name, &ty);
        writeln!(out).unwrap();
    }
    write_slot(
        out,
        "",
        slots::USER_FROM_CAPNP,
        preserved.get(slots::USER_FROM_CAPNP),
    );
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();
}

/// Expression converting a C++ value into what a Cap'n Proto setter takes,
/// or `None` for values that need a builder (structs, containers) or cannot
/// be converted.
fn to_wire_value(ty: &Type, value: &str, ctx: &CppContext<'_>) -> Option<String> {
    match ty {
        Type::Primitive(Primitive::String) => Some(format!("{value}.c_str()")),
        Type::Primitive(Primitive::Bytes) => Some(format!(
            "::capnp::Data::Reader({value}.data(), {value}.size())"
        )),
        Type::Primitive(Primitive::Void | Primitive::AnyPointer) => None,
        Type::Primitive(_) => Some(value.to_string()),
        Type::Enum { name, .. } => Some(format!(
            "static_cast<::{}::{name}>({value})",
            ctx.capnp_namespace
        )),
        Type::Custom(_) | Type::List(_) | Type::Map(_, _) => None,
    }
}

/// Expression converting a Cap'n Proto reader value into the C++ field type.
fn from_wire_value(ty: &Type, value: &str) -> Option<String> {
    match ty {
        Type::Primitive(Primitive::String) => {
            Some(format!("std::string({value}.cStr(), {value}.size())"))
        }
        Type::Primitive(Primitive::Bytes) => Some(format!(
            "std::vector<std::uint8_t>({value}.begin(), {value}.end())"
        )),
        Type::Primitive(Primitive::Void | Primitive::AnyPointer) => None,
        Type::Primitive(_) => Some(value.to_string()),
        Type::Enum { name, .. } => Some(format!("static_cast<{name}>({value})")),
        Type::Custom(_) | Type::List(_) | Type::Map(_, _) => None,
    }
}

fn is_struct(ty: &Type) -> bool {
    matches!(ty, Type::Custom(_))
}

fn write_field_to_capnp(out: &mut String, field: &str, ty: &Type, ctx: &CppContext<'_>) {
    let accessor = upper_first(field);

    if let Some(value) = to_wire_value(ty, field, ctx) {
        writeln!(out, "    builder.set{accessor}({value});").unwrap();
        return;
    }

    match ty {
        Type::Custom(_) => {
            writeln!(out, "    {field}.to_capnp_struct(builder.init{accessor}());").unwrap();
        }
        Type::List(element) => {
            let item = format!("{field}[i]");
            let body = if let Some(value) = to_wire_value(element, &item, ctx) {
                format!("list_builder.set(i, {value});")
            } else if is_struct(element) {
                format!("{item}.to_capnp_struct(list_builder[i]);")
            } else {
                writeln!(
                    out,
                    "    // {field}: nested container elements are not converted"
                )
                .unwrap();
                return;
            };
            writeln!(out, "    {{").unwrap();
            writeln!(
                out,
                "        auto list_builder = builder.init{accessor}(static_cast<unsigned int>({field}.size()));"
            )
            .unwrap();
            writeln!(
                out,
                "        for (unsigned int i = 0; i < list_builder.size(); ++i)"
            )
            .unwrap();
            writeln!(out, "        {{").unwrap();
            writeln!(out, "            {body}").unwrap();
            writeln!(out, "        }}").unwrap();
            writeln!(out, "    }}").unwrap();
        }
        Type::Map(key, value) => {
            let Some(key_expr) = to_wire_value(key, "key", ctx) else {
                writeln!(out, "    // {field}: only scalar map keys are converted").unwrap();
                return;
            };
            let value_stmt = if let Some(value_expr) = to_wire_value(value, "value", ctx) {
                format!("entry.setValue({value_expr});")
            } else if is_struct(value) {
                "value.to_capnp_struct(entry.initValue());".to_string()
            } else {
                writeln!(out, "    // {field}: nested container values are not converted").unwrap();
                return;
            };
            writeln!(out, "    {{").unwrap();
            writeln!(
                out,
                "        auto entries = builder.init{accessor}().initEntries(static_cast<unsigned int>({field}.size()));"
            )
            .unwrap();
            writeln!(out, "        unsigned int index = 0;").unwrap();
            writeln!(out, "        for (const auto& [key, value] : {field})").unwrap();
            writeln!(out, "        {{").unwrap();
            writeln!(out, "            auto entry = entries[index++];").unwrap();
            writeln!(out, "            entry.setKey({key_expr});").unwrap();
            writeln!(out, "            {value_stmt}").unwrap();
            writeln!(out, "        }}").unwrap();
            writeln!(out, "    }}").unwrap();
        }
        Type::Primitive(_) | Type::Enum { .. } => {
            writeln!(out, "    // {field}: no wire representation").unwrap();
        }
    }
}

fn write_field_from_capnp(out: &mut String, field: &str, ty: &Type) {
    let accessor = upper_first(field);
    let getter = format!("reader.get{accessor}()");

    if let Some(value) = from_wire_value(ty, &getter) {
        writeln!(out, "    {field} = {value};").unwrap();
        return;
    }

    match ty {
        Type::Custom(_) => {
            writeln!(out, "    if (reader.has{accessor}())").unwrap();
            writeln!(out, "    {{").unwrap();
            writeln!(out, "        {field}.from_capnp_struct({getter});").unwrap();
            writeln!(out, "    }}").unwrap();
        }
        Type::List(element) => {
            let push = if let Some(value) = from_wire_value(element, "item") {
                format!("{field}.push_back({value});")
            } else if is_struct(element) {
                format!(
                    "{field}.emplace_back();\n                {field}.back().from_capnp_struct(item);"
                )
            } else {
                writeln!(
                    out,
                    "    // {field}: nested container elements are not converted"
                )
                .unwrap();
                return;
            };
            writeln!(out, "    {field}.clear();").unwrap();
            writeln!(out, "    if (reader.has{accessor}())").unwrap();
            writeln!(out, "    {{").unwrap();
            writeln!(out, "        auto list_reader = {getter};").unwrap();
            writeln!(out, "        {field}.reserve(list_reader.size());").unwrap();
            writeln!(out, "        for (auto item : list_reader)").unwrap();
            writeln!(out, "        {{").unwrap();
            writeln!(out, "            {push}").unwrap();
            writeln!(out, "        }}").unwrap();
            writeln!(out, "    }}").unwrap();
        }
        Type::Map(key, value) => {
            let Some(key_expr) = from_wire_value(key, "entry.getKey()") else {
                writeln!(out, "    // {field}: only scalar map keys are converted").unwrap();
                return;
            };
            let assign = if let Some(value_expr) = from_wire_value(value, "entry.getValue()") {
                format!("{field}[{key_expr}] = {value_expr};")
            } else if is_struct(value) {
                format!("{field}[{key_expr}].from_capnp_struct(entry.getValue());")
            } else {
                writeln!(out, "    // {field}: nested container values are not converted").unwrap();
                return;
            };
            writeln!(out, "    {field}.clear();").unwrap();
            writeln!(out, "    if (reader.has{accessor}())").unwrap();
            writeln!(out, "    {{").unwrap();
            writeln!(out, "        for (auto entry : {getter}.getEntries())").unwrap();
            writeln!(out, "        {{").unwrap();
            writeln!(out, "            {assign}").unwrap();
            writeln!(out, "        }}").unwrap();
            writeln!(out, "    }}").unwrap();
        }
        Type::Primitive(_) | Type::Enum { .. } => {
            writeln!(out, "    // {field}: no wire representation").unwrap();
        }
    }
}

// ── Private helpers ────────────────────────────────────────────────────

fn write_copy_from(out: &mut String, message: &Message, preserved: &PreservedSlots) {
    let name = &message.name;

    writeln!(out, "// ---- Private Helpers ----").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "void {name}::_copy_from(const {name}& other)").unwrap();
    writeln!(out, "{{").unwrap();
    for field in &message.fields {
        writeln!(out, "    {0} = other.{0};", field.name).unwrap();
    }
    if !message.fields.is_empty() {
        writeln!(out).unwrap();
    }
    write_slot(
        out,
        "",
        slots::USER_COPY_FROM,
        preserved.get(slots::USER_COPY_FROM),
    );
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();
}
