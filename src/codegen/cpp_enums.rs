//! `enums.hpp`: one `enum class` per schema enum, in name order.

use std::fmt::Write;

use crate::regen::{PreservedSlots, Slot, slots, write_slot};
use crate::schema::{EnumDecl, Schema};

use super::CppContext;

pub(super) const ENUMS_SLOTS: [Slot; 2] = [slots::USER_INCLUDES, slots::USER_DEFINITIONS];

pub(super) fn render_enums_header(
    schema: &Schema,
    ctx: &CppContext<'_>,
    preserved: &PreservedSlots,
) -> String {
    let mut out = String::new();

    writeln!(out, "#pragma once").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#ifndef ENUMS_HPP").unwrap();
    writeln!(out, "#define ENUMS_HPP").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#include <cstdint>").unwrap();
    writeln!(out, "#include <ostream>").unwrap();
    writeln!(out).unwrap();

    write_slot(&mut out, "", slots::USER_INCLUDES, preserved.get(slots::USER_INCLUDES));
    writeln!(out).unwrap();

    writeln!(out, "namespace {}", ctx.namespace).unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "// ---- Auto-Generated Enum Definitions ----").unwrap();
    writeln!(out).unwrap();

    for decl in schema.enums.values() {
        write_enum_class(&mut out, decl);
    }

    write_slot(
        &mut out,
        "",
        slots::USER_DEFINITIONS,
        preserved.get(slots::USER_DEFINITIONS),
    );
    writeln!(out).unwrap();

    writeln!(out, "}} // namespace {}", ctx.namespace).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#endif // ENUMS_HPP").unwrap();

    out
}

fn write_enum_class(out: &mut String, decl: &EnumDecl) {
    let name = &decl.name;

    writeln!(out, "/// @brief Enum: {name}").unwrap();
    if let Some(id) = decl.id {
        writeln!(out, "/// @details Cap'n Proto ID: 0x{id:x}").unwrap();
    }
    writeln!(out, "enum class {name} : std::int64_t").unwrap();
    writeln!(out, "{{").unwrap();
    for value in &decl.values {
        writeln!(out, "    {} = {},", value.name, value.value).unwrap();
    }
    writeln!(out, "}};").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "/// @brief Stream output operator for {name}.").unwrap();
    writeln!(
        out,
        "inline std::ostream& operator<<(std::ostream& os, {name} value)"
    )
    .unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out, "    switch (value)").unwrap();
    writeln!(out, "    {{").unwrap();
    for value in &decl.values {
        writeln!(
            out,
            "        case {name}::{0}: return os << \"{0}\";",
            value.name
        )
        .unwrap();
    }
    writeln!(
        out,
        "        default: return os << \"Unknown(\" << static_cast<std::int64_t>(value) << \")\";"
    )
    .unwrap();
    writeln!(out, "    }}").unwrap();
    writeln!(out, "}}").unwrap();
    writeln!(out).unwrap();
}
