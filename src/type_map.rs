//! Maps IDL primitive keywords to Cap'n Proto and C++ type strings, plus the
//! identifier conversions shared by the emitters.
//!
//! # Type Mapping Table
//!
//! | IDL keyword | Cap'n Proto | C++ | Notes |
//! |-------------|-------------|-----|-------|
//! | `int8` .. `int64` | `Int8` .. `Int64` | `int8_t` .. `int64_t` | `int` is `int32` |
//! | `uint8` .. `uint64` | `UInt8` .. `UInt64` | `uint8_t` .. `uint64_t` | |
//! | `float32`, `float64` | `Float32`, `Float64` | `float`, `double` | |
//! | `bool` | `Bool` | `bool` | |
//! | `string` | `Text` | `std::string` | |
//! | `bytes` | `Data` | `std::vector<uint8_t>` | |
//! | `void` | `Void` | `void` | |
//! | `anypointer` | `AnyPointer` | `void*` | |
//!
//! Keywords are matched exactly here; case-insensitive fallback is done by
//! [`Primitive::from_keyword`].

use crate::types::Primitive;

/// Exact-match lookup of a primitive keyword.
pub fn primitive_from_keyword(keyword: &str) -> Option<Primitive> {
    let primitive = match keyword {
        "int" | "int32" => Primitive::Int32,
        "int8" => Primitive::Int8,
        "int16" => Primitive::Int16,
        "int64" => Primitive::Int64,
        "uint8" => Primitive::UInt8,
        "uint16" => Primitive::UInt16,
        "uint32" => Primitive::UInt32,
        "uint64" => Primitive::UInt64,
        "float32" => Primitive::Float32,
        "float64" => Primitive::Float64,
        "bool" => Primitive::Bool,
        "string" => Primitive::String,
        "bytes" => Primitive::Bytes,
        "void" => Primitive::Void,
        "anypointer" => Primitive::AnyPointer,
        _ => return None,
    };
    Some(primitive)
}

pub fn primitive_to_capnp(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::Int8 => "Int8",
        Primitive::Int16 => "Int16",
        Primitive::Int32 => "Int32",
        Primitive::Int64 => "Int64",
        Primitive::UInt8 => "UInt8",
        Primitive::UInt16 => "UInt16",
        Primitive::UInt32 => "UInt32",
        Primitive::UInt64 => "UInt64",
        Primitive::Float32 => "Float32",
        Primitive::Float64 => "Float64",
        Primitive::Bool => "Bool",
        Primitive::String => "Text",
        Primitive::Bytes => "Data",
        Primitive::Void => "Void",
        Primitive::AnyPointer => "AnyPointer",
    }
}

pub fn primitive_to_cpp(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::Int8 => "int8_t",
        Primitive::Int16 => "int16_t",
        Primitive::Int32 => "int32_t",
        Primitive::Int64 => "int64_t",
        Primitive::UInt8 => "uint8_t",
        Primitive::UInt16 => "uint16_t",
        Primitive::UInt32 => "uint32_t",
        Primitive::UInt64 => "uint64_t",
        Primitive::Float32 => "float",
        Primitive::Float64 => "double",
        Primitive::Bool => "bool",
        Primitive::String => "std::string",
        Primitive::Bytes => "std::vector<uint8_t>",
        Primitive::Void => "void",
        Primitive::AnyPointer => "void*",
    }
}

/// Replace whitespace with `_` so a name is a valid Cap'n Proto identifier.
///
/// - `"Player Joined"` → `"Player_Joined"`
pub fn to_capnp_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Lower-case only the first character: `"PlayerJoined"` → `"playerJoined"`.
///
/// This is the `MessageType` value name of a message.
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_lowercase().to_string() + chars.as_str(),
    }
}

/// Upper-case only the first character: `"playerId"` → `"PlayerId"`.
///
/// Cap'n Proto accessors are `get<Name>` / `set<Name>` / `init<Name>`.
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().to_string() + chars.as_str(),
    }
}

/// Dotted namespace to C++ syntax: `"game.net"` → `"game::net"`.
pub fn to_cpp_namespace(namespace: &str) -> String {
    namespace.replace('.', "::")
}

/// Header guard for a generated header: `"PlayerJoined"` → `"PLAYERJOINED_HPP"`.
pub fn header_guard(name: &str) -> String {
    format!("{}_HPP", name.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_is_exact() {
        assert_eq!(primitive_from_keyword("int"), Some(Primitive::Int32));
        assert_eq!(primitive_from_keyword("uint16"), Some(Primitive::UInt16));
        assert_eq!(primitive_from_keyword("anypointer"), Some(Primitive::AnyPointer));
        assert_eq!(primitive_from_keyword("Int32"), None);
        assert_eq!(primitive_from_keyword("list"), None);
        assert_eq!(primitive_from_keyword("Player"), None);
    }

    #[test]
    fn every_keyword_has_both_renderings() {
        for kw in [
            "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64", "float32",
            "float64", "bool", "string", "bytes", "void", "anypointer",
        ] {
            let p = primitive_from_keyword(kw).unwrap();
            assert!(!primitive_to_capnp(p).is_empty());
            assert!(!primitive_to_cpp(p).is_empty());
        }
    }

    #[test]
    fn capnp_identifier_replaces_whitespace() {
        assert_eq!(to_capnp_identifier("Player Joined"), "Player_Joined");
        assert_eq!(to_capnp_identifier("plain"), "plain");
    }

    #[test]
    fn first_character_case() {
        assert_eq!(lower_first("PlayerJoined"), "playerJoined");
        assert_eq!(lower_first("already"), "already");
        assert_eq!(lower_first(""), "");
        assert_eq!(upper_first("playerId"), "PlayerId");
    }

    #[test]
    fn namespace_conversion() {
        assert_eq!(to_cpp_namespace("game.net.v1"), "game::net::v1");
        assert_eq!(to_cpp_namespace("flat"), "flat");
    }

    #[test]
    fn header_guard_upper_cases() {
        assert_eq!(header_guard("PlayerJoined"), "PLAYERJOINED_HPP");
    }
}
