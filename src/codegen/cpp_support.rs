//! Fully generated support headers: the `MessageBase` interface every
//! wrapper derives from, and the `MessageType`-keyed factory. Neither has
//! user slots.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::schema::Schema;

use super::{CppContext, message_type_value};

pub(super) fn render_message_base(ctx: &CppContext<'_>) -> String {
    let ns = &ctx.namespace;

    format!(
        "#pragma once\n\
         \n\
         #ifndef MESSAGE_BASE_HPP\n\
         #define MESSAGE_BASE_HPP\n\
         \n\
         #include <cstdint>\n\
         #include <cstdlib>\n\
         #include <memory>\n\
         #include <string>\n\
         #include <utility>\n\
         #include <vector>\n\
         \n\
         namespace {ns}\n\
         {{\n\
         \n\
         /// @brief Owned, word-aligned serialized message bytes.\n\
         struct SerializedData\n\
         {{\n\
         \x20   void* data = nullptr;\n\
         \x20   std::size_t size = 0;\n\
         \x20   std::size_t word_count = 0;\n\
         \n\
         \x20   SerializedData() = default;\n\
         \x20   SerializedData(void* ptr, std::size_t byte_size, std::size_t words)\n\
         \x20       : data(ptr), size(byte_size), word_count(words) {{}}\n\
         \n\
         \x20   SerializedData(const SerializedData&) = delete;\n\
         \x20   SerializedData& operator=(const SerializedData&) = delete;\n\
         \n\
         \x20   SerializedData(SerializedData&& other) noexcept\n\
         \x20       : data(std::exchange(other.data, nullptr))\n\
         \x20       , size(std::exchange(other.size, 0))\n\
         \x20       , word_count(std::exchange(other.word_count, 0))\n\
         \x20   {{\n\
         \x20   }}\n\
         \n\
         \x20   SerializedData& operator=(SerializedData&& other) noexcept\n\
         \x20   {{\n\
         \x20       if (this != &other)\n\
         \x20       {{\n\
         \x20           std::free(data);\n\
         \x20           data = std::exchange(other.data, nullptr);\n\
         \x20           size = std::exchange(other.size, 0);\n\
         \x20           word_count = std::exchange(other.word_count, 0);\n\
         \x20       }}\n\
         \x20       return *this;\n\
         \x20   }}\n\
         \n\
         \x20   ~SerializedData() {{ std::free(data); }}\n\
         \n\
         \x20   explicit operator bool() const {{ return data != nullptr && size > 0; }}\n\
         \n\
         \x20   const std::uint8_t* bytes() const {{ return static_cast<const std::uint8_t*>(data); }}\n\
         }};\n\
         \n\
         /// @brief Base class of every generated message class.\n\
         class MessageBase\n\
         {{\n\
         public:\n\
         \x20   MessageBase() = default;\n\
         \x20   virtual ~MessageBase() = default;\n\
         \n\
         \x20   MessageBase(const MessageBase& other) = default;\n\
         \x20   MessageBase(MessageBase&& other) noexcept = default;\n\
         \x20   MessageBase& operator=(const MessageBase& other) = default;\n\
         \x20   MessageBase& operator=(MessageBase&& other) noexcept = default;\n\
         \n\
         \x20   virtual std::uint64_t get_message_id() const = 0;\n\
         \x20   virtual std::string get_message_name() const = 0;\n\
         \n\
         \x20   virtual std::vector<std::uint8_t> serialize() const = 0;\n\
         \x20   virtual SerializedData serialize_fast() const = 0;\n\
         \n\
         \x20   virtual bool deserialize(const std::vector<std::uint8_t>& data) = 0;\n\
         \x20   virtual bool deserialize(const std::uint8_t* data, std::size_t size) = 0;\n\
         }};\n\
         \n\
         }} // namespace {ns}\n\
         \n\
         #endif // MESSAGE_BASE_HPP\n"
    )
}

pub(super) fn render_factory(schema: &Schema, ctx: &CppContext<'_>) -> String {
    let ns = &ctx.namespace;
    let prefix = ctx.include_prefix;
    let mut out = String::new();

    writeln!(out, "#pragma once").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#ifndef FACTORY_BUILDER_HPP").unwrap();
    writeln!(out, "#define FACTORY_BUILDER_HPP").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#include <cstdint>").unwrap();
    writeln!(out, "#include <memory>").unwrap();
    writeln!(out, "#include <stdexcept>").unwrap();
    writeln!(out, "#include <string>").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#include \"{prefix}enums.hpp\"").unwrap();
    writeln!(out, "#include \"{prefix}message_base.hpp\"").unwrap();
    for name in schema.messages.keys() {
        writeln!(out, "#include \"{prefix}{name}.hpp\"").unwrap();
    }
    writeln!(out).unwrap();

    writeln!(out, "namespace {ns}").unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "/// @brief Creates message instances from their MessageType tag."
    )
    .unwrap();
    writeln!(out, "class FactoryBuilder").unwrap();
    writeln!(out, "{{").unwrap();
    writeln!(out, "public:").unwrap();
    writeln!(
        out,
        "    /// @throws std::runtime_error if the message type is unknown."
    )
    .unwrap();
    writeln!(
        out,
        "    static std::shared_ptr<MessageBase> createMessage(MessageType type)"
    )
    .unwrap();
    writeln!(out, "    {{").unwrap();
    writeln!(out, "        switch (type)").unwrap();
    writeln!(out, "        {{").unwrap();

    let mut seen = BTreeSet::new();
    for name in schema.messages.keys() {
        let value = message_type_value(schema, name);
        if !seen.insert(value.clone()) {
            eprintln!(
                "warning: message '{name}' shares MessageType value '{value}' with another message; \
                 left out of the factory"
            );
            continue;
        }
        writeln!(
            out,
            "            case MessageType::{value}: return std::make_shared<{name}>();"
        )
        .unwrap();
    }

    writeln!(out, "            default:").unwrap();
    writeln!(
        out,
        "                throw std::runtime_error(\"Unknown message type: \" + std::to_string(static_cast<std::int64_t>(type)));"
    )
    .unwrap();
    writeln!(out, "        }}").unwrap();
    writeln!(out, "    }}").unwrap();
    writeln!(out, "}};").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "}} // namespace {ns}").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "#endif // FACTORY_BUILDER_HPP").unwrap();

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CppContext<'static> {
        CppContext {
            namespace: "game::net".to_string(),
            capnp_namespace: "game::message".to_string(),
            include_prefix: "gen/",
            capnp_header: "network_msg.capnp.h",
        }
    }

    #[test]
    fn message_base_declares_interface() {
        let out = render_message_base(&ctx());
        assert!(out.contains("namespace game::net\n{"));
        assert!(out.contains("class MessageBase\n{"));
        assert!(out.contains("    virtual SerializedData serialize_fast() const = 0;"));
        assert!(out.contains("    SerializedData(SerializedData&& other) noexcept\n"));
        assert!(out.ends_with("#endif // MESSAGE_BASE_HPP\n"));
        assert!(!out.contains("_START"));
    }

    #[test]
    fn factory_switches_over_every_message() {
        let schema = Schema::from_source(
            "enum MessageType { undefined, Logout | 9 }\n\
             message Login(1) {}\nmessage Logout(9) {}",
        )
        .unwrap();
        let out = render_factory(&schema, &ctx());

        assert!(out.contains("#include \"gen/Login.hpp\"\n#include \"gen/Logout.hpp\"\n"));
        assert!(
            out.contains("            case MessageType::login: return std::make_shared<Login>();")
        );
        assert!(
            out.contains("            case MessageType::Logout: return std::make_shared<Logout>();")
        );
        assert!(
            out.contains("static std::shared_ptr<MessageBase> createMessage(MessageType type)")
        );
        assert!(!out.contains("_START"));
    }
}
