//! End-to-end integration tests for capnp-msg-gen.
//!
//! These tests parse a small embedded schema and run the full pipeline:
//! parsing → wire schema → C++ wrappers → regeneration.

use std::path::{Path, PathBuf};

use capnp_msg_gen::codegen::{self, CppOutputs, GenerateOptions};
use capnp_msg_gen::error::Error;
use capnp_msg_gen::ids::{derive_id, extract_root_id, format_hex};
use capnp_msg_gen::schema::Schema;

/// A small but realistic catalog: namespace, explicit enum id, inheritance,
/// containers and a cross-message reference.
const SCHEMA: &str = r#"
namespace game.message;

/* Connection lifecycle. */
enum Status @0x9a3c {
    ok,
    failed | 10,
    retry
}

// Shared header for every event.
message Event(1) {
    uint64 timestamp;
}

message Login(2) extends Event {
    string user;
    bytes token;
    Status status;
    list<string> roles;
    map<string, int32> scores;
}

message Roster(3) {
    list<Login> players;
}
"#;

fn options(dir: &Path) -> GenerateOptions {
    GenerateOptions {
        capnp_output: dir.join("capnp"),
        cpp: Some(CppOutputs::new(dir.join("include/messages"), dir.join("src"))),
    }
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path.as_ref())
        .unwrap_or_else(|e| panic!("reading {}: {e}", path.as_ref().display()))
}

#[test]
fn end_to_end_generate_layout() {
    let schema = Schema::from_source(SCHEMA).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let stats =
        codegen::generate(&schema, &options(dir.path())).expect("generation should succeed");

    assert_eq!(stats.structs_generated, 3);
    assert_eq!(stats.enums_generated, 2); // MessageType + Status
    assert_eq!(stats.headers_written, 6); // 3 messages + enums + base + factory
    assert_eq!(stats.sources_written, 3);
    assert!(!stats.root_id_reused);
    assert_eq!(stats.capnp_path, dir.path().join("capnp/network_msg.capnp"));

    let headers = dir.path().join("include/messages");
    for file in [
        "Event.hpp",
        "Login.hpp",
        "Roster.hpp",
        "enums.hpp",
        "message_base.hpp",
        "factory_builder.hpp",
    ] {
        assert!(headers.join(file).exists(), "missing {file}");
    }
    for file in ["Event.cpp", "Login.cpp", "Roster.cpp"] {
        assert!(dir.path().join("src").join(file).exists(), "missing {file}");
    }
}

#[test]
fn wire_schema_content() {
    let schema = Schema::from_source(SCHEMA).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let stats = codegen::generate(&schema, &options(dir.path())).unwrap();
    let capnp = read(&stats.capnp_path);

    assert!(capnp.starts_with(&format!("{};\n", format_hex(stats.root_id))));
    assert!(capnp.contains("$Cxx.namespace(\"game::message\");"));
    assert!(
        capnp.contains("enum Status @0x8000000000009a3c {\n  ok @0;\n  failed @10;\n  retry @11;\n}")
    );
    assert!(capnp.contains("  undefined @0;\n  event @1;\n  login @2;\n  roster @3;\n"));

    let login = format!(
        "struct Login {} {{\n\
         \x20 msgType @0 : MessageType;\n\
         \x20 timestamp @1 : UInt64;\n\
         \x20 user @2 : Text;\n\
         \x20 token @3 : Data;\n\
         \x20 status @4 : Status;\n\
         \x20 roles @5 : List(Text);\n\
         \x20 scores @6 : Map(Text, Int32);\n\
         }}\n",
        format_hex(derive_id(stats.root_id, "Login"))
    );
    assert!(capnp.contains(&login), "{capnp}");
    assert!(capnp.contains("  players @1 : List(Login);"));
}

#[test]
fn wrapper_content() {
    let mut schema = Schema::from_source(SCHEMA).unwrap();
    schema.wrapper_namespace = Some("game.net".to_string());
    let dir = tempfile::tempdir().unwrap();

    codegen::generate(&schema, &options(dir.path())).unwrap();

    let header = read(dir.path().join("include/messages/Login.hpp"));
    assert!(header.contains("#include \"network_msg.capnp.h\""));
    assert!(header.contains("#include \"messages/Event.hpp\""));
    assert!(header.contains("namespace game::net\n{"));
    assert!(header.contains("class Login : public Event\n{"));
    assert!(header.contains("    std::string user;"));
    assert!(header.contains("    // USER_METHODS_START\n    // USER_METHODS_END\n"));

    let roster = read(dir.path().join("include/messages/Roster.hpp"));
    assert!(roster.contains("class Roster : public MessageBase\n{"));
    assert!(roster.contains("#include \"messages/Login.hpp\""));

    let source = read(dir.path().join("src/Login.cpp"));
    assert!(source.starts_with("#include \"messages/Login.hpp\"\n"));
    assert!(source.contains("    builder.setMsgType(::game::message::MessageType::login);"));
    assert!(source.contains("// USER_IMPL_START\n// USER_IMPL_END\n"));

    let factory = read(dir.path().join("include/messages/factory_builder.hpp"));
    assert!(factory.contains("case MessageType::roster: return std::make_shared<Roster>();"));
}

#[test]
fn regeneration_preserves_user_code() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(dir.path());

    codegen::generate(&Schema::from_source(SCHEMA).unwrap(), &opts).unwrap();

    let source_path = dir.path().join("src/Login.cpp");
    let edited = read(&source_path).replace(
        "// USER_IMPL_START\n",
        "// USER_IMPL_START\nvoid FOO() {}\n",
    );
    std::fs::write(&source_path, edited).unwrap();

    let header_path = dir.path().join("include/messages/Login.hpp");
    let edited = read(&header_path).replace(
        "    // USER_METHODS_START\n",
        "    // USER_METHODS_START\n    void foo();\n",
    );
    std::fs::write(&header_path, edited).unwrap();

    // Add a field to the schema and regenerate.
    let changed = SCHEMA.replace("string user;", "string user;\n    uint32 level;");
    let stats = codegen::generate(&Schema::from_source(&changed).unwrap(), &opts).unwrap();
    assert_eq!(stats.slots_preserved, 2);

    let source = read(&source_path);
    assert!(source.contains("// USER_IMPL_START\nvoid FOO() {}\n// USER_IMPL_END\n"));
    assert_eq!(source.matches("void FOO()").count(), 1);

    let header = read(&header_path);
    assert!(
        header.contains("    // USER_METHODS_START\n    void foo();\n    // USER_METHODS_END\n")
    );
    assert!(header.contains("    uint32_t level;"));
}

#[test]
fn root_id_reused_across_runs() {
    let schema = Schema::from_source(SCHEMA).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let opts = GenerateOptions {
        capnp_output: dir.path().join("out.capnp"),
        cpp: None,
    };

    let first = codegen::generate(&schema, &opts).unwrap();
    let second = codegen::generate(&schema, &opts).unwrap();

    assert!(!first.root_id_reused);
    assert!(second.root_id_reused);
    assert_eq!(first.root_id, second.root_id);
    assert_eq!(extract_root_id(&read(dir.path().join("out.capnp"))), Some(first.root_id));
}

#[test]
fn rerun_is_byte_identical() {
    let schema = Schema::from_source(SCHEMA).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let opts = options(dir.path());

    codegen::generate(&schema, &opts).unwrap();
    let before: Vec<(PathBuf, String)> = walkdir(dir.path())
        .into_iter()
        .map(|path| {
            let content = read(&path);
            (path, content)
        })
        .collect();

    codegen::generate(&schema, &opts).unwrap();

    assert_eq!(before.len(), 10);
    for (path, content) in before {
        assert_eq!(read(&path), content, "files differ: {}", path.display());
    }
}

#[test]
fn child_message_tag_not_duplicated() {
    let source = "message Base(1) { MessageType msgType; int32 a; }\n\
                  message Child(2) extends Base { string b; }";
    let schema = Schema::from_source(source).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let stats = codegen::generate(&schema, &options(dir.path())).unwrap();
    let capnp = read(&stats.capnp_path);

    let child = format!(
        "struct Child {} {{\n  msgType @0 : MessageType;\n  a @1 : Int32;\n  b @2 : Text;\n}}\n",
        format_hex(derive_id(stats.root_id, "Child"))
    );
    assert!(capnp.contains(&child), "{capnp}");
    assert!(capnp.contains("$Cxx.namespace(\"curious::message\");"));

    let header = read(dir.path().join("include/messages/Child.hpp"));
    assert!(header.contains("namespace curious::net\n{"));
}

#[test]
fn plain_headers_mode() {
    let schema = Schema::from_source(SCHEMA).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(dir.path());
    if let Some(cpp) = opts.cpp.as_mut() {
        cpp.plain_headers = true;
    }

    let stats = codegen::generate(&schema, &opts).unwrap();
    assert_eq!(stats.headers_written, 4);
    assert_eq!(stats.sources_written, 0);

    let headers = dir.path().join("include/messages");
    let login = read(headers.join("Login.hpp"));
    assert!(login.contains("class Login : public Event\n{"));
    assert!(login.contains("    // USER_PROPERTIES_START\n"));
    assert!(!login.contains("MessageBase"));
    assert!(headers.join("enums.hpp").exists());
    assert!(!headers.join("message_base.hpp").exists());
    assert!(!headers.join("factory_builder.hpp").exists());
    assert!(!dir.path().join("src").exists());
}

#[test]
fn parse_errors_are_reported() {
    let err = Schema::from_source("message A(1) { int32 a;").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert!(err.to_string().contains("unexpected end of input"));

    let err = Schema::from_source("enum E { a | x }").unwrap_err();
    assert!(err.to_string().contains("enum value must be an integer"));

    let err = Schema::from_source("struct A {}").unwrap_err();
    assert!(err.to_string().contains("expected 'namespace', 'enum', or 'message'"));
}

#[test]
fn missing_input_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Schema::from_file(&dir.path().join("absent.idl")).unwrap_err();
    assert!(matches!(err, Error::Read { .. }));
}

#[test]
fn schema_serializes_to_json() {
    let schema = Schema::from_source(SCHEMA).unwrap();
    let json = serde_json::to_value(&schema).unwrap();

    assert_eq!(json["namespace"], "game.message");
    assert_eq!(json["messages"]["Login"]["id"], 2);
    assert_eq!(json["messages"]["Login"]["parent"], "Event");
    assert_eq!(json["enums"]["Status"]["values"][1]["name"], "failed");
    assert_eq!(json["enums"]["Status"]["values"][1]["value"], 10);
    assert_eq!(json["message_order"][0], "Event");
    assert!(json.get("wrapper_namespace").is_none());
}

// ── Helpers ────────────────────────────────────────────────────────────

fn walkdir(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    fn walk(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, files);
                } else {
                    files.push(path);
                }
            }
        }
    }
    walk(dir, &mut files);
    files.sort();
    files
}
