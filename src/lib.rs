//! Generate Cap'n Proto schemas and C++ message wrappers from a compact IDL.
//!
//! `capnp-msg-gen` reads a message catalog written in a small interface
//! definition language (namespaces, enums and messages with single
//! inheritance) and produces:
//!
//! - one Cap'n Proto schema file with stable, name-derived type ids
//! - optionally, a C++ header and source per message wrapping the
//!   Cap'n Proto builders and readers, plus shared support headers
//!
//! # Features
//!
//! - Recursive-descent parser with `//` and `/* */` comment stripping
//! - `MessageType` enum synthesized from the declared messages
//! - Inherited fields flattened into each wire struct
//! - Root id reused from a previous schema file, so ids stay stable
//! - User code between `// NAME_START` / `// NAME_END` markers survives
//!   regeneration
//! - Deterministic output: rerunning on an unchanged schema rewrites every
//!   file byte-for-byte
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! use capnp_msg_gen::codegen::{self, CppOutputs, GenerateOptions};
//! use capnp_msg_gen::schema::Schema;
//!
//! let schema = Schema::from_file(Path::new("messages.idl"))?;
//! let stats = codegen::generate(
//!     &schema,
//!     &GenerateOptions {
//!         capnp_output: "out/capnp".into(),
//!         cpp: Some(CppOutputs::new("include/messages", "src/messages")),
//!     },
//! )?;
//! eprintln!("Generated {} structs, {} enums", stats.structs_generated, stats.enums_generated);
//! # Ok::<(), capnp_msg_gen::error::Error>(())
//! ```

pub mod codegen;
pub mod error;
pub mod ids;
pub mod lexer;
pub mod preprocess;
pub mod regen;
pub mod schema;
pub mod type_map;
pub mod types;
