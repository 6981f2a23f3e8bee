use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use capnp_msg_gen::codegen::{self, CppOutputs, GenerateOptions};
use capnp_msg_gen::ids::format_hex;
use capnp_msg_gen::schema::Schema;

/// Generate Cap'n Proto schemas and C++ message wrappers from a message IDL.
///
/// Parses a schema of namespaces, enums and messages, writes the Cap'n Proto
/// wire schema and, when header and source directories are given, regenerable
/// C++ wrapper classes.
#[derive(Parser)]
#[command(name = "capnp-msg-gen", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the Cap'n Proto schema and optional C++ wrappers.
    Generate {
        /// Schema file to parse.
        #[arg(long, short)]
        input: PathBuf,

        /// Output .capnp file, or a directory receiving network_msg.capnp.
        #[arg(long)]
        out_capnp: PathBuf,

        /// Directory for generated C++ headers.
        #[arg(long, requires = "out_cpp")]
        out_hpp: Option<PathBuf>,

        /// Directory for generated C++ sources.
        #[arg(long, requires = "out_hpp")]
        out_cpp: Option<PathBuf>,

        /// Namespace for the C++ wrapper classes (dotted or `::` form).
        /// Defaults to the schema namespace.
        #[arg(long, env = "CAPNP_MSG_GEN_WRAPPER_NAMESPACE")]
        wrapper_namespace: Option<String>,

        /// Prefix for #include lines of generated headers.
        /// Defaults to the last component of --out-hpp plus "/".
        #[arg(long)]
        include_prefix: Option<String>,

        /// Header produced by the Cap'n Proto compiler for the schema.
        #[arg(long, default_value = codegen::DEFAULT_CAPNP_HEADER)]
        capnp_header: String,

        /// Emit plain data headers only (no sources, base class or factory).
        #[arg(long)]
        plain_headers: bool,

        /// Suppress non-error output.
        #[arg(long, short)]
        quiet: bool,
    },

    /// Parse a schema and print it as JSON.
    Inspect {
        /// Schema file to parse.
        #[arg(long, short)]
        input: PathBuf,

        /// Print compact JSON instead of pretty-printed.
        #[arg(long)]
        compact: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");

        // Print cause chain.
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }

        process::exit(1);
    }
}

fn run(cli: Cli) -> capnp_msg_gen::error::Result<()> {
    match cli.command {
        Commands::Generate {
            input,
            out_capnp,
            out_hpp,
            out_cpp,
            wrapper_namespace,
            include_prefix,
            capnp_header,
            plain_headers,
            quiet,
        } => {
            if !quiet {
                eprintln!("Parsing schema from {}", input.display());
            }
            let mut schema = Schema::from_file(&input)?;
            schema.wrapper_namespace = wrapper_namespace;
            if !quiet {
                eprintln!(
                    "Parsed {} messages, {} enums",
                    schema.messages.len(),
                    schema.enums.len()
                );
            }

            let cpp = match (out_hpp, out_cpp) {
                (Some(header_dir), Some(source_dir)) => {
                    let mut outputs = CppOutputs::new(header_dir, source_dir);
                    if let Some(prefix) = include_prefix {
                        outputs.include_prefix = prefix;
                    }
                    outputs.capnp_header = capnp_header;
                    outputs.plain_headers = plain_headers;
                    Some(outputs)
                }
                _ => None,
            };

            let stats = codegen::generate(
                &schema,
                &GenerateOptions {
                    capnp_output: out_capnp,
                    cpp,
                },
            )?;

            if !quiet {
                eprintln!(
                    "Wrote {} ({} structs, {} enums)",
                    stats.capnp_path.display(),
                    stats.structs_generated,
                    stats.enums_generated
                );
                if stats.root_id_reused {
                    eprintln!("Reused root id {}", format_hex(stats.root_id));
                } else {
                    eprintln!("Generated new root id {}", format_hex(stats.root_id));
                }
                if stats.headers_written > 0 || stats.sources_written > 0 {
                    eprintln!(
                        "Wrote {} C++ headers, {} C++ sources",
                        stats.headers_written, stats.sources_written
                    );
                }
                if stats.slots_preserved > 0 {
                    eprintln!("Preserved {} user code sections", stats.slots_preserved);
                }
                eprintln!("Done.");
            }
        }

        Commands::Inspect { input, compact } => {
            let schema = Schema::from_file(&input)?;
            let json = if compact {
                serde_json::to_string(&schema)?
            } else {
                serde_json::to_string_pretty(&schema)?
            };
            println!("{json}");
        }
    }

    Ok(())
}
