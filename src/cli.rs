// CLI module for handling command-line interface

use std::path::PathBuf;

use clap::Parser;

use crate::disassemble::DisassemblerKind;

/// Every flag is optional: without arguments the default repository is
/// mirrored into the current directory.
#[derive(Parser, Debug, Default)]
#[command(name = "maven-exploder")]
#[command(version)]
#[command(about = "Mirror a Maven repository, explode its artifacts and dump their bytecode")]
pub struct Cli {
    /// Directory that receives the exploded tree [default: current directory]
    #[arg(long, env = "EXPLODER_DIR", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Settings file [default: <output-dir>/exploder.toml when present]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the remote repository
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Mirror namespaces starting with this prefix (repeatable) [default: androidx.]
    #[arg(long = "namespace", value_name = "PREFIX")]
    pub namespaces: Vec<String>,

    /// Mirror every namespace listed in the master index
    #[arg(long, conflicts_with = "namespaces")]
    pub all_namespaces: bool,

    /// Concurrent extraction and disassembly workers [default: 16]
    #[arg(long, value_name = "N")]
    pub io_workers: Option<usize>,

    /// Upper bound on concurrent HTTP requests [default: unbounded]
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// Per-request HTTP timeout in seconds [default: 60]
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Backend used to render class files [default: native]
    #[arg(long, value_enum, env = "EXPLODER_DISASSEMBLER")]
    pub disassembler: Option<DisassemblerKind>,
}
