use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use marq_core::{Intention, TimeOfDay, VERSION};

use crate::config::Backend;

/// Marq - a tamper-evident, encryptable tapestry of woven threads
#[derive(Parser)]
#[command(name = "marq")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the tapestry (directory for the file backend, database for SQLite)
    #[arg(short, long, global = true, env = "MARQ_TAPESTRY")]
    pub tapestry: Option<String>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the tapestry will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Storage backend (inferred from PATH when omitted)
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `add` command
#[derive(Args)]
pub struct AddArgs {
    /// Why the thread was woven
    #[arg(long)]
    pub intention: Intention,

    /// Time of day (dawn, midday, dusk, night)
    #[arg(long)]
    pub time: TimeOfDay,

    /// Where it happened
    #[arg(long)]
    pub region: String,

    /// Short title
    #[arg(long)]
    pub title: String,

    /// Print the woven thread as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show only the most recent N threads
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the `export` command
#[derive(Args)]
pub struct ExportArgs {
    /// Write the scroll to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,
}

/// Arguments for the `import` command
#[derive(Args)]
pub struct ImportArgs {
    /// Scroll file to import ("-" reads stdin)
    #[arg(value_name = "FILE")]
    pub file: String,
}

/// Arguments for the `clear` command
#[derive(Args)]
pub struct ClearArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the config file and create an empty tapestry
    Init(InitArgs),

    /// Weave a new thread onto the tapestry
    Add(AddArgs),

    /// List threads, oldest first
    List(ListArgs),

    /// Verify the hash chain
    Verify,

    /// Export all threads as a scroll
    Export(ExportArgs),

    /// Replace all threads with the contents of a scroll
    Import(ImportArgs),

    /// Encrypt the tapestry at rest
    Encrypt,

    /// Store the tapestry as plain JSON again
    Decrypt,

    /// Show lifecycle, encryption, and integrity status
    Status,

    /// Remove every thread
    Clear(ClearArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
