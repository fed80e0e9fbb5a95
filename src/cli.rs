//! Command-line argument parsing
//!
//! Supports:
//! - Listing the bindings of a mode
//! - Showing how a notation string normalizes
//! - Replaying a key script against the loaded keymap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect and exercise key-sequence keymaps
#[derive(Parser, Debug)]
#[command(name = "keyseq", version, about = "Inspect and exercise key-sequence keymaps")]
pub struct CliArgs {
    /// Extra keymap file layered on top of the defaults
    #[arg(short, long, value_name = "FILE", global = true)]
    pub keymap: Option<PathBuf>,

    /// Only use this keymap file, skipping the built-in and user layers
    #[arg(long, requires = "keymap", global = true)]
    pub no_defaults: bool,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// List bindings, one per line
    Bindings {
        /// Mode to list (defaults to the keymap's default mode)
        #[arg(short, long)]
        mode: Option<String>,
    },
    /// Print the normalized keys of a notation string
    Parse {
        /// Notation like `<C-w>j` or `<leader>ff`
        notation: String,
    },
    /// Feed a key script through the processor and print each dispatch
    Replay {
        /// Script file, or `-` for stdin
        script: PathBuf,
    },
}

impl CliArgs {
    /// Console log level when RUST_LOG is not set
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
