//! Command-line argument parsing, kept separate from execution logic.

use clap::{Parser, Subcommand};

/// cue - fuzzy answer assistant
#[derive(Parser)]
#[command(name = "cuectl")]
#[command(about = "Control the cue answer daemon", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to daemon socket (overrides $CUED_SOCKET and the default)
    #[arg(long, global = true)]
    pub socket: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a JSON answer set, replacing the current one
    Upload {
        /// Path to a JSON object file, or "-" for stdin
        file: String,
    },

    /// Fire a named trigger command (show-answer, force-gpt)
    Trigger {
        command: String,
    },

    /// Run the observer session: track pointer events from stdin, answer
    /// the daemon's question requests, print incoming answers
    Observe,

    /// Check that the daemon is up
    Ping,
}
