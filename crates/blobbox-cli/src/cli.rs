use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "blobbox")]
#[command(about = "Named JSON documents behind a single RPC endpoint", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database file (default from config, then the platform data directory)
    #[arg(long, global = true, env = "BLOBBOX_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Inspect and edit stored documents
    #[command(subcommand)]
    Data(DataCommands),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Print a shell completion script
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum DataCommands {
    /// Store a JSON document under a name
    Set {
        name: String,

        /// Document as JSON text (e.g. '{"events": []}')
        json: String,
    },

    /// Print the document stored under a name
    Get {
        name: String,
    },

    /// List stored names with their sizes
    List,

    /// Delete every stored document
    Reset {
        /// Skip confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Show usage against the capacity
    Stats,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the config file location
    Path,

    /// Print the effective configuration
    Show,
}
