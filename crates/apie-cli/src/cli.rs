//! Command-line definition

use std::path::PathBuf;

use clap::{Parser, Subcommand};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

#[derive(Debug, Parser)]
#[command(name = "apie", version, about = "Client for the APIE import-analysis server")]
pub struct Cli {
    /// Server base URL (falls back to $APIE_SERVER).
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Verbose client tracing on stderr.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn server_url(&self) -> String {
        self.server
            .clone()
            .or_else(|| std::env::var("APIE_SERVER").ok())
            .unwrap_or_else(|| DEFAULT_SERVER.to_string())
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a binary and report suspicious imported routines.
    Analyze {
        /// File to inspect.
        file: PathBuf,

        /// Follow the live analysis stream instead of waiting for the result.
        #[arg(short, long)]
        verbose: bool,

        /// Write a report file when the analysis completes.
        #[arg(short, long)]
        export: bool,

        /// Directory exported reports land in.
        #[arg(long, default_value = "reports")]
        reports_dir: PathBuf,

        /// Seconds of producer silence tolerated before giving up.
        #[arg(long, default_value_t = 60)]
        idle_timeout: u64,
    },

    /// Look up API names directly, without uploading a file.
    Lookup {
        /// One or more API names.
        #[arg(required = true)]
        names: Vec<String>,
    },
}
