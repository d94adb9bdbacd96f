use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// How command results are printed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// Single-line JSON.
    Raw,
}

/// Top-level CLI parser for the `beacon` binary.
#[derive(Debug, Parser)]
#[command(name = "beacon", version, about = "Beacon - customer feedback analytics backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding config.toml (defaults to .beacon)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the REST API until Ctrl-C
    Serve {
        /// Override server.bind_addr
        #[arg(long)]
        bind: Option<String>,
    },

    /// Create a company and its first owner
    Bootstrap {
        /// Company display name
        #[arg(long)]
        company: String,
        /// Identity-provider subject of the owner
        #[arg(long)]
        auth_user_id: String,
        #[arg(long)]
        email: String,
    },

    /// Group unassigned analysed feedback into new themes
    DiscoverThemes {
        #[arg(long)]
        company: String,
    },

    /// Score every theme against the active strategy
    ScoreThemes {
        #[arg(long)]
        company: String,
    },

    /// Recompute the health report of every customer
    RecomputeHealth {
        #[arg(long)]
        company: String,
    },
}
