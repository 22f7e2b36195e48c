// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};

use codeseek::output::OutputFormat;

/// codeseek - incremental source sync and line-level code search
///
/// Keeps a remote full-text engine in sync with a source tree and searches
/// it with filename filters, line-level scoring and highlighted excerpts.
#[derive(Parser, Debug)]
#[command(name = "codeseek")]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = "Search quickstart:\n  codeseek search struct rtl8169_private\n  codeseek search @sds sdsnew\n  codeseek index ~/src"
)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Compact JSON output (no pretty formatting)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Engine base URL (overrides config and CODESEEK_HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Engine index name (overrides config and CODESEEK_INDEX)
    #[arg(long, global = true)]
    pub index: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync source trees into the engine, submitting only changed files
    #[command(visible_alias = "i")]
    Index {
        /// Roots to index (defaults to the configured source root)
        roots: Vec<String>,

        /// Submit every file, skipping change detection
        #[arg(long)]
        overwrite: bool,

        /// Files read and checked per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Do not rewrite the status record after the run
        #[arg(long)]
        no_status: bool,
    },

    /// Search indexed sources (`@word` restricts to matching file names)
    #[command(visible_alias = "s")]
    Search {
        /// Query words; joined with spaces (use `--` before words starting with `-`)
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Show one document in full
        #[arg(long)]
        id: Option<String>,

        /// Result page, starting at 0
        #[arg(short, long, default_value_t = 0)]
        page: usize,

        /// Print the engine's score explanation for each hit
        #[arg(long)]
        explain: bool,
    },

    /// Show the sync status record of the source root
    Status,

    /// Show engine statistics
    Stat,

    /// Remove one document from the engine
    Delete {
        /// Document id, e.g. /linux/drivers/net/r8169.c
        #[arg(long, required = true)]
        id: String,
    },
}
