// SPDX-License-Identifier: MIT OR Apache-2.0

//! codeseek - incremental source sync and line-level code search
//!
//! Keeps a remote full-text engine in sync with local source trees and
//! searches it with filename filters and highlighted line excerpts.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use codeseek::config::Config;
use codeseek::output::OutputFormat;
use codeseek::query::SearchRequest;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codeseek=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(index) = cli.index {
        config.index = index;
    }
    let format = cli
        .format
        .or_else(|| config.output_format().map(OutputFormat::from))
        .unwrap_or_default();
    let compact = cli.compact;

    match cli.command {
        Commands::Index {
            roots,
            overwrite,
            batch_size,
            no_status,
        } => {
            if overwrite {
                config.overwrite = true;
            }
            if let Some(size) = batch_size {
                config.read_batch_size = size;
            }
            commands::run_index(&config, &roots, !no_status, format, compact)?;
        }
        Commands::Search {
            query,
            id,
            page,
            explain,
        } => {
            let request = SearchRequest {
                query: query.join(" "),
                id,
                page,
            };
            commands::run_search(&config, &request, explain, format, compact)?;
        }
        Commands::Status => {
            commands::run_status(&config, format, compact)?;
        }
        Commands::Stat => {
            commands::run_stat(&config, compact)?;
        }
        Commands::Delete { id } => {
            commands::run_delete(&config, &id, format, compact)?;
        }
    }

    Ok(())
}
