// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand runners: wire configuration to the library and print results.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use codeseek::config::Config;
use codeseek::errors::{
    suggestions, EngineUnreachableError, SourceRootNotFoundError, StoreError, SyncError,
};
use codeseek::indexer::{status, Indexer, SyncReport};
use codeseek::output::{print_json, OutputFormat};
use codeseek::query::{search, SearchPage, SearchRequest};
use codeseek::store::wire::{QueryNode, FIELD_ID};
use codeseek::store::{HttpEngine, StoreClient};

fn connect(config: &Config) -> Result<StoreClient<HttpEngine>> {
    let engine = HttpEngine::new(config.host.clone(), config.request_timeout())
        .context("Failed to create engine client")?;
    Ok(StoreClient::from_config(engine, config))
}

/// Attach the unreachable-engine suggestion to transport failures.
fn engine_error(err: StoreError, config: &Config) -> anyhow::Error {
    if matches!(err, StoreError::Transport { .. }) {
        anyhow::Error::new(err).context(EngineUnreachableError {
            host: config.host.clone(),
        })
    } else {
        err.into()
    }
}

fn sync_error(err: SyncError, config: &Config) -> anyhow::Error {
    match err {
        SyncError::Batch {
            source: source @ StoreError::Transport { .. },
            batch,
            submitted_batches,
        } => engine_error(source, config).context(format!(
            "batch {batch} failed after {submitted_batches} batch(es) were submitted"
        )),
        other => other.into(),
    }
}

#[derive(Debug, Serialize)]
struct IndexResult {
    reports: Vec<SyncReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    engine_stat: Option<Value>,
}

pub fn run_index(
    config: &Config,
    roots: &[String],
    write_status: bool,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let roots: Vec<PathBuf> = if roots.is_empty() {
        vec![config.source_root.clone()]
    } else {
        roots.iter().map(PathBuf::from).collect()
    };
    for root in &roots {
        if !root.is_dir() {
            return Err(SourceRootNotFoundError {
                root: root.display().to_string(),
            }
            .into());
        }
    }

    let client = connect(config)?;
    let indexer = Indexer::new(&client, config);
    let mut reports = Vec::with_capacity(roots.len());
    for root in &roots {
        let report = indexer
            .sync_root(root)
            .map_err(|err| sync_error(err, config))?;
        if format == OutputFormat::Text {
            print_sync_report(&report);
        }
        reports.push(report);
    }

    let status_file = if write_status {
        write_status_record(&config.source_root)
    } else {
        None
    };

    let engine_stat = match client.stat() {
        Ok(stat) => {
            info!(stat = %stat, "engine statistics");
            Some(stat)
        }
        Err(err) => {
            warn!(error = %err, "failed to read engine statistics");
            None
        }
    };

    let result = IndexResult {
        reports,
        status_file,
        engine_stat,
    };
    match format {
        OutputFormat::Json => print_json(&result, compact)?,
        OutputFormat::Text => {
            if let Some(path) = &result.status_file {
                println!("{} status written to {}", "✓".green(), path.cyan());
            }
        }
    }
    Ok(())
}

fn write_status_record(root: &Path) -> Option<String> {
    if !root.is_dir() {
        warn!(root = %root.display(), "source root missing, status record not written");
        return None;
    }
    match status::write_status(root, chrono::Utc::now()) {
        Ok(path) => Some(path.display().to_string()),
        Err(err) => {
            warn!(error = %err, "failed to write status record");
            None
        }
    }
}

fn print_sync_report(report: &SyncReport) {
    println!(
        "{} {}: {} files in {} batches, {} submitted, {} unchanged ({} ms)",
        "✓".green(),
        report.root.cyan(),
        report.scanned,
        report.batches,
        report.submitted.to_string().yellow(),
        report.unchanged,
        report.elapsed_ms
    );
}

pub fn run_search(
    config: &Config,
    request: &SearchRequest,
    show_explain: bool,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let client = connect(config)?;
    let page = search(&client, config, request);

    match format {
        OutputFormat::Json => print_json(&page, compact)?,
        OutputFormat::Text => print_search_page(&page, show_explain),
    }

    if page.is_error() {
        anyhow::bail!("search failed");
    }
    Ok(())
}

fn print_search_page(page: &SearchPage, show_explain: bool) {
    if let Some(error) = &page.error {
        eprintln!("{} {}", "✗".red(), error);
        return;
    }
    if page.hits.is_empty() {
        if !page.query.trim().is_empty() {
            println!("{}", suggestions::no_results_suggestion(&page.query));
        }
        return;
    }

    println!(
        "\n{} {} results for: {} (page {}/{}, {} ms)\n",
        "🔍".cyan(),
        page.total,
        page.query.yellow(),
        page.page,
        page.pages,
        page.took
    );
    for hit in &page.hits {
        let mut header = format!("{} score {:.2}", hit.id.cyan().bold(), hit.score);
        if hit.matches > 0 {
            header.push_str(&format!(", {} matching lines", hit.matches));
        }
        if let Some(updated) = &hit.updated_at {
            header.push_str(&format!(", updated {}", updated.dimmed()));
        }
        println!("{header}");
        print!("{}", hit.excerpt.render_colored());
        if show_explain {
            if let Some(explanation) = &hit.explanation {
                println!("{}", explanation.dimmed());
            }
        }
        println!();
    }
}

#[derive(Debug, Serialize)]
struct StatusResult {
    path: String,
    available: bool,
    content: String,
}

pub fn run_status(config: &Config, format: OutputFormat, compact: bool) -> Result<()> {
    let path = config.status_path();
    let available = path.is_file();
    let content = status::read_status(&path);
    match format {
        OutputFormat::Text => print!("{}", ensure_newline(&content)),
        OutputFormat::Json => print_json(
            &StatusResult {
                path: path.display().to_string(),
                available,
                content,
            },
            compact,
        )?,
    }
    Ok(())
}

pub fn run_stat(config: &Config, compact: bool) -> Result<()> {
    let client = connect(config)?;
    let stat = client.stat().map_err(|err| engine_error(err, config))?;
    print_json(&stat, compact)
}

pub fn run_delete(config: &Config, id: &str, format: OutputFormat, compact: bool) -> Result<()> {
    let client = connect(config)?;
    let response = client
        .delete(&QueryNode::term(FIELD_ID, id))
        .map_err(|err| engine_error(err, config))?;
    match format {
        OutputFormat::Json => print_json(&response, compact)?,
        OutputFormat::Text => println!("{} deleted {}", "✓".green(), id.cyan()),
    }
    Ok(())
}

fn ensure_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}
