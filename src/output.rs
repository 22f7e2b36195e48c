// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared output helpers for text and JSON rendering

use anyhow::Result;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::io::Write;

use crate::config::ConfigOutputFormat;

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<ConfigOutputFormat> for OutputFormat {
    fn from(value: ConfigOutputFormat) -> Self {
        match value {
            ConfigOutputFormat::Text => OutputFormat::Text,
            ConfigOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Serialize `value` to stdout, pretty unless `compact` is set.
pub fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{rendered}")?;
    Ok(())
}

/// Paint an excerpt line according to its emphasis and alternating band.
pub fn paint_line(text: &str, bold: bool, band: Option<usize>) -> ColoredString {
    let painted = match band {
        Some(band) if band % 2 == 0 => text.yellow(),
        Some(_) => text.cyan(),
        None => text.normal(),
    };
    if bold {
        painted.bold()
    } else {
        painted
    }
}
