// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for codeseek
//!
//! Loads configuration from .codeseekrc.toml in current directory or
//! ~/.config/codeseek/config.toml, then applies `CODESEEK_*` environment
//! overrides. The result is built once per process and passed by reference.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const ENV_HOST: &str = "CODESEEK_HOST";
pub const ENV_INDEX: &str = "CODESEEK_INDEX";
pub const ENV_OVERWRITE: &str = "CODESEEK_OVERWRITE";
pub const ENV_FORCE_MERGE: &str = "CODESEEK_FORCE_MERGE";

const DEFAULT_EXTENSIONS: &[&str] = &["c", "java", "pm", "pl", "rb", "clj", "inc", "go", "rs"];

/// Output format for results (mirrored from cli for library use)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigOutputFormat {
    #[default]
    Text,
    Json,
}

/// Configuration loaded from .codeseekrc.toml or ~/.config/codeseek/config.toml
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the search engine
    pub host: String,
    /// Engine index holding the documents
    pub index: String,
    /// Directory whose top-level sub-trees are indexed
    pub source_root: PathBuf,
    /// File extensions picked up by the indexer (without the dot)
    pub extensions: Vec<String>,
    /// Files read and checked per indexing batch
    pub read_batch_size: usize,
    /// Documents per existence-check request
    pub lookup_batch_size: usize,
    /// Results per search page
    pub per_page: usize,
    /// Matched lines shown per result before the excerpt is cut
    pub show_lines_per_item: usize,
    /// Lines of context shown after each matched line
    pub context_radius: usize,
    /// Transport timeout for one engine request
    pub request_timeout_secs: u64,
    /// Submit every document, skipping change detection
    pub overwrite: bool,
    /// Passed through to the engine on every write
    pub force_merge: u32,
    /// Default output format (text or json)
    pub default_format: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "http://localhost:3000".to_string(),
            index: "example-index-bitmap".to_string(),
            source_root: PathBuf::from("SOURCE-TO-INDEX"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            read_batch_size: 100,
            lookup_batch_size: 512,
            per_page: 15,
            show_lines_per_item: 50,
            context_radius: 2,
            request_timeout_secs: 60,
            overwrite: false,
            force_merge: 0,
            default_format: None,
        }
    }
}

impl Config {
    /// Load configuration from files and the environment
    ///
    /// Precedence (highest to lowest):
    /// 1. `CODESEEK_*` environment variables
    /// 2. .codeseekrc.toml in current directory
    /// 3. ~/.config/codeseek/config.toml
    pub fn load() -> Self {
        let mut config = Self::load_files();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn load_files() -> Self {
        // Try current directory first
        if let Some(config) = Self::load_from_path(Path::new(".codeseekrc.toml")) {
            return config;
        }

        // Try home directory config
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("codeseek").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    pub fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Apply environment overrides through `lookup` (injectable for tests)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST).filter(|v| !v.is_empty()) {
            self.host = host;
        }
        if let Some(index) = lookup(ENV_INDEX).filter(|v| !v.is_empty()) {
            self.index = index;
        }
        if let Some(raw) = lookup(ENV_OVERWRITE) {
            self.overwrite = parse_flag(&raw);
        }
        if let Some(raw) = lookup(ENV_FORCE_MERGE) {
            match raw.trim().parse::<u32>() {
                Ok(value) => self.force_merge = value,
                Err(_) => warn!("Ignoring non-numeric {}={}", ENV_FORCE_MERGE, raw),
            }
        }
    }

    /// Get output format from config, parsing the string to ConfigOutputFormat
    pub fn output_format(&self) -> Option<ConfigOutputFormat> {
        self.default_format.as_ref().and_then(|s| match s.to_lowercase().as_str() {
            "json" => Some(ConfigOutputFormat::Json),
            "text" => Some(ConfigOutputFormat::Text),
            _ => None,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Status record path under the source root
    pub fn status_path(&self) -> PathBuf {
        self.source_root.join(crate::indexer::status::STATUS_FILE_NAME)
    }
}

/// Any non-empty value other than `0`/`false`/`no`/`off` enables a flag.
fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}
