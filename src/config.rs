//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! field has a default matching the production layout (state in
//! `scans.json`, pages `14minds.html` and `scanner.html`, DexScreener as the
//! price source), so an empty file is a valid configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Env var overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "SCAN_OUTCOMES_CONFIG";

/// Default config file path.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub oracle: OracleConfig,
    pub documents: DocumentsConfig,
    pub publish: PublishConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("scans.json"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OracleConfig {
    /// Token lookup endpoint; the address is appended as a path segment.
    pub base_url: String,
    /// Chain whose quote is preferred when a token trades on several.
    pub reference_chain: String,
    /// Unset means the request waits as long as the provider takes.
    pub request_timeout_secs: Option<u64>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dexscreener.com/latest/dex/tokens".to_string(),
            reference_chain: "base".to_string(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DocumentsConfig {
    pub paths: Vec<PathBuf>,
    /// Opening tags that start a scan row.
    pub row_markers: Vec<String>,
    /// Literal content of an unresolved slot.
    pub pending_placeholder: String,
    /// Literal standing in for the accuracy figure until it is known.
    pub accuracy_placeholder: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from("14minds.html"), PathBuf::from("scanner.html")],
            row_markers: vec![
                r#"<div class="scan-item">"#.to_string(),
                r#"<div class="scan-row">"#.to_string(),
            ],
            pending_placeholder: "Pending".to_string(),
            accuracy_placeholder: "\u{2014}%".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PublishConfig {
    pub enabled: bool,
    /// Working tree the git commands run in.
    pub repo_dir: PathBuf,
    pub remote: String,
    pub branch: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            repo_dir: PathBuf::from("."),
            remote: "origin".to_string(),
            branch: "main".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        if config.documents.row_markers.is_empty() {
            anyhow::bail!("documents.row_markers must list at least one marker");
        }
        if config.documents.pending_placeholder.is_empty() {
            anyhow::bail!("documents.pending_placeholder must not be empty");
        }
        if config.documents.accuracy_placeholder.is_empty() {
            anyhow::bail!("documents.accuracy_placeholder must not be empty");
        }
        Ok(config)
    }

    /// Load from `$SCAN_OUTCOMES_CONFIG`, falling back to `config.toml`.
    /// A missing default file yields the built-in defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load(&path),
            Err(_) if !std::path::Path::new(DEFAULT_CONFIG_FILE).exists() => Ok(Self::default()),
            Err(_) => Self::load(DEFAULT_CONFIG_FILE),
        }
    }
}
