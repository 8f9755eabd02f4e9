//! Configuration for signature runs and the service.

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{DEFAULT_FILE_EXTENSION, DEFAULT_FILE_TIMEOUT_SECS, DEFAULT_IGNORE_FILE, DEFAULT_PORT};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "phpsig.toml";

/// Prefix for environment overrides (`PHPSIG_MAX_WORKERS=8`).
pub const ENV_PREFIX: &str = "PHPSIG";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Global signature service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// External parser executable
    pub parser_command: String,

    /// Arguments for the parser; `{file}` is replaced by the file path
    pub parser_args: Vec<String>,

    /// Source file extension collected during discovery
    pub file_extension: String,

    /// Per-directory ignore list file name
    pub ignore_file_name: String,

    /// Maximum files processed concurrently
    pub max_workers: usize,

    /// Per-file processing budget in seconds
    pub file_timeout_secs: u64,

    /// HTTP port for `serve`
    pub port: u16,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            parser_command: "php-parse".to_string(),
            parser_args: vec!["--json-dump".to_string(), "{file}".to_string()],
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            ignore_file_name: DEFAULT_IGNORE_FILE.to_string(),
            max_workers: default_workers(),
            file_timeout_secs: DEFAULT_FILE_TIMEOUT_SECS,
            port: DEFAULT_PORT,
            log_format: LogFormat::Text,
        }
    }
}

impl SignatureConfig {
    /// Load configuration: defaults, then the config file (if present),
    /// then `PHPSIG_*` environment variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(" ")
                    .with_list_parse_key("parser_args"),
            )
            .build()
            .context("Failed to read configuration")?;

        let mut loaded: Self = config
            .try_deserialize()
            .context("Invalid configuration")?;
        loaded.max_workers = loaded.max_workers.max(1);
        Ok(loaded)
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
