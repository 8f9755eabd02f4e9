//! Core types for the signature service.

mod config;
mod error;
mod report;

pub use config::{LogFormat, SignatureConfig, DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use error::{SignatureError, SignatureResult};
pub use report::{render_report, FileReport};
