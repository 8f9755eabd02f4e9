//! PHP Signature Library
//!
//! Deterministic structural signatures for PHP source trees: declarations are
//! rendered in a canonical, position-insensitive text form so two versions of
//! a code base can be diffed by their API surface rather than their layout.

pub mod api;
pub mod ast_engine;
pub mod batch;
pub mod canonical;
pub mod processing;
pub mod signature;
pub mod types;

pub use ast_engine::{AstSource, CommandSource, EntityExtractor, JsonDumpSource, Node};
pub use batch::{BatchConfig, BatchProcessor, BatchResult};
pub use processing::{render_signature, FileDiscovery};
pub use signature::SourceSignature;
pub use types::{FileReport, SignatureConfig, SignatureError, SignatureResult};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ast_engine::{AstSource, CommandSource, JsonDumpSource, Node, NodeKind, Value};
    pub use crate::batch::*;
    pub use crate::canonical::Digest;
    pub use crate::processing::{normalize_path, render_signature, FileDiscovery};
    pub use crate::signature::*;
    pub use crate::types::*;
}

/// Default source file extension
pub const DEFAULT_FILE_EXTENSION: &str = "php";

/// Default per-directory ignore file name
pub const DEFAULT_IGNORE_FILE: &str = ".php-stat";

/// Default per-file processing budget in seconds
pub const DEFAULT_FILE_TIMEOUT_SECS: u64 = 30;

/// Default HTTP port for `serve`
pub const DEFAULT_PORT: u16 = 3017;
