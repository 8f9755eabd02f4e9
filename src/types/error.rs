//! Per-file error taxonomy.

use std::io;

use thiserror::Error;

/// Errors that abort the signature of a single file.
///
/// None of these ever abort a whole run; the batch layer turns them into a
/// report line and moves on to the next file.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The file is missing or unreadable.
    #[error("File {path} is not readable: {source}")]
    Input {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The external parser rejected the source.
    #[error("Failed to parse file: {file}: {message}")]
    Parse {
        file: String,
        message: String,
        line: Option<u32>,
    },

    /// A declaration-bearing node had a shape the engine does not handle.
    #[error("Unsupported {context}: {kind}")]
    UnsupportedConstruct {
        context: &'static str,
        kind: String,
        line: Option<u32>,
    },

    /// The file exceeded its processing time budget.
    #[error("Timed out after {seconds}s processing {file}")]
    Timeout { file: String, seconds: u64 },

    /// The worker processing the file stopped before producing a result.
    #[error("Worker failed processing {file}: {message}")]
    Worker { file: String, message: String },
}

impl SignatureError {
    /// Build an unsupported-construct error for the given node.
    pub fn unsupported(context: &'static str, node: &crate::ast_engine::Node) -> Self {
        SignatureError::UnsupportedConstruct {
            context,
            kind: node.node_type().to_string(),
            line: node.line(),
        }
    }

    /// Best-effort source line the error points at.
    pub fn line(&self) -> Option<u32> {
        match self {
            SignatureError::Parse { line, .. } | SignatureError::UnsupportedConstruct { line, .. } => {
                *line
            }
            SignatureError::Input { .. }
            | SignatureError::Timeout { .. }
            | SignatureError::Worker { .. } => None,
        }
    }
}

pub type SignatureResult<T> = Result<T, SignatureError>;
