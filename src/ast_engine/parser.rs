//! Parser boundary.
//!
//! The signature engine does not parse PHP itself. Syntax trees come from
//! PHP-Parser's JSON dump, either produced on demand by an external command
//! or read from a pre-dumped file.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::ast_engine::node::Node;
use crate::types::{SignatureConfig, SignatureError, SignatureResult};

/// Placeholder replaced by the file path in parser arguments.
pub const FILE_PLACEHOLDER: &str = "{file}";

lazy_static! {
    static ref LINE_PATTERN: Regex = Regex::new(r"on line (\d+)").expect("valid line pattern");
}

/// A source of syntax trees.
#[async_trait]
pub trait AstSource: Send + Sync {
    /// Name of this source, for logging.
    fn name(&self) -> &'static str;

    /// Produce the root statements of the file at `path`.
    async fn load(&self, path: &Path) -> SignatureResult<Vec<Node>>;
}

/// Decode JSON without serde_json's nesting limit. Deeply chained `elseif`
/// blocks or concatenations nest far beyond it; the stack grows on demand.
pub fn from_json_unbounded<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Decode a JSON dump into root statements.
pub fn parse_json_ast(text: &str, file: &str) -> SignatureResult<Vec<Node>> {
    from_json_unbounded(text.as_bytes()).map_err(|e| SignatureError::Parse {
        file: file.to_string(),
        message: format!("invalid syntax tree dump: {}", e),
        line: None,
    })
}

/// Pull the first `on line N` out of a parser message.
pub fn line_from_message(message: &str) -> Option<u32> {
    LINE_PATTERN
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Drop any banner lines (`====> File ...`, `==> JSON dump:`) that precede
/// the JSON array.
fn strip_banner(output: &str) -> &str {
    let mut offset = 0;
    for line in output.split_inclusive('\n') {
        if line.trim_start().starts_with('[') {
            return &output[offset..];
        }
        offset += line.len();
    }
    output
}

async fn ensure_readable(path: &Path) -> SignatureResult<()> {
    tokio::fs::File::open(path)
        .await
        .map(|_| ())
        .map_err(|source| SignatureError::Input {
            path: path.display().to_string(),
            source,
        })
}

/// Reads syntax trees that were already dumped to JSON files.
#[derive(Debug, Default, Clone)]
pub struct JsonDumpSource;

#[async_trait]
impl AstSource for JsonDumpSource {
    fn name(&self) -> &'static str {
        "json-dump"
    }

    async fn load(&self, path: &Path) -> SignatureResult<Vec<Node>> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SignatureError::Input {
                path: path.display().to_string(),
                source,
            })?;
        parse_json_ast(strip_banner(&text), &path.display().to_string())
    }
}

/// Runs an external parser command and decodes its JSON output.
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
}

impl CommandSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &SignatureConfig) -> Self {
        Self::new(config.parser_command.clone(), config.parser_args.clone())
    }

    /// Arguments with the file placeholder substituted. The path is appended
    /// when no argument mentions the placeholder.
    fn args_for(&self, path: &Path) -> Vec<String> {
        let file = path.display().to_string();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace(FILE_PLACEHOLDER, &file))
            .collect();
        if !self.args.iter().any(|arg| arg.contains(FILE_PLACEHOLDER)) {
            args.push(file);
        }
        args
    }
}

#[async_trait]
impl AstSource for CommandSource {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn load(&self, path: &Path) -> SignatureResult<Vec<Node>> {
        ensure_readable(path).await?;
        let file = path.display().to_string();
        let args = self.args_for(path);

        debug!(program = %self.program, file = %file, "Running external parser");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SignatureError::Parse {
                file: file.clone(),
                message: format!("could not run parser `{}`: {}", self.program, e),
                line: None,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(SignatureError::Parse {
                file,
                line: line_from_message(&message),
                message,
            });
        }

        parse_json_ast(strip_banner(&stdout), &file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_strip_banner() {
        let output = "====> File a.php:\n==> JSON dump:\n[\n]\n";
        assert_eq!(strip_banner(output), "[\n]\n");
        assert_eq!(strip_banner("[]"), "[]");
    }

    #[test]
    fn test_line_from_message() {
        assert_eq!(
            line_from_message("Syntax error, unexpected EOF on line 14"),
            Some(14)
        );
        assert_eq!(line_from_message("Syntax error"), None);
    }

    #[test]
    fn test_parse_json_ast_rejects_garbage() {
        let err = parse_json_ast("{not json", "x.php").unwrap_err();
        assert!(matches!(err, SignatureError::Parse { .. }));
        assert!(err.to_string().starts_with("Failed to parse file: x.php"));
    }

    fn else_if_chain(depth: usize) -> String {
        let mut tree = r#"{"nodeType":"Stmt_Function","byRef":false,"name":{"nodeType":"Identifier","name":"deep"},"params":[],"returnType":null,"stmts":[]}"#.to_string();
        for _ in 0..depth {
            tree = format!(
                r#"{{"nodeType":"Stmt_If","cond":{{"nodeType":"Expr_Variable","name":"x"}},"stmts":[],"elseifs":[],"else":{{"nodeType":"Stmt_Else","stmts":[{}]}}}}"#,
                tree
            );
        }
        format!("[{}]", tree)
    }

    #[test]
    fn test_deep_trees_decode() {
        let nodes = parse_json_ast(&else_if_chain(200), "deep.php").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_type(), "Stmt_If");
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse_json_ast("[] x", "a.php").is_err());
    }

    #[test]
    fn test_args_for_placeholder() {
        let source = CommandSource::new("php-parse", vec!["--json-dump".into(), "{file}".into()]);
        assert_eq!(source.args_for(Path::new("a.php")), vec!["--json-dump", "a.php"]);

        let bare = CommandSource::new("dump-ast", vec![]);
        assert_eq!(bare.args_for(Path::new("a.php")), vec!["a.php"]);
    }

    #[tokio::test]
    async fn test_json_dump_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"nodeType":"Stmt_Nop","attributes":{{"startLine":1}}}}]"#
        )
        .unwrap();

        let nodes = JsonDumpSource.load(file.path()).await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_type(), "Stmt_Nop");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timed_out_parser_is_killed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let marker = format!("{}.done", file.path().display());
        let source = CommandSource::new(
            "sh",
            vec!["-c".into(), "sleep 1; echo x > {file}.done".into()],
        );

        let result =
            tokio::time::timeout(Duration::from_millis(100), source.load(file.path())).await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!Path::new(&marker).exists());
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let result = tokio_test::block_on(
            CommandSource::new("php-parse", vec![]).load(Path::new("/definitely/not/here.php")),
        );
        assert!(matches!(result, Err(SignatureError::Input { .. })));
    }
}
