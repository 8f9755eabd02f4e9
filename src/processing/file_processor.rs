//! Per-file pipeline: load the syntax tree, extract the signature, render.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::ast_engine::{AstSource, EntityExtractor, Node};
use crate::types::{FileReport, SignatureResult};

/// Report path for `path` under `root`: root prefix removed, backslashes
/// turned into forward slashes, leading and trailing slashes trimmed.
pub fn normalize_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .to_string_lossy()
        .replace('\\', "/")
        .trim_matches('/')
        .to_string()
}

/// Render the signature of already-loaded root statements.
pub fn render_signature(statements: &[Node]) -> SignatureResult<String> {
    EntityExtractor::extract(statements).map(|signature| signature.to_string())
}

/// Turns one input file into its report entry.
#[derive(Clone)]
pub struct FileProcessor {
    source: Arc<dyn AstSource>,
}

impl FileProcessor {
    pub fn new(source: Arc<dyn AstSource>) -> Self {
        Self { source }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Process a file; the error, if any, is kept in the report.
    pub async fn process(&self, root: &Path, path: &Path) -> FileReport {
        let report_path = normalize_path(root, path);
        debug!(file = %report_path, source = self.source.name(), "Processing file");

        match self.signature_of(path).await {
            Ok(signature) => FileReport::success(report_path, signature),
            Err(error) => FileReport::failure(report_path, error),
        }
    }

    async fn signature_of(&self, path: &Path) -> SignatureResult<String> {
        let statements = self.source.load(path).await?;
        render_signature(&statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_engine::JsonDumpSource;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/src/app"), Path::new("/src/app/lib/a.php")),
            "lib/a.php"
        );
        assert_eq!(normalize_path(Path::new(""), Path::new("a.php")), "a.php");
        assert_eq!(
            normalize_path(Path::new("/other"), Path::new("lib\\b.php")),
            "lib/b.php"
        );
    }

    #[tokio::test]
    async fn test_process_define() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.php");
        fs::write(
            &file,
            r#"[{"nodeType":"Stmt_Expression","expr":{"nodeType":"Expr_FuncCall",
                "name":{"nodeType":"Name","parts":["define"]},
                "args":[
                    {"nodeType":"Arg","value":{"nodeType":"Scalar_String","value":"A"},"byRef":false,"unpack":false},
                    {"nodeType":"Arg","value":{"nodeType":"Scalar_LNumber","value":1},"byRef":false,"unpack":false}
                ]}}]"#,
        )
        .unwrap();

        let processor = FileProcessor::new(Arc::new(JsonDumpSource));
        let report = processor.process(dir.path(), &file).await;
        assert_eq!(report.path, "a.php");
        assert_eq!(report.to_string(), "# a.php\n\ndefine A  = 1;\n");
    }

    #[tokio::test]
    async fn test_process_missing_file() {
        let processor = FileProcessor::new(Arc::new(JsonDumpSource));
        let report = processor
            .process(Path::new("/gone"), Path::new("/gone/x.php"))
            .await;
        assert_eq!(report.path, "x.php");
        assert!(!report.is_ok());
        assert!(report.to_string().ends_with("IN x.php#0"));
    }
}
