//! Concurrent signature runs over many files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::ast_engine::AstSource;
use crate::processing::{normalize_path, FileProcessor};
use crate::types::{FileReport, SignatureConfig, SignatureError};

/// Configuration for batch processing.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum files processed concurrently
    pub concurrency: usize,
    /// Time budget per file
    pub file_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::from(&SignatureConfig::default())
    }
}

impl From<&SignatureConfig> for BatchConfig {
    fn from(config: &SignatureConfig) -> Self {
        Self {
            concurrency: config.max_workers.max(1),
            file_timeout: Duration::from_secs(config.file_timeout_secs),
        }
    }
}

/// Result of batch processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub total_files: usize,
    pub processed_files: usize,
    pub failed_files: usize,
    pub elapsed_ms: u64,
}

/// Runs the per-file pipeline over a file list with bounded concurrency.
pub struct BatchProcessor {
    processor: FileProcessor,
    config: BatchConfig,
}

impl BatchProcessor {
    pub fn new(source: Arc<dyn AstSource>, config: BatchConfig) -> Self {
        Self {
            processor: FileProcessor::new(source),
            config,
        }
    }

    /// Process every file. Failures are isolated per file; the reports come
    /// back ordered by normalized path regardless of completion order.
    pub async fn process_batch(
        &self,
        root: &Path,
        files: Vec<PathBuf>,
    ) -> (Vec<FileReport>, BatchResult) {
        let started = Instant::now();
        let total_files = files.len();

        info!(
            total_files,
            concurrency = self.config.concurrency,
            source = self.processor.source_name(),
            "Starting batch processing"
        );

        let root = Arc::new(root.to_path_buf());
        let budget = self.config.file_timeout;

        let reports: Vec<FileReport> = stream::iter(files)
            .map(|path| {
                let processor = self.processor.clone();
                let root = Arc::clone(&root);
                async move {
                    let report_path = normalize_path(&root, &path);
                    let task = tokio::spawn(async move {
                        timeout(budget, processor.process(&root, &path)).await
                    });
                    match task.await {
                        Ok(Ok(report)) => report,
                        Ok(Err(_)) => FileReport::failure(
                            report_path.clone(),
                            SignatureError::Timeout {
                                file: report_path,
                                seconds: budget.as_secs(),
                            },
                        ),
                        Err(e) => FileReport::failure(
                            report_path.clone(),
                            SignatureError::Worker {
                                file: report_path,
                                message: e.to_string(),
                            },
                        ),
                    }
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut ordered = BTreeMap::new();
        for report in reports {
            if let Err(error) = &report.outcome {
                warn!(file = %report.path, error = %error, "Failed to process file");
            }
            ordered.insert(report.path.clone(), report);
        }
        let reports: Vec<FileReport> = ordered.into_values().collect();

        let failed_files = reports.iter().filter(|r| !r.is_ok()).count();
        let result = BatchResult {
            total_files,
            processed_files: reports.len() - failed_files,
            failed_files,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            processed = result.processed_files,
            failed = result.failed_files,
            elapsed_ms = result.elapsed_ms,
            "Batch processing complete"
        );

        (reports, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_engine::{JsonDumpSource, Node};
    use crate::types::SignatureResult;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::fs;

    const NOP: &str = r#"[{"nodeType":"Stmt_Nop"}]"#;

    fn function_dump(name: &str) -> String {
        format!(
            r#"[{{"nodeType":"Stmt_Function","byRef":false,
                "name":{{"nodeType":"Identifier","name":"{}"}},
                "params":[],"returnType":null,"stmts":[]}}]"#,
            name
        )
    }

    fn config(concurrency: usize) -> BatchConfig {
        BatchConfig {
            concurrency,
            file_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_reports_sorted_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = Vec::new();
        for name in ["c.php", "a.php", "b.php"] {
            let path = dir.path().join(name);
            fs::write(&path, NOP).unwrap();
            files.push(path);
        }

        let batch = BatchProcessor::new(Arc::new(JsonDumpSource), config(3));
        let (reports, result) = batch.process_batch(dir.path(), files).await;

        let paths: Vec<&str> = reports.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["a.php", "b.php", "c.php"]);
        assert_eq!(result.total_files, 3);
        assert_eq!(result.processed_files, 3);
        assert_eq!(result.failed_files, 0);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.php");
        let bad = dir.path().join("bad.php");
        fs::write(&good, function_dump("ok")).unwrap();
        fs::write(&bad, "{broken").unwrap();

        let batch = BatchProcessor::new(Arc::new(JsonDumpSource), config(2));
        let (reports, result) = batch
            .process_batch(dir.path(), vec![good, bad])
            .await;

        assert_eq!(result.processed_files, 1);
        assert_eq!(result.failed_files, 1);
        assert!(reports[0].to_string().starts_with("ERROR: Failed to parse file:"));
        assert!(reports[0].to_string().ends_with("IN bad.php#0"));
        assert!(reports[1].to_string().starts_with("# good.php\n\nfunction \\ok ()\n{ /* "));
    }

    #[tokio::test]
    async fn test_same_output_for_any_worker_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = Vec::new();
        for i in 0..8 {
            let path = dir.path().join(format!("f{}.php", i));
            fs::write(&path, function_dump(&format!("f{}", i))).unwrap();
            files.push(path);
        }

        let serial = BatchProcessor::new(Arc::new(JsonDumpSource), config(1));
        let parallel = BatchProcessor::new(Arc::new(JsonDumpSource), config(4));
        let (one, _) = serial.process_batch(dir.path(), files.clone()).await;
        let (many, _) = parallel.process_batch(dir.path(), files).await;

        let one: Vec<String> = one.iter().map(ToString::to_string).collect();
        let many: Vec<String> = many.iter().map(ToString::to_string).collect();
        assert_eq!(one, many);
    }

    struct SlowSource;

    #[async_trait]
    impl AstSource for SlowSource {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn load(&self, _path: &Path) -> SignatureResult<Vec<Node>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_timeout_reported() {
        let batch = BatchProcessor::new(
            Arc::new(SlowSource),
            BatchConfig {
                concurrency: 1,
                file_timeout: Duration::from_millis(20),
            },
        );
        let (reports, result) = batch
            .process_batch(Path::new("/src"), vec![PathBuf::from("/src/slow.php")])
            .await;

        assert_eq!(result.failed_files, 1);
        assert_eq!(
            reports[0].to_string(),
            "ERROR: Timed out after 0s processing slow.php IN slow.php#0"
        );
    }
}
