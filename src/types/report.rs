//! Report entries produced by a signature run.

use std::fmt;

use crate::types::SignatureError;

/// Outcome for one input file.
#[derive(Debug)]
pub struct FileReport {
    /// Normalized relative path.
    pub path: String,
    /// Rendered signature, or the error that aborted this file.
    pub outcome: Result<String, SignatureError>,
}

impl FileReport {
    pub fn success(path: impl Into<String>, signature: String) -> Self {
        Self {
            path: path.into(),
            outcome: Ok(signature),
        }
    }

    pub fn failure(path: impl Into<String>, error: SignatureError) -> Self {
        Self {
            path: path.into(),
            outcome: Err(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(signature) => write!(f, "# {}\n\n{}\n", self.path, signature),
            Err(error) => write!(
                f,
                "ERROR: {} IN {}#{}",
                error,
                self.path,
                error.line().unwrap_or(0)
            ),
        }
    }
}

/// Join reports into the final text, one section per file.
pub fn render_report(reports: &[FileReport]) -> String {
    let mut out = String::new();
    for report in reports {
        out.push_str(&report.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_section() {
        let report = FileReport::success("lib/a.php", "define A  = 1;".to_string());
        assert_eq!(report.to_string(), "# lib/a.php\n\ndefine A  = 1;\n");
    }

    #[test]
    fn test_error_line() {
        let report = FileReport::failure(
            "lib/b.php",
            SignatureError::UnsupportedConstruct {
                context: "class member",
                kind: "Stmt_TraitUse".to_string(),
                line: Some(3),
            },
        );
        assert_eq!(
            report.to_string(),
            "ERROR: Unsupported class member: Stmt_TraitUse IN lib/b.php#3"
        );
    }

    #[test]
    fn test_render_report() {
        let reports = vec![
            FileReport::success("a.php", "x".to_string()),
            FileReport::failure(
                "b.php",
                SignatureError::Timeout {
                    file: "b.php".to_string(),
                    seconds: 2,
                },
            ),
        ];
        assert_eq!(
            render_report(&reports),
            "# a.php\n\nx\n\nERROR: Timed out after 2s processing b.php IN b.php#0\n"
        );
    }
}
