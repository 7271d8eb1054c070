//! Output formatting for relayout
//!
//! Supports text (colored terminal), JSON and unified diff output formats.

use anyhow::Result;
use colored::*;
use serde::Serialize;
use std::path::Path;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Diff,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "diff" => Some(OutputFormat::Diff),
            _ => None,
        }
    }
}

/// One regenerated region
#[derive(Debug, Clone, Serialize)]
pub struct EditInfo {
    /// Kind of the node at the top of the region
    pub kind: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Result of processing a single file
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edits: Vec<EditInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    pub fn success(path: &Path, edits: Vec<EditInfo>, warnings: Vec<String>) -> Self {
        Self {
            path: path.display().to_string(),
            edits,
            warnings,
            error: None,
        }
    }

    pub fn error(path: &Path, error: String) -> Self {
        Self {
            path: path.display().to_string(),
            edits: Vec::new(),
            warnings: Vec::new(),
            error: Some(error),
        }
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files_processed: usize,
    pub files_with_changes: usize,
    pub total_edits: usize,
    pub warnings: usize,
    pub errors: usize,
}

/// Full JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub version: String,
    pub summary: Summary,
    pub files: Vec<FileResult>,
}

/// Reporter for accumulating and outputting results
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    results: Vec<FileResult>,
    summary: Summary,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            results: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Report a file with changes (in check mode - showing what would change)
    pub fn report_check(
        &mut self,
        path: &Path,
        edits: Vec<EditInfo>,
        warnings: Vec<String>,
        old_source: &str,
        new_source: &str,
    ) {
        self.summary.files_processed += 1;
        self.count_changes(&edits, &warnings);

        match self.format {
            OutputFormat::Text => {
                println!("{}", path.display().to_string().bold());
                print_diff(old_source, new_source);
                println!();
                for edit in &edits {
                    println!(
                        "  {} {}:{} {}",
                        "->".green(),
                        edit.line,
                        edit.column,
                        edit.message
                    );
                }
                print_warnings(&warnings);
                println!();
            }
            OutputFormat::Diff => {
                print_unified_diff(path, old_source, new_source);
            }
            OutputFormat::Json => {
                // JSON output is handled in finish()
            }
        }

        self.results.push(FileResult::success(path, edits, warnings));
    }

    /// Report a file after applying fixes
    pub fn report_fix(&mut self, path: &Path, edits: Vec<EditInfo>, warnings: Vec<String>) {
        self.summary.files_processed += 1;
        self.count_changes(&edits, &warnings);

        if self.format == OutputFormat::Text {
            println!("{}", path.display().to_string().bold());
            println!("  {} Applied {} change(s)", "OK".green(), edits.len());
            print_warnings(&warnings);
            println!();
        }

        self.results.push(FileResult::success(path, edits, warnings));
    }

    /// Report a file whose edited tree matches the original
    pub fn report_skipped(&mut self, path: &Path, warnings: Vec<String>) {
        self.summary.files_processed += 1;
        self.summary.warnings += warnings.len();
        if self.verbose && self.format == OutputFormat::Text {
            println!("{}: No changes needed", path.display());
        }
        self.results.push(FileResult::success(path, vec![], warnings));
    }

    /// Report an error processing a file
    pub fn report_error(&mut self, path: &Path, error: &str) {
        self.summary.files_processed += 1;
        self.summary.errors += 1;

        if self.format == OutputFormat::Text {
            eprintln!("{}: {} - {}", "Error".red(), path.display(), error);
        }

        self.results.push(FileResult::error(path, error.to_string()));
    }

    fn count_changes(&mut self, edits: &[EditInfo], warnings: &[String]) {
        if !edits.is_empty() {
            self.summary.files_with_changes += 1;
        }
        self.summary.total_edits += edits.len();
        self.summary.warnings += warnings.len();
    }

    /// Print final summary/output
    pub fn finish(self, check_mode: bool) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                println!();
                println!("{}", "Summary".bold().underline());
                println!("  Files processed: {}", self.summary.files_processed);
                println!("  Files with changes: {}", self.summary.files_with_changes);
                println!("  Total edits: {}", self.summary.total_edits);
                if self.summary.warnings > 0 {
                    println!("  Warnings: {}", self.summary.warnings);
                }
                if self.summary.errors > 0 {
                    println!("  Errors: {}", self.summary.errors);
                }

                if check_mode && self.summary.total_edits > 0 {
                    println!();
                    println!("{}", "Run with --fix to apply changes".yellow());
                }
            }
            OutputFormat::Json => {
                let output = JsonOutput {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    summary: self.summary,
                    files: self.results,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Diff => {
                // Patch-compatible output has no summary
            }
        }
        Ok(())
    }

    /// Get summary for exit code determination
    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("  {} {}", "!".yellow(), warning);
    }
}

/// Print a colored diff between old and new content
fn print_diff(old: &str, new: &str) {
    for diff_result in diff::lines(old, new) {
        match diff_result {
            diff::Result::Left(l) => {
                println!("  {}", format!("- {}", l).red());
            }
            diff::Result::Right(r) => {
                println!("  {}", format!("+ {}", r).green());
            }
            diff::Result::Both(_, _) => {}
        }
    }
}

/// Print unified diff format (standard diff -u compatible)
fn print_unified_diff(path: &Path, old: &str, new: &str) {
    print!("{}", unified_diff(path, old, new));
}

fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    use similar::{ChangeTag, TextDiff};

    let diff = TextDiff::from_lines(old, new);
    let path_str = path.display().to_string();

    let mut out = format!("--- a/{}\n+++ b/{}\n", path_str, path_str);
    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        out.push_str(&format!("{}\n", hunk.header()));
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            out.push_str(&format!("{}{}", sign, change));
            if change.missing_newline() {
                out.push('\n');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(line: usize) -> EditInfo {
        EditInfo {
            kind: "apply".to_string(),
            line,
            column: 3,
            message: "Regenerate apply".to_string(),
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("diff"), Some(OutputFormat::Diff));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn test_summary_counts() {
        let mut reporter = Reporter::new(OutputFormat::Json, false);
        reporter.report_check(
            Path::new("A.scala"),
            vec![edit(2), edit(5)],
            vec!["Cannot print ident nodes".to_string()],
            "a\n",
            "b\n",
        );
        reporter.report_skipped(Path::new("B.scala"), vec![]);
        reporter.report_error(Path::new("C.scala"), "Failed to read file");

        assert_eq!(
            reporter.summary(),
            &Summary {
                files_processed: 3,
                files_with_changes: 1,
                total_edits: 2,
                warnings: 1,
                errors: 1,
            }
        );
    }

    #[test]
    fn test_file_result_serialization() {
        let ok = serde_json::to_string(&FileResult::success(
            Path::new("A.scala"),
            vec![edit(15)],
            vec![],
        ))
        .unwrap();
        assert!(ok.contains("\"kind\":\"apply\""));
        assert!(ok.contains("\"line\":15"));
        assert!(!ok.contains("warnings"));
        assert!(!ok.contains("error"));

        let failed =
            serde_json::to_string(&FileResult::error(Path::new("A.scala"), "boom".to_string()))
                .unwrap();
        assert!(failed.contains("\"error\":\"boom\""));
        assert!(!failed.contains("edits"));
    }

    #[test]
    fn test_json_output() {
        let output = JsonOutput {
            version: "0.1.0".to_string(),
            summary: Summary {
                files_processed: 10,
                files_with_changes: 3,
                total_edits: 7,
                warnings: 0,
                errors: 0,
            },
            files: vec![],
        };

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"version\":\"0.1.0\""));
        assert!(json.contains("\"files_processed\":10"));
    }

    #[test]
    fn test_unified_diff() {
        let diff = unified_diff(Path::new("A.scala"), "a\nb\nc\n", "a\nx\nc\n");
        assert!(diff.starts_with("--- a/A.scala\n+++ b/A.scala\n"));
        assert!(diff.contains("@@ -1,3 +1,3 @@\n"));
        assert!(diff.contains("-b\n+x\n"));
        assert!(diff.contains(" a\n"));
    }
}
