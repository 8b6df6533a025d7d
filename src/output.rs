//! Output formatting for batch reports and extraction dumps.
//!
//! Reports render as plain text for terminals or as JSON for programmatic
//! access.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::builder::{BatchReport, FileReport};
use crate::extract::{ExtractionResult, ProcessSummary};

/// Errors that can occur during output formatting.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable summary (default).
    #[default]
    Text,
    /// JSON for programmatic access.
    Json,
}

/// Options controlling report output.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub format: OutputFormat,
    /// List every file, not only totals and failures.
    pub per_file: bool,
}

/// Format a batch report.
pub fn format_report(report: &BatchReport, options: &ReportOptions) -> Result<String, OutputError> {
    match options.format {
        OutputFormat::Text => Ok(format_report_text(report, options.per_file)),
        OutputFormat::Json => format_report_json(report, options.per_file),
    }
}

/// Group digits in threes: `12345` becomes `12,345`.
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

// ============================================================================
// Text Formatting
// ============================================================================

fn format_report_text(report: &BatchReport, per_file: bool) -> String {
    let mut output = String::with_capacity(1024);

    if per_file {
        for file in &report.files {
            output.push_str(&format_file_text(file));
        }
        output.push('\n');
    } else {
        for file in report.failures() {
            output.push_str(&format_file_text(file));
        }
    }

    output.push_str("End result:\n");
    output.push_str(&format_summary_text(&report.totals));
    output.push_str(&format!(
        "  {:<17}{} ({} lines)\n",
        "files:",
        format_number(report.files.len()),
        format_number(report.lines)
    ));
    output.push_str(&format!("  {:<17}{}\n", "written:", format_number(report.written)));
    if report.failed > 0 {
        output.push_str(&format!("  {:<17}{}\n", "failed:", format_number(report.failed)));
    }

    output
}

fn format_file_text(file: &FileReport) -> String {
    match &file.error {
        Some(error) => format!("{}: error: {}\n", file.path.display(), error),
        None => {
            let s = &file.summary;
            format!(
                "{}: {} classes, {} class functions, {} vars, {} var functions, {} var properties, {} loose functions\n",
                file.path.display(),
                s.classes,
                s.class_functions,
                s.vars,
                s.var_functions,
                s.var_properties,
                s.loose_functions
            )
        }
    }
}

fn format_summary_text(summary: &ProcessSummary) -> String {
    let rows = [
        ("classes:", summary.classes),
        ("class functions:", summary.class_functions),
        ("vars:", summary.vars),
        ("var functions:", summary.var_functions),
        ("var properties:", summary.var_properties),
        ("loose functions:", summary.loose_functions),
    ];

    rows.iter()
        .map(|(label, count)| format!("  {:<17}{}\n", label, format_number(*count)))
        .collect()
}

// ============================================================================
// JSON Formatting
// ============================================================================

#[derive(Serialize)]
struct JsonReport<'a> {
    root: String,
    totals: &'a ProcessSummary,
    lines: usize,
    written: usize,
    failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<JsonFile<'a>>,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    summary: &'a ProcessSummary,
    lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonExtraction<'a> {
    path: String,
    #[serde(flatten)]
    result: &'a ExtractionResult,
}

fn format_report_json(report: &BatchReport, per_file: bool) -> Result<String, OutputError> {
    let files = report
        .files
        .iter()
        .filter(|f| per_file || f.is_failed())
        .map(|f| JsonFile {
            path: f.path.display().to_string(),
            output: f.output.as_ref().map(|p| p.display().to_string()),
            summary: &f.summary,
            lines: f.lines,
            error: f.error.as_deref(),
        })
        .collect();

    let output = JsonReport {
        root: report.root.display().to_string(),
        totals: &report.totals,
        lines: report.lines,
        written: report.written,
        failed: report.failed,
        files,
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

/// Dump an extraction result as JSON.
pub fn format_extraction(path: &Path, result: &ExtractionResult) -> Result<String, OutputError> {
    let output = JsonExtraction {
        path: path.display().to_string(),
        result,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StubRun;
    use crate::extract::extract;
    use std::fs;
    use tempfile::TempDir;

    fn sample_report() -> BatchReport {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.js"), "class A {\n  run() {}\n}\n").unwrap();
        fs::write(dir.path().join("b.js"), "function b() {\n").unwrap();
        StubRun::new(dir.path()).run().unwrap()
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_text_report() {
        let report = sample_report();
        let text = format_report(&report, &ReportOptions::default()).unwrap();

        assert!(text.starts_with("b.js: error: "));
        assert!(text.contains("End result:\n"));
        assert!(text.contains("  class functions: 1\n"));
        assert!(text.contains("  files:           2 (4 lines)\n"));
        assert!(text.contains("  failed:          1\n"));
        assert!(!text.contains("a.js"));
    }

    #[test]
    fn test_text_report_per_file() {
        let report = sample_report();
        let options = ReportOptions {
            per_file: true,
            ..Default::default()
        };
        let text = format_report(&report, &options).unwrap();

        assert!(text.contains("a.js: 1 classes, 1 class functions, 0 vars"));
        assert!(text.contains("b.js: error: "));
    }

    #[test]
    fn test_json_report() {
        let report = sample_report();
        let options = ReportOptions {
            format: OutputFormat::Json,
            per_file: false,
        };
        let json = format_report(&report, &options).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(v["totals"]["classes"], 1);
        assert_eq!(v["failed"], 1);
        let files = v["files"].as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["path"], "b.js");
        assert!(files[0]["error"].as_str().unwrap().contains("unterminated"));
    }

    #[test]
    fn test_extraction_json() {
        let lines = ["/** @classdesc Thing */", "function Thing() {}", "Thing.prototype.go = function() {};"];
        let result = extract(&lines).unwrap();
        let json = format_extraction(Path::new("thing.js"), &result).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(v["path"], "thing.js");
        let functions = v["loose_functions"].as_array().unwrap();
        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0]["has_prototype"], true);
        assert_eq!(functions[0]["comment"]["tags"][0], "@classdesc Thing");
        assert_eq!(functions[1]["header"]["declaration"], "Thing.prototype.go = function() {");
    }
}
