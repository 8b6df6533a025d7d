//! Batch runs and the functional API.
//!
//! [`StubRun`] walks a source tree, stubs every matching file in parallel
//! and optionally mirrors the stubs into an output directory. Each file is
//! extracted in isolation: a file that fails is recorded on its own report
//! and the run carries on.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::StubError;
use crate::extract::{extract, split_lines, ExtractError, ProcessSummary};
use crate::printer::{render_stub, PrintOptions};
use crate::walker::{walk_with_options, WalkOptions};

/// Builder for a stub run over a file or directory.
///
/// # Examples
///
/// ```no_run
/// use jsstub::builder::StubRun;
///
/// let report = StubRun::new("./src")
///     .output_dir("./stubs")
///     .exclude("**/*.min.js")
///     .run()
///     .unwrap();
///
/// println!("{} functions stubbed", report.totals.class_functions);
/// ```
pub struct StubRun {
    root: PathBuf,
    output_dir: Option<PathBuf>,
    extensions: Vec<String>,
    excludes: Vec<String>,
    print_options: PrintOptions,
    walk_options: WalkOptions,
}

impl StubRun {
    /// Create a new run rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_dir: None,
            extensions: vec!["js".to_string()],
            excludes: Vec::new(),
            print_options: PrintOptions::default(),
            walk_options: WalkOptions::default(),
        }
    }

    /// Write stubs under `dir`, mirroring paths relative to the root.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// File extensions to stub, without the dot. Default: `js`.
    pub fn extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.extensions = extensions
            .iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Skip files whose path relative to the root matches `pattern`.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// Re-wrap `define(...)` modules in a function closure.
    pub fn wrap_closure(mut self, wrap: bool) -> Self {
        self.print_options.wrap_closure = wrap;
        self
    }

    /// Include hidden files.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.walk_options.include_hidden = include;
        self
    }

    /// Set maximum directory depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.walk_options.max_depth = Some(depth);
        self
    }

    /// Replace the print options.
    pub fn print_options(mut self, options: PrintOptions) -> Self {
        self.print_options = options;
        self
    }

    /// Replace the walk options.
    pub fn walk_options(mut self, options: WalkOptions) -> Self {
        self.walk_options = options;
        self
    }

    /// Run the batch.
    ///
    /// # Errors
    ///
    /// Fails when the root is missing or unreadable, an exclude pattern is
    /// invalid, or no file qualifies. Per-file failures are reported, not
    /// returned.
    pub fn run(self) -> Result<BatchReport, StubError> {
        if !self.root.exists() {
            return Err(StubError::PathNotFound(self.root));
        }

        let excludes = self
            .excludes
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let files = self.collect_files(&excludes)?;
        if files.is_empty() {
            return Err(StubError::NoFilesFound(self.root));
        }
        debug!(count = files.len(), root = %self.root.display(), "stubbing files");

        let mut reports: Vec<FileReport> = files
            .into_par_iter()
            .map(|(path, relative)| self.process_file(&path, relative))
            .collect();
        reports.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(BatchReport::new(self.root, reports))
    }

    /// Files to stub as `(path, path relative to the root)` pairs.
    ///
    /// An unreadable root fails the run; unreadable entries below it are
    /// skipped.
    fn collect_files(&self, excludes: &[Pattern]) -> Result<Vec<(PathBuf, PathBuf)>, StubError> {
        if self.root.is_file() {
            let relative = self.root.file_name().map(PathBuf::from).unwrap_or_default();
            return Ok(vec![(self.root.clone(), relative)]);
        }

        let output = self.output_dir.as_deref().and_then(|out| relative_output(&self.root, out));

        let mut files = Vec::new();
        for entry in walk_with_options(&self.root, &self.walk_options) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.path() == self.root => return Err(err.into()),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.is_file || !self.has_extension(&entry.path) {
                continue;
            }

            let Ok(relative) = entry.path.strip_prefix(&self.root).map(Path::to_path_buf) else {
                continue;
            };
            if output.as_ref().is_some_and(|out| relative.starts_with(out)) {
                continue;
            }
            if excludes.iter().any(|p| p.matches_path(&relative)) {
                debug!(path = %relative.display(), "excluded");
                continue;
            }
            files.push((entry.path, relative));
        }

        Ok(files)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
    }

    fn process_file(&self, path: &Path, relative: PathBuf) -> FileReport {
        let mut report = FileReport {
            path: relative,
            output: None,
            summary: ProcessSummary::default(),
            lines: 0,
            error: None,
        };

        let stub = match stub_file(path, &self.print_options) {
            Ok(stub) => stub,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping file");
                report.error = Some(err.to_string());
                return report;
            }
        };
        report.summary = stub.summary;
        report.lines = stub.lines;

        if let Some(out) = &self.output_dir {
            if !stub.text.is_empty() {
                let target = out.join(&report.path);
                match write_stub(&target, &stub.text) {
                    Ok(()) => report.output = Some(target),
                    Err(err) => {
                        warn!(path = %target.display(), error = %err, "failed to write stub");
                        report.error = Some(err.to_string());
                    }
                }
            }
        }

        debug!(path = %report.path.display(), lines = report.lines, "stubbed");
        report
    }
}

/// Output directory relative to `root`, when it lies inside it.
///
/// Both sides are canonicalized so `./src` and `src/stubs` compare equal. An
/// output directory that doesn't exist yet holds nothing to skip.
fn relative_output(root: &Path, out: &Path) -> Option<PathBuf> {
    let root = root.canonicalize().ok()?;
    let out = out.canonicalize().ok()?;
    out.strip_prefix(&root).ok().map(Path::to_path_buf)
}

fn write_stub(target: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, text)
}

/// Outcome for one file of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Path relative to the run root.
    pub path: PathBuf,
    /// Where the stub was written, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub summary: ProcessSummary,
    pub lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Totals over a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub root: PathBuf,
    pub files: Vec<FileReport>,
    pub totals: ProcessSummary,
    /// Lines scanned across all files.
    pub lines: usize,
    /// Stubs written to the output directory.
    pub written: usize,
    pub failed: usize,
}

impl BatchReport {
    fn new(root: PathBuf, files: Vec<FileReport>) -> Self {
        let mut totals = ProcessSummary::default();
        for file in &files {
            totals += file.summary;
        }

        Self {
            root,
            totals,
            lines: files.iter().map(|f| f.lines).sum(),
            written: files.iter().filter(|f| f.output.is_some()).count(),
            failed: files.iter().filter(|f| f.is_failed()).count(),
            files,
        }
    }

    /// Reports of files that failed.
    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.is_failed())
    }
}

// ============================================================================
// Functional API
// ============================================================================

/// A rendered stub and what went into it.
#[derive(Debug, Clone)]
pub struct Stub {
    /// Stub text; empty when nothing was kept.
    pub text: String,
    pub summary: ProcessSummary,
    /// Lines in the source.
    pub lines: usize,
}

/// Count source lines, including an unterminated last line.
fn count_lines(text: &str) -> usize {
    let newlines = bytecount::count(text.as_bytes(), b'\n');
    if text.is_empty() || text.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

/// Stub source text.
///
/// ```
/// use jsstub::builder::stub_source;
/// use jsstub::printer::PrintOptions;
///
/// let stub = stub_source("class A {\n  run() {\n    go();\n  }\n}\n", &PrintOptions::default()).unwrap();
/// assert_eq!(stub.text, "class A {\nrun() {}\n}\n");
/// assert_eq!(stub.summary.class_functions, 1);
/// ```
pub fn stub_source(text: &str, options: &PrintOptions) -> Result<Stub, ExtractError> {
    let lines = split_lines(text);
    let result = extract(&lines)?;

    Ok(Stub {
        text: render_stub(&lines, &result, options),
        summary: ProcessSummary::of(&result),
        lines: count_lines(text),
    })
}

/// Read and stub one file.
pub fn stub_file(path: impl AsRef<Path>, options: &PrintOptions) -> Result<Stub, StubError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;

    stub_source(&text, options).map_err(|source| StubError::Extract {
        path: path.to_path_buf(),
        source,
    })
}
