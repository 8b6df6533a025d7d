//! jsstub - Generate signature-only stubs of JavaScript source trees.
//!
//! jsstub reads JavaScript files line by line, extracts class, variable,
//! function and prototype declarations with their documentation comments,
//! and writes them back out with every body emptied. The result is a compact
//! view of a codebase's API surface that documentation tools can consume.
//!
//! # Quick Start
//!
//! ```no_run
//! use jsstub::builder::StubRun;
//!
//! let report = StubRun::new("./src")
//!     .output_dir("./stubs")
//!     .run()
//!     .unwrap();
//!
//! println!("{} files, {} failed", report.files.len(), report.failed);
//! ```
//!
//! For a single file or string, see [`builder::stub_source`] and
//! [`extract::extract`].
//!
//! # Modules
//!
//! - [`scan`] - Delimiter matching, closing strings and header classification
//! - [`comments`] - Documentation comment collection and matching
//! - [`extract`] - Declaration extraction
//! - [`printer`] - Stub rendering
//! - [`walker`] - Directory traversal with gitignore support
//! - [`builder`] - Batch runs and the functional API
//! - [`output`] - Report formatting

pub mod scan;
pub mod comments;
pub mod extract;
pub mod printer;
pub mod errors;
pub mod walker;
pub mod output;
pub mod builder;

// Re-export key types at crate root for convenience
pub use builder::{stub_file, stub_source, BatchReport, FileReport, Stub, StubRun};
pub use comments::{CommentBlock, CommentPool};
pub use errors::StubError;
pub use extract::{extract, extract_source, ExtractError, ExtractionResult, ProcessSummary};
pub use output::OutputError;
pub use printer::{render_stub, PrintOptions};
pub use walker::{WalkError, WalkOptions};
