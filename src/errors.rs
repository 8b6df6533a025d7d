//! Error types for jsstub.

use std::path::PathBuf;

use crate::extract::ExtractError;
use crate::output::OutputError;
use crate::walker::WalkError;

/// Top-level error type for jsstub operations.
#[derive(Debug, thiserror::Error)]
pub enum StubError {
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("no JavaScript files found in {0}")]
    NoFilesFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("{}: {source}", .path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },

    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Map an error to its exit code.
pub fn exit_code(error: &StubError) -> i32 {
    match error {
        StubError::PathNotFound(_) => 3,
        StubError::NoFilesFound(_) => 5,
        StubError::Io(_) => 1,
        StubError::Walk(WalkError::PermissionDenied { .. }) => 4,
        StubError::Walk(_) => 2,
        StubError::Extract { .. } => 6,
        StubError::Pattern(_) => 2,
        StubError::Output(_) => 1,
    }
}
