//! Directory traversal with gitignore support.
//!
//! Uses the `ignore` crate to walk source trees while respecting
//! .gitignore, .git/info/exclude, global gitignore, and .jsstubignore.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use thiserror::Error;

/// Name of the per-tree ignore file, read from the walk root.
pub const IGNORE_FILE: &str = ".jsstubignore";

/// Default recursion limit below the root.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WalkError {
    /// The path the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            WalkError::NotFound { path } | WalkError::PermissionDenied { path } | WalkError::Io { path, .. } => path,
        }
    }
}

/// Options for directory walking.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Maximum depth to recurse (None = unlimited).
    pub max_depth: Option<usize>,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Include hidden files and directories.
    pub include_hidden: bool,
    /// Respect .gitignore patterns.
    pub respect_gitignore: bool,
    /// Additional ignore files on top of .jsstubignore.
    pub custom_ignores: Vec<PathBuf>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            follow_symlinks: false,
            include_hidden: false,
            respect_gitignore: true,
            custom_ignores: Vec::new(),
        }
    }
}

impl WalkOptions {
    /// Set maximum depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// Entry from directory walk.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Path to the entry.
    pub path: PathBuf,
    /// Whether this is a file or directory.
    pub is_file: bool,
}

/// Walk a directory tree with default options, yielding entries.
///
/// # Examples
///
/// ```no_run
/// use jsstub::walker::walk;
/// use std::path::Path;
///
/// for entry in walk(Path::new("./src")).flatten() {
///     println!("{}", entry.path.display());
/// }
/// ```
pub fn walk(root: &Path) -> impl Iterator<Item = Result<WalkEntry, WalkError>> {
    walk_with_options(root, &WalkOptions::default())
}

/// Walk a directory tree with custom options.
pub fn walk_with_options(
    root: &Path,
    options: &WalkOptions,
) -> impl Iterator<Item = Result<WalkEntry, WalkError>> {
    let root = root.to_path_buf();

    if !root.exists() {
        return itertools_lite::Either::Left(std::iter::once(Err(WalkError::NotFound {
            path: root,
        })));
    }

    let mut builder = WalkBuilder::new(&root);

    builder
        .hidden(!options.include_hidden)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .follow_links(options.follow_symlinks)
        .max_depth(options.max_depth);

    for ignore_path in &options.custom_ignores {
        if ignore_path.exists() {
            builder.add_ignore(ignore_path);
        }
    }

    let tree_ignore = root.join(IGNORE_FILE);
    if tree_ignore.exists() {
        builder.add_ignore(&tree_ignore);
    }

    let walker = builder.build();

    itertools_lite::Either::Right(walker.filter_map(move |result| match result {
        Ok(entry) => Some(Ok(WalkEntry {
            path: entry.path().to_path_buf(),
            is_file: entry.file_type().is_some_and(|ft| ft.is_file()),
        })),
        Err(err) => {
            let kind = err.io_error().map(std::io::Error::kind);
            let path = error_path(&err);
            match kind {
                Some(std::io::ErrorKind::PermissionDenied) => Some(Err(WalkError::PermissionDenied { path })),
                Some(_) => err.into_io_error().map(|source| Err(WalkError::Io { path, source })),
                // Ignore-file parse errors and the like don't stop the walk.
                None => None,
            }
        }
    }))
}

/// Path an `ignore` error refers to, if it carries one.
fn error_path(err: &ignore::Error) -> PathBuf {
    match err {
        ignore::Error::WithPath { path, .. } => path.clone(),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => error_path(err),
        _ => PathBuf::from("<walk error>"),
    }
}

/// Simple Either type to avoid adding itertools dependency.
mod itertools_lite {
    pub enum Either<L, R> {
        Left(L),
        Right(R),
    }

    impl<L, R, T> Iterator for Either<L, R>
    where
        L: Iterator<Item = T>,
        R: Iterator<Item = T>,
    {
        type Item = T;

        fn next(&mut self) -> Option<Self::Item> {
            match self {
                Either::Left(l) => l.next(),
                Either::Right(r) => r.next(),
            }
        }
    }
}
