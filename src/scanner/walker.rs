//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and collecting `(path, size)` for every regular file. It uses
//! [`jwalk`] for parallel directory reading, with children sorted by name
//! so the output order is stable between runs.
//!
//! # Features
//!
//! - Parallel directory reading using rayon thread pool
//! - Directory symlinks are never followed, so the walk stays under the root
//! - File symlinks are resolved like any other file open would resolve them
//! - Per-entry failures are reported, never fatal
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupehunt::scanner::Walker;
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"));
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{FileEntry, ScanError};

/// Directory walker for file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            root: path.to_path_buf(),
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the directory tree, yielding regular files and access errors.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Directories are traversed but never yielded.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(false)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        return None;
                    }
                    self.stat_entry(entry.path())
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    Some(Err(self.handle_jwalk_error(path, e)))
                }
            })
    }

    /// Stat a non-directory entry, keeping it only if it is a regular file.
    fn stat_entry(&self, path: PathBuf) -> Option<Result<FileEntry, ScanError>> {
        match std::fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => {
                log::trace!("Found file ({} bytes): {}", metadata.len(), path.display());
                Some(Ok(FileEntry::new(path, metadata.len())))
            }
            Ok(_) => {
                log::trace!("Skipping non-regular entry: {}", path.display());
                None
            }
            Err(e) => {
                log::warn!("Cannot access {}: {}", path.display(), e);
                Some(Err(ScanError::from_io(path, e)))
            }
        }
    }

    fn handle_jwalk_error(&self, path: PathBuf, error: jwalk::Error) -> ScanError {
        log::warn!("Walker error for {}: {}", path.display(), error);
        match error.io_error().map(std::io::Error::kind) {
            Some(std::io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
            Some(std::io::ErrorKind::NotFound) => ScanError::NotFound(path),
            _ => ScanError::Io {
                path,
                source: Arc::new(std::io::Error::other(error.to_string())),
            },
        }
    }
}

/// Walk `root` to completion, splitting files from access errors.
///
/// Files come back in traversal order.
#[must_use]
pub fn scan(root: &Path) -> (Vec<FileEntry>, Vec<ScanError>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();
    for result in Walker::new(root).walk() {
        match result {
            Ok(file) => files.push(file),
            Err(e) => errors.push(e),
        }
    }
    log::info!(
        "Completed scanning {}: {} files, {} errors",
        root.display(),
        files.len(),
        errors.len()
    );
    (files, errors)
}
