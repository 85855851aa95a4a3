//! Duplicate finder implementation with multi-phase detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Phase 1 - Size grouping**: Group files by size (see [`crate::duplicates::groups`] module)
//! 2. **Phase 2 - Prehash**: Hash the first 4 KiB of same-size files
//! 3. **Phase 3 - Full hash**: Hash the entire content of prehash matches
//!
//! Hashing runs on a bounded rayon pool. Results come back in input order
//! and are grouped on the calling thread, so the outcome does not depend
//! on how many I/O threads were used.
//!
//! # Example
//!
//! ```no_run
//! use dupehunt::duplicates::{
//!     build_io_pool, group_by_size, phase2_prehash, phase3_fullhash, PhaseContext,
//! };
//! use dupehunt::scanner::{scan, Hasher};
//! use std::path::Path;
//!
//! let (files, _errors) = scan(Path::new("."));
//! let (size_groups, _) = group_by_size(files);
//!
//! let hasher = Hasher::new();
//! let pool = build_io_pool(4).unwrap();
//! let ctx = PhaseContext::default();
//!
//! let (prehash_groups, stats) = phase2_prehash(size_groups, &hasher, &pool, &ctx);
//! println!("Phase 2: {} potential duplicates remain", stats.potential_duplicates);
//!
//! let (confirmed, _) = phase3_fullhash(prehash_groups, &hasher, &pool, &ctx);
//! println!("Phase 3: {} duplicate groups", confirmed.len());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::{collect, group_by_size, DuplicateReport, SizeGroup};
use crate::progress::{HashProgress, ProgressCallback};
use crate::scanner::{FileEntry, Hash, HashAlgorithm, HashError, Hasher, ScanError, Walker};

/// Files larger than this are logged individually when fully hashed.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Build the bounded thread pool used for hashing.
///
/// # Errors
///
/// Returns the rayon build error if the pool cannot be created.
pub fn build_io_pool(threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("dupehunt-io-{i}"))
        .build()
}

/// Shared state for one run of the hashing phases.
///
/// Carries the cooperative shutdown flag and the hash-operation counters
/// that feed progress reporting. Both phases of a run must share the same
/// context so the progress total accumulates across them.
#[derive(Debug, Clone)]
pub struct PhaseContext {
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Arc<HashProgress>,
}

impl Default for PhaseContext {
    fn default() -> Self {
        Self::new(Arc::new(HashProgress::new(None)))
    }
}

impl PhaseContext {
    /// Create a context reporting into `progress`.
    #[must_use]
    pub fn new(progress: Arc<HashProgress>) -> Self {
        Self {
            shutdown_flag: None,
            progress,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The hash-operation counters for this run.
    #[must_use]
    pub fn progress(&self) -> &Arc<HashProgress> {
        &self.progress
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn callback(&self) -> Option<&Arc<dyn ProgressCallback>> {
        self.progress.callback()
    }
}

/// Files of one size whose prefixes hashed to the same digest.
#[derive(Debug, Clone)]
pub struct PrehashGroup {
    /// File size shared by every member
    pub size: u64,
    /// Prefix digest shared by every member
    pub prehash: Hash,
    /// Members in discovery order
    pub files: Vec<FileEntry>,
}

/// Statistics from prehash phase.
#[derive(Debug, Clone, Default)]
pub struct PrehashStats {
    /// Total files that entered Phase 2
    pub input_files: usize,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Number of files that failed to hash (I/O errors)
    pub failed_files: usize,
    /// Errors encountered during prehash
    pub errors: Vec<HashError>,
    /// Number of files eliminated by a unique prefix
    pub unique_prehashes: usize,
    /// Number of files that could still be duplicates
    pub potential_duplicates: usize,
    /// Number of prehash groups with 2+ files
    pub duplicate_groups: usize,
    /// Whether phase was interrupted by shutdown
    pub interrupted: bool,
}

impl PrehashStats {
    /// Percentage of files eliminated by prehash comparison.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.input_files == 0 {
            0.0
        } else {
            let eliminated = self.input_files - self.potential_duplicates;
            (eliminated as f64 / self.input_files as f64) * 100.0
        }
    }
}

/// Statistics from full hash phase.
#[derive(Debug, Clone, Default)]
pub struct FullhashStats {
    /// Total files that entered Phase 3
    pub input_files: usize,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Number of files that failed to hash (I/O errors)
    pub failed_files: usize,
    /// Errors encountered during full hash
    pub errors: Vec<HashError>,
    /// Total bytes hashed across all files
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Whether phase was interrupted by shutdown
    pub interrupted: bool,
}

/// Hash every file on the pool, in input order.
///
/// A `None` result means the file was skipped because shutdown was
/// requested before it was reached.
fn hash_all<F>(
    files: Vec<FileEntry>,
    pool: &rayon::ThreadPool,
    ctx: &PhaseContext,
    hash_one: F,
) -> Vec<(FileEntry, Option<Result<Hash, HashError>>)>
where
    F: Fn(&FileEntry) -> Result<Hash, HashError> + Sync,
{
    pool.install(|| {
        files
            .into_par_iter()
            .map(|file| {
                if ctx.is_shutdown_requested() {
                    return (file, None);
                }
                let result = hash_one(&file);
                ctx.progress.complete_one();
                (file, Some(result))
            })
            .collect()
    })
}

/// Group hashed files by `(size, digest)`, keeping first-appearance order.
fn group_in_order(hashed: Vec<(FileEntry, Hash)>) -> Vec<(u64, Hash, Vec<FileEntry>)> {
    let mut index: HashMap<(u64, Hash), usize> = HashMap::new();
    let mut groups: Vec<(u64, Hash, Vec<FileEntry>)> = Vec::new();

    for (file, hash) in hashed {
        let key = (file.size, hash);
        match index.get(&key) {
            Some(&i) => groups[i].2.push(file),
            None => {
                index.insert(key, groups.len());
                groups.push((file.size, hash, vec![file]));
            }
        }
    }
    groups
}

/// Group files by prehash within size groups (Phase 2).
///
/// For every file of every size group, digests at most the first 4 KiB
/// and groups files by `(size, prefix digest)`. Groups of one are dropped.
/// Files that cannot be read are left out of every group and their errors
/// are recorded in the returned stats.
///
/// Emits `prehash` phase start and end to the context's callback and
/// schedules one hash operation per input file.
#[must_use]
pub fn phase2_prehash(
    size_groups: BTreeMap<u64, Vec<FileEntry>>,
    hasher: &Hasher,
    pool: &rayon::ThreadPool,
    ctx: &PhaseContext,
) -> (Vec<PrehashGroup>, PrehashStats) {
    let all_files: Vec<FileEntry> = size_groups.into_values().flatten().collect();
    let mut stats = PrehashStats {
        input_files: all_files.len(),
        ..Default::default()
    };

    if let Some(callback) = ctx.callback() {
        callback.on_phase_start("prehash", all_files.len());
    }
    ctx.progress.schedule(all_files.len() as u64);

    log::info!("Phase 2: Computing prehashes for {} files", all_files.len());

    let results = hash_all(all_files, pool, ctx, |file| {
        let result = hasher.prehash(&file.path);
        match &result {
            Ok(_) => log::trace!("Prehash computed: {}", file.path.display()),
            Err(e) => log::warn!("Failed to prehash {}: {}", file.path.display(), e),
        }
        result
    });

    let mut hashed = Vec::with_capacity(results.len());
    for (file, result) in results {
        match result {
            Some(Ok(prehash)) => {
                stats.hashed_files += 1;
                hashed.push((file, prehash));
            }
            Some(Err(e)) => {
                stats.failed_files += 1;
                stats.errors.push(e);
            }
            None => stats.interrupted = true,
        }
    }

    if stats.interrupted {
        log::info!("Phase 2: Interrupted by shutdown signal");
    }

    let groups: Vec<PrehashGroup> = group_in_order(hashed)
        .into_iter()
        .filter_map(|(size, prehash, files)| {
            if files.len() > 1 {
                Some(PrehashGroup {
                    size,
                    prehash,
                    files,
                })
            } else {
                stats.unique_prehashes += files.len();
                None
            }
        })
        .collect();

    stats.duplicate_groups = groups.len();
    stats.potential_duplicates = groups.iter().map(|g| g.files.len()).sum();

    if let Some(callback) = ctx.callback() {
        callback.on_phase_end("prehash");
    }

    log::info!(
        "Phase 2 complete: {} candidates in {} groups ({:.1}% eliminated)",
        stats.potential_duplicates,
        stats.duplicate_groups,
        stats.elimination_rate()
    );

    (groups, stats)
}

/// Confirm duplicates by full content hash (Phase 3).
///
/// Streams every prehash candidate through the digest and groups the
/// results by `(size, full digest)`. Only groups with 2+ files are
/// returned, in first-appearance order, ready for [`collect`].
///
/// Emits `fullhash` phase start and end even when there is nothing to
/// hash, so a progress display can always finish.
#[must_use]
pub fn phase3_fullhash(
    prehash_groups: Vec<PrehashGroup>,
    hasher: &Hasher,
    pool: &rayon::ThreadPool,
    ctx: &PhaseContext,
) -> (Vec<(Hash, Vec<FileEntry>)>, FullhashStats) {
    let all_files: Vec<FileEntry> = prehash_groups
        .into_iter()
        .flat_map(|g| g.files)
        .collect();
    let mut stats = FullhashStats {
        input_files: all_files.len(),
        ..Default::default()
    };

    if let Some(callback) = ctx.callback() {
        callback.on_phase_start("fullhash", all_files.len());
    }
    ctx.progress.schedule(all_files.len() as u64);

    log::info!(
        "Phase 3: Computing full hashes for {} files",
        all_files.len()
    );

    let results = hash_all(all_files, pool, ctx, |file| {
        if file.size > LARGE_FILE_THRESHOLD {
            log::debug!(
                "Hashing large file ({}): {}",
                ByteSize::b(file.size),
                file.path.display()
            );
        }
        let result = hasher.full_hash(&file.path);
        match &result {
            Ok(_) => log::trace!("Full hash computed: {}", file.path.display()),
            Err(e) => log::warn!("Failed to hash {}: {}", file.path.display(), e),
        }
        result
    });

    let mut hashed = Vec::with_capacity(results.len());
    for (file, result) in results {
        match result {
            Some(Ok(hash)) => {
                stats.hashed_files += 1;
                stats.bytes_hashed += file.size;
                hashed.push((file, hash));
            }
            Some(Err(e)) => {
                stats.failed_files += 1;
                stats.errors.push(e);
            }
            None => stats.interrupted = true,
        }
    }

    if stats.interrupted {
        log::info!("Phase 3: Interrupted by shutdown signal");
    }

    let confirmed: Vec<(Hash, Vec<FileEntry>)> = group_in_order(hashed)
        .into_iter()
        .filter(|(_, _, files)| files.len() > 1)
        .map(|(_, hash, files)| (hash, files))
        .collect();
    stats.duplicate_groups = confirmed.len();

    if let Some(callback) = ctx.callback() {
        callback.on_phase_end("fullhash");
    }

    log::info!(
        "Phase 3 complete: {} duplicate groups, {} hashed",
        stats.duplicate_groups,
        ByteSize::b(stats.bytes_hashed)
    );

    (confirmed, stats)
}

/// Run both hashing phases over a single size group.
///
/// Returns the confirmed full-hash subgroups (2+ members each) and every
/// read error met along the way.
#[must_use]
pub fn stage_hash(
    group: &SizeGroup,
    hasher: &Hasher,
    pool: &rayon::ThreadPool,
    ctx: &PhaseContext,
) -> (Vec<(Hash, Vec<FileEntry>)>, Vec<HashError>) {
    if !group.has_duplicates() {
        return (Vec::new(), Vec::new());
    }

    let mut input = BTreeMap::new();
    input.insert(group.size, group.files.clone());

    let (candidates, prehash_stats) = phase2_prehash(input, hasher, pool, ctx);
    let (confirmed, fullhash_stats) = phase3_fullhash(candidates, hasher, pool, ctx);

    let mut errors = prehash_stats.errors;
    errors.extend(fullhash_stats.errors);
    (confirmed, errors)
}

// ============================================================================
// DuplicateFinder - Pipeline Orchestrator
// ============================================================================

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Digest used for prefix and full hashes.
    pub algorithm: HashAlgorithm,
    /// Retry transient read failures once.
    pub retry_reads: bool,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("algorithm", &self.algorithm)
            .field("retry_reads", &self.retry_reads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            algorithm: HashAlgorithm::default(),
            retry_reads: false,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the I/O thread count (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Enable or disable the single retry of transient read failures.
    #[must_use]
    pub fn with_retry_reads(mut self, enabled: bool) -> Self {
        self.retry_reads = enabled;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Total number of files scanned
    pub total_files: usize,
    /// Total size of all scanned files in bytes
    pub total_size: u64,
    /// Number of files eliminated by size grouping (unique sizes)
    pub eliminated_by_size: usize,
    /// Number of files eliminated by prehash (different first 4 KiB)
    pub eliminated_by_prehash: usize,
    /// Hash operations performed, prefix and full combined
    pub hash_operations: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Per-file errors met while walking and hashing
    pub errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }

    /// Whether any file could not be stat'ed or read.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Errors that end a duplicate search.
///
/// Per-file problems never show up here; see [`ScanSummary::errors`].
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(std::path::PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(std::path::PathBuf),

    /// The provided directory cannot be listed.
    #[error("Cannot read directory {path}: {source}")]
    Unreadable {
        /// The root that was given
        path: std::path::PathBuf,
        /// Why listing it failed
        #[source]
        source: std::io::Error,
    },

    /// The hashing thread pool could not be started.
    #[error("Failed to start hashing threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Duplicate finder that orchestrates the multi-phase detection pipeline.
///
/// # Example
///
/// ```no_run
/// use dupehunt::duplicates::{DuplicateFinder, FinderConfig};
/// use std::path::Path;
///
/// let config = FinderConfig::default().with_io_threads(4);
/// let finder = DuplicateFinder::new(config);
///
/// let (report, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
///
/// println!("Found {} duplicate groups", report.len());
/// println!("Reclaimable space: {}", summary.reclaimable_display());
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let hasher = Hasher::with_algorithm(config.algorithm).with_retry_reads(config.retry_reads);
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find all duplicate files under `path`.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist
    /// - The path is not a directory
    /// - The directory cannot be listed
    /// - The scan is interrupted by shutdown signal
    /// - The hashing thread pool cannot be built
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(DuplicateReport, ScanSummary), FinderError> {
        let start_time = Instant::now();

        if !path.exists() {
            return Err(FinderError::PathNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(FinderError::NotADirectory(path.to_path_buf()));
        }
        if let Err(e) = std::fs::read_dir(path) {
            return Err(FinderError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            });
        }

        log::info!("Starting duplicate scan of {}", path.display());

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
            callback.on_message(&format!("Walking {}", path.display()));
        }

        let mut walker = Walker::new(path);
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut files = Vec::new();
        let mut scan_errors = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => files.push(file),
                Err(e) => scan_errors.push(e),
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        if self.config.is_shutdown_requested() {
            log::info!("Walk interrupted after {} files", files.len());
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Walk complete: {} files, {} errors",
            files.len(),
            scan_errors.len()
        );

        let (report, mut summary) = self.find_duplicates_from_files(files)?;

        scan_errors.append(&mut summary.errors);
        summary.errors = scan_errors;
        summary.scan_duration = start_time.elapsed();

        Ok((report, summary))
    }

    /// Run the pipeline on an already collected list of files.
    ///
    /// # Errors
    ///
    /// Returns `FinderError::Interrupted` if shutdown is requested before
    /// hashing completes, or `FinderError::ThreadPool` if the hashing pool
    /// cannot be built.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(DuplicateReport, ScanSummary), FinderError> {
        let start_time = Instant::now();

        let (size_groups, size_stats) = group_by_size(files);
        let mut summary = ScanSummary {
            total_files: size_stats.total_files,
            total_size: size_stats.total_size,
            eliminated_by_size: size_stats.eliminated_unique,
            ..Default::default()
        };

        log::info!(
            "Phase 1: {} files, {} candidates in {} size groups",
            size_stats.total_files,
            size_stats.potential_duplicates,
            size_stats.duplicate_groups
        );

        let pool = build_io_pool(self.config.io_threads)?;
        let progress = Arc::new(HashProgress::new(self.config.progress_callback.clone()));
        let mut ctx = PhaseContext::new(Arc::clone(&progress));
        if let Some(ref flag) = self.config.shutdown_flag {
            ctx = ctx.with_shutdown_flag(Arc::clone(flag));
        }

        let (candidates, prehash_stats) = phase2_prehash(size_groups, &self.hasher, &pool, &ctx);
        if prehash_stats.interrupted || ctx.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let (confirmed, fullhash_stats) = phase3_fullhash(candidates, &self.hasher, &pool, &ctx);
        if fullhash_stats.interrupted || ctx.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let report = collect(confirmed);

        summary.eliminated_by_prehash = prehash_stats.unique_prehashes;
        summary.hash_operations = progress.snapshot().0;
        summary.duplicate_groups = report.len();
        summary.duplicate_files = report.duplicate_files();
        summary.reclaimable_space = report.wasted_space();
        summary.errors = prehash_stats
            .errors
            .into_iter()
            .chain(fullhash_stats.errors)
            .map(ScanError::from)
            .collect();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Found {} duplicate groups, {} reclaimable",
            summary.duplicate_groups,
            summary.reclaimable_display()
        );

        Ok((report, summary))
    }
}

/// Find duplicates under `root` with the default configuration.
///
/// # Errors
///
/// Returns `FinderError` if `root` is missing or not a directory.
pub fn detect_duplicates(root: &Path) -> Result<DuplicateReport, FinderError> {
    DuplicateFinder::with_defaults()
        .find_duplicates(root)
        .map(|(report, _)| report)
}
