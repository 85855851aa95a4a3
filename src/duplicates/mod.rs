//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (Phase 1)
//! - Prehash comparison (Phase 2)
//! - Full hash comparison (Phase 3)
//! - Collecting confirmed groups into a [`DuplicateReport`]

pub mod finder;
pub mod groups;
pub mod report;

pub use finder::{
    build_io_pool, detect_duplicates, phase2_prehash, phase3_fullhash, stage_hash,
    DuplicateFinder, FinderConfig, FinderError, FullhashStats, PhaseContext, PrehashGroup,
    PrehashStats, ScanSummary,
};
pub use groups::{
    group_by_size, DuplicateGroup, GroupingStats, SizeGroup,
};
pub use report::{collect, DuplicateReport};
