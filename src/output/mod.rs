//! Output formatters for duplicate scan results.
//!
//! - [`text`]: human-readable listing, optionally colored
//! - [`json`]: machine-readable document for scripting
//!
//! # Example
//!
//! ```no_run
//! use dupehunt::cli::LabelStyle;
//! use dupehunt::duplicates::DuplicateFinder;
//! use dupehunt::error::ExitCode;
//! use dupehunt::output::JsonOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (report, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! let output = JsonOutput::new(&report, &summary, LabelStyle::Hash, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;

use crate::cli::LabelStyle;
use crate::duplicates::DuplicateGroup;

/// The identifier shown for `group` under the given label style.
#[must_use]
pub fn group_label(group: &DuplicateGroup, style: LabelStyle) -> String {
    match style {
        LabelStyle::Hash => group.hash_hex(),
        LabelStyle::Sequential => group.label(),
    }
}
