//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "id": 1,
//!       "label": "Group 1",
//!       "hash": "abc123...",
//!       "size": 1024,
//!       "files": ["/path/to/file1.txt", "/path/to/file2.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "hash_operations": 42,
//!     "scan_duration_ms": 1234,
//!     "errors": [{ "path": "/locked", "message": "Permission denied: /locked" }],
//!     "exit_code": 0,
//!     "exit_code_name": "DH000"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use super::group_label;
use crate::cli::LabelStyle;
use crate::duplicates::{DuplicateGroup, DuplicateReport, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Sequential group number
    pub id: usize,
    /// Identifier under the chosen label style
    pub label: String,
    /// Full content hash as hexadecimal string (64 characters)
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Paths of every member
    pub files: Vec<String>,
}

impl JsonDuplicateGroup {
    /// Convert a [`DuplicateGroup`].
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup, labels: LabelStyle) -> Self {
        Self {
            id: group.id,
            label: group_label(group, labels),
            hash: group.hash_hex(),
            size: group.size,
            files: group
                .files
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// A file that was skipped because of an error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonError {
    /// Path of the file or directory
    pub path: String,
    /// Error description
    pub message: String,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Total number of files scanned
    pub total_files: usize,
    /// Total size of all scanned files in bytes
    pub total_size: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates (bytes)
    pub reclaimable_space: u64,
    /// Prefix and full hash operations performed
    pub hash_operations: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Files and directories that were skipped
    pub errors: Vec<JsonError>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DH000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a [`ScanSummary`] and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            hash_operations: summary.hash_operations,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            errors: summary
                .errors
                .iter()
                .map(|e| JsonError {
                    path: e.path().to_string_lossy().into_owned(),
                    message: e.to_string(),
                })
                .collect(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// List of duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document for a finished scan.
    ///
    /// ```
    /// use dupehunt::cli::LabelStyle;
    /// use dupehunt::duplicates::{DuplicateReport, ScanSummary};
    /// use dupehunt::error::ExitCode;
    /// use dupehunt::output::JsonOutput;
    ///
    /// let report = DuplicateReport::default();
    /// let output = JsonOutput::new(&report, &ScanSummary::default(), LabelStyle::Hash, ExitCode::NoDuplicates);
    /// assert!(output.duplicates.is_empty());
    /// assert_eq!(output.summary.exit_code, 2);
    /// ```
    #[must_use]
    pub fn new(
        report: &DuplicateReport,
        summary: &ScanSummary,
        labels: LabelStyle,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            duplicates: report
                .iter()
                .map(|g| JsonDuplicateGroup::from_duplicate_group(g, labels))
                .collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON output: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::collect;
    use crate::scanner::{FileEntry, ScanError};
    use std::path::PathBuf;
    use std::time::Duration;

    fn sample_report() -> DuplicateReport {
        collect(vec![
            (
                [0x01; 32],
                vec![
                    FileEntry::new(PathBuf::from("/a/1"), 10),
                    FileEntry::new(PathBuf::from("/a/2"), 10),
                ],
            ),
            (
                [0x02; 32],
                vec![
                    FileEntry::new(PathBuf::from("/b/1"), 500),
                    FileEntry::new(PathBuf::from("/b/2"), 500),
                    FileEntry::new(PathBuf::from("/b/3"), 500),
                ],
            ),
        ])
    }

    fn sample_summary() -> ScanSummary {
        ScanSummary {
            total_files: 7,
            total_size: 1620,
            duplicate_groups: 2,
            duplicate_files: 3,
            reclaimable_space: 1010,
            hash_operations: 10,
            scan_duration: Duration::from_millis(1234),
            errors: vec![ScanError::PermissionDenied(PathBuf::from("/locked"))],
            ..Default::default()
        }
    }

    #[test]
    fn test_json_structure() {
        let output = JsonOutput::new(
            &sample_report(),
            &sample_summary(),
            LabelStyle::Sequential,
            ExitCode::PartialSuccess,
        );
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        let duplicates = value["duplicates"].as_array().unwrap();
        assert_eq!(duplicates.len(), 2);
        assert_eq!(duplicates[0]["id"], 1);
        assert_eq!(duplicates[0]["label"], "Group 1");
        assert_eq!(duplicates[0]["size"], 500);
        assert_eq!(duplicates[0]["hash"], "02".repeat(32));
        assert_eq!(duplicates[1]["files"][0], "/a/1");

        let summary = &value["summary"];
        assert_eq!(summary["scan_duration_ms"], 1234);
        assert_eq!(summary["hash_operations"], 10);
        assert_eq!(summary["exit_code"], 3);
        assert_eq!(summary["exit_code_name"], "DH003");
        assert_eq!(summary["errors"][0]["path"], "/locked");
    }

    #[test]
    fn test_hash_label_style() {
        let output = JsonOutput::new(
            &sample_report(),
            &sample_summary(),
            LabelStyle::Hash,
            ExitCode::Success,
        );
        assert_eq!(output.duplicates[1].label, "01".repeat(32));
    }

    #[test]
    fn test_write_to_appends_newline() {
        let output = JsonOutput::new(
            &DuplicateReport::default(),
            &ScanSummary::default(),
            LabelStyle::Hash,
            ExitCode::NoDuplicates,
        );
        let mut buffer = Vec::new();
        output.write_to(&mut buffer, true).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\"duplicates\": []"));
    }
}
