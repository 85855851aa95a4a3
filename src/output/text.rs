//! Plain-text report.
//!
//! ```text
//! Duplicate group (Group 1): 2 files, 1.0 KiB each
//!   /data/a.bin
//!   /data/copy of a.bin
//!
//! 1 duplicate group, 1 redundant file, 1.0 KiB reclaimable (50.0% of 2.0 KiB scanned)
//! ```

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::{Paint, Style};

use super::group_label;
use crate::cli::LabelStyle;
use crate::duplicates::{DuplicateReport, ScanSummary};

/// Text formatter for a finished scan.
#[derive(Debug)]
pub struct TextOutput<'a> {
    report: &'a DuplicateReport,
    summary: &'a ScanSummary,
    labels: LabelStyle,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a formatter. Colors are off until [`with_color`](Self::with_color).
    #[must_use]
    pub fn new(report: &'a DuplicateReport, summary: &'a ScanSummary, labels: LabelStyle) -> Self {
        Self {
            report,
            summary,
            labels,
            color: false,
        }
    }

    /// Enable or disable ANSI colors.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Write the report followed by a one-line summary.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let heading = Style::new().bold();
        let path_style = Style::new().cyan();

        for group in self.report {
            let label = group_label(group, self.labels);
            writeln!(
                writer,
                "{} {} files, {} each",
                self.paint(&format!("Duplicate group ({label}):"), heading),
                group.len(),
                ByteSize::b(group.size)
            )?;
            for file in &group.files {
                writeln!(
                    writer,
                    "  {}",
                    self.paint(&file.path.display().to_string(), path_style)
                )?;
            }
            writeln!(writer)?;
        }

        if self.report.is_empty() {
            writeln!(writer, "No duplicate files found.")?;
        } else {
            let groups = self.report.len();
            let files = self.summary.duplicate_files;
            writeln!(
                writer,
                "{} duplicate group{}, {} redundant file{}, {} reclaimable ({:.1}% of {} scanned)",
                groups,
                if groups == 1 { "" } else { "s" },
                files,
                if files == 1 { "" } else { "s" },
                self.paint(&self.summary.reclaimable_display(), Style::new().green().bold()),
                self.summary.wasted_percentage(),
                self.summary.total_size_display()
            )?;
        }

        if self.summary.has_errors() {
            let count = self.summary.errors.len();
            let message = format!(
                "{} file{} could not be read and {} skipped",
                count,
                if count == 1 { "" } else { "s" },
                if count == 1 { "was" } else { "were" }
            );
            writeln!(writer, "{}", self.paint(&message, Style::new().yellow()))?;
        }

        Ok(())
    }

    /// Render to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
