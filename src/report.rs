use std::io::Write;

use anyhow::{Result, anyhow};

use crate::types::error::S3cleanerError;
use crate::types::{DeletionOutcome, ObjectRecord};

const NAME_LABEL: &str = "Name:          ";
const LAST_MODIFIED_LABEL: &str = "Last modified: ";
const FAILED_LABEL: &str = "Failed:        ";
const LAST_MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// The result of one enumeration: the bucket's records in service order.
///
/// ```
/// use s3cleaner_rs::InventoryReport;
///
/// let report = InventoryReport::new("my-bucket", vec![], false);
/// assert_eq!(report.total(), 0);
/// assert_eq!(report.summary_line(), "Found 0 items in bucket my-bucket");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryReport {
    bucket: String,
    records: Vec<ObjectRecord>,
    include_all_versions: bool,
}

impl InventoryReport {
    pub fn new(bucket: &str, records: Vec<ObjectRecord>, include_all_versions: bool) -> Self {
        Self {
            bucket: bucket.to_string(),
            records,
            include_all_versions,
        }
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ObjectRecord> {
        self.records
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn include_all_versions(&self) -> bool {
        self.include_all_versions
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `Name:          <key>[ (Latest Version)][ - Version ID: <id>]`
    pub fn formatted_line(record: &ObjectRecord) -> String {
        let mut line = format!("{NAME_LABEL}{}", record.key());
        if record.is_latest_version() {
            line.push_str(" (Latest Version)");
        }
        if let Some(version_id) = record.version_id() {
            line.push_str(" - Version ID: ");
            line.push_str(version_id);
        }
        line
    }

    pub fn last_modified_line(record: &ObjectRecord) -> String {
        format!(
            "{LAST_MODIFIED_LABEL}{}",
            record.last_modified().format(LAST_MODIFIED_FORMAT)
        )
    }

    pub fn summary_line(&self) -> String {
        let unit = if self.include_all_versions {
            "versions"
        } else {
            "items"
        };
        format!("Found {} {unit} in bucket {}", self.total(), self.bucket)
    }

    pub fn deletion_header_line(&self) -> String {
        format!("Delete {} items in bucket {}", self.total(), self.bucket)
    }

    /// Writes the `ls` rendering: name, modification time and a blank line
    /// per record, then the summary.
    pub fn write_listing<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for record in &self.records {
            writeln!(out, "{}", Self::formatted_line(record))?;
            writeln!(out, "{}", Self::last_modified_line(record))?;
            writeln!(out)?;
        }
        writeln!(out, "{}", self.summary_line())
    }

    /// Writes the `del` preview: one name line per record, then the header.
    pub fn write_deletion_plan<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for record in &self.records {
            writeln!(out, "{}", Self::formatted_line(record))?;
        }
        writeln!(out)?;
        writeln!(out, "{}", self.deletion_header_line())
    }
}

/// Totals of a deletion batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletionSummary {
    pub deleted: u64,
    pub failed: u64,
    pub delete_markers_created: u64,
    pub already_absent: u64,
    first_error: Option<S3cleanerError>,
}

impl DeletionSummary {
    pub fn from_outcomes(outcomes: &[DeletionOutcome]) -> Self {
        let mut summary = DeletionSummary::default();
        for outcome in outcomes {
            if outcome.succeeded {
                summary.deleted += 1;
                if outcome.delete_marker_created {
                    summary.delete_markers_created += 1;
                }
                if outcome.already_absent {
                    summary.already_absent += 1;
                }
            } else {
                summary.failed += 1;
                if summary.first_error.is_none() {
                    summary.first_error = outcome.error.clone();
                }
            }
        }
        summary
    }

    pub fn total(&self) -> u64 {
        self.deleted + self.failed
    }

    pub fn first_error(&self) -> Option<&S3cleanerError> {
        self.first_error.as_ref()
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// `PartialFailure` when any item failed.
    pub fn into_result(self) -> Result<Self> {
        if self.has_failures() {
            return Err(anyhow!(S3cleanerError::PartialFailure {
                deleted: self.deleted,
                failed: self.failed,
            }));
        }
        Ok(self)
    }

    pub fn summary_line(&self, bucket: &str) -> String {
        let mut line = format!(
            "Deleted {} of {} items in bucket {bucket}",
            self.deleted,
            self.total()
        );
        if self.failed > 0 {
            line.push_str(&format!(", {} failed", self.failed));
        }
        if self.delete_markers_created > 0 {
            line.push_str(&format!(
                " ({} delete markers created)",
                self.delete_markers_created
            ));
        }
        line
    }

    /// `Failed:        <key>[ - Version ID: <id>]: <error>`
    pub fn failure_line(outcome: &DeletionOutcome) -> String {
        let mut line = format!("{FAILED_LABEL}{}", outcome.key);
        if let Some(version_id) = &outcome.version_id {
            line.push_str(" - Version ID: ");
            line.push_str(version_id);
        }
        if let Some(error) = &outcome.error {
            line.push_str(&format!(": {error}"));
        }
        line
    }
}
