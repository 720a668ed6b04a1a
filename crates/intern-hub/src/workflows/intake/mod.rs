//! Candidate intake: manual entry validation and CSV bulk upload.

mod guard;
mod normalizer;
mod parser;

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::workflows::hiring::domain::SubjectId;

pub use guard::{CandidateSubmission, IntakeGuard, IntakeViolation};
pub use parser::ImportRow;

#[derive(Debug)]
pub enum CandidateImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingColumns(Vec<String>),
}

impl std::fmt::Display for CandidateImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateImportError::Io(err) => write!(f, "failed to read candidate upload: {}", err),
            CandidateImportError::Csv(err) => write!(f, "invalid candidate CSV data: {}", err),
            CandidateImportError::MissingColumns(columns) => write!(
                f,
                "candidate CSV is missing required columns: {}",
                columns.join(", ")
            ),
        }
    }
}

impl std::error::Error for CandidateImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CandidateImportError::Io(err) => Some(err),
            CandidateImportError::Csv(err) => Some(err),
            CandidateImportError::MissingColumns(_) => None,
        }
    }
}

impl From<std::io::Error> for CandidateImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CandidateImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Per-upload accounting; one bad row never aborts the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkImportSummary {
    pub total_rows: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<String>,
    pub imported: Vec<SubjectId>,
}

impl BulkImportSummary {
    pub fn record_success(&mut self, subject_id: Option<SubjectId>) {
        self.total_rows += 1;
        self.success_count += 1;
        if let Some(id) = subject_id {
            self.imported.push(id);
        }
    }

    pub fn record_failure(&mut self, row_number: usize, reason: impl std::fmt::Display) {
        self.total_rows += 1;
        self.failure_count += 1;
        self.errors.push(format!("row {row_number}: {reason}"));
    }
}

pub struct CandidateImporter;

impl CandidateImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        college_name: &str,
    ) -> Result<Vec<ImportRow>, CandidateImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, college_name)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        college_name: &str,
    ) -> Result<Vec<ImportRow>, CandidateImportError> {
        parser::parse_rows(reader, college_name)
    }

    /// Validate rows without persisting anything, flagging repeated e-mails.
    pub fn dry_run(rows: Vec<ImportRow>) -> BulkImportSummary {
        let guard = IntakeGuard;
        let mut summary = BulkImportSummary::default();
        let mut seen = HashSet::new();

        for row in rows {
            let profile = row
                .submission
                .and_then(|submission| {
                    guard
                        .profile_from_submission(submission)
                        .map_err(|violation| violation.to_string())
                });
            match profile {
                Ok(profile) if !seen.insert(profile.email.clone()) => {
                    summary.record_failure(
                        row.row_number,
                        format!("email {} appears more than once", profile.email),
                    );
                }
                Ok(_) => summary.record_success(None),
                Err(reason) => summary.record_failure(row.row_number, reason),
            }
        }

        summary
    }
}
