use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    CandidateRecord, CandidateStatus, InternRecord, PipelinePosition, RoundOutcome, Subject,
    SubjectId,
};
use super::onboarding::{DocumentId, DocumentRecord, OfferId, OfferRecord};

/// Candidate-to-intern conversion handed to the repository as one unit.
///
/// Implementations must persist all three effects or none of them: the intern insert,
/// the candidate's `converted_to` link, and the optional outcome on the intern id.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub candidate: CandidateRecord,
    pub intern: InternRecord,
    pub outcome: Option<RoundOutcome>,
}

/// Subject fields an outcome write refreshes; every other field keeps its stored value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubjectRefresh {
    pub position: PipelinePosition,
    /// Only applied when the stored subject is a candidate.
    pub candidate_status: Option<CandidateStatus>,
}

impl SubjectRefresh {
    /// Apply onto the stored record. Converted or withdrawn candidates refuse the write
    /// with [`RepositoryError::Conflict`].
    pub fn apply_to(&self, stored: &mut Subject) -> Result<(), RepositoryError> {
        if let Subject::Candidate(candidate) = &mut *stored {
            if candidate.converted_to.is_some() || candidate.status == CandidateStatus::Withdrawn {
                return Err(RepositoryError::Conflict);
            }
            if let Some(status) = self.candidate_status {
                candidate.status = status;
            }
        }
        *stored.position_mut() = self.position;
        Ok(())
    }
}

/// Refuse replacing a converted candidate with a record that lost its `converted_to` link.
pub fn guard_subject_update(stored: &Subject, incoming: &Subject) -> Result<(), RepositoryError> {
    match (stored, incoming) {
        (Subject::Candidate(stored), Subject::Candidate(incoming))
            if stored.converted_to.is_some() && incoming.converted_to != stored.converted_to =>
        {
            Err(RepositoryError::Conflict)
        }
        (Subject::Candidate(_), Subject::Intern(_)) | (Subject::Intern(_), Subject::Candidate(_)) => {
            Err(RepositoryError::Conflict)
        }
        _ => Ok(()),
    }
}

/// Persistence boundary for the hiring pipeline.
pub trait PipelineRepository: Send + Sync {
    fn insert_candidate(&self, record: CandidateRecord)
        -> Result<CandidateRecord, RepositoryError>;
    /// Replace a stored subject; implementations run [`guard_subject_update`] first.
    fn update_subject(&self, subject: Subject) -> Result<(), RepositoryError>;
    fn fetch_subject(&self, id: &SubjectId) -> Result<Option<Subject>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<Subject>, RepositoryError>;
    fn subjects(&self) -> Result<Vec<Subject>, RepositoryError>;

    fn outcomes(&self, subject_id: &SubjectId) -> Result<Vec<RoundOutcome>, RepositoryError>;
    /// Replace any outcome stored for the same (subject, round) pair and apply `refresh`
    /// to the stored subject in the same write. A refused refresh stores nothing.
    fn upsert_outcome(
        &self,
        outcome: RoundOutcome,
        refresh: SubjectRefresh,
    ) -> Result<RoundOutcome, RepositoryError>;
    fn promote_candidate(&self, promotion: Promotion) -> Result<InternRecord, RepositoryError>;

    fn documents(&self, intern_id: &SubjectId) -> Result<Vec<DocumentRecord>, RepositoryError>;
    fn fetch_document(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError>;
    fn upsert_document(&self, document: DocumentRecord)
        -> Result<DocumentRecord, RepositoryError>;

    fn offers(&self, intern_id: &SubjectId) -> Result<Vec<OfferRecord>, RepositoryError>;
    fn fetch_offer(&self, id: &OfferId) -> Result<Option<OfferRecord>, RepositoryError>;
    fn insert_offer(&self, offer: OfferRecord) -> Result<OfferRecord, RepositoryError>;
    fn update_offer(&self, offer: OfferRecord) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for side effects owned by other systems (credentials, e-mail).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notice: PipelineNotice) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineNotice {
    pub template: String,
    pub subject_id: SubjectId,
    pub details: BTreeMap<String, String>,
}

impl PipelineNotice {
    pub fn new(template: &str, subject_id: SubjectId) -> Self {
        Self {
            template: template.to_string(),
            subject_id,
            details: BTreeMap::new(),
        }
    }

    pub fn detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
