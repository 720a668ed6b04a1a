use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    CandidateRecord, CandidateStatus, HiringRound, InternRecord, InternStatus, OutcomeSubmission,
    PipelinePosition, RoundOutcome, RoundStatus, Subject, SubjectId,
};
use super::ledger::{LedgerViolation, PipelineStage, RoundLedger, RoundView, SubmissionPlan};
use super::onboarding::{
    DocumentChecklist, DocumentId, DocumentKind, DocumentRecord, DocumentStatus, DocumentUpload,
    OfferId, OfferRecord, OfferRequest, OfferStatus, OfferTerms, SignedArtifact,
};
use super::repository::{
    NotificationPublisher, PipelineNotice, PipelineRepository, Promotion, RepositoryError,
    SubjectRefresh,
};
use super::session::SessionContext;
use crate::config::{OfferGate, PipelineConfig};
use crate::workflows::intake::{
    BulkImportSummary, CandidateImportError, CandidateImporter, CandidateSubmission, IntakeGuard,
    IntakeViolation,
};

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id(prefix: &str) -> String {
    let id = RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

/// Full read model for one subject's progress through the rounds.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineView {
    pub subject: Subject,
    pub stage: PipelineStage,
    pub current_round: Option<HiringRound>,
    pub rounds: Vec<RoundView>,
}

/// Result of a recorded outcome; `subject` is the intern when the submission promoted.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeReceipt {
    pub subject: Subject,
    pub outcome: RoundOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted_from: Option<SubjectId>,
}

/// Service composing the intake guard, round ledger, repository, and notifications.
pub struct HiringService<R, N> {
    guard: IntakeGuard,
    repository: Arc<R>,
    notifier: Arc<N>,
    config: PipelineConfig,
}

impl<R, N> HiringService<R, N>
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, config: PipelineConfig) -> Self {
        Self {
            guard: IntakeGuard,
            repository,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Admit a single manually entered candidate.
    pub fn register_candidate(
        &self,
        session: &SessionContext,
        submission: CandidateSubmission,
    ) -> Result<CandidateRecord, PipelineError> {
        let profile = self.guard.profile_from_submission(submission)?;
        if self.repository.find_by_email(&profile.email)?.is_some() {
            return Err(PipelineError::Conflict(format!(
                "email {} is already registered",
                profile.email
            )));
        }

        let record = CandidateRecord {
            id: SubjectId(next_id("cand")),
            profile,
            position: PipelinePosition::default(),
            status: CandidateStatus::Applied,
            converted_to: None,
        };

        let stored = self.repository.insert_candidate(record)?;
        info!(candidate = %stored.id, actor = %session.actor, "candidate registered");
        Ok(stored)
    }

    /// Register every valid row of a CSV upload; repository outages abort the batch.
    pub fn import_candidates<Rd: Read>(
        &self,
        session: &SessionContext,
        college_name: &str,
        reader: Rd,
    ) -> Result<BulkImportSummary, PipelineError> {
        let rows = CandidateImporter::from_reader(reader, college_name)?;
        let mut summary = BulkImportSummary::default();

        for row in rows {
            let submission = match row.submission {
                Ok(submission) => submission,
                Err(reason) => {
                    summary.record_failure(row.row_number, reason);
                    continue;
                }
            };

            match self.register_candidate(session, submission) {
                Ok(record) => summary.record_success(Some(record.id)),
                Err(err @ PipelineError::RemoteService(_)) => return Err(err),
                Err(err) => summary.record_failure(row.row_number, err),
            }
        }

        info!(
            college = college_name,
            total = summary.total_rows,
            imported = summary.success_count,
            failed = summary.failure_count,
            "candidate bulk upload processed"
        );
        Ok(summary)
    }

    pub fn subjects(&self, _session: &SessionContext) -> Result<Vec<Subject>, PipelineError> {
        Ok(self.repository.subjects()?)
    }

    /// Candidates still in the hiring funnel; converted records are filtered out.
    pub fn active_candidates(
        &self,
        _session: &SessionContext,
    ) -> Result<Vec<CandidateRecord>, PipelineError> {
        let mut candidates: Vec<CandidateRecord> = self
            .repository
            .subjects()?
            .into_iter()
            .filter_map(|subject| match subject {
                Subject::Candidate(record) if record.is_active() => Some(record),
                _ => None,
            })
            .collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(candidates)
    }

    pub fn subject(
        &self,
        _session: &SessionContext,
        id: &SubjectId,
    ) -> Result<Subject, PipelineError> {
        self.require_subject(id)
    }

    pub fn pipeline(
        &self,
        _session: &SessionContext,
        id: &SubjectId,
    ) -> Result<PipelineView, PipelineError> {
        let subject = self.require_subject(id)?;
        let ledger = self.ledger(id)?;
        Ok(PipelineView {
            subject,
            stage: ledger.stage(),
            current_round: ledger.current_round(),
            rounds: ledger.round_views(),
        })
    }

    pub fn current_round_status(
        &self,
        _session: &SessionContext,
        id: &SubjectId,
        round: HiringRound,
    ) -> Result<RoundStatus, PipelineError> {
        self.require_subject(id)?;
        Ok(self.ledger(id)?.status(round))
    }

    pub fn is_round_locked(
        &self,
        _session: &SessionContext,
        id: &SubjectId,
        round: HiringRound,
    ) -> Result<bool, PipelineError> {
        self.require_subject(id)?;
        Ok(self.ledger(id)?.is_locked(round))
    }

    /// Record a round outcome, promoting the candidate when "Selected" is cleared.
    pub fn submit_outcome(
        &self,
        session: &SessionContext,
        id: &SubjectId,
        submission: OutcomeSubmission,
    ) -> Result<OutcomeReceipt, PipelineError> {
        let subject = self.require_subject(id)?;
        if let Subject::Candidate(candidate) = &subject {
            if let Some(intern_id) = &candidate.converted_to {
                return Err(PipelineError::Validation(format!(
                    "candidate {id} was converted to intern {intern_id}; record outcomes against the intern"
                )));
            }
            if candidate.status == CandidateStatus::Withdrawn {
                return Err(PipelineError::Validation(format!(
                    "candidate {id} has withdrawn from the pipeline"
                )));
            }
        }

        let join_date = submission.join_date;
        let mut ledger = self.ledger(id)?;
        let plan = ledger.plan(&subject, submission, session, Utc::now())?;

        match plan {
            SubmissionPlan::Upsert(outcome) => {
                ledger.apply(outcome.clone());
                let refresh = subject_refresh(&outcome, &ledger);
                let stored = self
                    .repository
                    .upsert_outcome(outcome, refresh)
                    .map_err(|err| match err {
                        RepositoryError::Conflict => PipelineError::Conflict(format!(
                            "{} {id} changed while the outcome was being recorded",
                            subject.kind_label()
                        )),
                        other => other.into(),
                    })?;
                let subject = self.require_subject(id)?;
                info!(
                    subject = %stored.subject_id,
                    round = %stored.round,
                    status = stored.status.label(),
                    actor = %session.actor,
                    "round outcome recorded"
                );
                Ok(OutcomeReceipt {
                    subject,
                    outcome: stored,
                    promoted_from: None,
                })
            }
            SubmissionPlan::PromoteAndRecord { candidate, outcome } => {
                let candidate_id = candidate.id.clone();
                let (intern, outcome) = self.promote(session, candidate, join_date, outcome)?;
                Ok(OutcomeReceipt {
                    subject: Subject::Intern(intern),
                    outcome,
                    promoted_from: Some(candidate_id),
                })
            }
        }
    }

    /// Take a candidate out of the funnel; the record and its round history stay readable.
    pub fn withdraw_candidate(
        &self,
        session: &SessionContext,
        candidate_id: &SubjectId,
    ) -> Result<CandidateRecord, PipelineError> {
        let mut candidate = match self.require_subject(candidate_id)? {
            Subject::Candidate(candidate) => candidate,
            Subject::Intern(_) => {
                return Err(PipelineError::Validation(format!(
                    "subject {candidate_id} is an intern and cannot be withdrawn"
                )))
            }
        };
        if let Some(intern_id) = &candidate.converted_to {
            return Err(PipelineError::Validation(format!(
                "candidate {candidate_id} was already converted to intern {intern_id}"
            )));
        }
        if candidate.status == CandidateStatus::Withdrawn {
            return Ok(candidate);
        }

        candidate.status = CandidateStatus::Withdrawn;
        self.repository
            .update_subject(Subject::Candidate(candidate.clone()))
            .map_err(|err| match err {
                RepositoryError::Conflict => PipelineError::Conflict(format!(
                    "candidate {candidate_id} was converted before the withdrawal was saved"
                )),
                other => other.into(),
            })?;
        info!(candidate = %candidate_id, actor = %session.actor, "candidate withdrawn");
        Ok(candidate)
    }

    /// Convert a candidate directly; equivalent to clearing the "Selected" round.
    pub fn convert_to_intern(
        &self,
        session: &SessionContext,
        candidate_id: &SubjectId,
        join_date: Option<NaiveDate>,
    ) -> Result<InternRecord, PipelineError> {
        match self.require_subject(candidate_id)? {
            Subject::Intern(_) => Err(PipelineError::Validation(format!(
                "subject {candidate_id} is already an intern"
            ))),
            Subject::Candidate(_) => {
                let mut submission =
                    OutcomeSubmission::new(HiringRound::terminal(), RoundStatus::Cleared);
                submission.join_date = join_date;
                let receipt = self.submit_outcome(session, candidate_id, submission)?;
                match receipt.subject {
                    Subject::Intern(intern) => Ok(intern),
                    Subject::Candidate(_) => Err(PipelineError::Validation(format!(
                        "candidate {candidate_id} could not be converted"
                    ))),
                }
            }
        }
    }

    fn promote(
        &self,
        session: &SessionContext,
        mut candidate: CandidateRecord,
        join_date: Option<NaiveDate>,
        mut outcome: RoundOutcome,
    ) -> Result<(InternRecord, RoundOutcome), PipelineError> {
        let intern_id = SubjectId(next_id("intern"));
        outcome.subject_id = intern_id.clone();
        let position = PipelinePosition::from_outcome(&outcome);

        let intern = InternRecord {
            id: intern_id.clone(),
            profile: candidate.profile.clone(),
            position,
            status: InternStatus::DocumentPending,
            join_date,
            converted_from: Some(candidate.id.clone()),
        };

        let candidate_id = candidate.id.clone();
        candidate.status = CandidateStatus::Selected;
        candidate.position = position;
        candidate.converted_to = Some(intern_id.clone());

        let intern = self
            .repository
            .promote_candidate(Promotion {
                candidate,
                intern,
                outcome: Some(outcome.clone()),
            })
            .map_err(|source| PipelineError::ConversionFailure {
                candidate_id: candidate_id.clone(),
                source,
            })?;

        info!(
            candidate = %candidate_id,
            intern = %intern.id,
            actor = %session.actor,
            "candidate promoted to intern"
        );
        self.notify(
            PipelineNotice::new("intern_credentials_issued", intern.id.clone())
                .detail("email", intern.profile.email.clone())
                .detail("candidate_id", candidate_id.0),
        );

        Ok((intern, outcome))
    }

    pub fn documents(
        &self,
        _session: &SessionContext,
        intern_id: &SubjectId,
    ) -> Result<Vec<DocumentRecord>, PipelineError> {
        self.require_intern(intern_id)?;
        Ok(self.repository.documents(intern_id)?)
    }

    pub fn document_checklist(
        &self,
        _session: &SessionContext,
        intern_id: &SubjectId,
    ) -> Result<DocumentChecklist, PipelineError> {
        self.require_intern(intern_id)?;
        self.checklist(intern_id)
    }

    /// Store upload metadata; re-uploading a kind replaces it and resets review.
    pub fn upload_document(
        &self,
        session: &SessionContext,
        intern_id: &SubjectId,
        upload: DocumentUpload,
    ) -> Result<DocumentRecord, PipelineError> {
        let intern = self.require_intern(intern_id)?;
        if upload.file_name.trim().is_empty() || upload.storage_key.trim().is_empty() {
            return Err(PipelineError::Validation(
                "document upload needs a file name and storage key".to_string(),
            ));
        }

        let existing = self
            .repository
            .documents(intern_id)?
            .into_iter()
            .find(|document| document.kind == upload.kind);

        let document = DocumentRecord {
            id: existing
                .map(|document| document.id)
                .unwrap_or_else(|| DocumentId(next_id("doc"))),
            intern_id: intern_id.clone(),
            kind: upload.kind,
            file_name: upload.file_name,
            storage_key: upload.storage_key,
            status: DocumentStatus::Pending,
            rejection_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            uploaded_at: Utc::now(),
        };
        let stored = self.repository.upsert_document(document)?;

        if matches!(
            intern.status,
            InternStatus::DocumentPending | InternStatus::DocumentVerified
        ) {
            self.set_intern_status(intern, InternStatus::DocumentVerification)?;
        }

        info!(
            intern = %intern_id,
            document = %stored.id,
            kind = stored.kind.label(),
            actor = %session.actor,
            "document uploaded"
        );
        Ok(stored)
    }

    pub fn verify_document(
        &self,
        session: &SessionContext,
        document_id: &DocumentId,
    ) -> Result<DocumentRecord, PipelineError> {
        let mut document = self.require_document(document_id)?;
        document.status = DocumentStatus::Verified;
        document.rejection_reason = None;
        document.reviewed_by = Some(session.actor.clone());
        document.reviewed_at = Some(Utc::now());
        let stored = self.repository.upsert_document(document)?;

        let intern = self.require_intern(&stored.intern_id)?;
        if matches!(
            intern.status,
            InternStatus::DocumentPending | InternStatus::DocumentVerification
        ) && self.checklist(&stored.intern_id)?.is_complete()
        {
            self.set_intern_status(intern, InternStatus::DocumentVerified)?;
        }

        info!(document = %stored.id, actor = %session.actor, "document verified");
        Ok(stored)
    }

    pub fn reject_document(
        &self,
        session: &SessionContext,
        document_id: &DocumentId,
        reason: &str,
    ) -> Result<DocumentRecord, PipelineError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(PipelineError::Validation(
                "a rejection reason is required".to_string(),
            ));
        }

        let mut document = self.require_document(document_id)?;
        document.status = DocumentStatus::Rejected;
        document.rejection_reason = Some(reason.to_string());
        document.reviewed_by = Some(session.actor.clone());
        document.reviewed_at = Some(Utc::now());
        let stored = self.repository.upsert_document(document)?;

        let intern = self.require_intern(&stored.intern_id)?;
        if intern.status == InternStatus::DocumentVerified {
            self.set_intern_status(intern, InternStatus::DocumentVerification)?;
        }

        info!(document = %stored.id, actor = %session.actor, reason, "document rejected");
        Ok(stored)
    }

    pub fn offers(
        &self,
        _session: &SessionContext,
        intern_id: &SubjectId,
    ) -> Result<Vec<OfferRecord>, PipelineError> {
        self.require_intern(intern_id)?;
        Ok(self.repository.offers(intern_id)?)
    }

    /// Create an offer, or a draft when requested; drafts skip the document gate.
    pub fn generate_offer(
        &self,
        session: &SessionContext,
        intern_id: &SubjectId,
        request: OfferRequest,
    ) -> Result<OfferRecord, PipelineError> {
        let intern = self.require_intern(intern_id)?;
        validate_terms(&request.terms)?;

        if let Some(active) = self
            .repository
            .offers(intern_id)?
            .into_iter()
            .find(|offer| offer.status.is_active())
        {
            return Err(PipelineError::ActiveOfferExists {
                intern_id: intern_id.clone(),
                offer_id: active.id,
            });
        }

        let status = if request.draft {
            OfferStatus::Draft
        } else {
            self.enforce_document_gate(intern_id)?;
            OfferStatus::Generated
        };

        let offer = OfferRecord {
            id: OfferId(next_id("offer")),
            intern_id: intern_id.clone(),
            terms: request.terms,
            status,
            generated_by: session.actor.clone(),
            signed_artifact: None,
            created_at: Utc::now(),
            sent_at: None,
            responded_at: None,
        };
        let stored = self.repository.insert_offer(offer)?;

        if status == OfferStatus::Generated {
            self.set_intern_status(intern, InternStatus::OfferGenerated)?;
        }

        info!(
            intern = %intern_id,
            offer = %stored.id,
            status = %stored.status,
            actor = %session.actor,
            "offer created"
        );
        Ok(stored)
    }

    pub fn finalize_offer(
        &self,
        session: &SessionContext,
        offer_id: &OfferId,
    ) -> Result<OfferRecord, PipelineError> {
        let offer = self.require_offer(offer_id)?;
        ensure_transition(&offer, OfferStatus::Generated)?;
        self.enforce_document_gate(&offer.intern_id)?;

        let offer = self.transition(session, offer, OfferStatus::Generated)?;
        let intern = self.require_intern(&offer.intern_id)?;
        self.set_intern_status(intern, InternStatus::OfferGenerated)?;
        Ok(offer)
    }

    pub fn send_offer(
        &self,
        session: &SessionContext,
        offer_id: &OfferId,
    ) -> Result<OfferRecord, PipelineError> {
        let mut offer = self.require_offer(offer_id)?;
        ensure_transition(&offer, OfferStatus::Sent)?;
        offer.sent_at = Some(Utc::now());
        let offer = self.transition(session, offer, OfferStatus::Sent)?;

        self.notify(
            PipelineNotice::new("offer_sent", offer.intern_id.clone())
                .detail("offer_id", offer.id.0.clone())
                .detail("position", offer.terms.position.clone()),
        );
        Ok(offer)
    }

    /// Accept an offer; a signed copy of the letter must accompany the call.
    pub fn accept_offer(
        &self,
        session: &SessionContext,
        offer_id: &OfferId,
        artifact: SignedArtifact,
    ) -> Result<OfferRecord, PipelineError> {
        if !artifact.is_supplied() {
            return Err(PipelineError::Validation(
                "a signed offer letter is required to accept".to_string(),
            ));
        }

        let mut offer = self.require_offer(offer_id)?;
        ensure_transition(&offer, OfferStatus::Accepted)?;
        offer.signed_artifact = Some(artifact);
        offer.responded_at = Some(Utc::now());
        let offer = self.transition(session, offer, OfferStatus::Accepted)?;

        let intern = self.require_intern(&offer.intern_id)?;
        self.set_intern_status(intern, InternStatus::Onboarding)?;
        self.notify(
            PipelineNotice::new("offer_accepted", offer.intern_id.clone())
                .detail("offer_id", offer.id.0.clone()),
        );
        Ok(offer)
    }

    pub fn reject_offer(
        &self,
        session: &SessionContext,
        offer_id: &OfferId,
    ) -> Result<OfferRecord, PipelineError> {
        let mut offer = self.require_offer(offer_id)?;
        ensure_transition(&offer, OfferStatus::Rejected)?;
        offer.responded_at = Some(Utc::now());
        self.transition(session, offer, OfferStatus::Rejected)
    }

    fn transition(
        &self,
        session: &SessionContext,
        mut offer: OfferRecord,
        next: OfferStatus,
    ) -> Result<OfferRecord, PipelineError> {
        let previous = offer.status;
        offer.status = next;
        self.repository.update_offer(offer.clone())?;
        info!(
            offer = %offer.id,
            from = %previous,
            to = %next,
            actor = %session.actor,
            "offer status changed"
        );
        Ok(offer)
    }

    fn enforce_document_gate(&self, intern_id: &SubjectId) -> Result<(), PipelineError> {
        let checklist = self.checklist(intern_id)?;
        if checklist.is_complete() {
            return Ok(());
        }

        let outstanding = checklist.outstanding();
        match self.config.offer_gate {
            OfferGate::Strict => Err(PipelineError::DocumentsIncomplete {
                intern_id: intern_id.clone(),
                outstanding,
            }),
            OfferGate::Advisory => {
                warn!(
                    intern = %intern_id,
                    outstanding = ?outstanding,
                    "generating offer before all documents are verified"
                );
                Ok(())
            }
        }
    }

    fn checklist(&self, intern_id: &SubjectId) -> Result<DocumentChecklist, PipelineError> {
        let documents = self.repository.documents(intern_id)?;
        Ok(DocumentChecklist::from_documents(&documents))
    }

    fn ledger(&self, id: &SubjectId) -> Result<RoundLedger, PipelineError> {
        let history = self.repository.outcomes(id)?;
        Ok(RoundLedger::from_outcomes(id.clone(), history))
    }

    fn require_subject(&self, id: &SubjectId) -> Result<Subject, PipelineError> {
        self.repository
            .fetch_subject(id)?
            .ok_or_else(|| PipelineError::not_found("subject", &id.0))
    }

    /// Candidate ids, converted or not, never resolve to an intern.
    fn require_intern(&self, id: &SubjectId) -> Result<InternRecord, PipelineError> {
        match self.repository.fetch_subject(id)? {
            Some(Subject::Intern(intern)) => Ok(intern),
            _ => Err(PipelineError::not_found("intern", &id.0)),
        }
    }

    fn require_document(&self, id: &DocumentId) -> Result<DocumentRecord, PipelineError> {
        self.repository
            .fetch_document(id)?
            .ok_or_else(|| PipelineError::not_found("document", &id.0))
    }

    fn require_offer(&self, id: &OfferId) -> Result<OfferRecord, PipelineError> {
        self.repository
            .fetch_offer(id)?
            .ok_or_else(|| PipelineError::not_found("offer", &id.0))
    }

    fn set_intern_status(
        &self,
        mut intern: InternRecord,
        status: InternStatus,
    ) -> Result<(), PipelineError> {
        if intern.status == status {
            return Ok(());
        }
        info!(
            intern = %intern.id,
            from = intern.status.label(),
            to = status.label(),
            "intern status changed"
        );
        intern.status = status;
        self.repository.update_subject(Subject::Intern(intern))?;
        Ok(())
    }

    /// Side effects run after the state change is committed, so failures are only logged.
    fn notify(&self, notice: PipelineNotice) {
        let template = notice.template.clone();
        if let Err(err) = self.notifier.publish(notice) {
            warn!(template = %template, error = %err, "notification dispatch failed");
        }
    }
}

fn subject_refresh(outcome: &RoundOutcome, ledger: &RoundLedger) -> SubjectRefresh {
    let candidate_status = if ledger.earliest_rejection().is_some() {
        CandidateStatus::Rejected
    } else {
        CandidateStatus::Interviewing
    };
    SubjectRefresh {
        position: PipelinePosition::from_outcome(outcome),
        candidate_status: Some(candidate_status),
    }
}

fn ensure_transition(offer: &OfferRecord, next: OfferStatus) -> Result<(), PipelineError> {
    if offer.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(PipelineError::InvalidTransition {
            offer_id: offer.id.clone(),
            from: offer.status,
            to: next,
        })
    }
}

fn validate_terms(terms: &OfferTerms) -> Result<(), PipelineError> {
    let required = [
        ("position", &terms.position),
        ("department", &terms.department),
        ("duration", &terms.duration),
        ("location", &terms.location),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(PipelineError::Validation(format!("offer {field} is required")));
        }
    }
    Ok(())
}

/// Error raised by the hiring service.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("sequence violation: {round} is locked because {rejected_round} was rejected")]
    SequenceViolation {
        round: HiringRound,
        rejected_round: HiringRound,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("conversion of candidate {candidate_id} failed: {source}")]
    ConversionFailure {
        candidate_id: SubjectId,
        #[source]
        source: RepositoryError,
    },
    #[error("offer {offer_id} cannot move from {from} to {to}")]
    InvalidTransition {
        offer_id: OfferId,
        from: OfferStatus,
        to: OfferStatus,
    },
    #[error("intern {intern_id} has unverified documents: {outstanding:?}")]
    DocumentsIncomplete {
        intern_id: SubjectId,
        outstanding: Vec<DocumentKind>,
    },
    #[error("intern {intern_id} already holds active offer {offer_id}")]
    ActiveOfferExists {
        intern_id: SubjectId,
        offer_id: OfferId,
    },
    #[error(transparent)]
    Import(#[from] CandidateImportError),
    #[error("remote service error: {0}")]
    RemoteService(#[source] RepositoryError),
}

impl PipelineError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Conflicts and missing rows keep their meaning; only outages are remote failures.
impl From<RepositoryError> for PipelineError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict => Self::Conflict("record already exists".to_string()),
            RepositoryError::NotFound => Self::not_found("record", "referenced by the request"),
            RepositoryError::Unavailable(_) => Self::RemoteService(value),
        }
    }
}

impl From<LedgerViolation> for PipelineError {
    fn from(value: LedgerViolation) -> Self {
        match value {
            LedgerViolation::SequenceViolation {
                round,
                rejected_round,
            } => Self::SequenceViolation {
                round,
                rejected_round,
            },
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<IntakeViolation> for PipelineError {
    fn from(value: IntakeViolation) -> Self {
        Self::Validation(value.to_string())
    }
}
