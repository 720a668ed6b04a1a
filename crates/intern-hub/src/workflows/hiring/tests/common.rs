use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::{OfferGate, PipelineConfig};
use crate::workflows::hiring::domain::{
    CandidateRecord, CandidateStatus, HiringRound, InternRecord, InternStatus, OutcomeSubmission,
    RoundOutcome, RoundStatus, Subject, SubjectId,
};
use crate::workflows::hiring::onboarding::{
    DocumentId, DocumentKind, DocumentRecord, DocumentUpload, OfferId, OfferRecord, OfferRequest,
    OfferTerms, WorkMode,
};
use crate::workflows::hiring::repository::{
    guard_subject_update, NotificationPublisher, NotifyError, PipelineNotice, PipelineRepository,
    Promotion, RepositoryError, SubjectRefresh,
};
use crate::workflows::hiring::service::HiringService;
use crate::workflows::hiring::session::{SessionContext, SessionRole};
use crate::workflows::intake::CandidateSubmission;

pub(super) fn recruiter() -> SessionContext {
    SessionContext::new("recruiter@example.com", SessionRole::Recruiter)
}

pub(super) fn submission(email: &str) -> CandidateSubmission {
    CandidateSubmission {
        name: "Asha Rao".to_string(),
        email: email.to_string(),
        phone: "98765 43210".to_string(),
        emergency_contact: None,
        college_name: "Riverside Institute".to_string(),
        branch: "Computer Science".to_string(),
        cgpa: "8.4".to_string(),
        graduation_year: Some(2026),
        address: None,
    }
}

pub(super) fn offer_terms() -> OfferTerms {
    OfferTerms {
        position: "Software Engineering Intern".to_string(),
        department: "Platform".to_string(),
        stipend: 25_000,
        duration: "6 months".to_string(),
        start_date: NaiveDate::from_ymd_opt(2026, 7, 1).expect("valid date"),
        location: "Pune".to_string(),
        reporting_manager: Some("Kavya Menon".to_string()),
        work_mode: WorkMode::Hybrid,
    }
}

pub(super) fn offer_request(draft: bool) -> OfferRequest {
    OfferRequest {
        terms: offer_terms(),
        draft,
    }
}

pub(super) fn upload(kind: DocumentKind) -> DocumentUpload {
    DocumentUpload {
        kind,
        file_name: format!("{kind:?}.pdf").to_lowercase(),
        storage_key: format!("interns/docs/{kind:?}").to_lowercase(),
    }
}

pub(super) fn build_service() -> (
    HiringService<MemoryRepository, MemoryNotifier>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifier>,
) {
    build_service_with_gate(OfferGate::Strict)
}

pub(super) fn build_service_with_gate(
    offer_gate: OfferGate,
) -> (
    HiringService<MemoryRepository, MemoryNotifier>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = HiringService::new(
        repository.clone(),
        notifier.clone(),
        PipelineConfig { offer_gate },
    );
    (service, repository, notifier)
}

/// Register a candidate and clear every round up to "Selected".
pub(super) fn promote<R, N>(service: &HiringService<R, N>, email: &str) -> InternRecord
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = recruiter();
    let candidate = service
        .register_candidate(&session, submission(email))
        .expect("candidate registered");
    for round in HiringRound::ordered() {
        service
            .submit_outcome(
                &session,
                &candidate.id,
                OutcomeSubmission::new(round, RoundStatus::Cleared),
            )
            .expect("round cleared");
    }
    match service.subject(&session, &candidate.id).expect("candidate present") {
        Subject::Candidate(CandidateRecord {
            converted_to: Some(intern_id),
            ..
        }) => service
            .subject(&session, &intern_id)
            .expect("intern present")
            .as_intern()
            .cloned()
            .expect("intern variant"),
        other => panic!("candidate was not converted: {other:?}"),
    }
}

/// Upload and verify every required document for the intern.
pub(super) fn verify_all_documents<R, N>(service: &HiringService<R, N>, intern_id: &SubjectId)
where
    R: PipelineRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let session = recruiter();
    for kind in DocumentKind::required() {
        let document = service
            .upload_document(&session, intern_id, upload(kind))
            .expect("upload accepted");
        service
            .verify_document(&session, &document.id)
            .expect("document verified");
    }
}

#[derive(Default)]
struct MemoryState {
    subjects: HashMap<SubjectId, Subject>,
    outcomes: HashMap<(SubjectId, HiringRound), RoundOutcome>,
    documents: BTreeMap<DocumentId, DocumentRecord>,
    offers: BTreeMap<OfferId, OfferRecord>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub(super) fn outcome_count(&self, subject_id: &SubjectId) -> usize {
        let guard = self.state.lock().expect("repository mutex poisoned");
        guard
            .outcomes
            .keys()
            .filter(|(id, _)| id == subject_id)
            .count()
    }

    pub(super) fn subject_count(&self) -> usize {
        self.state
            .lock()
            .expect("repository mutex poisoned")
            .subjects
            .len()
    }
}

impl PipelineRepository for MemoryRepository {
    fn insert_candidate(
        &self,
        record: CandidateRecord,
    ) -> Result<CandidateRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        if guard.subjects.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard
            .subjects
            .insert(record.id.clone(), Subject::Candidate(record.clone()));
        Ok(record)
    }

    fn update_subject(&self, subject: Subject) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        let stored = guard
            .subjects
            .get(subject.id())
            .ok_or(RepositoryError::NotFound)?;
        guard_subject_update(stored, &subject)?;
        guard.subjects.insert(subject.id().clone(), subject);
        Ok(())
    }

    fn fetch_subject(&self, id: &SubjectId) -> Result<Option<Subject>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.subjects.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Subject>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .subjects
            .values()
            .find(|subject| subject.profile().email == email)
            .cloned())
    }

    fn subjects(&self) -> Result<Vec<Subject>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.subjects.values().cloned().collect())
    }

    fn outcomes(&self, subject_id: &SubjectId) -> Result<Vec<RoundOutcome>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .outcomes
            .iter()
            .filter(|((id, _), _)| id == subject_id)
            .map(|(_, outcome)| outcome.clone())
            .collect())
    }

    fn upsert_outcome(
        &self,
        outcome: RoundOutcome,
        refresh: SubjectRefresh,
    ) -> Result<RoundOutcome, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        let stored = guard
            .subjects
            .get_mut(&outcome.subject_id)
            .ok_or(RepositoryError::NotFound)?;
        refresh.apply_to(stored)?;
        guard.outcomes.insert(
            (outcome.subject_id.clone(), outcome.round),
            outcome.clone(),
        );
        Ok(outcome)
    }

    fn promote_candidate(&self, promotion: Promotion) -> Result<InternRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        match guard.subjects.get(&promotion.candidate.id) {
            Some(Subject::Candidate(existing)) if existing.converted_to.is_none() => {}
            Some(_) => return Err(RepositoryError::Conflict),
            None => return Err(RepositoryError::NotFound),
        }
        if guard.subjects.contains_key(&promotion.intern.id) {
            return Err(RepositoryError::Conflict);
        }
        let Promotion {
            candidate,
            intern,
            outcome,
        } = promotion;
        guard
            .subjects
            .insert(candidate.id.clone(), Subject::Candidate(candidate));
        guard
            .subjects
            .insert(intern.id.clone(), Subject::Intern(intern.clone()));
        if let Some(outcome) = outcome {
            guard
                .outcomes
                .insert((outcome.subject_id.clone(), outcome.round), outcome);
        }
        Ok(intern)
    }

    fn documents(&self, intern_id: &SubjectId) -> Result<Vec<DocumentRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .documents
            .values()
            .filter(|document| &document.intern_id == intern_id)
            .cloned()
            .collect())
    }

    fn fetch_document(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.documents.get(id).cloned())
    }

    fn upsert_document(
        &self,
        document: DocumentRecord,
    ) -> Result<DocumentRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.documents.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    fn offers(&self, intern_id: &SubjectId) -> Result<Vec<OfferRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .offers
            .values()
            .filter(|offer| &offer.intern_id == intern_id)
            .cloned()
            .collect())
    }

    fn fetch_offer(&self, id: &OfferId) -> Result<Option<OfferRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.offers.get(id).cloned())
    }

    fn insert_offer(&self, offer: OfferRecord) -> Result<OfferRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        if guard.offers.contains_key(&offer.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.offers.insert(offer.id.clone(), offer.clone());
        Ok(offer)
    }

    fn update_offer(&self, offer: OfferRecord) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.offers.insert(offer.id.clone(), offer);
        Ok(())
    }
}

/// Delegates to [`MemoryRepository`] but refuses every promotion.
#[derive(Default, Clone)]
pub(super) struct PromotionFailsRepository {
    pub(super) inner: MemoryRepository,
}

impl PipelineRepository for PromotionFailsRepository {
    fn insert_candidate(
        &self,
        record: CandidateRecord,
    ) -> Result<CandidateRecord, RepositoryError> {
        self.inner.insert_candidate(record)
    }

    fn update_subject(&self, subject: Subject) -> Result<(), RepositoryError> {
        self.inner.update_subject(subject)
    }

    fn fetch_subject(&self, id: &SubjectId) -> Result<Option<Subject>, RepositoryError> {
        self.inner.fetch_subject(id)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Subject>, RepositoryError> {
        self.inner.find_by_email(email)
    }

    fn subjects(&self) -> Result<Vec<Subject>, RepositoryError> {
        self.inner.subjects()
    }

    fn outcomes(&self, subject_id: &SubjectId) -> Result<Vec<RoundOutcome>, RepositoryError> {
        self.inner.outcomes(subject_id)
    }

    fn upsert_outcome(
        &self,
        outcome: RoundOutcome,
        refresh: SubjectRefresh,
    ) -> Result<RoundOutcome, RepositoryError> {
        self.inner.upsert_outcome(outcome, refresh)
    }

    fn promote_candidate(&self, _promotion: Promotion) -> Result<InternRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("intern service timed out".to_string()))
    }

    fn documents(&self, intern_id: &SubjectId) -> Result<Vec<DocumentRecord>, RepositoryError> {
        self.inner.documents(intern_id)
    }

    fn fetch_document(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError> {
        self.inner.fetch_document(id)
    }

    fn upsert_document(
        &self,
        document: DocumentRecord,
    ) -> Result<DocumentRecord, RepositoryError> {
        self.inner.upsert_document(document)
    }

    fn offers(&self, intern_id: &SubjectId) -> Result<Vec<OfferRecord>, RepositoryError> {
        self.inner.offers(intern_id)
    }

    fn fetch_offer(&self, id: &OfferId) -> Result<Option<OfferRecord>, RepositoryError> {
        self.inner.fetch_offer(id)
    }

    fn insert_offer(&self, offer: OfferRecord) -> Result<OfferRecord, RepositoryError> {
        self.inner.insert_offer(offer)
    }

    fn update_offer(&self, offer: OfferRecord) -> Result<(), RepositoryError> {
        self.inner.update_offer(offer)
    }
}

/// Delegates to [`MemoryRepository`], converting one candidate the moment the service
/// reads its outcome history. Simulates a conversion committed by another request.
#[derive(Default)]
pub(super) struct ConcurrentConversionRepository {
    pub(super) inner: MemoryRepository,
    pending: Mutex<Option<SubjectId>>,
}

impl ConcurrentConversionRepository {
    pub(super) fn convert_on_next_read(&self, candidate_id: &SubjectId) {
        *self.pending.lock().expect("pending mutex poisoned") = Some(candidate_id.clone());
    }

    fn convert_elsewhere(&self, candidate_id: &SubjectId) {
        let candidate = self
            .inner
            .fetch_subject(candidate_id)
            .expect("fetch")
            .and_then(|subject| subject.as_candidate().cloned())
            .expect("candidate present");
        let intern = InternRecord {
            id: SubjectId(format!("intern-elsewhere-{}", candidate.id)),
            profile: candidate.profile.clone(),
            position: candidate.position,
            status: InternStatus::DocumentPending,
            join_date: None,
            converted_from: Some(candidate.id.clone()),
        };
        let mut converted = candidate;
        converted.status = CandidateStatus::Selected;
        converted.converted_to = Some(intern.id.clone());
        self.inner
            .promote_candidate(Promotion {
                candidate: converted,
                intern,
                outcome: None,
            })
            .expect("concurrent conversion commits");
    }
}

impl PipelineRepository for ConcurrentConversionRepository {
    fn insert_candidate(
        &self,
        record: CandidateRecord,
    ) -> Result<CandidateRecord, RepositoryError> {
        self.inner.insert_candidate(record)
    }

    fn update_subject(&self, subject: Subject) -> Result<(), RepositoryError> {
        self.inner.update_subject(subject)
    }

    fn fetch_subject(&self, id: &SubjectId) -> Result<Option<Subject>, RepositoryError> {
        self.inner.fetch_subject(id)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Subject>, RepositoryError> {
        self.inner.find_by_email(email)
    }

    fn subjects(&self) -> Result<Vec<Subject>, RepositoryError> {
        self.inner.subjects()
    }

    fn outcomes(&self, subject_id: &SubjectId) -> Result<Vec<RoundOutcome>, RepositoryError> {
        let history = self.inner.outcomes(subject_id)?;
        let due = {
            let mut pending = self.pending.lock().expect("pending mutex poisoned");
            if pending.as_ref() == Some(subject_id) {
                pending.take()
            } else {
                None
            }
        };
        if let Some(candidate_id) = due {
            self.convert_elsewhere(&candidate_id);
        }
        Ok(history)
    }

    fn upsert_outcome(
        &self,
        outcome: RoundOutcome,
        refresh: SubjectRefresh,
    ) -> Result<RoundOutcome, RepositoryError> {
        self.inner.upsert_outcome(outcome, refresh)
    }

    fn promote_candidate(&self, promotion: Promotion) -> Result<InternRecord, RepositoryError> {
        self.inner.promote_candidate(promotion)
    }

    fn documents(&self, intern_id: &SubjectId) -> Result<Vec<DocumentRecord>, RepositoryError> {
        self.inner.documents(intern_id)
    }

    fn fetch_document(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError> {
        self.inner.fetch_document(id)
    }

    fn upsert_document(
        &self,
        document: DocumentRecord,
    ) -> Result<DocumentRecord, RepositoryError> {
        self.inner.upsert_document(document)
    }

    fn offers(&self, intern_id: &SubjectId) -> Result<Vec<OfferRecord>, RepositoryError> {
        self.inner.offers(intern_id)
    }

    fn fetch_offer(&self, id: &OfferId) -> Result<Option<OfferRecord>, RepositoryError> {
        self.inner.fetch_offer(id)
    }

    fn insert_offer(&self, offer: OfferRecord) -> Result<OfferRecord, RepositoryError> {
        self.inner.insert_offer(offer)
    }

    fn update_offer(&self, offer: OfferRecord) -> Result<(), RepositoryError> {
        self.inner.update_offer(offer)
    }
}

pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl PipelineRepository for UnavailableRepository {
    fn insert_candidate(
        &self,
        _record: CandidateRecord,
    ) -> Result<CandidateRecord, RepositoryError> {
        offline()
    }

    fn update_subject(&self, _subject: Subject) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_subject(&self, _id: &SubjectId) -> Result<Option<Subject>, RepositoryError> {
        offline()
    }

    fn find_by_email(&self, _email: &str) -> Result<Option<Subject>, RepositoryError> {
        offline()
    }

    fn subjects(&self) -> Result<Vec<Subject>, RepositoryError> {
        offline()
    }

    fn outcomes(&self, _subject_id: &SubjectId) -> Result<Vec<RoundOutcome>, RepositoryError> {
        offline()
    }

    fn upsert_outcome(
        &self,
        _outcome: RoundOutcome,
        _refresh: SubjectRefresh,
    ) -> Result<RoundOutcome, RepositoryError> {
        offline()
    }

    fn promote_candidate(&self, _promotion: Promotion) -> Result<InternRecord, RepositoryError> {
        offline()
    }

    fn documents(&self, _intern_id: &SubjectId) -> Result<Vec<DocumentRecord>, RepositoryError> {
        offline()
    }

    fn fetch_document(
        &self,
        _id: &DocumentId,
    ) -> Result<Option<DocumentRecord>, RepositoryError> {
        offline()
    }

    fn upsert_document(
        &self,
        _document: DocumentRecord,
    ) -> Result<DocumentRecord, RepositoryError> {
        offline()
    }

    fn offers(&self, _intern_id: &SubjectId) -> Result<Vec<OfferRecord>, RepositoryError> {
        offline()
    }

    fn fetch_offer(&self, _id: &OfferId) -> Result<Option<OfferRecord>, RepositoryError> {
        offline()
    }

    fn insert_offer(&self, _offer: OfferRecord) -> Result<OfferRecord, RepositoryError> {
        offline()
    }

    fn update_offer(&self, _offer: OfferRecord) -> Result<(), RepositoryError> {
        offline()
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    notices: Arc<Mutex<Vec<PipelineNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn notices(&self) -> Vec<PipelineNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn templates(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .map(|notice| notice.template)
            .collect()
    }
}

impl NotificationPublisher for MemoryNotifier {
    fn publish(&self, notice: PipelineNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct BrokenNotifier;

impl NotificationPublisher for BrokenNotifier {
    fn publish(&self, _notice: PipelineNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay refused".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
