use chrono::NaiveDate;
use intern_hub::workflows::hiring::{
    guard_subject_update, CandidateRecord, DocumentId, DocumentRecord, HiringRound, InternRecord,
    NotificationPublisher, NotifyError, OfferId, OfferRecord, PipelineNotice, PipelineRepository,
    Promotion, RepositoryError, RoundOutcome, Subject, SubjectId, SubjectRefresh,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct PipelineTables {
    subjects: BTreeMap<SubjectId, Subject>,
    outcomes: HashMap<(SubjectId, HiringRound), RoundOutcome>,
    documents: BTreeMap<DocumentId, DocumentRecord>,
    offers: BTreeMap<OfferId, OfferRecord>,
}

/// Process-local store; every write happens under one lock so promotions are atomic.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPipelineRepository {
    tables: Arc<Mutex<PipelineTables>>,
}

impl InMemoryPipelineRepository {
    fn lock(&self) -> Result<MutexGuard<'_, PipelineTables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl PipelineRepository for InMemoryPipelineRepository {
    fn insert_candidate(
        &self,
        record: CandidateRecord,
    ) -> Result<CandidateRecord, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.subjects.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .subjects
            .insert(record.id.clone(), Subject::Candidate(record.clone()));
        Ok(record)
    }

    fn update_subject(&self, subject: Subject) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let existing = tables
            .subjects
            .get_mut(subject.id())
            .ok_or(RepositoryError::NotFound)?;
        guard_subject_update(existing, &subject)?;
        *existing = subject;
        Ok(())
    }

    fn fetch_subject(&self, id: &SubjectId) -> Result<Option<Subject>, RepositoryError> {
        Ok(self.lock()?.subjects.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Subject>, RepositoryError> {
        Ok(self
            .lock()?
            .subjects
            .values()
            .find(|subject| subject.profile().email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn subjects(&self) -> Result<Vec<Subject>, RepositoryError> {
        Ok(self.lock()?.subjects.values().cloned().collect())
    }

    fn outcomes(&self, subject_id: &SubjectId) -> Result<Vec<RoundOutcome>, RepositoryError> {
        Ok(self
            .lock()?
            .outcomes
            .values()
            .filter(|outcome| &outcome.subject_id == subject_id)
            .cloned()
            .collect())
    }

    fn upsert_outcome(
        &self,
        outcome: RoundOutcome,
        refresh: SubjectRefresh,
    ) -> Result<RoundOutcome, RepositoryError> {
        let mut tables = self.lock()?;
        let stored = tables
            .subjects
            .get_mut(&outcome.subject_id)
            .ok_or(RepositoryError::NotFound)?;
        refresh.apply_to(stored)?;
        tables
            .outcomes
            .insert((outcome.subject_id.clone(), outcome.round), outcome.clone());
        Ok(outcome)
    }

    fn promote_candidate(&self, promotion: Promotion) -> Result<InternRecord, RepositoryError> {
        let mut tables = self.lock()?;
        match tables.subjects.get(&promotion.candidate.id) {
            Some(Subject::Candidate(existing)) if existing.converted_to.is_none() => {}
            Some(_) => return Err(RepositoryError::Conflict),
            None => return Err(RepositoryError::NotFound),
        }
        if tables.subjects.contains_key(&promotion.intern.id) {
            return Err(RepositoryError::Conflict);
        }

        let Promotion {
            candidate,
            intern,
            outcome,
        } = promotion;
        tables
            .subjects
            .insert(candidate.id.clone(), Subject::Candidate(candidate));
        tables
            .subjects
            .insert(intern.id.clone(), Subject::Intern(intern.clone()));
        if let Some(outcome) = outcome {
            tables
                .outcomes
                .insert((outcome.subject_id.clone(), outcome.round), outcome);
        }
        Ok(intern)
    }

    fn documents(&self, intern_id: &SubjectId) -> Result<Vec<DocumentRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .documents
            .values()
            .filter(|document| &document.intern_id == intern_id)
            .cloned()
            .collect())
    }

    fn fetch_document(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError> {
        Ok(self.lock()?.documents.get(id).cloned())
    }

    fn upsert_document(
        &self,
        document: DocumentRecord,
    ) -> Result<DocumentRecord, RepositoryError> {
        self.lock()?
            .documents
            .insert(document.id.clone(), document.clone());
        Ok(document)
    }

    fn offers(&self, intern_id: &SubjectId) -> Result<Vec<OfferRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .offers
            .values()
            .filter(|offer| &offer.intern_id == intern_id)
            .cloned()
            .collect())
    }

    fn fetch_offer(&self, id: &OfferId) -> Result<Option<OfferRecord>, RepositoryError> {
        Ok(self.lock()?.offers.get(id).cloned())
    }

    fn insert_offer(&self, offer: OfferRecord) -> Result<OfferRecord, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.offers.contains_key(&offer.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.offers.insert(offer.id.clone(), offer.clone());
        Ok(offer)
    }

    fn update_offer(&self, offer: OfferRecord) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        match tables.offers.get_mut(&offer.id) {
            Some(existing) => {
                *existing = offer;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

/// Records notices and logs them; credential and e-mail delivery live elsewhere.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotifier {
    notices: Arc<Mutex<Vec<PipelineNotice>>>,
}

impl NotificationPublisher for InMemoryNotifier {
    fn publish(&self, notice: PipelineNotice) -> Result<(), NotifyError> {
        info!(
            template = %notice.template,
            subject = %notice.subject_id,
            "pipeline notice queued"
        );
        let mut guard = self
            .notices
            .lock()
            .map_err(|_| NotifyError::Transport("notifier mutex poisoned".to_string()))?;
        guard.push(notice);
        Ok(())
    }
}

impl InMemoryNotifier {
    pub(crate) fn notices(&self) -> Vec<PipelineNotice> {
        self.notices
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
