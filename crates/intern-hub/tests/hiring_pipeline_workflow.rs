//! End-to-end scenarios for the hiring pipeline: round progression, promotion to intern,
//! document verification, and the offer lifecycle, driven through the public service facade
//! and HTTP router.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use intern_hub::config::PipelineConfig;
    use intern_hub::workflows::hiring::{
        guard_subject_update, CandidateRecord, DocumentId, DocumentRecord, HiringRound,
        HiringService, InternRecord, NotificationPublisher, NotifyError, OfferId, OfferRecord,
        PipelineNotice, PipelineRepository, Promotion, RepositoryError, RoundOutcome,
        SessionContext, SessionRole, Subject, SubjectId, SubjectRefresh,
    };
    use intern_hub::workflows::intake::CandidateSubmission;

    #[derive(Default)]
    struct Tables {
        subjects: HashMap<SubjectId, Subject>,
        outcomes: HashMap<(SubjectId, HiringRound), RoundOutcome>,
        documents: HashMap<DocumentId, DocumentRecord>,
        offers: HashMap<OfferId, OfferRecord>,
    }

    #[derive(Default)]
    pub struct SharedRepository {
        tables: Mutex<Tables>,
    }

    impl SharedRepository {
        pub fn outcomes_for(&self, id: &SubjectId) -> usize {
            let tables = self.tables.lock().expect("tables poisoned");
            tables.outcomes.keys().filter(|(owner, _)| owner == id).count()
        }
    }

    impl PipelineRepository for SharedRepository {
        fn insert_candidate(
            &self,
            record: CandidateRecord,
        ) -> Result<CandidateRecord, RepositoryError> {
            let mut tables = self.tables.lock().expect("tables poisoned");
            tables
                .subjects
                .insert(record.id.clone(), Subject::Candidate(record.clone()));
            Ok(record)
        }

        fn update_subject(&self, subject: Subject) -> Result<(), RepositoryError> {
            let mut tables = self.tables.lock().expect("tables poisoned");
            let stored = tables
                .subjects
                .get_mut(subject.id())
                .ok_or(RepositoryError::NotFound)?;
            guard_subject_update(stored, &subject)?;
            *stored = subject;
            Ok(())
        }

        fn fetch_subject(&self, id: &SubjectId) -> Result<Option<Subject>, RepositoryError> {
            Ok(self.tables.lock().expect("tables poisoned").subjects.get(id).cloned())
        }

        fn find_by_email(&self, email: &str) -> Result<Option<Subject>, RepositoryError> {
            let tables = self.tables.lock().expect("tables poisoned");
            Ok(tables
                .subjects
                .values()
                .find(|subject| subject.profile().email == email)
                .cloned())
        }

        fn subjects(&self) -> Result<Vec<Subject>, RepositoryError> {
            let tables = self.tables.lock().expect("tables poisoned");
            Ok(tables.subjects.values().cloned().collect())
        }

        fn outcomes(&self, subject_id: &SubjectId) -> Result<Vec<RoundOutcome>, RepositoryError> {
            let tables = self.tables.lock().expect("tables poisoned");
            Ok(tables
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
            let mut tables = self.tables.lock().expect("tables poisoned");
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

        fn promote_candidate(
            &self,
            promotion: Promotion,
        ) -> Result<InternRecord, RepositoryError> {
            let mut tables = self.tables.lock().expect("tables poisoned");
            tables.subjects.insert(
                promotion.candidate.id.clone(),
                Subject::Candidate(promotion.candidate),
            );
            tables.subjects.insert(
                promotion.intern.id.clone(),
                Subject::Intern(promotion.intern.clone()),
            );
            if let Some(outcome) = promotion.outcome {
                tables
                    .outcomes
                    .insert((outcome.subject_id.clone(), outcome.round), outcome);
            }
            Ok(promotion.intern)
        }

        fn documents(
            &self,
            intern_id: &SubjectId,
        ) -> Result<Vec<DocumentRecord>, RepositoryError> {
            let tables = self.tables.lock().expect("tables poisoned");
            Ok(tables
                .documents
                .values()
                .filter(|document| &document.intern_id == intern_id)
                .cloned()
                .collect())
        }

        fn fetch_document(
            &self,
            id: &DocumentId,
        ) -> Result<Option<DocumentRecord>, RepositoryError> {
            Ok(self.tables.lock().expect("tables poisoned").documents.get(id).cloned())
        }

        fn upsert_document(
            &self,
            document: DocumentRecord,
        ) -> Result<DocumentRecord, RepositoryError> {
            let mut tables = self.tables.lock().expect("tables poisoned");
            tables.documents.insert(document.id.clone(), document.clone());
            Ok(document)
        }

        fn offers(&self, intern_id: &SubjectId) -> Result<Vec<OfferRecord>, RepositoryError> {
            let tables = self.tables.lock().expect("tables poisoned");
            Ok(tables
                .offers
                .values()
                .filter(|offer| &offer.intern_id == intern_id)
                .cloned()
                .collect())
        }

        fn fetch_offer(&self, id: &OfferId) -> Result<Option<OfferRecord>, RepositoryError> {
            Ok(self.tables.lock().expect("tables poisoned").offers.get(id).cloned())
        }

        fn insert_offer(&self, offer: OfferRecord) -> Result<OfferRecord, RepositoryError> {
            let mut tables = self.tables.lock().expect("tables poisoned");
            tables.offers.insert(offer.id.clone(), offer.clone());
            Ok(offer)
        }

        fn update_offer(&self, offer: OfferRecord) -> Result<(), RepositoryError> {
            let mut tables = self.tables.lock().expect("tables poisoned");
            tables.offers.insert(offer.id.clone(), offer);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub notices: Mutex<Vec<PipelineNotice>>,
    }

    impl NotificationPublisher for RecordingNotifier {
        fn publish(&self, notice: PipelineNotice) -> Result<(), NotifyError> {
            self.notices.lock().expect("notices poisoned").push(notice);
            Ok(())
        }
    }

    pub type Service = HiringService<SharedRepository, RecordingNotifier>;

    pub fn service() -> (Service, Arc<SharedRepository>, Arc<RecordingNotifier>) {
        let repository = Arc::new(SharedRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = HiringService::new(
            repository.clone(),
            notifier.clone(),
            PipelineConfig::default(),
        );
        (service, repository, notifier)
    }

    pub fn interviewer() -> SessionContext {
        SessionContext::new("panel@example.com", SessionRole::Interviewer)
    }

    pub fn candidate(email: &str) -> CandidateSubmission {
        CandidateSubmission {
            name: "Nikhil Shah".to_string(),
            email: email.to_string(),
            phone: "+91 98450 12345".to_string(),
            emergency_contact: Some("98450 54321".to_string()),
            college_name: "Lakeside College of Engineering".to_string(),
            branch: "Information Technology".to_string(),
            cgpa: "7.6".to_string(),
            graduation_year: Some(2026),
            address: Some("Bengaluru".to_string()),
        }
    }
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use intern_hub::workflows::hiring::{
    hiring_router, DocumentKind, DocumentUpload, HiringRound, InternStatus, OfferRequest,
    OfferStatus, OfferTerms, OutcomeSubmission, PipelineError, RoundStatus, SignedArtifact,
    Subject, WorkMode, ACTOR_HEADER,
};
use tower::ServiceExt;

use common::*;

#[test]
fn clearing_aptitude_keeps_technical_round_open() {
    let (service, _, _) = service();
    let session = interviewer();
    let record = service
        .register_candidate(&session, candidate("c1@example.com"))
        .expect("registered");

    service
        .submit_outcome(
            &session,
            &record.id,
            OutcomeSubmission::new(HiringRound::AptitudeTest, RoundStatus::Cleared),
        )
        .expect("aptitude cleared");

    assert_eq!(
        service
            .current_round_status(&session, &record.id, HiringRound::AptitudeTest)
            .expect("status"),
        RoundStatus::Cleared
    );
    assert!(!service
        .is_round_locked(&session, &record.id, HiringRound::TechnicalRound1)
        .expect("lock"));
}

#[test]
fn technical_rejection_blocks_the_next_round() {
    let (service, repository, _) = service();
    let session = interviewer();
    let record = service
        .register_candidate(&session, candidate("c2@example.com"))
        .expect("registered");

    service
        .submit_outcome(
            &session,
            &record.id,
            OutcomeSubmission::new(HiringRound::TechnicalRound1, RoundStatus::Rejected)
                .with_feedback("struggled with data structures"),
        )
        .expect("rejection recorded");

    assert!(service
        .is_round_locked(&session, &record.id, HiringRound::TechnicalRound2)
        .expect("lock"));
    let result = service.submit_outcome(
        &session,
        &record.id,
        OutcomeSubmission::new(HiringRound::TechnicalRound2, RoundStatus::Cleared),
    );
    assert!(matches!(result, Err(PipelineError::SequenceViolation { .. })));
    assert_eq!(repository.outcomes_for(&record.id), 1);
}

#[test]
fn full_pipeline_from_candidate_to_onboarding() {
    let (service, repository, notifier) = service();
    let session = interviewer();
    let record = service
        .register_candidate(&session, candidate("c3@example.com"))
        .expect("registered");

    for (round, score) in [
        (HiringRound::AptitudeTest, 78),
        (HiringRound::TechnicalRound1, 81),
        (HiringRound::TechnicalRound2, 85),
        (HiringRound::HrRound, 90),
    ] {
        service
            .submit_outcome(
                &session,
                &record.id,
                OutcomeSubmission::new(round, RoundStatus::Cleared).with_score(score),
            )
            .expect("round cleared");
    }

    let mut selected = OutcomeSubmission::new(HiringRound::Selected, RoundStatus::Cleared);
    selected.join_date = NaiveDate::from_ymd_opt(2026, 7, 15);
    let receipt = service
        .submit_outcome(&session, &record.id, selected)
        .expect("selected");

    let intern = match receipt.subject {
        Subject::Intern(intern) => intern,
        other => panic!("expected intern, got {other:?}"),
    };
    assert_eq!(receipt.promoted_from.as_ref(), Some(&record.id));
    assert_eq!(receipt.outcome.subject_id, intern.id);
    assert_eq!(repository.outcomes_for(&intern.id), 1);
    assert_eq!(repository.outcomes_for(&record.id), 4);
    assert!(service
        .active_candidates(&session)
        .expect("active")
        .is_empty());
    assert!(matches!(
        service.documents(&session, &record.id),
        Err(PipelineError::NotFound { .. })
    ));

    for kind in DocumentKind::required() {
        let document = service
            .upload_document(
                &session,
                &intern.id,
                DocumentUpload {
                    kind,
                    file_name: format!("{}.pdf", kind.label()),
                    storage_key: format!("vault/{}/{:?}", intern.id, kind),
                },
            )
            .expect("uploaded");
        service
            .verify_document(&session, &document.id)
            .expect("verified");
    }

    let offer = service
        .generate_offer(
            &session,
            &intern.id,
            OfferRequest {
                terms: OfferTerms {
                    position: "Data Engineering Intern".to_string(),
                    department: "Analytics".to_string(),
                    stipend: 30_000,
                    duration: "6 months".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2026, 7, 15).expect("date"),
                    location: "Bengaluru".to_string(),
                    reporting_manager: None,
                    work_mode: WorkMode::Onsite,
                },
                draft: false,
            },
        )
        .expect("offer generated");
    service.send_offer(&session, &offer.id).expect("sent");
    let accepted = service
        .accept_offer(
            &session,
            &offer.id,
            SignedArtifact {
                file_name: "signed-offer.pdf".to_string(),
                storage_key: format!("vault/{}/signed-offer.pdf", intern.id),
            },
        )
        .expect("accepted");
    assert_eq!(accepted.status, OfferStatus::Accepted);

    match service.subject(&session, &intern.id).expect("intern") {
        Subject::Intern(intern) => {
            assert_eq!(intern.status, InternStatus::Onboarding);
            assert_eq!(intern.join_date, NaiveDate::from_ymd_opt(2026, 7, 15));
        }
        other => panic!("expected intern, got {other:?}"),
    }

    let templates: Vec<String> = notifier
        .notices
        .lock()
        .expect("notices poisoned")
        .iter()
        .map(|notice| notice.template.clone())
        .collect();
    assert_eq!(
        templates,
        vec!["intern_credentials_issued", "offer_sent", "offer_accepted"]
    );
}

#[tokio::test]
async fn router_exposes_pipeline_view() {
    let (service, _, _) = service();
    let session = interviewer();
    let record = service
        .register_candidate(&session, candidate("c4@example.com"))
        .expect("registered");
    service
        .submit_outcome(
            &session,
            &record.id,
            OutcomeSubmission::new(HiringRound::AptitudeTest, RoundStatus::OnHold),
        )
        .expect("on hold");

    let router = hiring_router(Arc::new(service));
    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/subjects/{}/rounds", record.id))
                .header(ACTOR_HEADER, "panel@example.com")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(payload["stage"]["stage"], "in_progress");
    assert_eq!(payload["stage"]["round"], "Aptitude Test");
    assert_eq!(payload["rounds"][0]["status"], "ON_HOLD");
    assert_eq!(payload["rounds"][0]["locked"], false);
}
