//! Hiring pipeline: round progression, candidate promotion, documents, and offers.

pub mod domain;
pub mod ledger;
pub mod onboarding;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use domain::{
    CandidateRecord, CandidateStatus, HiringRound, InternRecord, InternStatus, OutcomeSubmission,
    PipelinePosition, RoundOutcome, RoundStatus, Subject, SubjectId, SubjectProfile, UnknownRound,
};
pub use ledger::{LedgerViolation, PipelineStage, RoundLedger, RoundView, SubmissionPlan};
pub use onboarding::{
    DocumentChecklist, DocumentId, DocumentKind, DocumentRecord, DocumentStatus, DocumentUpload,
    OfferId, OfferRecord, OfferRequest, OfferStatus, OfferTerms, SignedArtifact, WorkMode,
};
pub use repository::{
    guard_subject_update, NotificationPublisher, NotifyError, PipelineNotice, PipelineRepository,
    Promotion, RepositoryError, SubjectRefresh,
};
pub use router::{hiring_router, ACTOR_HEADER, ROLE_HEADER};
pub use service::{HiringService, OutcomeReceipt, PipelineError, PipelineView};
pub use session::{SessionContext, SessionRole};
