//! Round progression rules for a single subject.
//!
//! A [`RoundLedger`] is rebuilt from the persisted outcome history on every call, so the
//! lock predicate is always derived and never stored. Planning a submission is pure: the
//! service decides how to persist the resulting [`SubmissionPlan`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    CandidateRecord, HiringRound, OutcomeSubmission, RoundOutcome, RoundStatus, Subject,
    SubjectId,
};
use super::session::SessionContext;

pub const MAX_SCORE: u8 = 100;

/// Reasons a submission is refused before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerViolation {
    #[error("a status must be chosen for {0}")]
    MissingStatus(HiringRound),
    #[error("score {0} is outside 0-100")]
    ScoreOutOfRange(u8),
    #[error("{round} is locked: {rejected_round} was rejected")]
    SequenceViolation {
        round: HiringRound,
        rejected_round: HiringRound,
    },
    #[error("submission is for subject {found}, ledger tracks {expected}")]
    SubjectMismatch { expected: SubjectId, found: SubjectId },
}

/// Where a subject currently stands in the round sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PipelineStage {
    InProgress { round: HiringRound },
    Rejected { round: HiringRound },
    Completed,
}

/// How a validated submission must be persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionPlan {
    /// Overwrite the outcome for the (subject, round) pair.
    Upsert(RoundOutcome),
    /// Convert the candidate and attach the outcome to the new intern, atomically.
    PromoteAndRecord {
        candidate: CandidateRecord,
        outcome: RoundOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundView {
    pub round: HiringRound,
    pub sequence: u8,
    pub status: RoundStatus,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RoundOutcome>,
}

#[derive(Debug, Clone, Default)]
pub struct RoundLedger {
    subject_id: Option<SubjectId>,
    outcomes: BTreeMap<HiringRound, RoundOutcome>,
}

impl RoundLedger {
    pub fn new(subject_id: SubjectId) -> Self {
        Self {
            subject_id: Some(subject_id),
            outcomes: BTreeMap::new(),
        }
    }

    /// Build a ledger from persisted history; the newest write per round wins.
    pub fn from_outcomes(subject_id: SubjectId, history: Vec<RoundOutcome>) -> Self {
        let mut ledger = Self::new(subject_id);
        for outcome in history {
            let newer = ledger
                .outcomes
                .get(&outcome.round)
                .map_or(true, |existing| existing.updated_at <= outcome.updated_at);
            if newer {
                ledger.outcomes.insert(outcome.round, outcome);
            }
        }
        ledger
    }

    pub fn outcome(&self, round: HiringRound) -> Option<&RoundOutcome> {
        self.outcomes.get(&round)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &RoundOutcome> {
        self.outcomes.values()
    }

    pub fn status(&self, round: HiringRound) -> RoundStatus {
        self.outcomes
            .get(&round)
            .map(|outcome| outcome.status)
            .unwrap_or(RoundStatus::Pending)
    }

    pub fn earliest_rejection(&self) -> Option<HiringRound> {
        self.outcomes
            .values()
            .find(|outcome| outcome.status == RoundStatus::Rejected)
            .map(|outcome| outcome.round)
    }

    /// True iff a round with a smaller sequence number was rejected.
    pub fn is_locked(&self, round: HiringRound) -> bool {
        self.blocking_rejection(round).is_some()
    }

    fn blocking_rejection(&self, round: HiringRound) -> Option<HiringRound> {
        self.earliest_rejection()
            .filter(|rejected| rejected.sequence() < round.sequence())
    }

    /// Lowest-sequence round that has not been cleared; `None` once the terminal round
    /// is cleared, since interns carry only that outcome under their own id.
    pub fn current_round(&self) -> Option<HiringRound> {
        if self.status(HiringRound::terminal()) == RoundStatus::Cleared {
            return None;
        }
        HiringRound::ordered()
            .into_iter()
            .find(|round| self.status(*round) != RoundStatus::Cleared)
    }

    pub fn stage(&self) -> PipelineStage {
        if let Some(round) = self.earliest_rejection() {
            return PipelineStage::Rejected { round };
        }
        match self.current_round() {
            Some(round) => PipelineStage::InProgress { round },
            None => PipelineStage::Completed,
        }
    }

    pub fn round_views(&self) -> Vec<RoundView> {
        HiringRound::ordered()
            .into_iter()
            .map(|round| RoundView {
                round,
                sequence: round.sequence(),
                status: self.status(round),
                locked: self.is_locked(round),
                outcome: self.outcomes.get(&round).cloned(),
            })
            .collect()
    }

    /// Validate a submission against the history and decide how it is persisted.
    pub fn plan(
        &self,
        subject: &Subject,
        submission: OutcomeSubmission,
        session: &SessionContext,
        now: DateTime<Utc>,
    ) -> Result<SubmissionPlan, LedgerViolation> {
        if let Some(expected) = &self.subject_id {
            if expected != subject.id() {
                return Err(LedgerViolation::SubjectMismatch {
                    expected: expected.clone(),
                    found: subject.id().clone(),
                });
            }
        }

        let round = submission.round;
        let status = submission
            .status
            .ok_or(LedgerViolation::MissingStatus(round))?;

        if let Some(score) = submission.score {
            if score > MAX_SCORE {
                return Err(LedgerViolation::ScoreOutOfRange(score));
            }
        }

        if let Some(rejected_round) = self.blocking_rejection(round) {
            return Err(LedgerViolation::SequenceViolation {
                round,
                rejected_round,
            });
        }

        let outcome = RoundOutcome {
            subject_id: subject.id().clone(),
            round,
            status,
            feedback: submission.feedback.filter(|text| !text.trim().is_empty()),
            score: submission.score,
            interviewer: submission.interviewer.or_else(|| Some(session.actor.clone())),
            completed_at: status.is_decided().then_some(now),
            recorded_by: session.actor.clone(),
            updated_at: now,
        };

        match subject {
            Subject::Candidate(candidate)
                if round.is_terminal() && status == RoundStatus::Cleared =>
            {
                Ok(SubmissionPlan::PromoteAndRecord {
                    candidate: candidate.clone(),
                    outcome,
                })
            }
            _ => Ok(SubmissionPlan::Upsert(outcome)),
        }
    }

    /// Upsert in place; the previous outcome for the round is replaced wholesale.
    pub fn apply(&mut self, outcome: RoundOutcome) -> Option<RoundOutcome> {
        self.outcomes.insert(outcome.round, outcome)
    }
}
