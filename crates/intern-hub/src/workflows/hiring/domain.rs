use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier wrapper shared by candidates and interns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed, totally ordered set of hiring rounds.
///
/// Serialized as the display label; deserialized through [`FromStr`], so request bodies
/// accept the same spellings as path segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum HiringRound {
    #[serde(rename = "Aptitude Test")]
    AptitudeTest,
    #[serde(rename = "Technical Round 1")]
    TechnicalRound1,
    #[serde(rename = "Technical Round 2")]
    TechnicalRound2,
    #[serde(rename = "HR Round")]
    HrRound,
    #[serde(rename = "Selected")]
    Selected,
}

impl HiringRound {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::AptitudeTest,
            Self::TechnicalRound1,
            Self::TechnicalRound2,
            Self::HrRound,
            Self::Selected,
        ]
    }

    pub const fn sequence(self) -> u8 {
        match self {
            Self::AptitudeTest => 1,
            Self::TechnicalRound1 => 2,
            Self::TechnicalRound2 => 3,
            Self::HrRound => 4,
            Self::Selected => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AptitudeTest => "Aptitude Test",
            Self::TechnicalRound1 => "Technical Round 1",
            Self::TechnicalRound2 => "Technical Round 2",
            Self::HrRound => "HR Round",
            Self::Selected => "Selected",
        }
    }

    const fn key(self) -> &'static str {
        match self {
            Self::AptitudeTest => "aptitude_test",
            Self::TechnicalRound1 => "technical_round_1",
            Self::TechnicalRound2 => "technical_round_2",
            Self::HrRound => "hr_round",
            Self::Selected => "selected",
        }
    }

    /// The round whose clearance turns a candidate into an intern.
    pub const fn terminal() -> Self {
        Self::Selected
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Selected)
    }
}

impl fmt::Display for HiringRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hiring round '{0}'")]
pub struct UnknownRound(pub String);

impl FromStr for HiringRound {
    type Err = UnknownRound;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ordered()
            .into_iter()
            .find(|round| {
                round.label().eq_ignore_ascii_case(trimmed) || round.key() == trimmed
            })
            .ok_or_else(|| UnknownRound(trimmed.to_string()))
    }
}

impl<'de> Deserialize<'de> for HiringRound {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Status recorded against a single round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundStatus {
    #[default]
    Pending,
    Cleared,
    Rejected,
    OnHold,
}

impl RoundStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Cleared => "CLEARED",
            Self::Rejected => "REJECTED",
            Self::OnHold => "ON_HOLD",
        }
    }

    /// Whether the outcome marks the round as finished.
    pub const fn is_decided(self) -> bool {
        matches!(self, Self::Cleared | Self::Rejected)
    }
}

/// Personal and academic details carried by both candidates and interns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    pub college_name: String,
    pub branch: String,
    pub cgpa: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Denormalized summary of where a subject sits in the round sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelinePosition {
    pub hiring_round: Option<HiringRound>,
    pub hiring_status: RoundStatus,
    pub hiring_score: Option<u8>,
}

impl PipelinePosition {
    pub(crate) fn from_outcome(outcome: &RoundOutcome) -> Self {
        Self {
            hiring_round: Some(outcome.round),
            hiring_status: outcome.status,
            hiring_score: outcome.score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    Applied,
    Interviewing,
    Selected,
    Rejected,
    Withdrawn,
}

impl CandidateStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Interviewing => "interviewing",
            Self::Selected => "selected",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternStatus {
    DocumentPending,
    DocumentVerification,
    DocumentVerified,
    OfferGenerated,
    Onboarding,
}

impl InternStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::DocumentPending => "document_pending",
            Self::DocumentVerification => "document_verification",
            Self::DocumentVerified => "document_verified",
            Self::OfferGenerated => "offer_generated",
            Self::Onboarding => "onboarding",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: SubjectId,
    pub profile: SubjectProfile,
    pub position: PipelinePosition,
    pub status: CandidateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_to: Option<SubjectId>,
}

impl CandidateRecord {
    /// Converted and withdrawn candidates drop out of candidate listings.
    pub fn is_active(&self) -> bool {
        self.converted_to.is_none() && self.status != CandidateStatus::Withdrawn
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternRecord {
    pub id: SubjectId,
    pub profile: SubjectProfile,
    pub position: PipelinePosition,
    pub status: InternStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_from: Option<SubjectId>,
}

/// A person moving through the pipeline; exactly one variant at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    Candidate(CandidateRecord),
    Intern(InternRecord),
}

impl Subject {
    pub fn id(&self) -> &SubjectId {
        match self {
            Subject::Candidate(record) => &record.id,
            Subject::Intern(record) => &record.id,
        }
    }

    pub fn profile(&self) -> &SubjectProfile {
        match self {
            Subject::Candidate(record) => &record.profile,
            Subject::Intern(record) => &record.profile,
        }
    }

    pub fn position(&self) -> &PipelinePosition {
        match self {
            Subject::Candidate(record) => &record.position,
            Subject::Intern(record) => &record.position,
        }
    }

    pub(crate) fn position_mut(&mut self) -> &mut PipelinePosition {
        match self {
            Subject::Candidate(record) => &mut record.position,
            Subject::Intern(record) => &mut record.position,
        }
    }

    pub const fn kind_label(&self) -> &'static str {
        match self {
            Subject::Candidate(_) => "candidate",
            Subject::Intern(_) => "intern",
        }
    }

    pub fn as_candidate(&self) -> Option<&CandidateRecord> {
        match self {
            Subject::Candidate(record) => Some(record),
            Subject::Intern(_) => None,
        }
    }

    pub fn as_intern(&self) -> Option<&InternRecord> {
        match self {
            Subject::Intern(record) => Some(record),
            Subject::Candidate(_) => None,
        }
    }
}

/// Latest recorded result for a (subject, round) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub subject_id: SubjectId,
    pub round: HiringRound,
    pub status: RoundStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interviewer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub recorded_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Inbound request to record a round result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSubmission {
    pub round: HiringRound,
    #[serde(default)]
    pub status: Option<RoundStatus>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub interviewer: Option<String>,
    /// Only consulted when the submission promotes a candidate.
    #[serde(default)]
    pub join_date: Option<NaiveDate>,
}

impl OutcomeSubmission {
    pub fn new(round: HiringRound, status: RoundStatus) -> Self {
        Self {
            round,
            status: Some(status),
            feedback: None,
            score: None,
            interviewer: None,
            join_date: None,
        }
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}
