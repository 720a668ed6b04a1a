//! Post-selection records: intern documents and offer letters.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::SubjectId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OfferId(pub String);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Documents every intern must supply before an offer is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Aadhaar,
    Pan,
    #[serde(rename = "CLASS_10")]
    Class10,
    #[serde(rename = "CLASS_12")]
    Class12,
    Degree,
    Resume,
    Photo,
    BankPassbook,
}

impl DocumentKind {
    pub const fn required() -> [Self; 8] {
        [
            Self::Aadhaar,
            Self::Pan,
            Self::Class10,
            Self::Class12,
            Self::Degree,
            Self::Resume,
            Self::Photo,
            Self::BankPassbook,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Aadhaar => "Aadhaar Card",
            Self::Pan => "PAN Card",
            Self::Class10 => "Class 10 Marksheet",
            Self::Class12 => "Class 12 Marksheet",
            Self::Degree => "Degree Certificate",
            Self::Resume => "Resume",
            Self::Photo => "Passport Photo",
            Self::BankPassbook => "Bank Passbook",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub intern_id: SubjectId,
    pub kind: DocumentKind,
    pub file_name: String,
    pub storage_key: String,
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub uploaded_at: DateTime<Utc>,
}

/// Metadata for an uploaded file; the bytes live in external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub kind: DocumentKind,
    pub file_name: String,
    pub storage_key: String,
}

/// Verification progress across the required document set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentChecklist {
    pub verified: Vec<DocumentKind>,
    pub pending: Vec<DocumentKind>,
    pub rejected: Vec<DocumentKind>,
    pub missing: Vec<DocumentKind>,
}

impl DocumentChecklist {
    pub fn from_documents(documents: &[DocumentRecord]) -> Self {
        let latest: BTreeMap<DocumentKind, &DocumentRecord> = documents
            .iter()
            .map(|document| (document.kind, document))
            .collect();

        let mut checklist = DocumentChecklist::default();
        for kind in DocumentKind::required() {
            match latest.get(&kind).map(|document| document.status) {
                Some(DocumentStatus::Verified) => checklist.verified.push(kind),
                Some(DocumentStatus::Pending) => checklist.pending.push(kind),
                Some(DocumentStatus::Rejected) => checklist.rejected.push(kind),
                None => checklist.missing.push(kind),
            }
        }
        checklist
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty() && self.rejected.is_empty() && self.missing.is_empty()
    }

    /// Required kinds that are not yet verified, in checklist order.
    pub fn outstanding(&self) -> Vec<DocumentKind> {
        let mut outstanding: Vec<DocumentKind> = self
            .pending
            .iter()
            .chain(&self.rejected)
            .chain(&self.missing)
            .copied()
            .collect();
        outstanding.sort();
        outstanding
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkMode {
    Onsite,
    Remote,
    #[default]
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Draft,
    Generated,
    Sent,
    Accepted,
    Rejected,
}

impl OfferStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Generated => "GENERATED",
            Self::Sent => "SENT",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }

    pub const fn can_transition_to(self, next: OfferStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Generated)
                | (Self::Generated, Self::Sent)
                | (Self::Generated | Self::Sent, Self::Accepted)
                | (Self::Generated | Self::Sent, Self::Rejected)
        )
    }

    /// Rejected offers no longer count against the one-offer-per-intern rule.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTerms {
    pub position: String,
    pub department: String,
    pub stipend: u32,
    pub duration: String,
    pub start_date: NaiveDate,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_manager: Option<String>,
    #[serde(default)]
    pub work_mode: WorkMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRequest {
    pub terms: OfferTerms,
    #[serde(default)]
    pub draft: bool,
}

/// Signed copy of the offer letter returned by the intern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedArtifact {
    pub file_name: String,
    pub storage_key: String,
}

impl SignedArtifact {
    pub fn is_supplied(&self) -> bool {
        !self.file_name.trim().is_empty() && !self.storage_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub id: OfferId,
    pub intern_id: SubjectId,
    pub terms: OfferTerms,
    pub status: OfferStatus,
    pub generated_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_artifact: Option<SignedArtifact>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}
