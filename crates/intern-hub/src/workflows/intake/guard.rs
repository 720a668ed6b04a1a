use serde::{Deserialize, Deserializer, Serialize};

use super::normalizer::{normalize_email, normalize_phone, normalize_text};
use crate::workflows::hiring::domain::SubjectProfile;

/// Candidate details as entered by hand or read from a CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    pub college_name: String,
    pub branch: String,
    #[serde(deserialize_with = "string_or_number")]
    pub cgpa: String,
    #[serde(default)]
    pub graduation_year: Option<u16>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Validation errors raised while admitting a candidate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("'{0}' is not a valid phone number")]
    InvalidPhone(String),
    #[error("cgpa '{0}' is not a number")]
    InvalidCgpa(String),
    #[error("cgpa {0} is outside 0-10")]
    CgpaOutOfRange(f32),
}

const MAX_CGPA: f32 = 10.0;
const MIN_PHONE_DIGITS: usize = 10;

/// Guard responsible for producing `SubjectProfile` instances.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn profile_from_submission(
        &self,
        submission: CandidateSubmission,
    ) -> Result<SubjectProfile, IntakeViolation> {
        let name = required("name", &submission.name)?;
        let college_name = required("college name", &submission.college_name)?;
        let branch = required("branch", &submission.branch)?;

        let email = normalize_email(&submission.email);
        if email.is_empty() {
            return Err(IntakeViolation::MissingField("email"));
        }
        if !looks_like_email(&email) {
            return Err(IntakeViolation::InvalidEmail(submission.email));
        }

        let phone = normalize_phone(&submission.phone);
        if phone.is_empty() {
            return Err(IntakeViolation::MissingField("phone"));
        }
        if phone.chars().filter(char::is_ascii_digit).count() < MIN_PHONE_DIGITS {
            return Err(IntakeViolation::InvalidPhone(submission.phone));
        }

        let raw_cgpa = submission.cgpa.trim();
        if raw_cgpa.is_empty() {
            return Err(IntakeViolation::MissingField("cgpa"));
        }
        let cgpa: f32 = raw_cgpa
            .parse()
            .map_err(|_| IntakeViolation::InvalidCgpa(raw_cgpa.to_string()))?;
        if !cgpa.is_finite() || !(0.0..=MAX_CGPA).contains(&cgpa) {
            return Err(IntakeViolation::CgpaOutOfRange(cgpa));
        }

        Ok(SubjectProfile {
            name,
            email,
            phone,
            emergency_contact: optional(submission.emergency_contact),
            college_name,
            branch,
            cgpa,
            graduation_year: submission.graduation_year,
            address: optional(submission.address),
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, IntakeViolation> {
    let normalized = normalize_text(value);
    if normalized.is_empty() {
        Err(IntakeViolation::MissingField(field))
    } else {
        Ok(normalized)
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| normalize_text(&raw))
        .filter(|normalized| !normalized.is_empty())
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
