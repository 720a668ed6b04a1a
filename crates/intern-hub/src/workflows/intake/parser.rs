use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::guard::CandidateSubmission;

/// Columns every bulk upload must carry.
pub(crate) const REQUIRED_COLUMNS: [&str; 5] = ["name", "email", "phone", "branch", "cgpa"];

#[derive(Debug)]
pub struct ImportRow {
    /// 1-based data row number, excluding the header line.
    pub row_number: usize,
    pub submission: Result<CandidateSubmission, String>,
}

pub(crate) fn parse_rows<R: Read>(
    reader: R,
    college_name: &str,
) -> Result<Vec<ImportRow>, super::CandidateImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Header matching is case-insensitive; fields below are keyed in lowercase.
    let headers: csv::StringRecord = csv_reader
        .headers()?
        .iter()
        .map(|header| header.to_ascii_lowercase())
        .collect();
    csv_reader.set_headers(headers.clone());

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(super::CandidateImportError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<CandidateRow>().enumerate() {
        let submission = record
            .map_err(|err| format!("unreadable row: {err}"))
            .and_then(|row| row.into_submission(college_name));
        rows.push(ImportRow {
            row_number: index + 1,
            submission,
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    name: String,
    email: String,
    phone: String,
    branch: String,
    cgpa: String,
    #[serde(
        rename = "graduationyear",
        alias = "graduation_year",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    graduation_year: Option<String>,
    #[serde(
        rename = "emergencycontact",
        alias = "emergency_contact",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    emergency_contact: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    address: Option<String>,
}

impl CandidateRow {
    fn into_submission(self, college_name: &str) -> Result<CandidateSubmission, String> {
        let graduation_year = self
            .graduation_year
            .map(|raw| {
                raw.parse::<u16>()
                    .map_err(|_| format!("graduation year '{raw}' is not a year"))
            })
            .transpose()?;

        Ok(CandidateSubmission {
            name: self.name,
            email: self.email,
            phone: self.phone,
            emergency_contact: self.emergency_contact,
            college_name: college_name.to_string(),
            branch: self.branch,
            cgpa: self.cgpa,
            graduation_year,
            address: self.address,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
