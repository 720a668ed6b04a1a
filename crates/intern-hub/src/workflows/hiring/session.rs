use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of the operator driving a pipeline call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    Admin,
    Recruiter,
    Interviewer,
    Intern,
}

impl SessionRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Recruiter => "recruiter",
            Self::Interviewer => "interviewer",
            Self::Intern => "intern",
        }
    }
}

impl fmt::Display for SessionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SessionRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "recruiter" | "hr" => Ok(Self::Recruiter),
            "interviewer" => Ok(Self::Interviewer),
            "intern" => Ok(Self::Intern),
            other => Err(format!("unknown session role '{other}'")),
        }
    }
}

/// Explicit caller identity handed to every pipeline operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub actor: String,
    pub role: SessionRole,
}

impl SessionContext {
    pub fn new(actor: impl Into<String>, role: SessionRole) -> Self {
        Self {
            actor: actor.into(),
            role,
        }
    }

    /// Session used by batch jobs and the CLI demo.
    pub fn system() -> Self {
        Self::new("system", SessionRole::Admin)
    }
}
