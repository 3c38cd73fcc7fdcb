use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(CandidateId);

/// Pipeline stage of a candidate. Any stage may move to any other stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    #[default]
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl CandidateStatus {
    /// Board column order.
    pub const ALL: [CandidateStatus; 4] = [
        CandidateStatus::Applied,
        CandidateStatus::Interview,
        CandidateStatus::Offer,
        CandidateStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CandidateStatus::Applied => "applied",
            CandidateStatus::Interview => "interview",
            CandidateStatus::Offer => "offer",
            CandidateStatus::Rejected => "rejected",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            CandidateStatus::Applied => "Applied",
            CandidateStatus::Interview => "Interview",
            CandidateStatus::Offer => "Offer",
            CandidateStatus::Rejected => "Rejected",
        }
    }

    pub fn index(self) -> usize {
        match self {
            CandidateStatus::Applied => 0,
            CandidateStatus::Interview => 1,
            CandidateStatus::Offer => 2,
            CandidateStatus::Rejected => 3,
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown candidate status '{0}' (expected applied, interview, offer or rejected)")]
pub struct UnknownStatus(pub String);

impl FromStr for CandidateStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "applied" => Ok(CandidateStatus::Applied),
            "interview" => Ok(CandidateStatus::Interview),
            "offer" => Ok(CandidateStatus::Offer),
            "rejected" => Ok(CandidateStatus::Rejected),
            _ => Err(UnknownStatus(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub role: String,
    pub experience: f64,
    #[serde(default)]
    pub resume_link: Option<String>,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    /// Timestamp for the next mutation: `now`, or one microsecond past the
    /// current `updated_at` when the clock has not advanced.
    pub fn next_update_stamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        }
    }
}

/// Raw add-candidate input, exactly as the form collected it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateForm {
    pub name: String,
    pub role: String,
    pub experience: f64,
    #[serde(default)]
    pub resume_link: Option<String>,
    #[serde(default)]
    pub status: Option<CandidateStatus>,
}

/// A form that passed validation. Fields are trimmed and `resume_link` is
/// `None` rather than empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub name: String,
    pub role: String,
    pub experience: f64,
    pub resume_link: Option<String>,
    pub status: CandidateStatus,
}

impl From<NewCandidate> for CandidateForm {
    fn from(value: NewCandidate) -> Self {
        Self {
            name: value.name,
            role: value.role,
            experience: value.experience,
            resume_link: value.resume_link,
            status: Some(value.status),
        }
    }
}
