use serde::{Deserialize, Serialize};

use crate::domain::CandidateStatus;

/// Header carrying the store access key. `Authorization: Bearer` is also accepted.
pub const ACCESS_KEY_HEADER: &str = "apikey";

/// Body of `PATCH /candidates/:id`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: CandidateStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub status: CandidateStatus,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBreakdown {
    pub role: String,
    pub count: usize,
}

/// Aggregate view of the candidate list. Always recomputed in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_candidates: usize,
    pub status_breakdown: Vec<StatusBreakdown>,
    pub role_breakdown: Vec<RoleBreakdown>,
    pub average_experience: f64,
}

impl Default for Analytics {
    fn default() -> Self {
        Self {
            total_candidates: 0,
            status_breakdown: CandidateStatus::ALL
                .iter()
                .map(|status| StatusBreakdown {
                    status: *status,
                    count: 0,
                    percentage: 0,
                })
                .collect(),
            role_breakdown: Vec::new(),
            average_experience: 0.0,
        }
    }
}

impl Analytics {
    pub fn count_for(&self, status: CandidateStatus) -> usize {
        self.status_breakdown
            .iter()
            .find(|entry| entry.status == status)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    pub fn in_progress(&self) -> usize {
        self.count_for(CandidateStatus::Interview)
    }

    pub fn offers(&self) -> usize {
        self.count_for(CandidateStatus::Offer)
    }

    pub fn rejected(&self) -> usize {
        self.count_for(CandidateStatus::Rejected)
    }

    /// Share of candidates holding an offer, as a whole percentage.
    pub fn conversion_rate(&self) -> u32 {
        percentage_of(self.offers(), self.total_candidates)
    }

    pub fn top_roles(&self, limit: usize) -> &[RoleBreakdown] {
        let end = limit.min(self.role_breakdown.len());
        &self.role_breakdown[..end]
    }
}

/// `round(count / total * 100)`, or 0 for an empty total.
pub fn percentage_of(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u32
}
