use std::collections::BTreeSet;

use shared::domain::{Candidate, CandidateStatus};

/// Search box plus the two exact-match dropdowns. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    pub search: String,
    pub role: Option<String>,
    pub status: Option<CandidateStatus>,
}

impl CandidateFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.role.is_none() && self.status.is_none()
    }

    pub fn matches(&self, candidate: &Candidate) -> bool {
        self.matches_search(candidate) && self.matches_role(candidate) && self.matches_status(candidate)
    }

    /// Visible subset of `candidates`, order preserved.
    pub fn apply<'a>(&self, candidates: &'a [Candidate]) -> Vec<&'a Candidate> {
        candidates
            .iter()
            .filter(|candidate| self.matches(candidate))
            .collect()
    }

    fn matches_search(&self, candidate: &Candidate) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        candidate.name.to_lowercase().contains(&needle)
            || candidate.role.to_lowercase().contains(&needle)
    }

    fn matches_role(&self, candidate: &Candidate) -> bool {
        match self.role.as_deref() {
            None | Some("") => true,
            Some(role) => candidate.role == role,
        }
    }

    fn matches_status(&self, candidate: &Candidate) -> bool {
        self.status.map_or(true, |status| candidate.status == status)
    }
}

/// Sorted unique roles across the unfiltered list, for the role dropdown.
pub fn distinct_roles(candidates: &[Candidate]) -> Vec<String> {
    candidates
        .iter()
        .map(|candidate| candidate.role.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
