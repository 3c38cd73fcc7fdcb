use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use shared::{
    domain::{Candidate, CandidateId, CandidateStatus, NewCandidate},
    error::StoreError,
};

use crate::CandidateStore;

/// In-process store holding candidates in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Candidate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidates(candidates: Vec<Candidate>) -> Self {
        Self {
            records: Mutex::new(candidates),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl CandidateStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Candidate>, StoreError> {
        let mut snapshot: Vec<Candidate> = self.records.lock().await.iter().rev().cloned().collect();
        // stable: equal timestamps stay newest-inserted first
        snapshot.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(snapshot)
    }

    async fn create(&self, candidate: NewCandidate) -> Result<Candidate, StoreError> {
        let now = Utc::now();
        let record = Candidate {
            id: CandidateId(Uuid::new_v4().to_string()),
            name: candidate.name,
            role: candidate.role,
            experience: candidate.experience,
            resume_link: candidate.resume_link.filter(|link| !link.is_empty()),
            status: candidate.status,
            created_at: now,
            updated_at: now,
        };
        self.records.lock().await.push(record.clone());
        Ok(record)
    }

    async fn update_status(
        &self,
        id: &CandidateId,
        status: CandidateStatus,
    ) -> Result<Candidate, StoreError> {
        let mut guard = self.records.lock().await;
        let record = guard
            .iter_mut()
            .find(|candidate| &candidate.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        record.updated_at = record.next_update_stamp(Utc::now());
        record.status = status;
        Ok(record.clone())
    }

    async fn delete(&self, id: &CandidateId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().await;
        let before = guard.len();
        guard.retain(|candidate| &candidate.id != id);
        if guard.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
