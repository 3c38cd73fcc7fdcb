use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex as StdMutex, MutexGuard, PoisonError,
};

use pipeline::{compute_analytics, distinct_roles, validate, CandidateFilter};
use shared::{
    domain::{Candidate, CandidateForm, CandidateId, CandidateStatus},
    error::StoreError,
    protocol::Analytics,
};
use storage::CandidateStore;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::error::BoardError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    ConnectionError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardView {
    #[default]
    Board,
    Analytics,
}

/// The one status update currently awaiting the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransition {
    pub token: u64,
    pub candidate_id: CandidateId,
    pub target: CandidateStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(Candidate),
    /// Dropped onto the status it already has.
    Unchanged,
    /// Another transition was in flight; this one was dropped.
    Ignored { pending: PendingTransition },
}

/// Proof that the user was asked before a delete. Only
/// [`BoardController::request_delete`] hands these out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    candidate_id: CandidateId,
    name: String,
}

impl DeleteConfirmation {
    pub fn candidate_id(&self) -> &CandidateId {
        &self.candidate_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt(&self) -> String {
        format!("Are you sure you want to delete {}?", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn {
    pub status: CandidateStatus,
    pub title: &'static str,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub candidates: Vec<Candidate>,
    pub visible: Vec<Candidate>,
    pub analytics: Analytics,
    pub filter: CandidateFilter,
    pub view: BoardView,
    pub load_state: LoadState,
    pub pending: Option<PendingTransition>,
}

#[derive(Debug)]
struct BoardState {
    candidates: Vec<Candidate>,
    analytics: Analytics,
    filter: CandidateFilter,
    view: BoardView,
    load_state: LoadState,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            analytics: Analytics::default(),
            filter: CandidateFilter::default(),
            view: BoardView::default(),
            load_state: LoadState::Loading,
        }
    }
}

/// Owns the board's view of the candidate list and coordinates every store
/// call the front end makes.
pub struct BoardController {
    store: Arc<dyn CandidateStore>,
    state: Mutex<BoardState>,
    in_flight: StdMutex<Option<PendingTransition>>,
    next_token: AtomicU64,
}

/// Holds the in-flight slot for one transition. Dropping it frees the slot,
/// whether the move finished or its future was cancelled.
struct InFlightGuard<'a> {
    slot: &'a StdMutex<Option<PendingTransition>>,
    token: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().map(|pending| pending.token) == Some(self.token) {
            *slot = None;
        }
    }
}

impl BoardController {
    pub fn new(store: Arc<dyn CandidateStore>) -> Self {
        Self {
            store,
            state: Mutex::new(BoardState::default()),
            in_flight: StdMutex::new(None),
            next_token: AtomicU64::new(1),
        }
    }

    /// Re-reads the list and the analytics concurrently and replaces both.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        self.state.lock().await.load_state = LoadState::Loading;

        let (candidates, analytics) = tokio::join!(self.store.list(), self.read_analytics());

        let mut state = self.state.lock().await;
        let mut failure = None;
        match candidates {
            Ok(candidates) => state.candidates = candidates,
            Err(err) => failure = Some(err),
        }
        match analytics {
            Ok(analytics) => state.analytics = analytics,
            Err(err) => failure = failure.or(Some(err)),
        }

        match failure {
            None => {
                state.load_state = LoadState::Ready;
                info!(count = state.candidates.len(), "board refreshed");
                Ok(())
            }
            Some(err) => {
                error!(error = %err, "failed to load candidates");
                state.load_state = LoadState::ConnectionError(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn create(&self, form: CandidateForm) -> Result<Candidate, BoardError> {
        let candidate = validate(form)?;
        let created = self.store.create(candidate).await.map_err(|err| {
            error!(error = %err, "failed to add candidate");
            err
        })?;
        info!(id = %created.id, "candidate added");

        self.state.lock().await.candidates.insert(0, created.clone());
        self.reload_analytics().await;
        Ok(created)
    }

    pub async fn move_candidate(
        &self,
        candidate_id: &CandidateId,
        target: CandidateStatus,
    ) -> Result<TransitionOutcome, StoreError> {
        let current = self
            .state
            .lock()
            .await
            .candidates
            .iter()
            .find(|candidate| &candidate.id == candidate_id)
            .map(|candidate| candidate.status)
            .ok_or_else(|| StoreError::NotFound(candidate_id.clone()))?;
        if current == target {
            return Ok(TransitionOutcome::Unchanged);
        }

        let guard = match self.claim_transition(candidate_id, target) {
            Ok(guard) => guard,
            Err(pending) => {
                warn!(
                    id = %candidate_id,
                    pending = %pending.candidate_id,
                    "status update already in flight; dropping move"
                );
                return Ok(TransitionOutcome::Ignored { pending });
            }
        };
        let result = self.store.update_status(candidate_id, target).await;
        drop(guard);

        {
            let mut state = self.state.lock().await;
            match &result {
                Ok(updated) => {
                    if let Some(slot) = state
                        .candidates
                        .iter_mut()
                        .find(|candidate| candidate.id == updated.id)
                    {
                        *slot = updated.clone();
                    }
                    info!(id = %updated.id, status = %updated.status, "candidate moved");
                }
                Err(err) => {
                    error!(id = %candidate_id, status = %target, error = %err, "failed to update status");
                }
            }
        }

        let updated = result?;
        self.reload_analytics().await;
        Ok(TransitionOutcome::Applied(updated))
    }

    pub async fn request_delete(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<DeleteConfirmation, StoreError> {
        let state = self.state.lock().await;
        state
            .candidates
            .iter()
            .find(|candidate| &candidate.id == candidate_id)
            .map(|candidate| DeleteConfirmation {
                candidate_id: candidate.id.clone(),
                name: candidate.name.clone(),
            })
            .ok_or_else(|| StoreError::NotFound(candidate_id.clone()))
    }

    pub async fn confirm_delete(&self, confirmation: DeleteConfirmation) -> Result<(), StoreError> {
        let candidate_id = confirmation.candidate_id;
        self.store.delete(&candidate_id).await.map_err(|err| {
            error!(id = %candidate_id, error = %err, "failed to delete candidate");
            err
        })?;
        info!(id = %candidate_id, "candidate deleted");

        self.state
            .lock()
            .await
            .candidates
            .retain(|candidate| candidate.id != candidate_id);
        self.reload_analytics().await;
        Ok(())
    }

    pub async fn set_search(&self, search: impl Into<String>) {
        self.state.lock().await.filter.search = search.into();
    }

    pub async fn set_role_filter(&self, role: Option<String>) {
        self.state.lock().await.filter.role = role;
    }

    pub async fn set_status_filter(&self, status: Option<CandidateStatus>) {
        self.state.lock().await.filter.status = status;
    }

    pub async fn clear_filters(&self) {
        self.state.lock().await.filter = CandidateFilter::default();
    }

    pub async fn visible_candidates(&self) -> Vec<Candidate> {
        let state = self.state.lock().await;
        state
            .filter
            .apply(&state.candidates)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn role_options(&self) -> Vec<String> {
        distinct_roles(&self.state.lock().await.candidates)
    }

    /// One column per status, in status order, over the visible set.
    pub async fn columns(&self) -> Vec<BoardColumn> {
        let visible = self.visible_candidates().await;
        CandidateStatus::ALL
            .iter()
            .map(|&status| BoardColumn {
                status,
                title: status.title(),
                candidates: visible
                    .iter()
                    .filter(|candidate| candidate.status == status)
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    pub async fn view(&self) -> BoardView {
        self.state.lock().await.view
    }

    pub async fn set_view(&self, view: BoardView) {
        self.state.lock().await.view = view;
    }

    pub async fn toggle_view(&self) -> BoardView {
        let mut state = self.state.lock().await;
        state.view = match state.view {
            BoardView::Board => BoardView::Analytics,
            BoardView::Analytics => BoardView::Board,
        };
        state.view
    }

    pub async fn load_state(&self) -> LoadState {
        self.state.lock().await.load_state.clone()
    }

    pub fn pending(&self) -> Option<PendingTransition> {
        self.in_flight().clone()
    }

    pub async fn analytics(&self) -> Analytics {
        self.state.lock().await.analytics.clone()
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        let state = self.state.lock().await;
        BoardSnapshot {
            visible: state
                .filter
                .apply(&state.candidates)
                .into_iter()
                .cloned()
                .collect(),
            candidates: state.candidates.clone(),
            analytics: state.analytics.clone(),
            filter: state.filter.clone(),
            view: state.view,
            load_state: state.load_state.clone(),
            pending: self.pending(),
        }
    }

    fn in_flight(&self) -> MutexGuard<'_, Option<PendingTransition>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn claim_transition(
        &self,
        candidate_id: &CandidateId,
        target: CandidateStatus,
    ) -> Result<InFlightGuard<'_>, PendingTransition> {
        let mut slot = self.in_flight();
        if let Some(pending) = slot.as_ref() {
            return Err(pending.clone());
        }
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        *slot = Some(PendingTransition {
            token,
            candidate_id: candidate_id.clone(),
            target,
        });
        Ok(InFlightGuard {
            slot: &self.in_flight,
            token,
        })
    }

    async fn read_analytics(&self) -> Result<Analytics, StoreError> {
        let candidates = self.store.list().await?;
        Ok(compute_analytics(&candidates))
    }

    /// Replaces the analytics after a mutation. The mutation already
    /// succeeded, so a failed read is reported through `load_state` only.
    async fn reload_analytics(&self) {
        let result = self.read_analytics().await;
        let mut state = self.state.lock().await;
        match result {
            Ok(analytics) => state.analytics = analytics,
            Err(err) => {
                warn!(error = %err, "failed to reload analytics");
                state.load_state = LoadState::ConnectionError(err.to_string());
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
