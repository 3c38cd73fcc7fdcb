use std::sync::Arc;

use pipeline::{compute_analytics, validate};
use shared::{
    domain::{Candidate, CandidateForm, CandidateId, CandidateStatus},
    error::{ApiError, ErrorCode, StoreError},
    protocol::Analytics,
};
use storage::CandidateStore;
use tracing::{error, info};

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn CandidateStore>,
}

pub fn candidates_route() -> &'static str {
    "/candidates"
}

pub fn candidate_route() -> &'static str {
    "/candidates/:candidate_id"
}

pub fn analytics_route() -> &'static str {
    "/analytics"
}

pub async fn list_candidates(ctx: &ApiContext) -> Result<Vec<Candidate>, ApiError> {
    ctx.store.list().await.map_err(|e| store_failure("list", e))
}

pub async fn create_candidate(
    ctx: &ApiContext,
    form: CandidateForm,
) -> Result<Candidate, ApiError> {
    let candidate =
        validate(form).map_err(|e| ApiError::new(ErrorCode::Validation, e.to_string()))?;
    let created = ctx
        .store
        .create(candidate)
        .await
        .map_err(|e| store_failure("create", e))?;
    info!(id = %created.id, role = %created.role, "candidate created");
    Ok(created)
}

pub async fn update_candidate_status(
    ctx: &ApiContext,
    candidate_id: CandidateId,
    status: CandidateStatus,
) -> Result<Candidate, ApiError> {
    let updated = ctx
        .store
        .update_status(&candidate_id, status)
        .await
        .map_err(|e| store_failure("update_status", e))?;
    info!(id = %updated.id, %status, "candidate status updated");
    Ok(updated)
}

pub async fn delete_candidate(ctx: &ApiContext, candidate_id: CandidateId) -> Result<(), ApiError> {
    ctx.store
        .delete(&candidate_id)
        .await
        .map_err(|e| store_failure("delete", e))?;
    info!(id = %candidate_id, "candidate deleted");
    Ok(())
}

pub async fn analytics(ctx: &ApiContext) -> Result<Analytics, ApiError> {
    let candidates = list_candidates(ctx).await?;
    Ok(compute_analytics(&candidates))
}

fn store_failure(operation: &str, err: StoreError) -> ApiError {
    match &err {
        StoreError::NotFound(_) => {}
        _ => error!(operation, error = %err, "candidate store call failed"),
    }
    err.into()
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
