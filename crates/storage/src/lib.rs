use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;
use uuid::Uuid;

use shared::{
    domain::{Candidate, CandidateId, CandidateStatus, NewCandidate},
    error::StoreError,
};

mod memory;

pub use memory::MemoryStore;

/// Capability interface over the `candidates` collection.
///
/// Every call is a single round trip. Implementations never retry.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// All candidates, newest `created_at` first.
    async fn list(&self) -> Result<Vec<Candidate>, StoreError>;
    async fn create(&self, candidate: NewCandidate) -> Result<Candidate, StoreError>;
    /// Sets `status` and moves `updated_at` strictly forward.
    async fn update_status(
        &self,
        id: &CandidateId,
        status: CandidateStatus,
    ) -> Result<Candidate, StoreError>;
    async fn delete(&self, id: &CandidateId) -> Result<(), StoreError>;
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// SQLite-backed candidate store.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

const CANDIDATE_COLUMNS: &str =
    "id, name, role, experience, resume_link, status, created_at, updated_at";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn ping(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let rows = sqlx::query(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list candidates")?;
        rows.iter().map(candidate_from_row).collect()
    }

    async fn insert_candidate(&self, candidate: &NewCandidate) -> Result<Candidate> {
        let id = Uuid::new_v4().to_string();
        let now = encode_timestamp(stored_now());
        let row = sqlx::query(&format!(
            "INSERT INTO candidates ({CANDIDATE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {CANDIDATE_COLUMNS}"
        ))
        .bind(&id)
        .bind(&candidate.name)
        .bind(&candidate.role)
        .bind(candidate.experience)
        .bind(candidate.resume_link.as_deref().filter(|link| !link.is_empty()))
        .bind(candidate.status.as_str())
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert candidate")?;
        candidate_from_row(&row)
    }

    /// Reads the current `updated_at` and writes the next one inside a single
    /// write transaction, so concurrent updates of one id serialize.
    async fn transition_status(
        &self,
        id: &CandidateId,
        status: CandidateStatus,
    ) -> Result<Option<Candidate>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin status update")?;

        // first statement is a write so the lock is held before the read
        let claimed = sqlx::query("UPDATE candidates SET status = status WHERE id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to lock candidate {id}"))?;
        if claimed.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = ?"
        ))
        .bind(id.as_str())
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("failed to load candidate {id}"))?;
        let current = candidate_from_row(&row)?;

        let updated_at = encode_timestamp(current.next_update_stamp(stored_now()));
        let row = sqlx::query(&format!(
            "UPDATE candidates SET status = ?, updated_at = ? WHERE id = ?
             RETURNING {CANDIDATE_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(&updated_at)
        .bind(id.as_str())
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("failed to update status of candidate {id}"))?;
        let updated = candidate_from_row(&row)?;

        tx.commit().await.context("failed to commit status update")?;
        Ok(Some(updated))
    }

    async fn remove_candidate(&self, id: &CandidateId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete candidate {id}"))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CandidateStore for Storage {
    async fn list(&self) -> Result<Vec<Candidate>, StoreError> {
        self.list_candidates().await.map_err(unavailable)
    }

    async fn create(&self, candidate: NewCandidate) -> Result<Candidate, StoreError> {
        let created = self.insert_candidate(&candidate).await.map_err(unavailable)?;
        debug!(id = %created.id, "inserted candidate");
        Ok(created)
    }

    async fn update_status(
        &self,
        id: &CandidateId,
        status: CandidateStatus,
    ) -> Result<Candidate, StoreError> {
        self.transition_status(id, status)
            .await
            .map_err(unavailable)?
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn delete(&self, id: &CandidateId) -> Result<(), StoreError> {
        match self.remove_candidate(id).await.map_err(unavailable)? {
            0 => Err(StoreError::NotFound(id.clone())),
            _ => Ok(()),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.ping().await.map_err(unavailable)
    }
}

fn unavailable(err: anyhow::Error) -> StoreError {
    StoreError::Unavailable(format!("{err:#}"))
}

/// Current time at the precision the `candidates` table keeps.
fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so lexical order in SQLite equals time order.
fn encode_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .with_context(|| format!("invalid stored timestamp '{raw}'"))
}

fn candidate_from_row(row: &SqliteRow) -> Result<Candidate> {
    let raw_status: String = row.try_get("status")?;
    let status = CandidateStatus::from_str(&raw_status)
        .map_err(|err| anyhow!("corrupt candidate row: {err}"))?;
    Ok(Candidate {
        id: CandidateId(row.try_get("id")?),
        name: row.try_get("name")?,
        role: row.try_get("role")?,
        experience: row.try_get("experience")?,
        resume_link: row.try_get("resume_link")?,
        status,
        created_at: decode_timestamp(&row.try_get::<String, _>("created_at")?)?,
        updated_at: decode_timestamp(&row.try_get::<String, _>("updated_at")?)?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
