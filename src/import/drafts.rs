//! Staged import drafts.
//!
//! A draft holds the parsed rows between preview and commit. Drafts live in
//! the `import_drafts` table so a preview made by one process can be
//! committed by another. Each draft belongs to the actor who created it and
//! expires after a fixed TTL; expired rows are purged lazily and are never
//! returned.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::csv::ParsedRow;
use crate::error::{Error, Result, ResultExt};

/// A staged batch awaiting a commit decision.
#[derive(Debug, Clone)]
pub struct Draft {
    pub id: String,
    pub actor_id: String,
    pub rows: Vec<ParsedRow>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct DraftRow {
    id: String,
    actor_id: String,
    payload: String,
    created_at: i64,
    expires_at: i64,
}

impl DraftRow {
    fn into_draft(self) -> Result<Draft> {
        Ok(Draft {
            rows: serde_json::from_str(&self.payload)?,
            id: self.id,
            actor_id: self.actor_id,
            created_at: from_unix(self.created_at),
            expires_at: from_unix(self.expires_at),
        })
    }
}

fn from_unix(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// SQLite-backed draft store.
#[derive(Debug, Clone)]
pub struct DraftStore {
    pool: SqlitePool,
    ttl: Duration,
}

impl DraftStore {
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Stage rows for `actor_id` and return the new draft.
    pub async fn create(&self, actor_id: &str, rows: Vec<ParsedRow>) -> Result<Draft> {
        self.create_at(actor_id, rows, Utc::now()).await
    }

    async fn create_at(&self, actor_id: &str, rows: Vec<ParsedRow>, now: DateTime<Utc>) -> Result<Draft> {
        self.purge_expired_at(now).await?;

        let draft = Draft {
            id: Uuid::new_v4().to_string(),
            actor_id: actor_id.to_string(),
            rows,
            created_at: now,
            expires_at: now + self.ttl,
        };
        let payload = serde_json::to_string(&draft.rows)?;

        sqlx::query(
            "INSERT INTO import_drafts (id, actor_id, payload, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&draft.id)
        .bind(&draft.actor_id)
        .bind(&payload)
        .bind(draft.created_at.timestamp())
        .bind(draft.expires_at.timestamp())
        .execute(&self.pool)
        .await
        .with_context("storing import draft")?;

        debug!(target: "import", draft = %draft.id, actor = %actor_id, rows = draft.rows.len(), "Staged import draft");
        Ok(draft)
    }

    /// Look up a live draft owned by `actor_id`.
    ///
    /// # Errors
    ///
    /// [`Error::DraftNotFound`] if the draft doesn't exist, has expired, or
    /// belongs to someone else.
    pub async fn get(&self, actor_id: &str, id: &str) -> Result<Draft> {
        let row: Option<DraftRow> = sqlx::query_as(
            "SELECT * FROM import_drafts WHERE id = ? AND actor_id = ? AND expires_at > ?",
        )
        .bind(id)
        .bind(actor_id)
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| Error::draft_not_found(id))?.into_draft()
    }

    /// Remove and return a live draft owned by `actor_id`.
    ///
    /// The delete is a single statement, so two concurrent commits of the
    /// same draft can't both receive its rows.
    pub async fn take(&self, actor_id: &str, id: &str) -> Result<Draft> {
        self.take_at(actor_id, id, Utc::now()).await
    }

    async fn take_at(&self, actor_id: &str, id: &str, now: DateTime<Utc>) -> Result<Draft> {
        let row: Option<DraftRow> = sqlx::query_as(
            "DELETE FROM import_drafts WHERE id = ? AND actor_id = ? AND expires_at > ? RETURNING *",
        )
        .bind(id)
        .bind(actor_id)
        .bind(now.timestamp())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| Error::draft_not_found(id))?.into_draft()
    }

    /// Delete every draft expired at `now`. Returns how many were removed.
    async fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM import_drafts WHERE expires_at <= ?")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed > 0 {
            debug!(target: "import", removed, "Purged expired drafts");
        }
        Ok(removed)
    }
}
