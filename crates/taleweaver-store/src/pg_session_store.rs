//! `PostgreSQL` implementation of the `SessionStore` trait.
//!
//! An advancement transaction starts by locking the campaign row, which
//! serializes writers across processes as well as within one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};
use taleweaver_core::campaign::{NewSession, Session};
use taleweaver_core::error::DomainError;
use taleweaver_core::ids::CampaignId;
use taleweaver_core::repository::{SessionStore, SessionTransaction};

use crate::pg_store::{PgStore, storage_error};
use crate::rows::{SESSION_COLUMNS, SessionRow};

/// An open advancement transaction holding the campaign row lock.
struct PgSessionTransaction {
    campaign_id: CampaignId,
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SessionTransaction for PgSessionTransaction {
    async fn latest_session_number(&mut self) -> Result<Option<i32>, DomainError> {
        sqlx::query_scalar("SELECT MAX(session_number) FROM sessions WHERE campaign_id = $1")
            .bind(self.campaign_id.0)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(storage_error)
    }

    async fn complete_session(
        &mut self,
        session_number: i32,
        completed_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE sessions SET is_completed = TRUE, completed_at = $3 \
             WHERE campaign_id = $1 AND session_number = $2 AND NOT is_completed",
        )
        .bind(self.campaign_id.0)
        .bind(session_number)
        .bind(completed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn insert_session(&mut self, session: &NewSession) -> Result<Session, DomainError> {
        let row: SessionRow = sqlx::query_as(&format!(
            r"
            INSERT INTO sessions (campaign_id, session_number, title, narrative, location,
                                  choices, experience_reward, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SESSION_COLUMNS}
            "
        ))
        .bind(session.campaign_id.0)
        .bind(session.session_number)
        .bind(&session.title)
        .bind(&session.narrative)
        .bind(&session.location)
        .bind(Json(&session.choices))
        .bind(session.experience_reward)
        .bind(session.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(storage_error)?;

        Ok(Session::from(row))
    }

    async fn set_current_session(&mut self, session_number: i32) -> Result<(), DomainError> {
        sqlx::query("UPDATE campaigns SET current_session = $2 WHERE id = $1")
            .bind(self.campaign_id.0)
            .bind(session_number)
            .execute(&mut *self.tx)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx.commit().await.map_err(storage_error)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn begin_advance(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Box<dyn SessionTransaction>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM campaigns WHERE id = $1 FOR UPDATE")
                .bind(campaign_id.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_error)?;
        if locked.is_none() {
            return Err(DomainError::not_found("campaign", campaign_id));
        }

        Ok(Box::new(PgSessionTransaction { campaign_id, tx }))
    }

    async fn find_session(
        &self,
        campaign_id: CampaignId,
        session_number: i32,
    ) -> Result<Option<Session>, DomainError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE campaign_id = $1 AND session_number = $2"
        ))
        .bind(campaign_id.0)
        .bind(session_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Session::from))
    }
}
