//! `PostgreSQL` implementation of the `CampaignReader` trait.

use async_trait::async_trait;
use taleweaver_core::campaign::{Campaign, DiceRollFact, RosterEntry, Session};
use taleweaver_core::error::DomainError;
use taleweaver_core::ids::CampaignId;
use taleweaver_core::repository::CampaignReader;

use crate::pg_store::{PgStore, storage_error};
use crate::rows::{CampaignRow, DiceRollRow, RosterRow, SESSION_COLUMNS, SessionRow};

#[async_trait]
impl CampaignReader for PgStore {
    async fn find_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, DomainError> {
        let row: Option<CampaignRow> = sqlx::query_as(
            "SELECT id, title, description, current_session, current_turn_user_id \
             FROM campaigns WHERE id = $1",
        )
        .bind(campaign_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Campaign::from))
    }

    async fn latest_session(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<Session>, DomainError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE campaign_id = $1 ORDER BY session_number DESC LIMIT 1"
        ))
        .bind(campaign_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Session::from))
    }

    async fn active_roster(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<RosterEntry>, DomainError> {
        let rows: Vec<RosterRow> = sqlx::query_as(
            r"
            SELECT c.id AS character_id, p.user_id, c.name, c.race, c.class_name,
                   c.level, p.turn_order
            FROM participants p
            JOIN characters c ON c.id = p.character_id
            WHERE p.campaign_id = $1 AND p.is_active
            ORDER BY p.turn_order ASC NULLS LAST, c.id ASC
            ",
        )
        .bind(campaign_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(RosterEntry::from).collect())
    }

    async fn latest_roll(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<DiceRollFact>, DomainError> {
        let row: Option<DiceRollRow> = sqlx::query_as(
            "SELECT dice_type, result, modifier, purpose, rolled_at FROM dice_rolls \
             WHERE campaign_id = $1 ORDER BY rolled_at DESC, id DESC LIMIT 1",
        )
        .bind(campaign_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(DiceRollFact::from))
    }
}
