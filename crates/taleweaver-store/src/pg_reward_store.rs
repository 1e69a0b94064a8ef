//! `PostgreSQL` implementation of the `RewardStore` trait.
//!
//! Every operation is a single statement or a single transaction scoped to
//! one character.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taleweaver_core::error::DomainError;
use taleweaver_core::ids::{CharacterId, ItemId};
use taleweaver_core::repository::RewardStore;
use taleweaver_core::reward::{CatalogItemSpec, Purse};
use tracing::debug;

use crate::pg_store::{PgStore, storage_error};
use crate::rows::PurseRow;

#[async_trait]
impl RewardStore for PgStore {
    async fn upsert_catalog_item(&self, item: &CatalogItemSpec) -> Result<ItemId, DomainError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO items (name, description, rarity)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.rarity.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(ItemId(id))
    }

    async fn grant_item(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
    ) -> Result<i32, DomainError> {
        sqlx::query_scalar(
            r"
            INSERT INTO character_items (character_id, item_id, quantity, equipped)
            VALUES ($1, $2, 1, FALSE)
            ON CONFLICT (character_id, item_id)
            DO UPDATE SET quantity = character_items.quantity + 1
            RETURNING quantity
            ",
        )
        .bind(character_id.0)
        .bind(item_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)
    }

    async fn apply_currency_delta(
        &self,
        character_id: CharacterId,
        delta_copper: i64,
        reason: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<Purse, DomainError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let current: Option<PurseRow> = sqlx::query_as(
            "SELECT gold, silver, copper FROM characters WHERE id = $1 FOR UPDATE",
        )
        .bind(character_id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?;
        let current = Purse::from(
            current.ok_or_else(|| DomainError::not_found("character", character_id))?,
        );

        // Rejected before any write; dropping `tx` rolls back the row lock.
        let updated = current.credit(delta_copper)?;

        sqlx::query("UPDATE characters SET gold = $2, silver = $3, copper = $4 WHERE id = $1")
            .bind(character_id.0)
            .bind(updated.gold)
            .bind(updated.silver)
            .bind(updated.copper)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        sqlx::query(
            "INSERT INTO currency_ledger (character_id, delta_copper, reason, recorded_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(character_id.0)
        .bind(delta_copper)
        .bind(reason)
        .bind(recorded_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        debug!(%character_id, delta_copper, balance = updated.total_copper(), "currency applied");
        Ok(updated)
    }

    async fn add_experience(
        &self,
        character_id: CharacterId,
        amount: i64,
    ) -> Result<i64, DomainError> {
        let total: Option<i64> = sqlx::query_scalar(
            "UPDATE characters SET experience = experience + $2 WHERE id = $1 RETURNING experience",
        )
        .bind(character_id.0)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        total.ok_or_else(|| DomainError::not_found("character", character_id))
    }

    async fn purse(&self, character_id: CharacterId) -> Result<Purse, DomainError> {
        let row: Option<PurseRow> =
            sqlx::query_as("SELECT gold, silver, copper FROM characters WHERE id = $1")
                .bind(character_id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_error)?;

        row.map(Purse::from)
            .ok_or_else(|| DomainError::not_found("character", character_id))
    }

    async fn ledger_total(&self, character_id: CharacterId) -> Result<i64, DomainError> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(delta_copper), 0)::BIGINT FROM currency_ledger WHERE character_id = $1",
        )
        .bind(character_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)
    }
}
