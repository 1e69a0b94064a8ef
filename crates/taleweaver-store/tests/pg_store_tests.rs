//! Integration tests for `PgStore`.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgPool;
use taleweaver_core::campaign::{Choice, NewSession};
use taleweaver_core::error::DomainError;
use taleweaver_core::ids::{CampaignId, CharacterId};
use taleweaver_core::repository::{CampaignReader, RewardStore, SessionStore};
use taleweaver_core::reward::{CatalogItemSpec, Purse};
use taleweaver_store::PgStore;

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, hour, 0, 0).unwrap()
}

async fn seed_campaign(pool: &PgPool, title: &str) -> CampaignId {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO campaigns (title, description) VALUES ($1, 'A drowned kingdom stirs.') RETURNING id",
    )
    .bind(title)
    .fetch_one(pool)
    .await
    .unwrap();
    CampaignId(id)
}

async fn seed_session(pool: &PgPool, campaign_id: CampaignId, number: i32, title: &str) {
    sqlx::query(
        "INSERT INTO sessions (campaign_id, session_number, title, narrative, location, experience_reward) \
         VALUES ($1, $2, $3, 'Rain drums on the shutters.', $3, 100 + 25 * $2)",
    )
    .bind(campaign_id.0)
    .bind(number)
    .bind(title)
    .execute(pool)
    .await
    .unwrap();
    sqlx::query("UPDATE campaigns SET current_session = $2 WHERE id = $1")
        .bind(campaign_id.0)
        .bind(number)
        .execute(pool)
        .await
        .unwrap();
}

async fn seed_character(
    pool: &PgPool,
    campaign_id: CampaignId,
    name: &str,
    turn_order: Option<i32>,
    is_active: bool,
) -> CharacterId {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO characters (name, race, class_name, level) VALUES ($1, 'Elf', 'Rogue', 3) RETURNING id",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO participants (campaign_id, character_id, user_id, turn_order, is_active) \
         VALUES ($1, $2, $2 * 10, $3, $4)",
    )
    .bind(campaign_id.0)
    .bind(id)
    .bind(turn_order)
    .bind(is_active)
    .execute(pool)
    .await
    .unwrap();
    CharacterId(id)
}

fn new_session(campaign_id: CampaignId, number: i32) -> NewSession {
    NewSession {
        campaign_id,
        session_number: number,
        title: "A Hidden Key".to_owned(),
        narrative: "Beneath the bar, something glints.".to_owned(),
        location: "The Tavern Cellar".to_owned(),
        choices: vec![Choice {
            action: "Pick the lock".to_owned(),
            description: "Attempt to pick the lock.".to_owned(),
            icon: "dice".to_owned(),
            requires_dice_roll: true,
            dice_type: Some("d20".to_owned()),
            roll_dc: Some(14),
            roll_modifier: Some(2),
            roll_purpose: Some("Sleight of Hand".to_owned()),
            success_text: None,
            failure_text: None,
        }],
        experience_reward: 100 + 25 * i64::from(number),
        created_at: at(10),
    }
}

// --- campaign reader ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_find_campaign_returns_none_for_unknown_id(pool: PgPool) {
    let store = PgStore::new(pool);

    let campaign = store.find_campaign(CampaignId(9_999)).await.unwrap();

    assert!(campaign.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_latest_session_is_highest_number(pool: PgPool) {
    let campaign_id = seed_campaign(&pool, "The Sunken Crown").await;
    seed_session(&pool, campaign_id, 1, "The Tavern").await;
    seed_session(&pool, campaign_id, 2, "The Cellar").await;
    let store = PgStore::new(pool);

    let latest = store.latest_session(campaign_id).await.unwrap().unwrap();
    let campaign = store.find_campaign(campaign_id).await.unwrap().unwrap();

    assert_eq!(latest.session_number, 2);
    assert_eq!(latest.title, "The Cellar");
    assert_eq!(latest.experience_reward, 150);
    assert_eq!(campaign.current_session, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_roster_orders_by_turn_and_skips_inactive(pool: PgPool) {
    let campaign_id = seed_campaign(&pool, "The Sunken Crown").await;
    let unordered = seed_character(&pool, campaign_id, "Wren", None, true).await;
    let second = seed_character(&pool, campaign_id, "Bram", Some(2), true).await;
    let first = seed_character(&pool, campaign_id, "Mira", Some(1), true).await;
    seed_character(&pool, campaign_id, "Ghost", Some(0), false).await;
    let store = PgStore::new(pool);

    let roster = store.active_roster(campaign_id).await.unwrap();

    let ids: Vec<CharacterId> = roster.iter().map(|r| r.character_id).collect();
    assert_eq!(ids, vec![first, second, unordered]);
    assert_eq!(roster[0].name, "Mira");
    assert_eq!(roster[0].user_id.0, first.0 * 10);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_latest_roll_is_most_recent(pool: PgPool) {
    let campaign_id = seed_campaign(&pool, "The Sunken Crown").await;
    for (result, hour) in [(4, 9), (20, 11), (12, 10)] {
        sqlx::query(
            "INSERT INTO dice_rolls (campaign_id, dice_type, result, modifier, purpose, rolled_at) \
             VALUES ($1, 'd20', $2, 3, 'Perception', $3)",
        )
        .bind(campaign_id.0)
        .bind(result)
        .bind(at(hour))
        .execute(&pool)
        .await
        .unwrap();
    }
    let store = PgStore::new(pool);

    let roll = store.latest_roll(campaign_id).await.unwrap().unwrap();

    assert_eq!(roll.result, 20);
    assert_eq!(roll.total(), 23);
    assert_eq!(roll.purpose.as_deref(), Some("Perception"));
}

// --- reward store ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_catalog_upsert_is_idempotent_by_name(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let spec = CatalogItemSpec {
        name: "Rusty Key".to_owned(),
        description: "Cold iron.".to_owned(),
        rarity: Some("common".to_owned()),
    };

    let first = store.upsert_catalog_item(&spec).await.unwrap();
    let second = store.upsert_catalog_item(&spec).await.unwrap();

    assert_eq!(first, second);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE name = 'Rusty Key'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_grant_item_increments_quantity(pool: PgPool) {
    let campaign_id = seed_campaign(&pool, "The Sunken Crown").await;
    let mira = seed_character(&pool, campaign_id, "Mira", Some(1), true).await;
    let store = PgStore::new(pool.clone());
    let item_id = store
        .upsert_catalog_item(&CatalogItemSpec {
            name: "Lantern".to_owned(),
            description: String::new(),
            rarity: None,
        })
        .await
        .unwrap();

    assert_eq!(store.grant_item(mira, item_id).await.unwrap(), 1);
    assert_eq!(store.grant_item(mira, item_id).await.unwrap(), 2);

    let equipped: bool = sqlx::query_scalar(
        "SELECT equipped FROM character_items WHERE character_id = $1 AND item_id = $2",
    )
    .bind(mira.0)
    .bind(item_id.0)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(!equipped);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_currency_balance_matches_ledger(pool: PgPool) {
    let campaign_id = seed_campaign(&pool, "The Sunken Crown").await;
    let mira = seed_character(&pool, campaign_id, "Mira", Some(1), true).await;
    let store = PgStore::new(pool);

    for delta in [250, 7, -57] {
        store
            .apply_currency_delta(mira, delta, "Reward from adventure: Coins", at(10))
            .await
            .unwrap();
    }

    let purse = store.purse(mira).await.unwrap();
    assert_eq!(
        purse,
        Purse {
            gold: 2,
            silver: 0,
            copper: 0
        }
    );
    assert_eq!(store.ledger_total(mira).await.unwrap(), purse.total_copper());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_overdraft_leaves_balance_and_ledger_untouched(pool: PgPool) {
    let campaign_id = seed_campaign(&pool, "The Sunken Crown").await;
    let mira = seed_character(&pool, campaign_id, "Mira", Some(1), true).await;
    let store = PgStore::new(pool);
    store
        .apply_currency_delta(mira, 15, "Reward from adventure: Coins", at(10))
        .await
        .unwrap();

    let result = store
        .apply_currency_delta(mira, -20, "Reward from adventure: Toll", at(11))
        .await;

    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert_eq!(store.purse(mira).await.unwrap().total_copper(), 15);
    assert_eq!(store.ledger_total(mira).await.unwrap(), 15);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_add_experience_accumulates(pool: PgPool) {
    let campaign_id = seed_campaign(&pool, "The Sunken Crown").await;
    let mira = seed_character(&pool, campaign_id, "Mira", Some(1), true).await;
    let store = PgStore::new(pool);

    store.add_experience(mira, 40).await.unwrap();
    let total = store.add_experience(mira, 60).await.unwrap();

    assert_eq!(total, 100);
    assert!(matches!(
        store.add_experience(CharacterId(9_999), 1).await,
        Err(DomainError::NotFound { .. })
    ));
}

// --- session store ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_advance_transaction_commits_all_writes(pool: PgPool) {
    let campaign_id = seed_campaign(&pool, "The Sunken Crown").await;
    seed_session(&pool, campaign_id, 1, "The Tavern").await;
    let store = PgStore::new(pool);

    let mut tx = store.begin_advance(campaign_id).await.unwrap();
    assert_eq!(tx.latest_session_number().await.unwrap(), Some(1));
    tx.complete_session(1, at(10)).await.unwrap();
    let inserted = tx.insert_session(&new_session(campaign_id, 2)).await.unwrap();
    tx.set_current_session(2).await.unwrap();
    tx.commit().await.unwrap();

    let previous = store.find_session(campaign_id, 1).await.unwrap().unwrap();
    let current = store.find_session(campaign_id, 2).await.unwrap().unwrap();
    let campaign = store.find_campaign(campaign_id).await.unwrap().unwrap();
    assert!(previous.is_completed);
    assert_eq!(previous.completed_at, Some(at(10)));
    assert_eq!(current, inserted);
    assert_eq!(current.choices[0].roll_dc, Some(14));
    assert_eq!(campaign.current_session, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_dropped_transaction_discards_writes(pool: PgPool) {
    let campaign_id = seed_campaign(&pool, "The Sunken Crown").await;
    seed_session(&pool, campaign_id, 1, "The Tavern").await;
    let store = PgStore::new(pool);

    {
        let mut tx = store.begin_advance(campaign_id).await.unwrap();
        tx.insert_session(&new_session(campaign_id, 2)).await.unwrap();
        tx.set_current_session(2).await.unwrap();
    }

    assert!(store.find_session(campaign_id, 2).await.unwrap().is_none());
    let campaign = store.find_campaign(campaign_id).await.unwrap().unwrap();
    assert_eq!(campaign.current_session, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_second_advance_waits_for_campaign_row_lock(pool: PgPool) {
    let campaign_id = seed_campaign(&pool, "The Sunken Crown").await;
    seed_session(&pool, campaign_id, 1, "The Tavern").await;
    let store = PgStore::new(pool);

    let mut first = store.begin_advance(campaign_id).await.unwrap();
    let contender = store.clone();
    let second = tokio::spawn(async move {
        let mut tx = contender.begin_advance(campaign_id).await.unwrap();
        let latest = tx.latest_session_number().await.unwrap();
        tx.commit().await.unwrap();
        latest
    });

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!second.is_finished());

    first.insert_session(&new_session(campaign_id, 2)).await.unwrap();
    first.set_current_session(2).await.unwrap();
    first.commit().await.unwrap();

    assert_eq!(second.await.unwrap(), Some(2));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_duplicate_session_number_is_conflict(pool: PgPool) {
    let campaign_id = seed_campaign(&pool, "The Sunken Crown").await;
    seed_session(&pool, campaign_id, 1, "The Tavern").await;
    let store = PgStore::new(pool);

    let mut tx = store.begin_advance(campaign_id).await.unwrap();
    let result = tx.insert_session(&new_session(campaign_id, 1)).await;

    assert!(matches!(result, Err(DomainError::Conflict(_))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_begin_advance_on_unknown_campaign_is_not_found(pool: PgPool) {
    let store = PgStore::new(pool);

    let result = store.begin_advance(CampaignId(9_999)).await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}
