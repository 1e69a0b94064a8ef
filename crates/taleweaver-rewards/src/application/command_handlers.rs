//! Command handlers for the Reward settlement context.
//!
//! Settlement broadcasts every reward to every recipient. Each
//! character×reward pair is applied on its own; a failure is logged,
//! recorded in the report and skipped, and settlement moves on.

use taleweaver_core::campaign::RosterEntry;
use taleweaver_core::clock::Clock;
use taleweaver_core::command::Command;
use taleweaver_core::error::DomainError;
use taleweaver_core::ids::ItemId;
use taleweaver_core::repository::RewardStore;
use taleweaver_core::reward::{CatalogItemSpec, RewardDescriptor, RewardKind};
use tracing::{info, instrument, warn};

use crate::domain::commands::SettleRewards;
use crate::domain::settlement::{AppliedReward, PairOutcome, SettlementReport, ledger_reason};

/// Resolves an item reward to a catalog id, creating the catalog entry on
/// first sight. Done once per reward, not once per character.
async fn resolve_item(
    reward: &RewardDescriptor,
    store: &dyn RewardStore,
) -> Result<ItemId, DomainError> {
    let spec = CatalogItemSpec {
        name: reward.name.trim().to_owned(),
        description: reward.description.clone(),
        rarity: reward.rarity.clone(),
    };
    store.upsert_catalog_item(&spec).await
}

async fn apply_pair(
    recipient: &RosterEntry,
    reward: &RewardDescriptor,
    item: Option<&Result<ItemId, String>>,
    clock: &dyn Clock,
    store: &dyn RewardStore,
) -> Result<AppliedReward, String> {
    let character_id = recipient.character_id;
    match reward.kind {
        RewardKind::Currency => store
            .apply_currency_delta(
                character_id,
                reward.value,
                &ledger_reason(&reward.name),
                clock.now(),
            )
            .await
            .map(|purse| AppliedReward::Currency { purse })
            .map_err(|e| e.to_string()),
        RewardKind::Item => {
            let item_id = match item {
                Some(Ok(item_id)) => *item_id,
                Some(Err(reason)) => return Err(reason.clone()),
                None => return Err("item was not resolved".to_owned()),
            };
            store
                .grant_item(character_id, item_id)
                .await
                .map(|quantity| AppliedReward::Item { item_id, quantity })
                .map_err(|e| e.to_string())
        }
        RewardKind::Experience => {
            if reward.value < 0 {
                return Err(format!("experience reward cannot be negative: {}", reward.value));
            }
            store
                .add_experience(character_id, reward.value)
                .await
                .map(|total| AppliedReward::Experience { total })
                .map_err(|e| e.to_string())
        }
    }
}

/// Handles the `SettleRewards` command.
///
/// Never fails as a whole: every pair's result, success or failure, is in
/// the returned report.
#[instrument(
    skip_all,
    fields(
        campaign_id = %command.campaign_id,
        correlation_id = %command.correlation_id(),
        rewards = command.rewards.len(),
        recipients = command.recipients.len(),
    )
)]
pub async fn handle_settle_rewards(
    command: &SettleRewards,
    clock: &dyn Clock,
    store: &dyn RewardStore,
) -> SettlementReport {
    let mut report = SettlementReport::default();

    for reward in &command.rewards {
        let item = if reward.kind == RewardKind::Item {
            Some(resolve_item(reward, store).await.map_err(|e| e.to_string()))
        } else {
            None
        };

        for recipient in &command.recipients {
            let result = apply_pair(recipient, reward, item.as_ref(), clock, store).await;
            if let Err(reason) = &result {
                warn!(
                    character_id = %recipient.character_id,
                    reward = %reward.name,
                    kind = reward.kind.as_str(),
                    %reason,
                    "reward settlement failed for character"
                );
            }
            report.outcomes.push(PairOutcome {
                character_id: recipient.character_id,
                reward_name: reward.name.clone(),
                kind: reward.kind,
                result,
            });
        }
    }

    info!(
        command_type = command.command_type(),
        applied = report.applied_count(),
        failed = report.failed_count(),
        "rewards settled"
    );
    report
}

#[cfg(test)]
mod tests {
    use taleweaver_core::ids::{CampaignId, CharacterId, UserId};
    use taleweaver_core::repository::RewardStore;
    use taleweaver_core::reward::Purse;
    use taleweaver_test_support::{FixedClock, InMemoryStore};
    use uuid::Uuid;

    use super::*;

    fn reward(kind: RewardKind, name: &str, value: i64) -> RewardDescriptor {
        RewardDescriptor {
            kind,
            name: name.to_owned(),
            description: format!("A {name}."),
            value,
            rarity: None,
        }
    }

    fn recipient(store: &InMemoryStore, name: &str) -> RosterEntry {
        let character_id = store.add_character(name, "Human", "Fighter", 1);
        RosterEntry {
            character_id,
            user_id: UserId(character_id.0 * 10),
            name: name.to_owned(),
            race: "Human".to_owned(),
            class_name: "Fighter".to_owned(),
            level: 1,
            turn_order: None,
        }
    }

    fn command(rewards: Vec<RewardDescriptor>, recipients: Vec<RosterEntry>) -> SettleRewards {
        SettleRewards {
            correlation_id: Uuid::new_v4(),
            campaign_id: CampaignId(1),
            rewards,
            recipients,
        }
    }

    #[tokio::test]
    async fn test_every_recipient_receives_every_reward() {
        // Arrange
        let store = InMemoryStore::new();
        let clock = FixedClock::standard();
        let mira = recipient(&store, "Mira");
        let bram = recipient(&store, "Bram");
        let cmd = command(
            vec![
                reward(RewardKind::Currency, "Pouch of Coins", 250),
                reward(RewardKind::Item, "Rusty Key", 0),
                reward(RewardKind::Experience, "Clever Thinking", 40),
            ],
            vec![mira.clone(), bram.clone()],
        );

        // Act
        let report = handle_settle_rewards(&cmd, &clock, &store).await;

        // Assert
        assert!(!report.partial_failure());
        assert_eq!(report.applied_count(), 6);
        for character_id in [mira.character_id, bram.character_id] {
            assert_eq!(
                store.purse(character_id).await.unwrap(),
                Purse {
                    gold: 2,
                    silver: 5,
                    copper: 0
                }
            );
            assert_eq!(
                store.inventory(character_id),
                vec![("Rusty Key".to_owned(), 1, false)]
            );
            assert_eq!(store.experience(character_id), 40);
            let ledger = store.ledger(character_id);
            assert_eq!(ledger.len(), 1);
            assert_eq!(ledger[0].reason, "Reward from adventure: Pouch of Coins");
            assert_eq!(ledger[0].recorded_at, clock.0);
        }
        assert_eq!(store.catalog_count("Rusty Key"), 1);
    }

    #[tokio::test]
    async fn test_existing_catalog_item_is_reused_and_quantity_incremented() {
        // Arrange
        let store = InMemoryStore::new();
        let clock = FixedClock::standard();
        store.add_catalog_item("Rusty Key", "Already known.", Some("common"));
        let mira = recipient(&store, "Mira");
        let cmd = command(
            vec![reward(RewardKind::Item, "Rusty Key", 0)],
            vec![mira.clone()],
        );

        // Act
        handle_settle_rewards(&cmd, &clock, &store).await;
        let second = handle_settle_rewards(&cmd, &clock, &store).await;

        // Assert
        assert_eq!(store.catalog_count("Rusty Key"), 1);
        assert_eq!(
            store.inventory(mira.character_id),
            vec![("Rusty Key".to_owned(), 2, false)]
        );
        match &second.outcomes[0].result {
            Ok(AppliedReward::Item { quantity, .. }) => assert_eq!(*quantity, 2),
            other => panic!("expected item grant, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ledger_sum_matches_balance_after_many_rewards() {
        let store = InMemoryStore::new();
        let clock = FixedClock::standard();
        let mira = recipient(&store, "Mira");

        for value in [7, 130, 1_005, 42] {
            let cmd = command(
                vec![reward(RewardKind::Currency, "Coins", value)],
                vec![mira.clone()],
            );
            handle_settle_rewards(&cmd, &clock, &store).await;
        }

        let purse = store.purse(mira.character_id).await.unwrap();
        let ledger_total = store.ledger_total(mira.character_id).await.unwrap();
        assert_eq!(purse.total_copper(), 1_184);
        assert_eq!(purse.total_copper(), ledger_total);
    }

    #[tokio::test]
    async fn test_failure_for_one_character_does_not_stop_others() {
        // Arrange
        let store = InMemoryStore::new();
        let clock = FixedClock::standard();
        let mira = recipient(&store, "Mira");
        let bram = recipient(&store, "Bram");
        store.fail_rewards_for(mira.character_id);
        let cmd = command(
            vec![
                reward(RewardKind::Currency, "Coins", 10),
                reward(RewardKind::Item, "Lantern", 0),
            ],
            vec![mira.clone(), bram.clone()],
        );

        // Act
        let report = handle_settle_rewards(&cmd, &clock, &store).await;

        // Assert
        assert!(report.partial_failure());
        assert_eq!(report.failed_count(), 2);
        assert!(report.for_character(mira.character_id).all(|o| o.result.is_err()));
        assert!(report.for_character(bram.character_id).all(|o| o.result.is_ok()));
        assert_eq!(store.inventory(bram.character_id).len(), 1);
        assert!(store.ledger(mira.character_id).is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_item_fails_for_everyone_but_other_rewards_apply() {
        let store = InMemoryStore::new();
        let clock = FixedClock::standard();
        let mira = recipient(&store, "Mira");
        store.fail_catalog_item("Cursed Idol");
        let cmd = command(
            vec![
                reward(RewardKind::Item, "Cursed Idol", 0),
                reward(RewardKind::Experience, "Survival", 25),
            ],
            vec![mira.clone()],
        );

        let report = handle_settle_rewards(&cmd, &clock, &store).await;

        assert!(report.partial_failure());
        assert_eq!(report.failed_count(), 1);
        assert_eq!(store.experience(mira.character_id), 25);
        assert_eq!(store.catalog_count("Cursed Idol"), 0);
    }

    #[tokio::test]
    async fn test_overdraft_is_rejected_without_touching_ledger() {
        let store = InMemoryStore::new();
        let clock = FixedClock::standard();
        let mira = recipient(&store, "Mira");
        let cmd = command(
            vec![reward(RewardKind::Currency, "Toll", -5)],
            vec![mira.clone()],
        );

        let report = handle_settle_rewards(&cmd, &clock, &store).await;

        assert!(report.partial_failure());
        assert_eq!(store.purse(mira.character_id).await.unwrap(), Purse::default());
        assert_eq!(store.ledger_total(mira.character_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_no_recipients_settles_nothing() {
        let store = InMemoryStore::new();
        let clock = FixedClock::standard();
        let cmd = command(vec![reward(RewardKind::Currency, "Coins", 10)], Vec::new());

        let report = handle_settle_rewards(&cmd, &clock, &store).await;

        assert!(report.outcomes.is_empty());
        assert!(!report.partial_failure());
    }

    #[tokio::test]
    async fn test_negative_experience_is_rejected() {
        let store = InMemoryStore::new();
        let clock = FixedClock::standard();
        let mira = recipient(&store, "Mira");
        let cmd = command(
            vec![reward(RewardKind::Experience, "Shame", -10)],
            vec![mira.clone()],
        );

        let report = handle_settle_rewards(&cmd, &clock, &store).await;

        assert!(report.partial_failure());
        assert_eq!(store.experience(mira.character_id), 0);
        assert_eq!(report.for_character(CharacterId(mira.character_id.0)).count(), 1);
    }
}
