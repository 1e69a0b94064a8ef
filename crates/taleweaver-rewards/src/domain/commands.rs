//! Commands for the Reward settlement context.

use taleweaver_core::campaign::RosterEntry;
use taleweaver_core::command::Command;
use taleweaver_core::ids::CampaignId;
use taleweaver_core::reward::RewardDescriptor;
use uuid::Uuid;

/// Command to hand every reward to every recipient.
#[derive(Debug, Clone)]
pub struct SettleRewards {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Campaign the rewards were earned in.
    pub campaign_id: CampaignId,
    /// Rewards produced by the narrator.
    pub rewards: Vec<RewardDescriptor>,
    /// Active party members, each of whom receives every reward.
    pub recipients: Vec<RosterEntry>,
}

impl Command for SettleRewards {
    fn command_type(&self) -> &'static str {
        "rewards.settle"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
