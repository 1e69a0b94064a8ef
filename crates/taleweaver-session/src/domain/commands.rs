//! Commands for the Session & advancement context.

use taleweaver_core::command::Command;
use taleweaver_core::ids::CampaignId;
use uuid::Uuid;

/// Longest action text accepted, in characters.
pub const MAX_ACTION_CHARS: usize = 2_000;

/// Command to advance a campaign to its next session.
#[derive(Debug, Clone)]
pub struct AdvanceCampaign {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The campaign to advance.
    pub campaign_id: CampaignId,
    /// What the player does, in their own words.
    pub action: String,
}

impl Command for AdvanceCampaign {
    fn command_type(&self) -> &'static str {
        "session.advance_campaign"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
