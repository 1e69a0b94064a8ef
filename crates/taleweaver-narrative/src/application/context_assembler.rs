//! Context Assembler.
//!
//! Reads everything the narrator needs about a campaign and freezes it into a
//! [`ContextBundle`]. Performs no writes.

use taleweaver_core::error::DomainError;
use taleweaver_core::ids::CampaignId;
use taleweaver_core::repository::CampaignReader;
use thiserror::Error;
use tracing::debug;

use crate::domain::context::{ContextBundle, SessionSnapshot, describe_roll};

/// Why a context bundle could not be built.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The campaign does not exist.
    #[error("campaign {0} does not exist")]
    CampaignNotFound(CampaignId),

    /// The campaign has no session to advance from.
    #[error("campaign {0} has no active session")]
    NoActiveSession(CampaignId),

    /// A read failed.
    #[error(transparent)]
    Storage(#[from] DomainError),
}

/// Builds the context bundle for `campaign_id`.
///
/// # Errors
///
/// Returns `ContextError::CampaignNotFound` for an unknown campaign,
/// `ContextError::NoActiveSession` if it has no sessions yet, and
/// `ContextError::Storage` if a read fails.
pub async fn assemble_context(
    campaign_id: CampaignId,
    reader: &dyn CampaignReader,
) -> Result<ContextBundle, ContextError> {
    let campaign = reader
        .find_campaign(campaign_id)
        .await?
        .ok_or(ContextError::CampaignNotFound(campaign_id))?;

    let session = reader
        .latest_session(campaign_id)
        .await?
        .ok_or(ContextError::NoActiveSession(campaign_id))?;

    let roster = reader.active_roster(campaign_id).await?;
    let last_roll = reader
        .latest_roll(campaign_id)
        .await?
        .map(|roll| describe_roll(&roll));

    debug!(
        %campaign_id,
        session_number = session.session_number,
        party_size = roster.len(),
        has_roll = last_roll.is_some(),
        "assembled narrator context"
    );

    Ok(ContextBundle {
        campaign_id,
        campaign_title: campaign.title,
        campaign_description: campaign.description,
        roster,
        current_session: SessionSnapshot::from(&session),
        last_roll,
    })
}
