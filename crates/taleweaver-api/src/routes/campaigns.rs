//! Routes for the Session & advancement bounded context.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use taleweaver_core::campaign::Session;
use taleweaver_core::ids::CampaignId;
use taleweaver_session::domain::commands::AdvanceCampaign;
use taleweaver_session::domain::failure::AdvancementFailure;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /advance.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRequest {
    /// The campaign to advance.
    pub campaign_id: i64,
    /// The player's action.
    pub action: String,
}

/// Response body for a successful advancement.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceResponse {
    /// Always `true`.
    pub success: bool,
    /// The new session.
    pub session: Session,
    /// The campaign that advanced.
    pub campaign_id: CampaignId,
    /// Number of the new session.
    pub new_session_number: i32,
    /// True if some rewards could not be applied.
    pub rewards_partially_applied: bool,
}

/// Response body for GET /{campaign_id}/sessions/current.
#[derive(Debug, Serialize)]
pub struct CurrentSessionResponse {
    /// Always `true`.
    pub success: bool,
    /// The session the campaign pointer references.
    pub session: Session,
}

/// POST /advance
#[instrument(skip_all)]
async fn advance_campaign(
    State(state): State<AppState>,
    payload: Result<Json<AdvanceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AdvanceResponse>), ApiError> {
    let Json(request) =
        payload.map_err(|rejection| AdvancementFailure::InvalidRequest(rejection.body_text()))?;

    let command = AdvanceCampaign {
        correlation_id: Uuid::new_v4(),
        campaign_id: CampaignId(request.campaign_id),
        action: request.action,
    };

    info!(
        campaign_id = %command.campaign_id,
        correlation_id = %command.correlation_id,
        "handling advance_campaign command"
    );

    // Detached so a client disconnect cannot stop the unit of work mid-write.
    let orchestrator = Arc::clone(&state.orchestrator);
    let outcome = tokio::spawn(async move { orchestrator.advance(&command).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok((
        StatusCode::CREATED,
        Json(AdvanceResponse {
            success: true,
            campaign_id: outcome.campaign_id,
            new_session_number: outcome.new_session_number,
            rewards_partially_applied: outcome.rewards_partially_applied,
            session: outcome.session,
        }),
    ))
}

/// GET /{campaign_id}/sessions/current
#[instrument(skip(state))]
async fn current_session(
    State(state): State<AppState>,
    Path(campaign_id): Path<i64>,
) -> Result<Json<CurrentSessionResponse>, ApiError> {
    let campaign_id = CampaignId(campaign_id);
    let campaign = state
        .campaigns
        .find_campaign(campaign_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Campaign {campaign_id} was not found")))?;

    let session = state
        .sessions
        .find_session(campaign_id, campaign.current_session)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Campaign {campaign_id} has no current session"))
        })?;

    Ok(Json(CurrentSessionResponse {
        success: true,
        session,
    }))
}

/// Returns the router for the campaigns context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/advance", post(advance_campaign))
        .route("/{campaign_id}/sessions/current", get(current_session))
}
