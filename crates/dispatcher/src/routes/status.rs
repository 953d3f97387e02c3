//! Ping status lookup, used by clients to backfill read receipts missed
//! while their change-feed subscription was down.

use axum::extract::State;
use axum::Json;
use database::{ping, user};
use ping_core::api::{PingStatusEntry, PingStatusRequest, PingStatusResponse, MAX_STATUS_IDS};
use tracing::debug;

use crate::error::{DispatchError, Result};
use crate::state::AppState;

/// Report the current status of pings the caller sent.
///
/// Ids that are unknown, swept, non-numeric or sent by someone else are
/// left out of the response.
pub async fn ping_status(
    State(state): State<AppState>,
    Json(req): Json<PingStatusRequest>,
) -> Result<Json<PingStatusResponse>> {
    let sender_id = req
        .sender_id
        .ok_or_else(|| DispatchError::BadRequest("sender_id is required".to_string()))?;
    if req.notification_ids.len() > MAX_STATUS_IDS {
        return Err(DispatchError::BadRequest(format!(
            "at most {} notification_ids per request",
            MAX_STATUS_IDS
        )));
    }

    let token = req.sender_token.as_deref().unwrap_or_default();
    if token.trim().is_empty() {
        return Err(DispatchError::Unauthorized);
    }
    user::verify_sender(state.db.pool(), sender_id, token)
        .await?
        .ok_or(DispatchError::Unauthorized)?;

    let ids: Vec<i64> = req
        .notification_ids
        .iter()
        .filter_map(|id| id.as_i64())
        .collect();
    let pings = ping::pings_for_sender(state.db.pool(), sender_id, &ids).await?;

    debug!(sender_id, requested = ids.len(), found = pings.len(), "Ping status lookup");

    Ok(Json(PingStatusResponse {
        success: true,
        statuses: pings
            .into_iter()
            .map(|p| PingStatusEntry {
                id: p.notification_id(),
                status: p.status,
            })
            .collect(),
    }))
}
