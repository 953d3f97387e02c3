//! Group ping endpoint.

use axum::extract::State;
use axum::Json;
use database::user;
use database::validation::validate_topic;
use ping_core::api::{default_group_message, message_or, GroupPingRequest, GroupPingResponse};
use tracing::info;

use crate::error::{DispatchError, Result};
use crate::state::AppState;

/// Title of a group ping.
pub const GROUP_TITLE: &str = "Group Ping";

/// Broadcast a ping to every device subscribed to a topic.
///
/// No rows are written and nothing is read-tracked.
pub async fn send_group_ping(
    State(state): State<AppState>,
    Json(req): Json<GroupPingRequest>,
) -> Result<Json<GroupPingResponse>> {
    let token = req.sender_token.as_deref().unwrap_or_default();
    if token.is_empty() {
        return Err(DispatchError::Unauthorized);
    }
    let sender = user::find_by_push_token(state.db.pool(), token)
        .await?
        .ok_or(DispatchError::Unauthorized)?;

    let topic = req
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DispatchError::BadRequest("topic is required".to_string()))?;
    validate_topic(topic).map_err(|e| DispatchError::BadRequest(e.to_string()))?;

    let message = message_or(req.message.as_deref(), || default_group_message(topic));

    state.gateway.broadcast(topic, GROUP_TITLE, &message).await?;

    info!(sender_id = sender.id, topic, "Group ping sent");

    Ok(Json(GroupPingResponse {
        success: true,
        message: "Group ping sent".to_string(),
    }))
}
