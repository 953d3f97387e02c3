//! Individual ping endpoints: send and mark-read.

use axum::extract::State;
use axum::Json;
use database::{ping, user};
use ping_core::api::{
    message_or, MarkReadRequest, SendPingRequest, SendPingResponse, SuccessResponse,
    DEFAULT_PING_MESSAGE,
};
use ping_core::{Ping, PingData};
use push_gateway::PushMessage;
use tracing::{info, warn};

use crate::error::{DispatchError, Result};
use crate::state::AppState;

/// Title of the visible part of an individual ping.
pub const PING_TITLE: &str = "New Ping!";

/// Android channel individual pings are posted to.
pub const ANDROID_CHANNEL: &str = "default";

/// Android click action that opens the app.
pub const ANDROID_CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

/// APNs category carrying the "Mark as Read" action.
pub const APNS_CATEGORY: &str = "PING_CATEGORY";

/// Send a ping from one user to another.
///
/// The row is committed before delivery is attempted. Delivery failures are
/// logged and do not change the response.
pub async fn send_ping(
    State(state): State<AppState>,
    Json(req): Json<SendPingRequest>,
) -> Result<Json<SendPingResponse>> {
    let (Some(sender_id), Some(recipient_id)) = (req.sender_id, req.recipient_id) else {
        return Err(DispatchError::BadRequest(
            "sender_id and recipient_id are required".to_string(),
        ));
    };
    let token = req.sender_token.as_deref().unwrap_or_default();
    if token.trim().is_empty() {
        return Err(DispatchError::Unauthorized);
    }

    let sender = user::verify_sender(state.db.pool(), sender_id, token)
        .await?
        .ok_or(DispatchError::Unauthorized)?;

    let recipient = match user::get_user(state.db.pool(), recipient_id).await {
        Ok(recipient) => recipient,
        Err(err) if err.is_not_found() => return Err(DispatchError::NotFound("Recipient")),
        Err(err) => return Err(err.into()),
    };
    let Some(recipient_token) = recipient.push_token.clone() else {
        return Err(DispatchError::NotFound("Recipient"));
    };

    let message = message_or(req.message.as_deref(), || DEFAULT_PING_MESSAGE.to_string());
    let notification = ping::insert_ping(&state.db, sender.id, recipient.id, &message).await?;

    info!(
        notification_id = notification.id,
        sender_id = sender.id,
        recipient_id = recipient.id,
        "Ping sent"
    );

    deliver(&state, &sender.name, &recipient_token, &notification).await;

    Ok(Json(SendPingResponse {
        success: true,
        notification,
    }))
}

async fn deliver(state: &AppState, sender_name: &str, token: &str, notification: &Ping) {
    let body = format!("{}: {}", sender_name, notification.message);
    let message = PushMessage::to_token(token, PING_TITLE, body)
        .with_data(PingData::for_ping(notification).to_map())
        .with_android_channel(ANDROID_CHANNEL, ANDROID_CLICK_ACTION)
        .with_apns_category(APNS_CATEGORY);

    if let Err(e) = state.gateway.send(message).await {
        warn!(
            notification_id = notification.id,
            gateway = state.gateway.name(),
            error = %e,
            "Push delivery failed"
        );
    }
}

/// Mark a ping as read.
///
/// Idempotent, and unauthenticated: anyone holding a notification id can
/// mark it read.
pub async fn mark_read(
    State(state): State<AppState>,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<SuccessResponse>> {
    let id = req
        .notification_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| DispatchError::BadRequest("notification_id is required".to_string()))?;

    // Non-numeric ids can never match a row
    let row_id = id.as_i64().ok_or(DispatchError::NotFound("Notification"))?;

    match ping::mark_read(&state.db, row_id).await {
        Ok(_) => {
            info!(notification_id = row_id, "Ping marked read");
            Ok(Json(SuccessResponse::ok()))
        }
        Err(err) if err.is_not_found() => Err(DispatchError::NotFound("Notification")),
        Err(err) => Err(err.into()),
    }
}
