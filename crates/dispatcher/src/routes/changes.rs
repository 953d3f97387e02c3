//! Change feed over Server-Sent Events.
//!
//! Each subscriber gets its own receiver on the database's broadcast
//! channel, filtered to one sender's rows. Events are sent with the SSE
//! event name `change` and a JSON [`ChangeEvent`](ping_core::ChangeEvent)
//! payload.
//!
//! A subscriber that falls behind the broadcast buffer has its stream
//! closed; the client reconnects and catches up through `/ping-status`.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use ping_core::{feed_channel, ChangeKind};
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use database::user;
use tracing::{info, warn};

use crate::error::{DispatchError, Result};
use crate::state::AppState;

/// SSE event name carrying a change.
pub const CHANGE_EVENT: &str = "change";

/// `GET /changes` query.
#[derive(Debug, Deserialize)]
pub struct ChangesQuery {
    /// Only rows sent by this user are delivered.
    pub sender_id: i64,
    /// Push token of `sender_id`.
    #[serde(default)]
    pub sender_token: Option<String>,
    /// Mutation kind to deliver (`INSERT`, `UPDATE`, `DELETE`); absent or
    /// `*` delivers all.
    #[serde(default)]
    pub event: Option<String>,
    /// Channel name echoed on every event. Defaults to the sender's feed channel.
    #[serde(default)]
    pub channel: Option<String>,
}

/// Subscribe to changes of one sender's pings.
pub async fn changes(
    State(state): State<AppState>,
    Query(query): Query<ChangesQuery>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let kind = match query.event.as_deref().map(str::trim) {
        None | Some("") | Some("*") => None,
        Some(raw) => Some(
            raw.parse::<ChangeKind>()
                .map_err(|e| DispatchError::BadRequest(e.to_string()))?,
        ),
    };
    let sender_id = query.sender_id;
    let token = query.sender_token.as_deref().unwrap_or_default();
    if token.trim().is_empty() {
        return Err(DispatchError::Unauthorized);
    }
    user::verify_sender(state.db.pool(), sender_id, token)
        .await?
        .ok_or(DispatchError::Unauthorized)?;

    let channel = query
        .channel
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| feed_channel(sender_id));

    let receiver = state.db.changes().subscribe();
    info!(sender_id, channel = %channel, "Change feed subscriber connected");

    let stream = BroadcastStream::new(receiver)
        .map_while(move |item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(sender_id, skipped, "Change feed subscriber lagged, closing stream");
                None
            }
        })
        .filter_map(move |event| {
            if !event.matches(sender_id, kind) {
                return None;
            }
            let event = event.on_channel(channel.clone());
            match Event::default().event(CHANGE_EVENT).json_data(&event) {
                Ok(sse) => Some(Ok(sse)),
                Err(e) => {
                    warn!(error = %e, "Failed to encode change event");
                    None
                }
            }
        });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
