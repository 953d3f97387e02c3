//! Server-Sent Events client for the dispatcher's change feed.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use ping_core::ChangeEvent;
use reqwest_eventsource::retry::Never;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};

/// SSE event name the dispatcher uses for row changes.
pub const CHANGE_EVENT: &str = "change";

/// Something that happened on the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// The connection is open; events from here on are delivered.
    Opened,
    /// A row changed.
    Change(ChangeEvent),
}

/// One connection to the change feed.
///
/// The stream ends after the first error; reconnecting is the caller's job,
/// so it can backfill whatever the gap swallowed.
pub struct ChangeStream {
    event_source: EventSource,
}

impl ChangeStream {
    /// Open a connection to `url`.
    ///
    /// `http` must not have a request timeout; the connection is long-lived.
    pub fn connect(http: &reqwest::Client, url: &str) -> Result<Self> {
        // The query carries the sender's token
        let endpoint = url.split('?').next().unwrap_or(url);
        info!("Creating SSE connection to {}", endpoint);

        let mut event_source = http
            .get(url)
            .eventsource()
            .map_err(|e| ClientError::Feed(e.to_string()))?;
        event_source.set_retry_policy(Box::new(Never));

        Ok(Self { event_source })
    }

    /// Close the connection.
    pub fn close(&mut self) {
        self.event_source.close();
    }
}

impl Stream for ChangeStream {
    type Item = Result<FeedEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.event_source).poll_next(cx) {
                Poll::Ready(Some(Ok(Event::Open))) => {
                    debug!("SSE connection opened");
                    return Poll::Ready(Some(Ok(FeedEvent::Opened)));
                }
                Poll::Ready(Some(Ok(Event::Message(msg)))) => {
                    if msg.event != CHANGE_EVENT {
                        debug!("Ignoring SSE event type: {}", msg.event);
                        continue;
                    }
                    match serde_json::from_str::<ChangeEvent>(&msg.data) {
                        Ok(event) => return Poll::Ready(Some(Ok(FeedEvent::Change(event)))),
                        Err(e) => {
                            warn!("Failed to parse change event: {}", e);
                            debug!("Raw data: {}", msg.data);
                            continue;
                        }
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    self.event_source.close();
                    return Poll::Ready(Some(Err(ClientError::Feed(e.to_string()))));
                }
                Poll::Ready(None) => {
                    info!("SSE stream ended");
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
