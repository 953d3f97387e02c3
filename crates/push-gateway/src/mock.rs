//! Recording gateway for tests.
//!
//! Available with the `mock` feature.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::gateway::PushGateway;
use crate::types::{PushMessage, SendReceipt, Target};

/// A gateway that records every message instead of delivering it.
///
/// Clones share the recording, so a test can keep one handle and give
/// another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingGateway {
    messages: Arc<Mutex<Vec<PushMessage>>>,
    failing: Arc<AtomicBool>,
    next_id: Arc<AtomicU64>,
}

impl RecordingGateway {
    /// Create a gateway that accepts every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gateway that rejects every message.
    pub fn failing() -> Self {
        let gateway = Self::default();
        gateway.set_failing(true);
        gateway
    }

    /// Switch between accepting and rejecting messages.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every accepted message, in send order.
    pub fn messages(&self) -> Vec<PushMessage> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Accepted messages addressed to a device token.
    pub fn sent_to(&self, token: &str) -> Vec<PushMessage> {
        self.messages()
            .into_iter()
            .filter(|m| matches!(&m.target, Target::Token(t) if t == token))
            .collect()
    }

    /// Accepted topic broadcasts.
    pub fn broadcasts(&self) -> Vec<PushMessage> {
        self.messages()
            .into_iter()
            .filter(PushMessage::is_broadcast)
            .collect()
    }
}

#[async_trait]
impl PushGateway for RecordingGateway {
    async fn send(&self, message: PushMessage) -> Result<SendReceipt, GatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("recording gateway set to fail".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }

        Ok(SendReceipt {
            name: format!("projects/test/messages/{}", id),
        })
    }

    fn name(&self) -> &str {
        "RecordingGateway"
    }
}
