//! The PushGateway trait definition.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{PushMessage, SendReceipt};

/// A trait for handing messages to a push-notification provider.
///
/// Implementations must be safe for concurrent use; the dispatcher shares
/// one gateway across every request handler. This trait is object-safe and
/// can be used with `Arc<dyn PushGateway>`.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Send one message to its target.
    ///
    /// # Returns
    ///
    /// The provider's receipt, or an error if the provider did not accept
    /// the message.
    async fn send(&self, message: PushMessage) -> Result<SendReceipt, GatewayError>;

    /// Get a human-readable name for this gateway implementation.
    fn name(&self) -> &str;

    /// Broadcast a visible message to every subscriber of `topic`.
    async fn broadcast(
        &self,
        topic: &str,
        title: &str,
        body: &str,
    ) -> Result<SendReceipt, GatewayError> {
        self.send(PushMessage::to_topic(topic, title, body)).await
    }
}
