//! Push delivery

use async_trait::async_trait;

use crate::notification::PushMessage;
use crate::NotifyResult;

/// Sends a push message to a customer's devices
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, message: &PushMessage) -> NotifyResult<()>;
}

/// Writes push messages to the log instead of a provider
#[derive(Debug, Default, Clone)]
pub struct LoggingPushSender;

#[async_trait]
impl PushSender for LoggingPushSender {
    async fn send(&self, message: &PushMessage) -> NotifyResult<()> {
        tracing::info!(
            recipient = %message.recipient,
            title = %message.title,
            "push notification"
        );
        Ok(())
    }
}
