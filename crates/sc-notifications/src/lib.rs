//! # sc-notifications
//!
//! Customer notifications for Service Center RS.
//!
//! A notification is persisted as a record the customer can read later and
//! also sent as a push message. Both steps are best-effort: the [`Notifier`]
//! logs failures and never reports them to the operation that triggered it.

pub mod notification;
pub mod store;
pub mod push;
pub mod notifier;

pub use notification::{Notification, PushMessage};
pub use store::{MemoryNotificationStore, NotificationStore, PgNotificationStore};
pub use push::{LoggingPushSender, PushSender};
pub use notifier::{Delivery, Notifier};

/// Notification errors
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification store failed: {0}")]
    Store(String),
    #[error("Push delivery failed: {0}")]
    Push(String),
}

impl From<sqlx::Error> for NotifyError {
    fn from(err: sqlx::Error) -> Self {
        NotifyError::Store(err.to_string())
    }
}

pub type NotifyResult<T> = Result<T, NotifyError>;
