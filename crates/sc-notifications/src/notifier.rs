//! Best-effort customer notification

use std::sync::Arc;

use crate::notification::Notification;
use crate::push::PushSender;
use crate::store::NotificationStore;

/// Which steps of a notification went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delivery {
    pub stored: bool,
    pub pushed: bool,
}

/// Persists a record and sends a push; failures are logged and swallowed
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn NotificationStore>,
    push: Arc<dyn PushSender>,
}

impl Notifier {
    pub fn new(store: Arc<dyn NotificationStore>, push: Arc<dyn PushSender>) -> Self {
        Self { store, push }
    }

    pub async fn notify(&self, notification: Notification) -> Delivery {
        let mut delivery = Delivery::default();

        match self.store.save(&notification).await {
            Ok(_) => delivery.stored = true,
            Err(e) => tracing::warn!(
                customer_id = %notification.customer_id,
                error = %e,
                "failed to store notification"
            ),
        }

        match self.push.send(&notification.to_push()).await {
            Ok(()) => delivery.pushed = true,
            Err(e) => tracing::warn!(
                customer_id = %notification.customer_id,
                error = %e,
                "failed to send push notification"
            ),
        }

        delivery
    }
}
