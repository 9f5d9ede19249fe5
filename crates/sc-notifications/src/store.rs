//! Notification persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;

use crate::notification::Notification;
use crate::NotifyResult;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist and return the notification with its id
    async fn save(&self, notification: &Notification) -> NotifyResult<Notification>;

    /// Newest first
    async fn for_customer(&self, customer_id: &str) -> NotifyResult<Vec<Notification>>;
}

/// In-memory notification store
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.notifications.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notifications.read().await.is_empty()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn save(&self, notification: &Notification) -> NotifyResult<Notification> {
        let mut notifications = self.notifications.write().await;
        let mut saved = notification.clone();
        saved.id = Some(notifications.len() as i64 + 1);
        notifications.push(saved.clone());
        Ok(saved)
    }

    async fn for_customer(&self, customer_id: &str) -> NotifyResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .iter()
            .rev()
            .filter(|n| n.customer_id == customer_id)
            .cloned()
            .collect())
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    notification_id: i64,
    customer_id: String,
    title: String,
    message: String,
    breakdown_request_id: Option<i64>,
    created_at: DateTime<Utc>,
    is_read: bool,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: Some(row.notification_id),
            customer_id: row.customer_id,
            title: row.title,
            message: row.message,
            breakdown_request_id: row.breakdown_request_id,
            created_at: row.created_at,
            is_read: row.is_read,
        }
    }
}

/// PostgreSQL notification store
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn save(&self, notification: &Notification) -> NotifyResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications
                (customer_id, title, message, breakdown_request_id, created_at, is_read)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING notification_id, customer_id, title, message, breakdown_request_id,
                      created_at, is_read
            "#,
        )
        .bind(&notification.customer_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.breakdown_request_id)
        .bind(notification.created_at)
        .bind(notification.is_read)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn for_customer(&self, customer_id: &str) -> NotifyResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT notification_id, customer_id, title, message, breakdown_request_id,
                   created_at, is_read
            FROM notifications
            WHERE customer_id = $1
            ORDER BY created_at DESC, notification_id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_assigns_ids() {
        let store = MemoryNotificationStore::new();
        let first = store
            .save(&Notification::new("C-0001", "a", "first", Utc::now()))
            .await
            .unwrap();
        store
            .save(&Notification::new("C-0002", "b", "other", Utc::now()))
            .await
            .unwrap();
        store
            .save(&Notification::new("C-0001", "c", "second", Utc::now()))
            .await
            .unwrap();

        assert_eq!(first.id, Some(1));
        let mine = store.for_customer("C-0001").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].message, "second");
    }
}
