//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message kept for a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Assigned by the store
    pub id: Option<i64>,
    pub customer_id: String,
    pub title: String,
    pub message: String,
    pub breakdown_request_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl Notification {
    pub fn new(
        customer_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            customer_id: customer_id.into(),
            title: title.into(),
            message: message.into(),
            breakdown_request_id: None,
            created_at,
            is_read: false,
        }
    }

    pub fn for_breakdown(mut self, request_id: i64) -> Self {
        self.breakdown_request_id = Some(request_id);
        self
    }

    /// Push payload mirroring this notification
    pub fn to_push(&self) -> PushMessage {
        let mut data = serde_json::Map::new();
        if let Some(request_id) = self.breakdown_request_id {
            data.insert("breakdownRequestId".into(), request_id.into());
        }
        PushMessage {
            recipient: self.customer_id.clone(),
            title: self.title.clone(),
            body: self.message.clone(),
            data: serde_json::Value::Object(data),
        }
    }
}

/// Payload handed to the push provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub recipient: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_payload_carries_request() {
        let notification =
            Notification::new("C-0001", "Driver on the way", "A driver accepted", Utc::now())
                .for_breakdown(9);
        let push = notification.to_push();
        assert_eq!(push.recipient, "C-0001");
        assert_eq!(push.data["breakdownRequestId"], 9);
    }
}
