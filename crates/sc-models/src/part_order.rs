//! Part orders raised by mechanics and settled by cashiers
//!
//! ```text
//! Sent -> Approved   (terminal)
//! Sent -> Rejected   (terminal)
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UnknownStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Sent,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Sent => "Sent",
            OrderStatus::Approved => "Approved",
            OrderStatus::Rejected => "Rejected",
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, OrderStatus::Sent)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Sent" => Ok(OrderStatus::Sent),
            "Approved" => Ok(OrderStatus::Approved),
            "Rejected" => Ok(OrderStatus::Rejected),
            other => Err(UnknownStatus {
                kind: "order status",
                value: other.to_string(),
            }),
        }
    }
}

/// One requested part, tied to the service record it is for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub service_record_id: i64,
    pub part_id: String,
    pub quantity: i32,
}

/// Part order (`PO-0001`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartOrder {
    pub id: String,
    pub job_card_id: String,
    pub requested_by: String,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub lines: Vec<OrderLine>,
}

impl PartOrder {
    /// Cashier and instant that settled the order, if any
    pub fn decision(&self) -> Option<(&str, DateTime<Utc>)> {
        match self.status {
            OrderStatus::Approved => self.approved_by.as_deref().zip(self.approved_at),
            OrderStatus::Rejected => self.rejected_by.as_deref().zip(self.rejected_at),
            OrderStatus::Sent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_states() {
        assert!(!OrderStatus::Sent.is_final());
        assert!(OrderStatus::Approved.is_final());
        assert!(OrderStatus::Rejected.is_final());
    }

    #[test]
    fn test_decision() {
        let now = Utc::now();
        let mut order = PartOrder {
            id: "PO-0001".into(),
            job_card_id: "JC-0001".into(),
            requested_by: "M-001".into(),
            status: OrderStatus::Sent,
            order_date: now,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            lines: vec![],
        };
        assert_eq!(order.decision(), None);

        order.status = OrderStatus::Rejected;
        order.rejected_by = Some("C-001".into());
        order.rejected_at = Some(now);
        assert_eq!(order.decision(), Some(("C-001", now)));
    }
}
