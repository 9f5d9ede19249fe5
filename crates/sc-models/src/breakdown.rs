//! Roadside breakdown requests handled by drivers
//!
//! ```text
//! Pending    -> InProgress         (accept)
//! InProgress -> Completed          (complete)
//! InProgress -> Cancelled          (cancel)
//! Completed  -> Invoice Generated  (invoice)
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::UnknownStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakdownStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    #[serde(rename = "Invoice Generated")]
    InvoiceGenerated,
}

impl BreakdownStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakdownStatus::Pending => "Pending",
            BreakdownStatus::InProgress => "InProgress",
            BreakdownStatus::Completed => "Completed",
            BreakdownStatus::Cancelled => "Cancelled",
            BreakdownStatus::InvoiceGenerated => "Invoice Generated",
        }
    }

    /// Next status for `action`, or why the move is illegal
    pub fn apply(self, action: BreakdownAction) -> Result<BreakdownStatus, TransitionError> {
        use BreakdownAction::*;
        use BreakdownStatus::*;

        match (self, action) {
            (Pending, Accept) => Ok(InProgress),
            (InProgress, Complete) => Ok(Completed),
            (InProgress, Cancel) => Ok(Cancelled),
            (Completed, Invoice) => Ok(InvoiceGenerated),
            (from, action) => Err(TransitionError { from, action }),
        }
    }

    /// The status a conditional write must still see for `action`
    pub fn required_for(action: BreakdownAction) -> BreakdownStatus {
        match action {
            BreakdownAction::Accept => BreakdownStatus::Pending,
            BreakdownAction::Complete | BreakdownAction::Cancel => BreakdownStatus::InProgress,
            BreakdownAction::Invoice => BreakdownStatus::Completed,
        }
    }
}

impl fmt::Display for BreakdownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BreakdownStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(BreakdownStatus::Pending),
            "InProgress" | "In Progress" => Ok(BreakdownStatus::InProgress),
            "Completed" => Ok(BreakdownStatus::Completed),
            "Cancelled" => Ok(BreakdownStatus::Cancelled),
            "Invoice Generated" => Ok(BreakdownStatus::InvoiceGenerated),
            other => Err(UnknownStatus {
                kind: "breakdown status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakdownAction {
    Accept,
    Complete,
    Cancel,
    Invoice,
}

impl BreakdownAction {
    pub fn verb(&self) -> &'static str {
        match self {
            BreakdownAction::Accept => "accept",
            BreakdownAction::Complete => "complete",
            BreakdownAction::Cancel => "cancel",
            BreakdownAction::Invoice => "invoice",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {} a request that is {from}", .action.verb())]
pub struct TransitionError {
    pub from: BreakdownStatus,
    pub action: BreakdownAction,
}

/// Customer's roadside-assistance request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRequest {
    pub id: i64,
    pub customer_id: Option<String>,
    pub driver_id: Option<String>,
    pub location: String,
    pub description: Option<String>,
    pub status: BreakdownStatus,
    pub request_time: DateTime<Utc>,
    pub accepted_time: Option<DateTime<Utc>>,
    pub completed_time: Option<DateTime<Utc>>,
    pub cancelled_time: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub invoice_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use BreakdownAction::*;
    use BreakdownStatus::*;

    #[test]
    fn test_forward_path() {
        let status = Pending.apply(Accept).unwrap();
        assert_eq!(status, InProgress);
        let status = status.apply(Complete).unwrap();
        assert_eq!(status, Completed);
        assert_eq!(status.apply(Invoice).unwrap(), InvoiceGenerated);
        assert_eq!(InProgress.apply(Cancel).unwrap(), Cancelled);
    }

    #[test]
    fn test_illegal_moves() {
        let err = InProgress.apply(Accept).unwrap_err();
        assert_eq!(err.from, InProgress);
        assert_eq!(err.to_string(), "cannot accept a request that is InProgress");

        assert!(Pending.apply(Invoice).is_err());
        assert!(Completed.apply(Cancel).is_err());
        assert!(Cancelled.apply(Complete).is_err());
        assert!(InvoiceGenerated.apply(Invoice).is_err());
    }

    #[test]
    fn test_required_status_matches_apply() {
        for action in [Accept, Complete, Cancel, Invoice] {
            assert!(BreakdownStatus::required_for(action).apply(action).is_ok());
        }
    }
}
