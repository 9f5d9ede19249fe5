//! Job cards, their service records, and mechanic assignments
//!
//! ```text
//! JobCard:        Created -> Assigned -> Ongoing -> Finished -> Invoice Generated
//! ServiceRecord:  Not Started -> Ongoing -> Finished
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UnknownStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobCardStatus {
    Created,
    Assigned,
    Ongoing,
    Finished,
    #[serde(rename = "Invoice Generated")]
    InvoiceGenerated,
}

impl JobCardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobCardStatus::Created => "Created",
            JobCardStatus::Assigned => "Assigned",
            JobCardStatus::Ongoing => "Ongoing",
            JobCardStatus::Finished => "Finished",
            JobCardStatus::InvoiceGenerated => "Invoice Generated",
        }
    }

    fn position(&self) -> u8 {
        match self {
            JobCardStatus::Created => 0,
            JobCardStatus::Assigned => 1,
            JobCardStatus::Ongoing => 2,
            JobCardStatus::Finished => 3,
            JobCardStatus::InvoiceGenerated => 4,
        }
    }

    /// Statuses an assigned mechanic may write; invoicing is not one of them
    pub fn settable_by_mechanic(&self) -> bool {
        !matches!(self, JobCardStatus::InvoiceGenerated)
    }

    /// Forward-only check: stay put or move to the direct successor
    pub fn can_advance_to(&self, next: JobCardStatus) -> bool {
        next.position() == self.position() || next.position() == self.position() + 1
    }
}

impl fmt::Display for JobCardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobCardStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Created" => Ok(JobCardStatus::Created),
            "Assigned" => Ok(JobCardStatus::Assigned),
            "Ongoing" => Ok(JobCardStatus::Ongoing),
            "Finished" => Ok(JobCardStatus::Finished),
            "Invoice Generated" => Ok(JobCardStatus::InvoiceGenerated),
            other => Err(UnknownStatus {
                kind: "job card status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceRecordStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(alias = "Started")]
    Ongoing,
    Finished,
}

impl ServiceRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRecordStatus::NotStarted => "Not Started",
            ServiceRecordStatus::Ongoing => "Ongoing",
            ServiceRecordStatus::Finished => "Finished",
        }
    }

    /// Parts may only be ordered against records that are still open
    pub fn is_open(&self) -> bool {
        !matches!(self, ServiceRecordStatus::Finished)
    }

    pub fn can_advance_to(&self, next: ServiceRecordStatus) -> bool {
        use ServiceRecordStatus::*;
        matches!(
            (self, next),
            (NotStarted, NotStarted)
                | (NotStarted, Ongoing)
                | (Ongoing, Ongoing)
                | (Ongoing, Finished)
                | (Finished, Finished)
        )
    }
}

impl fmt::Display for ServiceRecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceRecordStatus {
    type Err = UnknownStatus;

    /// "Started" is accepted as an older spelling of "Ongoing"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Not Started" => Ok(ServiceRecordStatus::NotStarted),
            "Ongoing" | "Started" => Ok(ServiceRecordStatus::Ongoing),
            "Finished" => Ok(ServiceRecordStatus::Finished),
            other => Err(UnknownStatus {
                kind: "service record status",
                value: other.to_string(),
            }),
        }
    }
}

/// Work order for one appointment (`JC-0001`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCard {
    pub id: String,
    pub appointment_id: String,
    pub status: JobCardStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line item of work within a job card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: i64,
    pub job_card_id: String,
    pub vehicle_id: String,
    pub part_id: Option<String>,
    pub description: String,
    pub status: ServiceRecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceRecord {
    pub vehicle_id: String,
    pub part_id: Option<String>,
    pub description: String,
}

/// Membership of a mechanic on a job card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MechanicAssignment {
    pub job_card_id: String,
    pub employee_id: String,
    pub assigned_at: DateTime<Utc>,
}
