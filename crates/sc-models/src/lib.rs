//! # sc-models
//!
//! Domain models for Service Center RS.
//!
//! Besides the entity structs this crate owns the two pieces of pure logic
//! everything else builds on: identifier rendering (`identifier`) and the
//! closed status types with their transition rules.

pub mod identifier;
pub mod role;
pub mod customer;
pub mod staff;
pub mod job_card;
pub mod part_order;
pub mod breakdown;
pub mod invoice;

pub use identifier::{parse_suffix, IdCategory, IdScope, Identifier, IdentifierError, Padding};
pub use role::Role;
pub use customer::{Appointment, Customer, NewAppointment, NewCustomer};
pub use staff::{Attendance, AttendanceStatus, Employee, NewEmployee};
pub use job_card::{JobCard, JobCardStatus, MechanicAssignment, NewServiceRecord, ServiceRecord, ServiceRecordStatus};
pub use part_order::{OrderLine, OrderStatus, PartOrder};
pub use breakdown::{BreakdownAction, BreakdownRequest, BreakdownStatus, TransitionError};
pub use invoice::{round_cents, BreakdownCharge, Invoice};

/// Error returned when a status string is not one of the known values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

impl From<UnknownStatus> for sc_core::ScError {
    fn from(err: UnknownStatus) -> Self {
        sc_core::ScError::invalid_field("status", err.to_string())
    }
}
