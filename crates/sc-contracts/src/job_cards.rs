//! Job card and service record contracts

use std::collections::HashSet;

use sc_core::{ScError, ScResult, ValidationErrors};
use sc_models::{
    Attendance, Employee, JobCard, JobCardStatus, NewServiceRecord, Role, ServiceRecord,
    ServiceRecordStatus,
};

use crate::base::{Contract, ValidationResult};

/// Collapse duplicate ids, keeping first-seen order; an empty list is rejected
pub fn distinct_employee_ids(ids: &[String]) -> ScResult<Vec<String>> {
    let mut seen = HashSet::new();
    let distinct: Vec<String> = ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect();

    if distinct.is_empty() {
        return Err(ScError::invalid_field(
            "employeeIds",
            "must list at least one mechanic",
        ));
    }
    Ok(distinct)
}

/// Everything known about one employee proposed for a job card
#[derive(Debug, Clone)]
pub struct MechanicCandidate {
    pub employee_id: String,
    pub employee: Option<Employee>,
    /// Attendance row for today, if any
    pub attendance: Option<Attendance>,
}

/// Every candidate must be an existing mechanic marked Present today
///
/// All candidates are checked so the error lists every failing employee.
#[derive(Debug, Default)]
pub struct AssignMechanicsContract;

impl Contract<[MechanicCandidate]> for AssignMechanicsContract {
    fn validate(&self, candidates: &[MechanicCandidate]) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        for candidate in candidates {
            let id = candidate.employee_id.as_str();
            let Some(employee) = &candidate.employee else {
                errors.add(id, "does not exist");
                continue;
            };
            if employee.role != Role::Mechanic {
                errors.add(id, format!("is a {}, not a Mechanic", employee.role));
                continue;
            }
            match &candidate.attendance {
                None => errors.add(id, "has no attendance recorded for today"),
                Some(attendance) if !attendance.is_present() => {
                    errors.add(id, format!("is {} today", attendance.status))
                }
                Some(_) => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Only mechanics assigned to the job card may move its statuses
pub fn check_membership(is_assigned: bool, employee_id: &str, job_card_id: &str) -> ScResult<()> {
    if is_assigned {
        Ok(())
    } else {
        Err(ScError::forbidden(format!(
            "{employee_id} is not assigned to job card {job_card_id}"
        )))
    }
}

/// Parse and check a requested job card status
///
/// `Invoice Generated` is reserved for invoicing. With `strict` the move
/// must stay put or go to the direct successor.
pub fn check_job_card_status(card: &JobCard, requested: &str, strict: bool) -> ScResult<JobCardStatus> {
    let next: JobCardStatus = requested.parse()?;
    if !next.settable_by_mechanic() {
        return Err(ScError::invalid_field(
            "status",
            format!("'{next}' cannot be set directly"),
        ));
    }
    if strict && !card.status.can_advance_to(next) {
        return Err(ScError::invalid_state(
            "JobCard",
            &card.id,
            card.status,
            format!("cannot move to {next}"),
        ));
    }
    Ok(next)
}

/// Parse and check a requested service record status
pub fn check_service_record_status(
    record: &ServiceRecord,
    requested: &str,
    strict: bool,
) -> ScResult<ServiceRecordStatus> {
    let next: ServiceRecordStatus = requested.parse()?;
    if strict && !record.status.can_advance_to(next) {
        return Err(ScError::invalid_state(
            "ServiceRecord",
            record.id,
            record.status,
            format!("cannot move to {next}"),
        ));
    }
    Ok(next)
}

/// Service records supplied when a job card is opened
#[derive(Debug, Default)]
pub struct OpenJobCardContract;

impl Contract<[NewServiceRecord]> for OpenJobCardContract {
    fn validate(&self, records: &[NewServiceRecord]) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        for (index, record) in records.iter().enumerate() {
            if record.vehicle_id.trim().is_empty() {
                errors.add(format!("serviceRecords[{index}].vehicleId"), "can't be blank");
            }
            if record.description.trim().is_empty() {
                errors.add(format!("serviceRecords[{index}].description"), "can't be blank");
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
