//! Employee registration and daily attendance

use std::sync::Arc;

use sc_contracts::registrations::check_register_employee;
use sc_contracts::{authorize, permissions, Actor};
use sc_core::{Clock, ScError, ScResult};
use sc_db::StaffStore;
use sc_models::{Attendance, AttendanceStatus, Employee, NewEmployee};

use crate::identifiers::IdentifierAllocator;

#[derive(Clone)]
pub struct StaffService {
    staff: Arc<dyn StaffStore>,
    ids: IdentifierAllocator,
    clock: Arc<dyn Clock>,
}

impl StaffService {
    pub fn new(staff: Arc<dyn StaffStore>, ids: IdentifierAllocator, clock: Arc<dyn Clock>) -> Self {
        Self { staff, ids, clock }
    }

    /// Register a staff member; the identifier prefix follows the role
    pub async fn register_employee(&self, actor: &dyn Actor, input: NewEmployee) -> ScResult<Employee> {
        check_register_employee(actor, &input)?;

        let id = self.ids.allocate_employee(input.role).await?;
        let employee = Employee {
            id: id.into_string(),
            name: input.name.trim().to_string(),
            email: input.email,
            role: input.role,
            phone: input.phone,
            created_at: self.clock.now(),
        };
        self.staff.insert_employee(&employee).await?;

        tracing::info!(employee_id = %employee.id, role = %employee.role, "employee registered");
        Ok(employee)
    }

    /// Record today's attendance status for an employee
    pub async fn record_attendance(
        &self,
        actor: &dyn Actor,
        employee_id: &str,
        status: &str,
    ) -> ScResult<Attendance> {
        authorize(actor, permissions::RECORD_ATTENDANCE, "record attendance")?;
        let status: AttendanceStatus = status.parse()?;

        if self.staff.find_employee(employee_id).await?.is_none() {
            return Err(ScError::not_found("Employee", employee_id));
        }

        let row = Attendance {
            employee_id: employee_id.to_string(),
            date: self.clock.today(),
            status,
            is_working: false,
        };
        let stored = self.staff.record_attendance(&row).await?;

        tracing::info!(
            employee_id = %employee_id,
            date = %stored.date,
            status = %stored.status,
            "attendance recorded"
        );
        Ok(stored)
    }
}
