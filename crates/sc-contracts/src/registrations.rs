//! Customer, appointment and employee registration contracts

use sc_core::{ScError, ScResult, ValidationErrors};
use sc_models::{NewAppointment, NewEmployee, Role};

use crate::base::{authorize, permissions, validate_input, Actor};

/// Staff roles may be registered; customers sign up through their own flow
pub fn check_register_employee<A: Actor + ?Sized>(actor: &A, input: &NewEmployee) -> ScResult<()> {
    authorize(actor, permissions::REGISTER_EMPLOYEE, "register employees")?;
    validate_input(input)?;

    if !input.role.is_staff() {
        let mut errors = ValidationErrors::new();
        errors.add("role", format!("{} is not a staff role", input.role));
        return Err(ScError::Validation(errors));
    }
    Ok(())
}

/// Customers book for themselves; advisors and admins for anyone
pub fn check_book_appointment<A: Actor + ?Sized>(
    actor: &A,
    customer_id: &str,
    input: &NewAppointment,
) -> ScResult<()> {
    authorize(actor, permissions::BOOK_APPOINTMENT, "book appointments")?;
    if actor.has_role(Role::Customer) && actor.id() != customer_id {
        return Err(ScError::forbidden(
            "customers may only book appointments for themselves",
        ));
    }
    validate_input(input)
}
