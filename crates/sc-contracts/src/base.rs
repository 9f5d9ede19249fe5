//! Base contract system

use sc_core::{ScError, ScResult, ValidationErrors};
use sc_models::Role;
use validator::Validate;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// The verified principal performing an operation
pub trait Actor: Send + Sync {
    /// Subject identifier (`M-001`, `C-0004`, a driver id, ...)
    fn id(&self) -> &str;

    fn role(&self) -> Role;

    fn has_role(&self, role: Role) -> bool {
        self.role() == role
    }

    fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role())
    }
}

/// Base contract trait
pub trait Contract<T: ?Sized>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T) -> ValidationResult;
}

/// Fail with `Forbidden` unless the actor holds one of `allowed`
pub fn authorize<A: Actor + ?Sized>(actor: &A, allowed: &[Role], action: &str) -> ScResult<()> {
    if actor.has_any_role(allowed) {
        return Ok(());
    }
    Err(ScError::forbidden(format!(
        "{} ({}) may not {}",
        actor.id(),
        actor.role(),
        action
    )))
}

/// Run `validator` derive rules and convert their output
pub fn validate_input<T: Validate>(input: &T) -> ScResult<()> {
    match input.validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(ScError::Validation(convert_errors(&errors))),
    }
}

fn convert_errors(source: &validator::ValidationErrors) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for (field, field_errors) in source.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("is invalid ({})", error.code));
            errors.add(field, message);
        }
    }
    errors
}

/// Roles allowed for each operation
pub mod permissions {
    use sc_models::Role;

    pub const REGISTER_CUSTOMER: &[Role] = &[Role::Admin, Role::ServiceAdvisor];
    pub const BOOK_APPOINTMENT: &[Role] = &[Role::Customer, Role::ServiceAdvisor, Role::Admin];
    pub const REGISTER_EMPLOYEE: &[Role] = &[Role::Admin];
    pub const RECORD_ATTENDANCE: &[Role] = &[Role::Admin, Role::TeamLeader];
    pub const OPEN_JOB_CARD: &[Role] = &[Role::ServiceAdvisor, Role::TeamLeader, Role::Admin];
    pub const ASSIGN_MECHANICS: &[Role] = &[Role::TeamLeader];
    pub const UPDATE_WORK_STATUS: &[Role] = &[Role::Mechanic];
    pub const ORDER_PARTS: &[Role] = &[Role::Mechanic];
    pub const DECIDE_ORDER: &[Role] = &[Role::Cashier];
    pub const REQUEST_ASSISTANCE: &[Role] = &[Role::Customer];
    pub const HANDLE_BREAKDOWN: &[Role] = &[Role::Driver];
}


#[cfg(test)]
mod tests {
    use super::testing::TestActor;
    use super::*;
    use sc_models::NewCustomer;

    #[test]
    fn test_authorize() {
        let leader = TestActor::new("TL-001", Role::TeamLeader);
        assert!(authorize(&leader, permissions::ASSIGN_MECHANICS, "assign mechanics").is_ok());

        let mechanic = TestActor::new("M-001", Role::Mechanic);
        let err = authorize(&mechanic, permissions::ASSIGN_MECHANICS, "assign mechanics")
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(err.to_string().contains("M-001"));
    }

    #[test]
    fn test_validate_input_maps_fields() {
        let input = NewCustomer {
            name: String::new(),
            email: "ayesha@example.com".into(),
            phone: None,
        };
        match validate_input(&input).unwrap_err() {
            ScError::Validation(errors) => {
                assert!(errors.has_error("name"));
                assert!(!errors.has_error("email"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
