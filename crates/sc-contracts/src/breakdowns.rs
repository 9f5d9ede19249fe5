//! Breakdown request contracts

use sc_core::{ScError, ScResult};
use sc_models::{BreakdownAction, BreakdownRequest, BreakdownStatus};

/// Status the request moves to, or `InvalidState` naming the current one
pub fn check_transition(
    request: &BreakdownRequest,
    action: BreakdownAction,
) -> ScResult<BreakdownStatus> {
    request.status.apply(action).map_err(|err| {
        ScError::invalid_state("BreakdownRequest", request.id, request.status, err.to_string())
    })
}

/// Trimmed cancellation reason; blank is rejected
pub fn check_cancellation_reason(reason: &str) -> ScResult<String> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ScError::invalid_field("reason", "can't be blank"));
    }
    Ok(reason.to_string())
}

pub fn check_location(location: &str) -> ScResult<String> {
    let location = location.trim();
    if location.is_empty() {
        return Err(ScError::invalid_field("location", "can't be blank"));
    }
    Ok(location.to_string())
}
