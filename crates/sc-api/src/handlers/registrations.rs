//! Customer, appointment and staff handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sc_contracts::validate_input;
use sc_models::{NewAppointment, NewCustomer, NewEmployee};
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, AppState, AuthenticatedUser};

/// POST /api/v1/customers
pub async fn register_customer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(dto): ApiJson<NewCustomer>,
) -> ApiResult<impl IntoResponse> {
    let customer = state.services.customers.register_customer(&*user, dto).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentDto {
    pub customer_id: String,
    #[serde(flatten)]
    pub appointment: NewAppointment,
}

/// POST /api/v1/appointments
pub async fn book_appointment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(dto): ApiJson<BookAppointmentDto>,
) -> ApiResult<impl IntoResponse> {
    let appointment = state
        .services
        .customers
        .book_appointment(&*user, &dto.customer_id, dto.appointment)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// POST /api/v1/employees
pub async fn register_employee(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(dto): ApiJson<NewEmployee>,
) -> ApiResult<impl IntoResponse> {
    let employee = state.services.staff.register_employee(&*user, dto).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttendanceDto {
    #[validate(length(min = 1, message = "can't be blank"))]
    pub status: String,
}

/// POST /api/v1/employees/:id/attendance
pub async fn record_attendance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(employee_id): ApiPath<String>,
    ApiJson(dto): ApiJson<AttendanceDto>,
) -> ApiResult<impl IntoResponse> {
    validate_input(&dto)?;
    let attendance = state
        .services
        .staff
        .record_attendance(&*user, &employee_id, &dto.status)
        .await?;
    Ok(Json(attendance))
}
