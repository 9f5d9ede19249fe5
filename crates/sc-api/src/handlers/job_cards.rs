//! Job card, service record and part order handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sc_contracts::validate_input;
use sc_models::{JobCard, MechanicAssignment, NewServiceRecord, OrderLine, ServiceRecord};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, AppState, AuthenticatedUser};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenJobCardDto {
    pub appointment_id: String,
    #[serde(default)]
    pub service_records: Vec<NewServiceRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCardResponse {
    pub job_card: JobCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_records: Option<Vec<ServiceRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mechanics: Option<Vec<MechanicAssignment>>,
}

/// POST /api/v1/job_cards
pub async fn open_job_card(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(dto): ApiJson<OpenJobCardDto>,
) -> ApiResult<impl IntoResponse> {
    let opened = state
        .services
        .job_cards
        .open_job_card(&*user, &dto.appointment_id, dto.service_records)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(JobCardResponse {
            job_card: opened.job_card,
            service_records: Some(opened.service_records),
            mechanics: None,
        }),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignMechanicsDto {
    #[validate(length(min = 1, message = "must list at least one mechanic"))]
    pub employee_ids: Vec<String>,
}

/// POST /api/v1/job_cards/:id/mechanics
pub async fn assign_mechanics(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(job_card_id): ApiPath<String>,
    ApiJson(dto): ApiJson<AssignMechanicsDto>,
) -> ApiResult<impl IntoResponse> {
    validate_input(&dto)?;
    let assignment = state
        .services
        .job_cards
        .assign_mechanics(&*user, &job_card_id, &dto.employee_ids)
        .await?;
    Ok(Json(JobCardResponse {
        job_card: assignment.job_card,
        service_records: None,
        mechanics: Some(assignment.mechanics),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusDto {
    #[validate(length(min = 1, message = "can't be blank"))]
    pub status: String,
}

/// PATCH /api/v1/job_cards/:id/status
pub async fn update_job_card_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(job_card_id): ApiPath<String>,
    ApiJson(dto): ApiJson<StatusDto>,
) -> ApiResult<impl IntoResponse> {
    validate_input(&dto)?;
    let card = state
        .services
        .job_cards
        .update_job_card_status(&*user, &job_card_id, &dto.status)
        .await?;
    Ok(Json(card))
}

/// PATCH /api/v1/service_records/:id/status
pub async fn update_service_record_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(service_record_id): ApiPath<i64>,
    ApiJson(dto): ApiJson<StatusDto>,
) -> ApiResult<impl IntoResponse> {
    validate_input(&dto)?;
    let record = state
        .services
        .job_cards
        .update_service_record_status(&*user, service_record_id, &dto.status)
        .await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct OrderPartsDto {
    #[serde(default)]
    pub parts: Vec<OrderLine>,
}

/// POST /api/v1/job_cards/:id/orders
pub async fn order_parts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(job_card_id): ApiPath<String>,
    ApiJson(dto): ApiJson<OrderPartsDto>,
) -> ApiResult<impl IntoResponse> {
    let order = state
        .services
        .part_orders
        .order_parts(&*user, &job_card_id, dto.parts)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}
