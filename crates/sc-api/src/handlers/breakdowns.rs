//! Breakdown assistance handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sc_contracts::validate_input;
use sc_models::{BreakdownRequest, Invoice};
use sc_services::InvoiceRequest;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, AppState, AuthenticatedUser};

#[derive(Debug, Deserialize, Validate)]
pub struct AssistanceDto {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub location: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// POST /api/v1/breakdowns
pub async fn request_assistance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(dto): ApiJson<AssistanceDto>,
) -> ApiResult<impl IntoResponse> {
    validate_input(&dto)?;
    let request = state
        .services
        .breakdowns
        .request_assistance(&*user, &dto.location, dto.description)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// POST /api/v1/breakdowns/:id/accept
pub async fn accept(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(request_id): ApiPath<i64>,
) -> ApiResult<Json<BreakdownRequest>> {
    let request = state.services.breakdowns.accept(&*user, request_id).await?;
    Ok(Json(request))
}

/// POST /api/v1/breakdowns/:id/complete
pub async fn complete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(request_id): ApiPath<i64>,
) -> ApiResult<Json<BreakdownRequest>> {
    let request = state.services.breakdowns.complete(&*user, request_id).await?;
    Ok(Json(request))
}

#[derive(Debug, Deserialize)]
pub struct CancelDto {
    #[serde(default)]
    pub reason: String,
}

/// POST /api/v1/breakdowns/:id/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(request_id): ApiPath<i64>,
    ApiJson(dto): ApiJson<CancelDto>,
) -> ApiResult<Json<BreakdownRequest>> {
    let request = state
        .services
        .breakdowns
        .cancel(&*user, request_id, &dto.reason)
        .await?;
    Ok(Json(request))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
    pub distance_km: f64,
    #[serde(default)]
    pub additional_charges: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub invoice: Invoice,
    pub request: BreakdownRequest,
}

/// POST /api/v1/breakdowns/:id/invoice
pub async fn generate_invoice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(request_id): ApiPath<i64>,
    ApiJson(dto): ApiJson<InvoiceDto>,
) -> ApiResult<impl IntoResponse> {
    let issued = state
        .services
        .breakdowns
        .generate_invoice(
            &*user,
            request_id,
            InvoiceRequest {
                distance_km: dto.distance_km,
                additional_charges: dto.additional_charges,
                notes: dto.notes,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(InvoiceResponse {
            invoice: issued.invoice,
            request: issued.request,
        }),
    ))
}
