//! Cashier decisions on part orders

use axum::{extract::State, response::IntoResponse, Json};

use crate::error::ApiResult;
use crate::extractors::{ApiPath, AppState, AuthenticatedUser};

/// POST /api/v1/orders/:id/approve
pub async fn approve_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(order_id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    let order = state.services.part_orders.approve_order(&*user, &order_id).await?;
    Ok(Json(order))
}

/// POST /api/v1/orders/:id/reject
pub async fn reject_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(order_id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    let order = state.services.part_orders.reject_order(&*user, &order_id).await?;
    Ok(Json(order))
}
