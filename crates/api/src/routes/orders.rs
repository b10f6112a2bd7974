//! Order placement, cancellation and read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{OrderDetails, PlaceOrder};
use serde::Serialize;
use store::Store;

use super::{AppState, parse_id};
use crate::error::ApiError;

#[derive(Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: String,
}

#[derive(Serialize)]
pub struct OrderCancelledResponse {
    pub order_id: String,
    pub status: &'static str,
}

/// POST /orders: place an order for a customer identified by contact details.
#[tracing::instrument(skip(state, payload))]
pub async fn place<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<PlaceOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>), ApiError> {
    let Json(req) = payload?;
    let order_id = state.order_service.place_order(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderPlacedResponse {
            order_id: order_id.to_string(),
        }),
    ))
}

/// GET /orders: every order, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<OrderDetails>>, ApiError> {
    Ok(Json(state.order_service.list_orders().await?))
}

/// GET /orders/{id}: order with customer and line items.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderDetails>, ApiError> {
    let order_id = parse_id(&id, "order")?;
    Ok(Json(state.order_service.get_order_details(order_id).await?))
}

/// POST /orders/{id}/cancel: delete the order and restock its lines.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderCancelledResponse>, ApiError> {
    let order_id = parse_id(&id, "order")?;
    state.order_service.cancel_order(order_id).await?;
    Ok(Json(OrderCancelledResponse {
        order_id: order_id.to_string(),
        status: "cancelled",
    }))
}
