//! Customer CRUD and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Page, PageRequest, SortDirection};
use domain::CustomerDetails;
use serde::Deserialize;
use store::{Customer, CustomerQuery, CustomerSortColumn, Store};

use super::{AppState, parse_id};
use crate::error::ApiError;

/// Query string accepted by `GET /customers`.
#[derive(Debug, Default, Deserialize)]
pub struct ListCustomersParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search_term: Option<String>,
    pub sort_column: Option<CustomerSortColumn>,
    pub sort_direction: Option<SortDirection>,
    pub draw: Option<i32>,
}

impl ListCustomersParams {
    fn into_query(self) -> CustomerQuery {
        let defaults = PageRequest::default();
        let mut query = CustomerQuery::new()
            .page(PageRequest::new(
                self.page.unwrap_or(defaults.page()),
                self.page_size.unwrap_or(defaults.page_size()),
            ))
            .sort_by(
                self.sort_column.unwrap_or_default(),
                self.sort_direction.unwrap_or_default(),
            );
        if let Some(term) = self.search_term {
            query = query.search(term);
        }
        if let Some(draw) = self.draw {
            query = query.draw(draw);
        }
        query
    }
}

/// GET /customers: paged, searchable, sortable listing.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<ListCustomersParams>, QueryRejection>,
) -> Result<Json<Page<Customer>>, ApiError> {
    let page = state.customer_service.list(&params?.0.into_query()).await?;
    Ok(Json(page))
}

/// POST /customers: register a customer with unique contacts.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CustomerDetails>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let Json(details) = payload?;
    let customer = state.customer_service.create(details).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /customers/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let id = parse_id(&id, "customer")?;
    Ok(Json(state.customer_service.get(id).await?))
}

/// PUT /customers/{id}: replace a customer's details.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<CustomerDetails>, JsonRejection>,
) -> Result<Json<Customer>, ApiError> {
    let id = parse_id(&id, "customer")?;
    let Json(details) = payload?;
    Ok(Json(state.customer_service.update(id, details).await?))
}

/// DELETE /customers/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "customer")?;
    state.customer_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
