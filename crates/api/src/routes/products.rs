//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Money, Page, PageRequest, SortDirection};
use domain::{NewProduct, ProductUpdate};
use serde::Deserialize;
use store::{Product, ProductQuery, ProductSortColumn, Store};

use super::{AppState, parse_id};
use crate::error::ApiError;

/// Query string accepted by `GET /products`.
///
/// Price bounds are decimal strings such as `low_price=9.99`.
#[derive(Debug, Default, Deserialize)]
pub struct ListProductsParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search_term: Option<String>,
    pub low_price: Option<Money>,
    pub high_price: Option<Money>,
    pub sort_column: Option<ProductSortColumn>,
    pub sort_direction: Option<SortDirection>,
    pub draw: Option<i32>,
}

impl ListProductsParams {
    fn into_query(self) -> ProductQuery {
        let defaults = PageRequest::default();
        let mut query = ProductQuery::new()
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
        if let Some(low) = self.low_price {
            query = query.low_price(low);
        }
        if let Some(high) = self.high_price {
            query = query.high_price(high);
        }
        if let Some(draw) = self.draw {
            query = query.draw(draw);
        }
        query
    }
}

/// GET /products: paged listing with name search and price range.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<ListProductsParams>, QueryRejection>,
) -> Result<Json<Page<Product>>, ApiError> {
    let page = state.product_service.list(&params?.0.into_query()).await?;
    Ok(Json(page))
}

/// POST /products
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(input) = payload?;
    let product = state.product_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&id, "product")?;
    Ok(Json(state.product_service.get(id).await?))
}

/// PUT /products/{id}: rename or reprice; stock is left as is.
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&id, "product")?;
    let Json(input) = payload?;
    Ok(Json(state.product_service.update(id, input).await?))
}

/// DELETE /products/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "product")?;
    state.product_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
