//! Product catalog and stock endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Pagination, Product, ProductId};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::model::{NewProduct, ProductUpdate};

/// Query string of `PATCH /products/{id}/stock`.
#[derive(Debug, Deserialize)]
pub struct StockDelta {
    pub quantity_delta: i64,
}

/// GET /products
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let Query(page) = query?;
    Ok(Json(state.store.list(page).await?))
}

/// GET /products/{id}
#[tracing::instrument(skip(state, path))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Product>, ApiError> {
    let id = ProductId::new(path?.0);
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// POST /products
#[tracing::instrument(skip(state, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(product) = payload?;
    product.validate().map_err(ApiError::Unprocessable)?;

    let product = state.store.create(product).await?;
    tracing::info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /products/{id}
#[tracing::instrument(skip(state, path, payload))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let id = ProductId::new(path?.0);
    let Json(update) = payload?;
    update.validate().map_err(ApiError::Unprocessable)?;

    state
        .store
        .update(id, update)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// PATCH /products/{id}/stock?quantity_delta=<signed>
#[tracing::instrument(skip(state, path, query))]
pub async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<StockDelta>, QueryRejection>,
) -> Result<Json<Product>, ApiError> {
    let id = ProductId::new(path?.0);
    let Query(StockDelta { quantity_delta }) = query?;

    let product = state
        .store
        .adjust_stock(id, quantity_delta)
        .await?
        .ok_or(ApiError::NotFound)?;

    tracing::info!(
        product_id = %id,
        delta = quantity_delta,
        quantity = product.quantity,
        "stock adjusted"
    );
    Ok(Json(product))
}
