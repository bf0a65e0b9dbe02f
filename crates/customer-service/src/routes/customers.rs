//! Customer CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Customer, CustomerId, Pagination};

use crate::AppState;
use crate::error::ApiError;
use crate::model::{CustomerUpdate, NewCustomer};

fn not_found(id: CustomerId) -> ApiError {
    ApiError::NotFound(format!("Customer with id {id} not found"))
}

/// GET /customers
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let Query(page) = query?;
    Ok(Json(state.store.list(page).await?))
}

/// GET /customers/{id}
#[tracing::instrument(skip(state, path))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Customer>, ApiError> {
    let id = CustomerId::new(path?.0);
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// POST /customers
#[tracing::instrument(skip(state, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewCustomer>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let Json(customer) = payload?;
    customer.validate().map_err(ApiError::BadRequest)?;

    let customer = state.store.create(customer).await?;
    tracing::info!(customer_id = %customer.id, "customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

/// PUT /customers/{id}
#[tracing::instrument(skip(state, path, payload))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CustomerUpdate>, JsonRejection>,
) -> Result<Json<Customer>, ApiError> {
    let id = CustomerId::new(path?.0);
    let Json(update) = payload?;
    update.validate().map_err(ApiError::BadRequest)?;

    state
        .store
        .update(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// DELETE /customers/{id}
#[tracing::instrument(skip(state, path))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = CustomerId::new(path?.0);
    if state.store.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
