//! Bill creation and read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use billing::{Bill, BillStore, BillingService, CreateBill, CustomerLookup, Pagination, ProductCatalog};
use common::BillId;

use crate::error::ApiError;

/// Billing service over type-erased collaborators.
pub type DynBillingService =
    BillingService<Arc<dyn CustomerLookup>, Arc<dyn ProductCatalog>, Arc<dyn BillStore>>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub billing: DynBillingService,
    pub service_name: String,
}

/// POST /api/bills: run the create-bill workflow.
#[tracing::instrument(skip(state, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBill>, JsonRejection>,
) -> Result<(StatusCode, Json<Bill>), ApiError> {
    let Json(request) = payload?;
    request.validate().map_err(ApiError::unprocessable)?;

    let bill = state.billing.create_bill(request).await?;
    Ok((StatusCode::CREATED, Json(bill)))
}

/// GET /api/bills: list bills in insertion order.
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<Bill>>, ApiError> {
    let Query(page) = query?;
    Ok(Json(state.billing.list_bills(page).await?))
}

/// GET /api/bills/{id}: load one bill with its items.
#[tracing::instrument(skip(state, path))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Bill>, ApiError> {
    let Path(id) = path?;
    let id = BillId::new(id);

    state
        .billing
        .get_bill(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::bill_not_found(id))
}
