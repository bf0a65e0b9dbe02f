//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use billing::{BillingError, ClientError};

/// API-level error type that maps to HTTP responses.
///
/// Every response body is `{"error": <message>, "code": <code>}` with a
/// stable `code` per failure category.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound { message: String, code: &'static str },
    /// Request could not be parsed or failed validation.
    BadRequest { status: StatusCode, message: String },
    /// Billing workflow or ledger error.
    Billing(BillingError),
}

impl ApiError {
    pub fn bill_not_found(id: impl std::fmt::Display) -> Self {
        ApiError::NotFound {
            message: format!("Bill with ID {id} not found"),
            code: "bill_not_found",
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    /// Returns the status code and stable error code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound { code, .. } => (StatusCode::NOT_FOUND, code),
            ApiError::BadRequest { status, .. } => (*status, "bad_request"),
            ApiError::Billing(err) => billing_status(err),
        }
    }
}

fn billing_status(err: &BillingError) -> (StatusCode, &'static str) {
    match err {
        BillingError::CustomerNotFound(_) => (StatusCode::NOT_FOUND, "customer_not_found"),
        BillingError::ProductNotFound(_) => (StatusCode::NOT_FOUND, "product_not_found"),
        BillingError::StockUpdateFailed { source, .. } => match source {
            ClientError::StockUpdateRejected { .. } => {
                (StatusCode::BAD_REQUEST, "stock_update_rejected")
            }
            ClientError::ProductNotFoundDuringUpdate(_) => {
                (StatusCode::CONFLICT, "product_not_found_during_update")
            }
            _ => (StatusCode::BAD_GATEWAY, "stock_update_failed"),
        },
        BillingError::Remote(client) => match client {
            ClientError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            ClientError::Discovery(_) => (StatusCode::SERVICE_UNAVAILABLE, "discovery_unavailable"),
            ClientError::StockUpdateRejected { .. } => {
                (StatusCode::BAD_REQUEST, "stock_update_rejected")
            }
            ClientError::ProductNotFoundDuringUpdate(_) => {
                (StatusCode::CONFLICT, "product_not_found_during_update")
            }
            ClientError::ServiceCall { .. } => (StatusCode::BAD_GATEWAY, "service_call_failed"),
        },
        BillingError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "persistence_failed"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match self {
            ApiError::NotFound { message, .. } => message,
            ApiError::BadRequest { message, .. } => message,
            ApiError::Billing(err) => err.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, code, "request failed");
        } else {
            tracing::debug!(error = %message, code, "request rejected");
        }

        let body = serde_json::json!({ "error": message, "code": code });
        (status, axum::Json(body)).into_response()
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        ApiError::Billing(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
