use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use sapitos_core::DomainError;
use sapitos_infra::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Transaction(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "transaction_error", msg)
        }
        StoreError::Database { operation, message } => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "database_error",
            format!("{operation}: {message}"),
        ),
    }
}

fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::InvalidState { required, current } => json_error(
            StatusCode::CONFLICT,
            "invalid_state",
            format!("requires {required}, found {current}"),
        ),
        // Shortfall details travel in a structured payload so clients can
        // surface them without parsing the message.
        DomainError::InsufficientStock {
            article,
            available,
            requested,
        } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": format!(
                    "insufficient stock for {article}: available {available}, requested {requested}"
                ),
                "shortfall": {
                    "article": article,
                    "available": available,
                    "requested": requested,
                },
            })),
        )
            .into_response(),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
