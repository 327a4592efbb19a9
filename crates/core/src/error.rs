//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, illegal transitions). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A lifecycle transition was requested from the wrong status.
    #[error("invalid state: requires {required}, found {current}")]
    InvalidState { required: String, current: String },

    /// A dispatch would drive stock below zero; carries the first shortfall
    /// under the fixed iteration order.
    #[error("insufficient stock for {article}: available {available}, requested {requested}")]
    InsufficientStock {
        article: String,
        available: i64,
        requested: i64,
    },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. duplicate inventory record).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_state(required: impl Into<String>, current: impl Into<String>) -> Self {
        Self::InvalidState {
            required: required.into(),
            current: current.into(),
        }
    }

    pub fn insufficient_stock(article: impl Into<String>, available: i64, requested: i64) -> Self {
        Self::InsufficientStock {
            article: article.into(),
            available,
            requested,
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
