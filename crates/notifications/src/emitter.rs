use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sapitos_core::LocationId;
use sapitos_inventory::LowStockAdvisory;

/// Severity channel for a notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Danger,
}

/// An advisory message addressed to a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub location_id: LocationId,
}

impl From<&LowStockAdvisory> for Notification {
    fn from(advisory: &LowStockAdvisory) -> Self {
        Self {
            title: "Replenishment needed".to_string(),
            message: advisory.message(),
            severity: Severity::Danger,
            location_id: advisory.location_id,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification channel.
///
/// Implementations must not block on anything the stock transaction holds.
pub trait NotificationEmitter: Send + Sync {
    fn emit(&self, notification: Notification) -> Result<(), EmitError>;
}

/// Emit a low-stock notification, logging (never propagating) failures.
pub fn notify_low_stock(emitter: &dyn NotificationEmitter, advisory: &LowStockAdvisory) {
    let notification = Notification::from(advisory);
    if let Err(e) = emitter.emit(notification) {
        tracing::warn!(
            article = %advisory.article_name,
            location = %advisory.location_name,
            error = %e,
            "failed to emit low-stock notification",
        );
    }
}

/// Emitter that writes notifications to the log stream (default for the API
/// binary until a real channel is wired in).
#[derive(Debug, Default)]
pub struct TracingEmitter;

impl NotificationEmitter for TracingEmitter {
    fn emit(&self, notification: Notification) -> Result<(), EmitError> {
        tracing::info!(
            title = %notification.title,
            severity = ?notification.severity,
            location_id = %notification.location_id,
            "{}",
            notification.message,
        );
        Ok(())
    }
}

/// Recording emitter for tests.
#[derive(Debug, Default)]
pub struct InMemoryEmitter {
    sent: Mutex<Vec<Notification>>,
}

impl InMemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl NotificationEmitter for InMemoryEmitter {
    fn emit(&self, notification: Notification) -> Result<(), EmitError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification);
        }
        Ok(())
    }
}
