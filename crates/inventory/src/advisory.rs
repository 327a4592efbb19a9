//! Low-stock advisory math.
//!
//! Evaluated after any stock mutation; emission is best-effort and must
//! never roll back the mutation that triggered it.

use serde::{Deserialize, Serialize};

use sapitos_core::{InventoryId, LocationId};

use crate::record::InventoryRecord;

/// Advisory raised when a record's stock falls below its configured minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStockAdvisory {
    pub inventory_id: InventoryId,
    pub location_id: LocationId,
    pub article_name: String,
    pub location_name: String,
    pub stock_actual: i64,
    pub min_stock: i64,
    /// `stock / avg_daily_demand`; `None` when the demand rate is zero or unset.
    pub days_until_depletion: Option<f64>,
    /// `max(0, recommended_stock - stock_actual)`.
    pub reorder_quantity: i64,
}

impl LowStockAdvisory {
    /// Evaluate a record after a stock mutation. Returns `None` while stock
    /// is at or above the minimum.
    pub fn evaluate(
        record: &InventoryRecord,
        article_name: impl Into<String>,
        location_name: impl Into<String>,
    ) -> Option<Self> {
        if !record.is_below_minimum() {
            return None;
        }

        let days_until_depletion = if record.avg_daily_demand > 0.0 {
            Some(record.stock_actual as f64 / record.avg_daily_demand)
        } else {
            None
        };

        Some(Self {
            inventory_id: record.id,
            location_id: record.location_id,
            article_name: article_name.into(),
            location_name: location_name.into(),
            stock_actual: record.stock_actual,
            min_stock: record.min_stock,
            days_until_depletion,
            reorder_quantity: (record.recommended_stock - record.stock_actual).max(0),
        })
    }

    /// Human-readable message for the notification emitter.
    pub fn message(&self) -> String {
        let depletion = match self.days_until_depletion {
            Some(days) => format!("{days:.1}"),
            None => "?".to_string(),
        };
        format!(
            "Article {} at {} is below minimum stock ({}/{}). Depletes in {} days. Reorder {} units.",
            self.article_name,
            self.location_name,
            self.stock_actual,
            self.min_stock,
            depletion,
            self.reorder_quantity,
        )
    }
}
