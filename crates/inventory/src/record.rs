use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use sapitos_core::{ArticleId, DomainError, InventoryId, LocationId};

/// Stock bookkeeping for one article at one location.
///
/// Invariant: `stock_actual >= 0` at all times. Mutated only through the
/// fulfillment transaction ([`deplete`](InventoryRecord::deplete) /
/// [`receive`](InventoryRecord::receive)) or an administrative
/// [`InventoryPatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: InventoryId,
    pub article_id: ArticleId,
    pub location_id: LocationId,
    pub stock_actual: i64,
    pub min_stock: i64,
    pub recommended_stock: i64,
    pub safety_stock: i64,
    /// Profit margin in basis points (original stores a percentage).
    pub profit_margin_bp: i64,
    /// Replenishment lead time in days.
    pub restock_lead_days: i64,
    /// Average demand in units per day; fractional demand is meaningful here
    /// (e.g. one unit every other day).
    pub avg_daily_demand: f64,
    /// Cumulative units ever imported into / exported out of this record.
    pub imported_total: i64,
    pub exported_total: i64,
    pub last_import_date: Option<NaiveDate>,
    pub last_export_date: Option<NaiveDate>,
}

impl InventoryRecord {
    pub fn new(
        id: InventoryId,
        article_id: ArticleId,
        location_id: LocationId,
        stock_actual: i64,
        min_stock: i64,
        recommended_stock: i64,
        safety_stock: i64,
    ) -> Result<Self, DomainError> {
        if stock_actual < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        if min_stock < 0 || recommended_stock < 0 || safety_stock < 0 {
            return Err(DomainError::validation("stock thresholds cannot be negative"));
        }
        Ok(Self {
            id,
            article_id,
            location_id,
            stock_actual,
            min_stock,
            recommended_stock,
            safety_stock,
            profit_margin_bp: 0,
            restock_lead_days: 0,
            avg_daily_demand: 0.0,
            imported_total: 0,
            exported_total: 0,
            last_import_date: None,
            last_export_date: None,
        })
    }

    /// Remove `quantity` units (order fulfillment).
    ///
    /// Callers are expected to have run the depletion planner first; a
    /// shortfall here still refuses to break the non-negative invariant.
    pub fn deplete(&mut self, quantity: i64, today: NaiveDate) -> Result<(), DomainError> {
        if quantity <= 0 {
            return Err(DomainError::validation("depletion quantity must be positive"));
        }
        if self.stock_actual < quantity {
            return Err(DomainError::validation("stock cannot go negative"));
        }
        self.stock_actual -= quantity;
        self.exported_total += quantity;
        self.last_export_date = Some(today);
        Ok(())
    }

    /// Add `quantity` units (goods received / replenishment).
    pub fn receive(&mut self, quantity: i64, today: NaiveDate) -> Result<(), DomainError> {
        if quantity <= 0 {
            return Err(DomainError::validation("received quantity must be positive"));
        }
        self.stock_actual += quantity;
        self.imported_total += quantity;
        self.last_import_date = Some(today);
        Ok(())
    }

    pub fn is_below_minimum(&self) -> bool {
        self.stock_actual < self.min_stock
    }

    /// Apply an administrative partial update.
    pub fn apply_patch(&mut self, patch: &InventoryPatch) -> Result<(), DomainError> {
        if patch.is_empty() {
            return Err(DomainError::validation("no fields to update"));
        }
        if let Some(stock) = patch.stock_actual {
            if stock < 0 {
                return Err(DomainError::validation("stock cannot be negative"));
            }
            self.stock_actual = stock;
        }
        if let Some(min) = patch.min_stock {
            if min < 0 {
                return Err(DomainError::validation("minimum stock cannot be negative"));
            }
            self.min_stock = min;
        }
        if let Some(rec) = patch.recommended_stock {
            if rec < 0 {
                return Err(DomainError::validation("recommended stock cannot be negative"));
            }
            self.recommended_stock = rec;
        }
        if let Some(safety) = patch.safety_stock {
            if safety < 0 {
                return Err(DomainError::validation("safety stock cannot be negative"));
            }
            self.safety_stock = safety;
        }
        if let Some(margin) = patch.profit_margin_bp {
            self.profit_margin_bp = margin;
        }
        if let Some(lead) = patch.restock_lead_days {
            if lead < 0 {
                return Err(DomainError::validation("lead time cannot be negative"));
            }
            self.restock_lead_days = lead;
        }
        if let Some(demand) = patch.avg_daily_demand {
            if demand < 0.0 {
                return Err(DomainError::validation("demand rate cannot be negative"));
            }
            self.avg_daily_demand = demand;
        }
        Ok(())
    }
}

/// Explicit partial update for an inventory record.
///
/// A named set of optional fields instead of ad hoc query-string building;
/// `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryPatch {
    pub stock_actual: Option<i64>,
    pub min_stock: Option<i64>,
    pub recommended_stock: Option<i64>,
    pub safety_stock: Option<i64>,
    pub profit_margin_bp: Option<i64>,
    pub restock_lead_days: Option<i64>,
    pub avg_daily_demand: Option<f64>,
}

impl InventoryPatch {
    pub fn is_empty(&self) -> bool {
        self.stock_actual.is_none()
            && self.min_stock.is_none()
            && self.recommended_stock.is_none()
            && self.safety_stock.is_none()
            && self.profit_margin_bp.is_none()
            && self.restock_lead_days.is_none()
            && self.avg_daily_demand.is_none()
    }

    /// Whether this patch touches the stock quantity (and may therefore
    /// trigger the low-stock advisory).
    pub fn touches_stock(&self) -> bool {
        self.stock_actual.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(stock: i64, min: i64) -> InventoryRecord {
        InventoryRecord::new(
            InventoryId::new(),
            ArticleId::new(),
            LocationId::new(),
            stock,
            min,
            20,
            2,
        )
        .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn deplete_updates_stock_and_export_counters() {
        let mut rec = record(10, 5);
        rec.deplete(4, day(2)).unwrap();

        assert_eq!(rec.stock_actual, 6);
        assert_eq!(rec.exported_total, 4);
        assert_eq!(rec.last_export_date, Some(day(2)));
    }

    #[test]
    fn deplete_refuses_to_go_negative() {
        let mut rec = record(3, 5);
        assert!(rec.deplete(4, day(2)).is_err());
        assert_eq!(rec.stock_actual, 3);
        assert_eq!(rec.exported_total, 0);
    }

    #[test]
    fn receive_updates_stock_and_import_counters() {
        let mut rec = record(3, 5);
        rec.receive(7, day(4)).unwrap();

        assert_eq!(rec.stock_actual, 10);
        assert_eq!(rec.imported_total, 7);
        assert_eq!(rec.last_import_date, Some(day(4)));
    }

    #[test]
    fn empty_patch_is_rejected() {
        let mut rec = record(10, 5);
        assert!(rec.apply_patch(&InventoryPatch::default()).is_err());
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut rec = record(10, 5);
        let patch = InventoryPatch {
            stock_actual: Some(2),
            min_stock: Some(4),
            ..Default::default()
        };
        rec.apply_patch(&patch).unwrap();

        assert_eq!(rec.stock_actual, 2);
        assert_eq!(rec.min_stock, 4);
        assert_eq!(rec.recommended_stock, 20);
        assert!(rec.is_below_minimum());
    }

    #[test]
    fn patch_rejects_negative_stock() {
        let mut rec = record(10, 5);
        let patch = InventoryPatch {
            stock_actual: Some(-1),
            ..Default::default()
        };
        assert!(rec.apply_patch(&patch).is_err());
        assert_eq!(rec.stock_actual, 10);
    }
}
