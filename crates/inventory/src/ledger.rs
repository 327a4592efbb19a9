//! Pure depletion planning for order fulfillment.
//!
//! The planner decides whether every line of an order can be served from
//! current stock. It never mutates anything; applying the plan (and holding
//! the row locks that make it safe) is the data store's job.

use serde::{Deserialize, Serialize};

use sapitos_core::{DomainError, InventoryId};

/// One order line joined with the current stock of its inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepletionLine {
    pub inventory_id: InventoryId,
    pub article_name: String,
    pub requested: i64,
    pub available: i64,
}

/// Validate an order's lines against current stock, all-or-nothing.
///
/// Lines are checked in a fixed total order — ascending `(article_name,
/// inventory_id)` — so a partial failure is reproducible: the error always
/// reports the *first* shortfall under that order. On success the lines are
/// returned in plan order, ready to be applied.
pub fn plan_depletion(mut lines: Vec<DepletionLine>) -> Result<Vec<DepletionLine>, DomainError> {
    lines.sort_by(|a, b| {
        a.article_name
            .cmp(&b.article_name)
            .then(a.inventory_id.cmp(&b.inventory_id))
    });

    for line in &lines {
        if line.requested <= 0 {
            return Err(DomainError::validation(format!(
                "line for {} has non-positive quantity {}",
                line.article_name, line.requested
            )));
        }
        if line.available < line.requested {
            return Err(DomainError::insufficient_stock(
                line.article_name.clone(),
                line.available,
                line.requested,
            ));
        }
    }

    Ok(lines)
}
