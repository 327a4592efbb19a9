//! `sapitos-inventory` — the stock ledger.
//!
//! Owns inventory stock quantities and the invariant that they never go
//! negative. The pure depletion planner in [`ledger`] decides, in a fixed
//! total order, whether an order's lines can be fulfilled; the transactional
//! application of the plan lives in `sapitos-infra`.

pub mod advisory;
pub mod ledger;
pub mod record;

pub use advisory::LowStockAdvisory;
pub use ledger::{plan_depletion, DepletionLine};
pub use record::{InventoryPatch, InventoryRecord};
