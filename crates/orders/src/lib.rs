//! `sapitos-orders` — the order lifecycle engine.
//!
//! Owns the order status field and its legal transitions:
//!
//! ```text
//! Pending ──► Approved ──► InTransit ──► Completed
//!    │
//!    └──► Rejected
//! ```
//!
//! `Rejected` and `Completed` are terminal; no transition skips a state and
//! none go backwards. The stock mutation accompanying the dispatch
//! transition lives in `sapitos-inventory`; the transactional glue lives in
//! `sapitos-infra`.

pub mod order;

pub use order::{
    estimated_delivery, DeliveryOutcome, Order, OrderLine, OrderStatus, DELIVERY_LEAD_DAYS,
};
