//! `sapitos-infra` — data store implementations for the order flow.
//!
//! Two implementations of the same [`store::OrderFlowStore`] contract:
//! a Postgres store (sqlx, row locks, one transaction per dispatch) and an
//! in-memory store for tests and development.

pub mod store;

#[cfg(test)]
mod integration_tests;

pub use store::{
    ApprovalReceipt, DispatchReceipt, InMemoryStore, InventoryView, LineItemView, OrderFlowStore,
    PendingOrderView, PostgresStore, RejectionReceipt, StoreError, UserProfile,
};
