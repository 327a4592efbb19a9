//! The order-flow data store contract.
//!
//! The store owns transaction boundaries: `approve`/`reject` are conditional
//! single-row updates, `dispatch` wraps the status transition and the stock
//! depletion in one atomic unit. Implementations must guarantee that a
//! failed dispatch leaves no partial effects.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sapitos_catalog::{Article, Location, LocationKind};
use sapitos_core::{
    ArticleId, DomainError, InventoryId, LocationId, OrderId, Organization, UserId,
};
use sapitos_inventory::{InventoryPatch, InventoryRecord, LowStockAdvisory};
use sapitos_orders::{DeliveryOutcome, Order, OrderLine, OrderStatus};

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Store-level error: domain failures plus infrastructure trouble.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The transaction could not begin or commit; safe to retry from
    /// scratch, nothing was applied.
    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn database(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Database {
            operation,
            message: message.into(),
        }
    }
}

/// Requester identity attached to orders (maintained by user administration).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// A pending order as shown to the supplier, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOrderView {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub requested_by: String,
    pub requester_email: String,
    pub total_cents: u64,
    pub discount_cents: u64,
    pub status: OrderStatus,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub organization: Organization,
    pub order_type: String,
}

/// One order line joined with article data and live stock, used both for
/// display and for pre-flight stock checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemView {
    pub article_id: ArticleId,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_price_cents: u64,
    pub subtotal_cents: u64,
    pub available_stock: i64,
}

/// An inventory record joined with its article and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryView {
    pub record: InventoryRecord,
    pub article_name: String,
    pub category: String,
    pub supplier_price_cents: u64,
    pub sale_price_cents: u64,
    pub season: Option<String>,
    pub location_name: String,
    pub location_kind: LocationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalReceipt {
    pub status: OrderStatus,
    pub estimated_delivery_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionReceipt {
    pub status: OrderStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    pub status: OrderStatus,
    pub line_items_dispatched: usize,
    pub outcome: DeliveryOutcome,
    /// Records the dispatch pushed below their minimum; the caller emits
    /// these after commit.
    pub low_stock: Vec<LowStockAdvisory>,
}

/// The data store consumed by the HTTP layer.
///
/// Injected explicitly at service construction; no ambient globals.
#[async_trait]
pub trait OrderFlowStore: Send + Sync {
    // ── order lifecycle ─────────────────────────────────────────────────

    /// Pending → Approved as a conditional update: exactly one of two
    /// racing callers succeeds, the other observes `InvalidState`.
    async fn approve_order(
        &self,
        order_id: OrderId,
        today: NaiveDate,
    ) -> Result<ApprovalReceipt, StoreError>;

    /// Pending → Rejected, same conditional-update discipline.
    async fn reject_order(
        &self,
        order_id: OrderId,
        today: NaiveDate,
        reason: Option<String>,
    ) -> Result<RejectionReceipt, StoreError>;

    /// Approved → InTransit plus all-or-nothing stock depletion, in one
    /// transaction. On `InsufficientStock` no row changes.
    async fn dispatch_order(
        &self,
        order_id: OrderId,
        today: NaiveDate,
    ) -> Result<DispatchReceipt, StoreError>;

    async fn order_line_items(&self, order_id: OrderId) -> Result<Vec<LineItemView>, StoreError>;

    /// Pending orders addressed to the organization owning `location_id`.
    async fn pending_orders_for_supplier(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<PendingOrderView>, StoreError>;

    /// Create an order with its (immutable) lines.
    async fn create_order(&self, order: Order, lines: Vec<OrderLine>) -> Result<(), StoreError>;

    // ── inventory administration ────────────────────────────────────────

    async fn list_inventory(
        &self,
        kind: Option<LocationKind>,
    ) -> Result<Vec<InventoryView>, StoreError>;

    async fn inventory_for_location(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<InventoryView>, StoreError>;

    async fn get_inventory(&self, id: InventoryId) -> Result<InventoryView, StoreError>;

    async fn create_inventory(&self, record: InventoryRecord) -> Result<InventoryId, StoreError>;

    /// Apply a partial update; returns the low-stock advisory to emit (after
    /// this call returns) when the patch left stock below the minimum.
    async fn patch_inventory(
        &self,
        id: InventoryId,
        patch: InventoryPatch,
    ) -> Result<Option<LowStockAdvisory>, StoreError>;

    async fn delete_inventory(&self, id: InventoryId) -> Result<(), StoreError>;

    // ── reference data ──────────────────────────────────────────────────

    async fn list_articles(&self) -> Result<Vec<Article>, StoreError>;

    async fn list_locations(&self) -> Result<Vec<Location>, StoreError>;

    async fn create_article(&self, article: Article) -> Result<(), StoreError>;

    async fn create_location(&self, location: Location) -> Result<(), StoreError>;

    async fn upsert_user(&self, user: UserProfile) -> Result<(), StoreError>;
}
