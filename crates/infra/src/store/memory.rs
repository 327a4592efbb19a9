//! In-memory store for tests and development.
//!
//! One mutex around the whole state gives every operation the same
//! atomicity the Postgres store gets from transactions and row locks: a
//! dispatch observes and mutates stock while holding the lock, so
//! concurrent dispatches against shared inventory records serialize.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use sapitos_catalog::{Article, Location, LocationKind};
use sapitos_core::{DomainError, InventoryId, LocationId, OrderId, UserId};
use sapitos_inventory::{
    plan_depletion, DepletionLine, InventoryPatch, InventoryRecord, LowStockAdvisory,
};
use sapitos_orders::{Order, OrderLine};

use super::{
    ApprovalReceipt, DispatchReceipt, InventoryView, LineItemView, OrderFlowStore,
    PendingOrderView, RejectionReceipt, StoreError, UserProfile,
};

#[derive(Debug, Default)]
struct State {
    orders: HashMap<OrderId, StoredOrder>,
    inventory: HashMap<InventoryId, InventoryRecord>,
    articles: HashMap<sapitos_core::ArticleId, Article>,
    locations: HashMap<LocationId, Location>,
    users: HashMap<UserId, UserProfile>,
}

#[derive(Debug, Clone)]
struct StoredOrder {
    order: Order,
    lines: Vec<OrderLine>,
}

/// In-memory implementation of [`OrderFlowStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Transaction("store lock poisoned".to_string()))
    }
}

impl State {
    fn article_name(&self, record: &InventoryRecord) -> String {
        self.articles
            .get(&record.article_id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| record.article_id.to_string())
    }

    fn location_name(&self, record: &InventoryRecord) -> String {
        self.locations
            .get(&record.location_id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| record.location_id.to_string())
    }

    fn view(&self, record: &InventoryRecord) -> Result<InventoryView, StoreError> {
        let article = self
            .articles
            .get(&record.article_id)
            .ok_or(DomainError::NotFound)?;
        let location = self
            .locations
            .get(&record.location_id)
            .ok_or(DomainError::NotFound)?;
        Ok(InventoryView {
            record: record.clone(),
            article_name: article.name.clone(),
            category: article.category.clone(),
            supplier_price_cents: article.supplier_price_cents,
            sale_price_cents: article.sale_price_cents,
            season: article.season.clone(),
            location_name: location.name.clone(),
            location_kind: location.kind,
        })
    }

    fn advisory_for(&self, record: &InventoryRecord) -> Option<LowStockAdvisory> {
        LowStockAdvisory::evaluate(record, self.article_name(record), self.location_name(record))
    }
}

#[async_trait]
impl OrderFlowStore for InMemoryStore {
    async fn approve_order(
        &self,
        order_id: OrderId,
        today: NaiveDate,
    ) -> Result<ApprovalReceipt, StoreError> {
        let mut state = self.lock()?;
        let stored = state.orders.get_mut(&order_id).ok_or(DomainError::NotFound)?;

        let estimated = stored.order.approve(today)?;
        Ok(ApprovalReceipt {
            status: stored.order.status,
            estimated_delivery_date: estimated,
        })
    }

    async fn reject_order(
        &self,
        order_id: OrderId,
        today: NaiveDate,
        reason: Option<String>,
    ) -> Result<RejectionReceipt, StoreError> {
        let mut state = self.lock()?;
        let stored = state.orders.get_mut(&order_id).ok_or(DomainError::NotFound)?;

        stored.order.reject(today, reason.clone())?;
        Ok(RejectionReceipt {
            status: stored.order.status,
            reason,
        })
    }

    async fn dispatch_order(
        &self,
        order_id: OrderId,
        today: NaiveDate,
    ) -> Result<DispatchReceipt, StoreError> {
        let mut state = self.lock()?;

        let stored = state.orders.get(&order_id).ok_or(DomainError::NotFound)?;
        let lines = stored.lines.clone();
        let mut order = stored.order.clone();

        // Validate everything against a copy first; nothing below mutates
        // state until the whole plan is known to succeed.
        let depletion_lines = lines
            .iter()
            .map(|line| {
                let record = state
                    .inventory
                    .get(&line.inventory_id)
                    .ok_or(DomainError::NotFound)?;
                Ok(DepletionLine {
                    inventory_id: line.inventory_id,
                    article_name: state.article_name(record),
                    requested: line.quantity,
                    available: record.stock_actual,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let outcome = order.mark_in_transit(today)?;
        let plan = plan_depletion(depletion_lines)?;

        // Point of no return: apply the plan and the status change together.
        let mut low_stock = Vec::new();
        for planned in &plan {
            let record = state
                .inventory
                .get_mut(&planned.inventory_id)
                .ok_or(DomainError::NotFound)?;
            record.deplete(planned.requested, today)?;
            let record = record.clone();
            if let Some(advisory) = state.advisory_for(&record) {
                low_stock.push(advisory);
            }
        }

        let status = order.status;
        state
            .orders
            .get_mut(&order_id)
            .ok_or(DomainError::NotFound)?
            .order = order;

        Ok(DispatchReceipt {
            status,
            line_items_dispatched: plan.len(),
            outcome,
            low_stock,
        })
    }

    async fn order_line_items(&self, order_id: OrderId) -> Result<Vec<LineItemView>, StoreError> {
        let state = self.lock()?;
        let stored = state.orders.get(&order_id).ok_or(DomainError::NotFound)?;

        let mut items = stored
            .lines
            .iter()
            .map(|line| {
                let record = state
                    .inventory
                    .get(&line.inventory_id)
                    .ok_or(DomainError::NotFound)?;
                let article = state
                    .articles
                    .get(&record.article_id)
                    .ok_or(DomainError::NotFound)?;
                Ok(LineItemView {
                    article_id: article.id,
                    name: article.name.clone(),
                    category: article.category.clone(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price_cents,
                    subtotal_cents: line.subtotal_cents(),
                    available_stock: record.stock_actual,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn pending_orders_for_supplier(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<PendingOrderView>, StoreError> {
        let state = self.lock()?;
        let location = state
            .locations
            .get(&location_id)
            .ok_or(DomainError::NotFound)?;

        let mut views: Vec<_> = state
            .orders
            .values()
            .filter(|s| {
                s.order.status == sapitos_orders::OrderStatus::Pending
                    && s.order.organization == location.organization
            })
            .map(|s| {
                let requester = state.users.get(&s.order.created_by);
                PendingOrderView {
                    id: s.order.id,
                    created_at: s.order.created_at,
                    requested_by: requester
                        .map(|u| u.name.clone())
                        .unwrap_or_else(|| s.order.created_by.to_string()),
                    requester_email: requester.map(|u| u.email.clone()).unwrap_or_default(),
                    total_cents: s.order.total_cents,
                    discount_cents: s.order.discount_cents,
                    status: s.order.status,
                    estimated_delivery_date: s.order.estimated_delivery_date,
                    organization: s.order.organization.clone(),
                    order_type: s.order.order_type.clone(),
                }
            })
            .collect();

        views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(views)
    }

    async fn create_order(&self, order: Order, lines: Vec<OrderLine>) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if lines.is_empty() {
            return Err(DomainError::validation("order must have at least one line").into());
        }
        for line in &lines {
            if !state.inventory.contains_key(&line.inventory_id) {
                return Err(DomainError::validation("line references unknown inventory").into());
            }
        }
        if state.orders.contains_key(&order.id) {
            return Err(DomainError::conflict("order already exists").into());
        }
        state.orders.insert(order.id, StoredOrder { order, lines });
        Ok(())
    }

    async fn list_inventory(
        &self,
        kind: Option<LocationKind>,
    ) -> Result<Vec<InventoryView>, StoreError> {
        let state = self.lock()?;
        let mut views = state
            .inventory
            .values()
            .map(|r| state.view(r))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(kind) = kind {
            views.retain(|v| v.location_kind == kind);
        }
        views.sort_by(|a, b| a.article_name.cmp(&b.article_name));
        Ok(views)
    }

    async fn inventory_for_location(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<InventoryView>, StoreError> {
        let state = self.lock()?;
        if !state.locations.contains_key(&location_id) {
            return Err(DomainError::NotFound.into());
        }
        let mut views = state
            .inventory
            .values()
            .filter(|r| r.location_id == location_id)
            .map(|r| state.view(r))
            .collect::<Result<Vec<_>, _>>()?;
        views.sort_by(|a, b| a.article_name.cmp(&b.article_name));
        Ok(views)
    }

    async fn get_inventory(&self, id: InventoryId) -> Result<InventoryView, StoreError> {
        let state = self.lock()?;
        let record = state.inventory.get(&id).ok_or(DomainError::NotFound)?;
        state.view(record)
    }

    async fn create_inventory(&self, record: InventoryRecord) -> Result<InventoryId, StoreError> {
        let mut state = self.lock()?;
        if !state.articles.contains_key(&record.article_id) {
            return Err(DomainError::validation("article does not exist").into());
        }
        if !state.locations.contains_key(&record.location_id) {
            return Err(DomainError::validation("location does not exist").into());
        }
        let duplicate = state
            .inventory
            .values()
            .any(|r| r.article_id == record.article_id && r.location_id == record.location_id);
        if duplicate {
            return Err(
                DomainError::conflict("inventory record already exists for article/location")
                    .into(),
            );
        }
        let id = record.id;
        state.inventory.insert(id, record);
        Ok(id)
    }

    async fn patch_inventory(
        &self,
        id: InventoryId,
        patch: InventoryPatch,
    ) -> Result<Option<LowStockAdvisory>, StoreError> {
        let mut state = self.lock()?;
        let record = state.inventory.get_mut(&id).ok_or(DomainError::NotFound)?;
        record.apply_patch(&patch)?;
        let record = record.clone();

        if patch.touches_stock() {
            Ok(state.advisory_for(&record))
        } else {
            Ok(None)
        }
    }

    async fn delete_inventory(&self, id: InventoryId) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state
            .inventory
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound.into())
    }

    async fn list_articles(&self) -> Result<Vec<Article>, StoreError> {
        let state = self.lock()?;
        let mut articles: Vec<_> = state.articles.values().cloned().collect();
        articles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(articles)
    }

    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        let state = self.lock()?;
        let mut locations: Vec<_> = state.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn create_article(&self, article: Article) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.articles.contains_key(&article.id) {
            return Err(DomainError::conflict("article already exists").into());
        }
        state.articles.insert(article.id, article);
        Ok(())
    }

    async fn create_location(&self, location: Location) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.locations.contains_key(&location.id) {
            return Err(DomainError::conflict("location already exists").into());
        }
        state.locations.insert(location.id, location);
        Ok(())
    }

    async fn upsert_user(&self, user: UserProfile) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.users.insert(user.id, user);
        Ok(())
    }
}
