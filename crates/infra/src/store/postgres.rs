//! Postgres-backed order-flow store.
//!
//! Transaction discipline per operation:
//!
//! - `approve`/`reject` are single conditional `UPDATE ... WHERE status =
//!   'pending'` statements; a racing caller sees zero rows affected and is
//!   answered with the current status.
//! - `dispatch` runs one transaction: the order row and every touched
//!   inventory row are locked with `FOR UPDATE`, the depletion plan is
//!   validated against the locked stock, and only then are the stock
//!   decrements and the status transition written. Any failure drops the
//!   transaction unapplied.
//!
//! The schema lives in `schema.sql` at the crate root.
//!
//! SQLx errors map to [`StoreError`] as follows: `23505` (unique violation)
//! becomes a domain `Conflict`, `23503`/`23514` (referential / check
//! violations) become domain `Validation`, `RowNotFound` becomes `NotFound`,
//! and everything else surfaces as `Database` with the failing operation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use sapitos_catalog::{Article, Location, LocationKind};
use sapitos_core::{
    ArticleId, DomainError, InventoryId, LocationId, OrderId, Organization, UserId,
};
use sapitos_inventory::{
    plan_depletion, DepletionLine, InventoryPatch, InventoryRecord, LowStockAdvisory,
};
use sapitos_orders::{estimated_delivery, DeliveryOutcome, Order, OrderLine, OrderStatus};

use super::{
    ApprovalReceipt, DispatchReceipt, InventoryView, LineItemView, OrderFlowStore,
    PendingOrderView, RejectionReceipt, StoreError, UserProfile,
};

/// Postgres implementation of [`OrderFlowStore`].
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Current status of an order, for disambiguating a failed conditional
    /// update into `NotFound` vs `InvalidState`.
    async fn order_status(&self, order_id: OrderId) -> Result<OrderStatus, StoreError> {
        let row = sqlx::query("SELECT status FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("order_status", e))?;

        let row = row.ok_or(DomainError::NotFound)?;
        let status: String = row
            .try_get("status")
            .map_err(|e| map_sqlx_error("order_status", e))?;
        Ok(OrderStatus::parse(&status)?)
    }
}

#[async_trait]
impl OrderFlowStore for PostgresStore {
    #[instrument(skip(self), fields(order_id = %order_id), err)]
    async fn approve_order(
        &self,
        order_id: OrderId,
        today: NaiveDate,
    ) -> Result<ApprovalReceipt, StoreError> {
        let estimated = estimated_delivery(today);
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'approved', accepted_date = $2, estimated_delivery_date = $3
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(today)
        .bind(estimated)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("approve_order", e))?;

        if result.rows_affected() == 0 {
            let current = self.order_status(order_id).await?;
            return Err(DomainError::invalid_state(
                OrderStatus::Pending.as_str(),
                current.as_str(),
            )
            .into());
        }

        Ok(ApprovalReceipt {
            status: OrderStatus::Approved,
            estimated_delivery_date: estimated,
        })
    }

    #[instrument(skip(self, reason), fields(order_id = %order_id), err)]
    async fn reject_order(
        &self,
        order_id: OrderId,
        today: NaiveDate,
        reason: Option<String>,
    ) -> Result<RejectionReceipt, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'rejected', accepted_date = $2, rejection_reason = $3
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(today)
        .bind(reason.as_deref())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("reject_order", e))?;

        if result.rows_affected() == 0 {
            let current = self.order_status(order_id).await?;
            return Err(DomainError::invalid_state(
                OrderStatus::Pending.as_str(),
                current.as_str(),
            )
            .into());
        }

        Ok(RejectionReceipt {
            status: OrderStatus::Rejected,
            reason,
        })
    }

    #[instrument(skip(self), fields(order_id = %order_id), err)]
    async fn dispatch_order(
        &self,
        order_id: OrderId,
        today: NaiveDate,
    ) -> Result<DispatchReceipt, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        // Lock the order row for the duration of the transaction.
        let row = sqlx::query(
            r#"
            SELECT status, accepted_date, estimated_delivery_date
            FROM orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("dispatch_order", e))?;

        let row = row.ok_or(DomainError::NotFound)?;
        let status: String = row
            .try_get("status")
            .map_err(|e| map_sqlx_error("dispatch_order", e))?;
        let status = OrderStatus::parse(&status)?;
        if status != OrderStatus::Approved {
            return Err(DomainError::invalid_state(
                OrderStatus::Approved.as_str(),
                status.as_str(),
            )
            .into());
        }

        let accepted: Option<NaiveDate> = row
            .try_get("accepted_date")
            .map_err(|e| map_sqlx_error("dispatch_order", e))?;
        let estimated: Option<NaiveDate> = row
            .try_get("estimated_delivery_date")
            .map_err(|e| map_sqlx_error("dispatch_order", e))?;
        let accepted = accepted
            .ok_or_else(|| DomainError::validation("approved order missing acceptance date"))?;
        let estimated = estimated.ok_or_else(|| {
            DomainError::validation("approved order missing estimated delivery date")
        })?;

        // Lock every inventory row the order touches, in the planner's
        // iteration order, so concurrent dispatches acquire locks in the
        // same sequence.
        let line_rows = sqlx::query(
            r#"
            SELECT ol.inventory_id, ol.quantity, a.name AS article_name, i.stock_actual
            FROM order_lines ol
            JOIN inventory i ON i.id = ol.inventory_id
            JOIN articles a ON a.id = i.article_id
            WHERE ol.order_id = $1
            ORDER BY a.name ASC, ol.inventory_id ASC
            FOR UPDATE OF i
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("dispatch_order", e))?;

        let mut depletion_lines = Vec::with_capacity(line_rows.len());
        for row in &line_rows {
            depletion_lines.push(DepletionLine {
                inventory_id: InventoryId::from_uuid(
                    row.try_get("inventory_id")
                        .map_err(|e| map_sqlx_error("dispatch_order", e))?,
                ),
                article_name: row
                    .try_get("article_name")
                    .map_err(|e| map_sqlx_error("dispatch_order", e))?,
                requested: row
                    .try_get("quantity")
                    .map_err(|e| map_sqlx_error("dispatch_order", e))?,
                available: row
                    .try_get("stock_actual")
                    .map_err(|e| map_sqlx_error("dispatch_order", e))?,
            });
        }

        // Shortfall here drops the transaction; nothing has been written.
        let plan = plan_depletion(depletion_lines)?;
        let outcome = DeliveryOutcome::compute(accepted, estimated, today);

        for planned in &plan {
            sqlx::query(
                r#"
                UPDATE inventory
                SET stock_actual = stock_actual - $2,
                    exported_total = exported_total + $2,
                    last_export_date = $3
                WHERE id = $1
                "#,
            )
            .bind(planned.inventory_id.as_uuid())
            .bind(planned.requested)
            .bind(today)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("dispatch_order", e))?;
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET status = 'in_transit', delivered_date = $2, on_time = $3, delivery_days = $4
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(today)
        .bind(outcome.on_time)
        .bind(outcome.delivery_days)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("dispatch_order", e))?;

        // Gather advisories for records the dispatch pushed below minimum,
        // inside the transaction so they reflect the stock being committed.
        let touched: Vec<Uuid> = plan.iter().map(|p| *p.inventory_id.as_uuid()).collect();
        let advisory_rows = sqlx::query(
            r#"
            SELECT i.*, a.name AS article_name, l.name AS location_name
            FROM inventory i
            JOIN articles a ON a.id = i.article_id
            JOIN locations l ON l.id = i.location_id
            WHERE i.id = ANY($1) AND i.stock_actual < i.min_stock
            ORDER BY a.name ASC
            "#,
        )
        .bind(&touched)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("dispatch_order", e))?;

        let mut low_stock = Vec::with_capacity(advisory_rows.len());
        for row in advisory_rows {
            let joined = InventoryJoinRow::from_row(&row)
                .map_err(|e| map_sqlx_error("dispatch_order", e))?;
            if let Some(advisory) = LowStockAdvisory::evaluate(
                &joined.record,
                joined.article_name,
                joined.location_name,
            ) {
                low_stock.push(advisory);
            }
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(DispatchReceipt {
            status: OrderStatus::InTransit,
            line_items_dispatched: plan.len(),
            outcome,
            low_stock,
        })
    }

    #[instrument(skip(self), fields(order_id = %order_id), err)]
    async fn order_line_items(&self, order_id: OrderId) -> Result<Vec<LineItemView>, StoreError> {
        // Existence first: an order with no lines cannot happen, so zero
        // rows from the join would otherwise be ambiguous.
        self.order_status(order_id).await?;

        let rows = sqlx::query(
            r#"
            SELECT a.id AS article_id, a.name, a.category,
                   ol.quantity, ol.unit_price_cents, i.stock_actual
            FROM order_lines ol
            JOIN inventory i ON i.id = ol.inventory_id
            JOIN articles a ON a.id = i.article_id
            WHERE ol.order_id = $1
            ORDER BY a.name ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("order_line_items", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(
                line_item_from_row(&row).map_err(|e| map_sqlx_error("order_line_items", e))?,
            );
        }
        Ok(items)
    }

    #[instrument(skip(self), fields(location_id = %location_id), err)]
    async fn pending_orders_for_supplier(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<PendingOrderView>, StoreError> {
        let row = sqlx::query("SELECT organization FROM locations WHERE id = $1")
            .bind(location_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("pending_orders_for_supplier", e))?;
        let row = row.ok_or(DomainError::NotFound)?;
        let organization: String = row
            .try_get("organization")
            .map_err(|e| map_sqlx_error("pending_orders_for_supplier", e))?;

        let rows = sqlx::query(
            r#"
            SELECT o.id, o.created_at, o.total_cents, o.discount_cents, o.status,
                   o.estimated_delivery_date, o.organization, o.order_type,
                   o.created_by, u.name AS requester_name, u.email AS requester_email
            FROM orders o
            LEFT JOIN users u ON u.id = o.created_by
            WHERE o.status = 'pending' AND o.organization = $1
            ORDER BY o.created_at DESC
            "#,
        )
        .bind(&organization)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("pending_orders_for_supplier", e))?;

        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            views.push(
                pending_order_from_row(&row)
                    .map_err(|e| map_sqlx_error("pending_orders_for_supplier", e))?,
            );
        }
        Ok(views)
    }

    #[instrument(skip(self, order, lines), fields(order_id = %order.id, line_count = lines.len()), err)]
    async fn create_order(&self, order: Order, lines: Vec<OrderLine>) -> Result<(), StoreError> {
        if lines.is_empty() {
            return Err(DomainError::validation("order must have at least one line").into());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, created_at, created_by, organization, order_type,
                total_cents, discount_cents, status,
                accepted_date, estimated_delivery_date, delivered_date,
                on_time, delivery_days, rejection_reason
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.created_at)
        .bind(order.created_by.as_uuid())
        .bind(order.organization.as_str())
        .bind(&order.order_type)
        .bind(order.total_cents as i64)
        .bind(order.discount_cents as i64)
        .bind(order.status.as_str())
        .bind(order.accepted_date)
        .bind(order.estimated_delivery_date)
        .bind(order.delivered_date)
        .bind(order.on_time)
        .bind(order.delivery_days)
        .bind(order.rejection_reason.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_order", e))?;

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, inventory_id, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(line.inventory_id.as_uuid())
            .bind(line.quantity)
            .bind(line.unit_price_cents as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_order", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))
    }

    #[instrument(skip(self), err)]
    async fn list_inventory(
        &self,
        kind: Option<LocationKind>,
    ) -> Result<Vec<InventoryView>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT i.*, a.name AS article_name, a.category, a.supplier_price_cents,
                   a.sale_price_cents, a.season, l.name AS location_name, l.kind AS location_kind
            FROM inventory i
            JOIN articles a ON a.id = i.article_id
            JOIN locations l ON l.id = i.location_id
            WHERE ($1::text IS NULL OR l.kind = $1)
            ORDER BY a.name ASC
            "#,
        )
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_inventory", e))?;

        collect_inventory_views(rows).map_err(|e| map_sqlx_error("list_inventory", e))
    }

    #[instrument(skip(self), fields(location_id = %location_id), err)]
    async fn inventory_for_location(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<InventoryView>, StoreError> {
        let exists = sqlx::query("SELECT 1 FROM locations WHERE id = $1")
            .bind(location_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("inventory_for_location", e))?;
        if exists.is_none() {
            return Err(DomainError::NotFound.into());
        }

        let rows = sqlx::query(
            r#"
            SELECT i.*, a.name AS article_name, a.category, a.supplier_price_cents,
                   a.sale_price_cents, a.season, l.name AS location_name, l.kind AS location_kind
            FROM inventory i
            JOIN articles a ON a.id = i.article_id
            JOIN locations l ON l.id = i.location_id
            WHERE i.location_id = $1
            ORDER BY a.name ASC
            "#,
        )
        .bind(location_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory_for_location", e))?;

        collect_inventory_views(rows).map_err(|e| map_sqlx_error("inventory_for_location", e))
    }

    #[instrument(skip(self), fields(inventory_id = %id), err)]
    async fn get_inventory(&self, id: InventoryId) -> Result<InventoryView, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT i.*, a.name AS article_name, a.category, a.supplier_price_cents,
                   a.sale_price_cents, a.season, l.name AS location_name, l.kind AS location_kind
            FROM inventory i
            JOIN articles a ON a.id = i.article_id
            JOIN locations l ON l.id = i.location_id
            WHERE i.id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_inventory", e))?;

        let row = row.ok_or(DomainError::NotFound)?;
        let view = InventoryViewRow::from_row(&row)
            .map_err(|e| map_sqlx_error("get_inventory", e))?;
        view.into_view().map_err(|e| map_sqlx_error("get_inventory", e))
    }

    #[instrument(skip(self, record), fields(inventory_id = %record.id), err)]
    async fn create_inventory(&self, record: InventoryRecord) -> Result<InventoryId, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO inventory (
                id, article_id, location_id, stock_actual, min_stock,
                recommended_stock, safety_stock, profit_margin_bp,
                restock_lead_days, avg_daily_demand, imported_total,
                exported_total, last_import_date, last_export_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.article_id.as_uuid())
        .bind(record.location_id.as_uuid())
        .bind(record.stock_actual)
        .bind(record.min_stock)
        .bind(record.recommended_stock)
        .bind(record.safety_stock)
        .bind(record.profit_margin_bp)
        .bind(record.restock_lead_days)
        .bind(record.avg_daily_demand)
        .bind(record.imported_total)
        .bind(record.exported_total)
        .bind(record.last_import_date)
        .bind(record.last_export_date)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_inventory", e))?;

        Ok(record.id)
    }

    #[instrument(skip(self, patch), fields(inventory_id = %id), err)]
    async fn patch_inventory(
        &self,
        id: InventoryId,
        patch: InventoryPatch,
    ) -> Result<Option<LowStockAdvisory>, StoreError> {
        // Read-modify-write under a row lock; validation lives in
        // InventoryRecord::apply_patch.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        let row = sqlx::query(
            r#"
            SELECT i.*, a.name AS article_name, l.name AS location_name
            FROM inventory i
            JOIN articles a ON a.id = i.article_id
            JOIN locations l ON l.id = i.location_id
            WHERE i.id = $1
            FOR UPDATE OF i
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("patch_inventory", e))?;

        let row = row.ok_or(DomainError::NotFound)?;
        let mut joined = InventoryJoinRow::from_row(&row)
            .map_err(|e| map_sqlx_error("patch_inventory", e))?;
        joined.record.apply_patch(&patch)?;

        sqlx::query(
            r#"
            UPDATE inventory
            SET stock_actual = $2, min_stock = $3, recommended_stock = $4,
                safety_stock = $5, profit_margin_bp = $6, restock_lead_days = $7,
                avg_daily_demand = $8
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(joined.record.stock_actual)
        .bind(joined.record.min_stock)
        .bind(joined.record.recommended_stock)
        .bind(joined.record.safety_stock)
        .bind(joined.record.profit_margin_bp)
        .bind(joined.record.restock_lead_days)
        .bind(joined.record.avg_daily_demand)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("patch_inventory", e))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        if patch.touches_stock() {
            Ok(LowStockAdvisory::evaluate(
                &joined.record,
                joined.article_name,
                joined.location_name,
            ))
        } else {
            Ok(None)
        }
    }

    #[instrument(skip(self), fields(inventory_id = %id), err)]
    async fn delete_inventory(&self, id: InventoryId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_inventory", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound.into());
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_articles(&self) -> Result<Vec<Article>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, category, supplier_price_cents, sale_price_cents, season \
             FROM articles ORDER BY name ASC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_articles", e))?;

        let mut articles = Vec::with_capacity(rows.len());
        for row in rows {
            articles.push(article_from_row(&row).map_err(|e| map_sqlx_error("list_articles", e))?);
        }
        Ok(articles)
    }

    #[instrument(skip(self), err)]
    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, kind, organization, position_x, position_y, created_at \
             FROM locations ORDER BY name ASC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_locations", e))?;

        let mut locations = Vec::with_capacity(rows.len());
        for row in rows {
            locations
                .push(location_from_row(&row).map_err(|e| map_sqlx_error("list_locations", e))?);
        }
        Ok(locations)
    }

    #[instrument(skip(self, article), fields(article_id = %article.id), err)]
    async fn create_article(&self, article: Article) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO articles (id, name, category, supplier_price_cents, sale_price_cents, season)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(article.id.as_uuid())
        .bind(&article.name)
        .bind(&article.category)
        .bind(article.supplier_price_cents as i64)
        .bind(article.sale_price_cents as i64)
        .bind(article.season.as_deref())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_article", e))?;
        Ok(())
    }

    #[instrument(skip(self, location), fields(location_id = %location.id), err)]
    async fn create_location(&self, location: Location) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO locations (id, name, kind, organization, position_x, position_y, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(location.id.as_uuid())
        .bind(&location.name)
        .bind(location.kind.as_str())
        .bind(location.organization.as_str())
        .bind(location.position_x)
        .bind(location.position_y)
        .bind(location.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_location", e))?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn upsert_user(&self, user: UserProfile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_user", e))?;
        Ok(())
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = db_err.message().to_string();
            match db_err.code().as_deref() {
                // Unique violation: duplicate key, e.g. inventory (article, location).
                Some("23505") => DomainError::conflict(msg).into(),
                // Foreign key / check violations: bad references or values.
                Some("23503") | Some("23514") => DomainError::validation(msg).into(),
                _ => StoreError::database(operation, msg),
            }
        }
        sqlx::Error::RowNotFound => DomainError::NotFound.into(),
        other => StoreError::database(operation, other.to_string()),
    }
}

// SQLx row types

/// Inventory row joined with article and location names (advisory inputs).
#[derive(Debug)]
struct InventoryJoinRow {
    record: InventoryRecord,
    article_name: String,
    location_name: String,
}

impl<'r> FromRow<'r, PgRow> for InventoryJoinRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            record: inventory_record_from_row(row)?,
            article_name: row.try_get("article_name")?,
            location_name: row.try_get("location_name")?,
        })
    }
}

/// Inventory row joined with full article and location columns.
#[derive(Debug)]
struct InventoryViewRow {
    record: InventoryRecord,
    article_name: String,
    category: String,
    supplier_price_cents: i64,
    sale_price_cents: i64,
    season: Option<String>,
    location_name: String,
    location_kind: String,
}

impl<'r> FromRow<'r, PgRow> for InventoryViewRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            record: inventory_record_from_row(row)?,
            article_name: row.try_get("article_name")?,
            category: row.try_get("category")?,
            supplier_price_cents: row.try_get("supplier_price_cents")?,
            sale_price_cents: row.try_get("sale_price_cents")?,
            season: row.try_get("season")?,
            location_name: row.try_get("location_name")?,
            location_kind: row.try_get("location_kind")?,
        })
    }
}

impl InventoryViewRow {
    fn into_view(self) -> Result<InventoryView, sqlx::Error> {
        let location_kind =
            LocationKind::parse(&self.location_kind).map_err(|e| sqlx::Error::ColumnDecode {
                index: "location_kind".to_string(),
                source: Box::new(e),
            })?;
        Ok(InventoryView {
            record: self.record,
            article_name: self.article_name,
            category: self.category,
            supplier_price_cents: self.supplier_price_cents as u64,
            sale_price_cents: self.sale_price_cents as u64,
            season: self.season,
            location_name: self.location_name,
            location_kind,
        })
    }
}

fn inventory_record_from_row(row: &PgRow) -> Result<InventoryRecord, sqlx::Error> {
    Ok(InventoryRecord {
        id: InventoryId::from_uuid(row.try_get("id")?),
        article_id: ArticleId::from_uuid(row.try_get("article_id")?),
        location_id: LocationId::from_uuid(row.try_get("location_id")?),
        stock_actual: row.try_get("stock_actual")?,
        min_stock: row.try_get("min_stock")?,
        recommended_stock: row.try_get("recommended_stock")?,
        safety_stock: row.try_get("safety_stock")?,
        profit_margin_bp: row.try_get("profit_margin_bp")?,
        restock_lead_days: row.try_get("restock_lead_days")?,
        avg_daily_demand: row.try_get("avg_daily_demand")?,
        imported_total: row.try_get("imported_total")?,
        exported_total: row.try_get("exported_total")?,
        last_import_date: row.try_get("last_import_date")?,
        last_export_date: row.try_get("last_export_date")?,
    })
}

fn collect_inventory_views(rows: Vec<PgRow>) -> Result<Vec<InventoryView>, sqlx::Error> {
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(InventoryViewRow::from_row(&row)?.into_view()?);
    }
    Ok(views)
}

fn line_item_from_row(row: &PgRow) -> Result<LineItemView, sqlx::Error> {
    let quantity: i64 = row.try_get("quantity")?;
    let unit_price_cents: i64 = row.try_get("unit_price_cents")?;
    Ok(LineItemView {
        article_id: ArticleId::from_uuid(row.try_get("article_id")?),
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        quantity,
        unit_price_cents: unit_price_cents as u64,
        subtotal_cents: (quantity as u64).saturating_mul(unit_price_cents as u64),
        available_stock: row.try_get("stock_actual")?,
    })
}

fn pending_order_from_row(row: &PgRow) -> Result<PendingOrderView, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = OrderStatus::parse(&status).map_err(|e| sqlx::Error::ColumnDecode {
        index: "status".to_string(),
        source: Box::new(e),
    })?;
    let organization: String = row.try_get("organization")?;
    let organization = Organization::new(organization).map_err(|e| sqlx::Error::ColumnDecode {
        index: "organization".to_string(),
        source: Box::new(e),
    })?;
    let created_by = UserId::from_uuid(row.try_get("created_by")?);
    let requester_name: Option<String> = row.try_get("requester_name")?;
    let requester_email: Option<String> = row.try_get("requester_email")?;
    let total_cents: i64 = row.try_get("total_cents")?;
    let discount_cents: i64 = row.try_get("discount_cents")?;

    Ok(PendingOrderView {
        id: OrderId::from_uuid(row.try_get("id")?),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        requested_by: requester_name.unwrap_or_else(|| created_by.to_string()),
        requester_email: requester_email.unwrap_or_default(),
        total_cents: total_cents as u64,
        discount_cents: discount_cents as u64,
        status,
        estimated_delivery_date: row.try_get("estimated_delivery_date")?,
        organization,
        order_type: row.try_get("order_type")?,
    })
}

fn article_from_row(row: &PgRow) -> Result<Article, sqlx::Error> {
    let supplier_price_cents: i64 = row.try_get("supplier_price_cents")?;
    let sale_price_cents: i64 = row.try_get("sale_price_cents")?;
    Ok(Article {
        id: ArticleId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        supplier_price_cents: supplier_price_cents as u64,
        sale_price_cents: sale_price_cents as u64,
        season: row.try_get("season")?,
    })
}

fn location_from_row(row: &PgRow) -> Result<Location, sqlx::Error> {
    let kind: String = row.try_get("kind")?;
    let kind = LocationKind::parse(&kind).map_err(|e| sqlx::Error::ColumnDecode {
        index: "kind".to_string(),
        source: Box::new(e),
    })?;
    let organization: String = row.try_get("organization")?;
    let organization = Organization::new(organization).map_err(|e| sqlx::Error::ColumnDecode {
        index: "organization".to_string(),
        source: Box::new(e),
    })?;
    Ok(Location {
        id: LocationId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        kind,
        organization,
        position_x: row.try_get("position_x")?,
        position_y: row.try_get("position_y")?,
        created_at: row.try_get("created_at")?,
    })
}
