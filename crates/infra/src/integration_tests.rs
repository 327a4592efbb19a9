//! Integration tests for the full order flow against the in-memory store.
//!
//! Tests: lifecycle transition → depletion plan → stock mutation → advisory
//!
//! Verifies:
//! - Dispatch depletes stock atomically with the status transition
//! - A shortfall leaves every inventory record and the order untouched
//! - Racing transitions on one order admit exactly one winner
//! - Concurrent dispatches never oversell a shared inventory record

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, Utc};

    use sapitos_catalog::{Article, Location, LocationKind};
    use sapitos_core::{
        ArticleId, DomainError, InventoryId, LocationId, OrderId, Organization, UserId,
    };
    use sapitos_inventory::{InventoryPatch, InventoryRecord};
    use sapitos_orders::{Order, OrderLine, OrderStatus};

    use crate::store::{InMemoryStore, OrderFlowStore, StoreError, UserProfile};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn org() -> Organization {
        Organization::new("Proveedora Centro").unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        supplier_location: LocationId,
        requester: UserId,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = Arc::new(InMemoryStore::new());
            let supplier_location = LocationId::new();
            let requester = UserId::new();

            store
                .create_location(
                    Location::new(
                        supplier_location,
                        "Almacén Central",
                        LocationKind::Supplier,
                        org(),
                        19.43,
                        -99.13,
                        Utc::now(),
                    )
                    .unwrap(),
                )
                .await
                .unwrap();

            store
                .upsert_user(UserProfile {
                    id: requester,
                    name: "Ana Torres".to_string(),
                    email: "ana@sapitos.mx".to_string(),
                })
                .await
                .unwrap();

            Self {
                store,
                supplier_location,
                requester,
            }
        }

        /// Seed one article with a stock record at the supplier location.
        async fn seed_article(&self, name: &str, stock: i64, min: i64, recommended: i64) -> InventoryId {
            let article =
                Article::new(ArticleId::new(), name, "Ropa", 5_000, 9_900, None).unwrap();
            let article_id = article.id;
            self.store.create_article(article).await.unwrap();

            let mut record = InventoryRecord::new(
                InventoryId::new(),
                article_id,
                self.supplier_location,
                stock,
                min,
                recommended,
                0,
            )
            .unwrap();
            record.avg_daily_demand = 2.0;
            self.store.create_inventory(record).await.unwrap()
        }

        /// Seed a pending order with the given (inventory, quantity) lines.
        async fn seed_order(&self, lines: &[(InventoryId, i64)]) -> OrderId {
            let order = Order::create(
                OrderId::new(),
                Utc::now(),
                self.requester,
                org(),
                "supplier",
                10_000,
                0,
            );
            let id = order.id;
            let lines = lines
                .iter()
                .map(|(inv, qty)| OrderLine::new(*inv, *qty, 9_900).unwrap())
                .collect();
            self.store.create_order(order, lines).await.unwrap();
            id
        }
    }

    fn assert_domain(err: StoreError) -> DomainError {
        match err {
            StoreError::Domain(e) => e,
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dispatch_depletes_stock_and_raises_low_stock_advisory() {
        let fx = Fixture::new().await;
        let inv = fx.seed_article("Playera", 10, 5, 25).await;
        let order = fx.seed_order(&[(inv, 10)]).await;

        let receipt = fx.store.approve_order(order, day(1)).await.unwrap();
        assert_eq!(receipt.status, OrderStatus::Approved);
        assert_eq!(receipt.estimated_delivery_date, day(8));

        let receipt = fx.store.dispatch_order(order, day(3)).await.unwrap();
        assert_eq!(receipt.status, OrderStatus::InTransit);
        assert_eq!(receipt.line_items_dispatched, 1);
        assert!(receipt.outcome.on_time);
        assert_eq!(receipt.outcome.delivery_days, 2);

        // Stock hit zero, below the minimum of 5: one advisory, recommending
        // a refill back up to the recommended level.
        assert_eq!(receipt.low_stock.len(), 1);
        let advisory = &receipt.low_stock[0];
        assert_eq!(advisory.article_name, "Playera");
        assert_eq!(advisory.stock_actual, 0);
        assert_eq!(advisory.reorder_quantity, 25);
        assert_eq!(advisory.days_until_depletion, Some(0.0));

        let view = fx.store.get_inventory(inv).await.unwrap();
        assert_eq!(view.record.stock_actual, 0);
        assert_eq!(view.record.exported_total, 10);
        assert_eq!(view.record.last_export_date, Some(day(3)));

        // A second dispatch on the same order hits the state guard.
        let err = assert_domain(fx.store.dispatch_order(order, day(4)).await.unwrap_err());
        assert_eq!(err, DomainError::invalid_state("approved", "in_transit"));
    }

    #[tokio::test]
    async fn shortfall_reports_first_offender_and_mutates_nothing() {
        let fx = Fixture::new().await;
        let inv_ok = fx.seed_article("Abrigo", 50, 5, 60).await;
        let inv_short = fx.seed_article("Bufanda", 10, 5, 60).await;
        let order = fx.seed_order(&[(inv_ok, 20), (inv_short, 15)]).await;

        fx.store.approve_order(order, day(1)).await.unwrap();
        let err = assert_domain(fx.store.dispatch_order(order, day(2)).await.unwrap_err());
        assert_eq!(err, DomainError::insufficient_stock("Bufanda", 10, 15));

        // Atomicity: neither record moved, including the sufficient one.
        let ok_view = fx.store.get_inventory(inv_ok).await.unwrap();
        let short_view = fx.store.get_inventory(inv_short).await.unwrap();
        assert_eq!(ok_view.record.stock_actual, 50);
        assert_eq!(ok_view.record.exported_total, 0);
        assert_eq!(short_view.record.stock_actual, 10);

        // The order is still Approved: replenish and dispatch again.
        fx.store
            .patch_inventory(
                inv_short,
                InventoryPatch {
                    stock_actual: Some(15),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let receipt = fx.store.dispatch_order(order, day(3)).await.unwrap();
        assert_eq!(receipt.line_items_dispatched, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_approvals_admit_exactly_one_winner() {
        let fx = Fixture::new().await;
        let inv = fx.seed_article("Gorra", 10, 2, 20).await;
        let order = fx.seed_order(&[(inv, 1)]).await;

        let a = {
            let store = fx.store.clone();
            tokio::spawn(async move { store.approve_order(order, day(1)).await })
        };
        let b = {
            let store = fx.store.clone();
            tokio::spawn(async move { store.approve_order(order, day(1)).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);

        let loser = results.into_iter().find(|r| r.is_err()).unwrap();
        assert_eq!(
            assert_domain(loser.unwrap_err()),
            DomainError::invalid_state("pending", "approved"),
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_dispatches_never_oversell_a_shared_record() {
        let fx = Fixture::new().await;
        let inv = fx.seed_article("Chamarra", 10, 2, 20).await;
        let first = fx.seed_order(&[(inv, 6)]).await;
        let second = fx.seed_order(&[(inv, 6)]).await;

        fx.store.approve_order(first, day(1)).await.unwrap();
        fx.store.approve_order(second, day(1)).await.unwrap();

        let a = {
            let store = fx.store.clone();
            tokio::spawn(async move { store.dispatch_order(first, day(2)).await })
        };
        let b = {
            let store = fx.store.clone();
            tokio::spawn(async move { store.dispatch_order(second, day(2)).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);

        match assert_domain(results.into_iter().find(|r| r.is_err()).unwrap().unwrap_err()) {
            DomainError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 4);
                assert_eq!(requested, 6);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Initial stock minus the single successful dispatch.
        let view = fx.store.get_inventory(inv).await.unwrap();
        assert_eq!(view.record.stock_actual, 4);
    }

    #[tokio::test]
    async fn late_dispatch_is_recorded_as_not_on_time() {
        let fx = Fixture::new().await;
        let inv = fx.seed_article("Pantalón", 30, 2, 40).await;
        let order = fx.seed_order(&[(inv, 5)]).await;

        fx.store.approve_order(order, day(1)).await.unwrap();
        let receipt = fx.store.dispatch_order(order, day(10)).await.unwrap();
        assert!(!receipt.outcome.on_time);
        assert_eq!(receipt.outcome.delivery_days, 9);
        assert!(receipt.low_stock.is_empty());
    }

    #[tokio::test]
    async fn reject_requires_pending() {
        let fx = Fixture::new().await;
        let inv = fx.seed_article("Playera", 10, 2, 20).await;
        let order = fx.seed_order(&[(inv, 1)]).await;

        fx.store.approve_order(order, day(1)).await.unwrap();
        let err = assert_domain(
            fx.store
                .reject_order(order, day(2), Some("cambio de planes".into()))
                .await
                .unwrap_err(),
        );
        assert_eq!(err, DomainError::invalid_state("pending", "approved"));
    }

    #[tokio::test]
    async fn rejection_stores_the_reason_and_clears_the_pending_queue() {
        let fx = Fixture::new().await;
        let inv = fx.seed_article("Playera", 10, 2, 20).await;
        let order = fx.seed_order(&[(inv, 1)]).await;

        let pending = fx
            .store
            .pending_orders_for_supplier(fx.supplier_location)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].requested_by, "Ana Torres");
        assert_eq!(pending[0].requester_email, "ana@sapitos.mx");

        let receipt = fx
            .store
            .reject_order(order, day(1), Some("sin presupuesto".into()))
            .await
            .unwrap();
        assert_eq!(receipt.status, OrderStatus::Rejected);
        assert_eq!(receipt.reason.as_deref(), Some("sin presupuesto"));

        let pending = fx
            .store
            .pending_orders_for_supplier(fx.supplier_location)
            .await
            .unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn line_item_view_is_ordered_by_article_name_with_live_stock() {
        let fx = Fixture::new().await;
        let inv_z = fx.seed_article("Zapato", 9, 2, 20).await;
        let inv_a = fx.seed_article("Abrigo", 7, 2, 20).await;
        let order = fx.seed_order(&[(inv_z, 3), (inv_a, 2)]).await;

        let items = fx.store.order_line_items(order).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Abrigo");
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].available_stock, 7);
        assert_eq!(items[0].subtotal_cents, 2 * 9_900);
        assert_eq!(items[1].name, "Zapato");
        assert_eq!(items[1].available_stock, 9);
    }

    #[tokio::test]
    async fn patch_below_minimum_returns_an_advisory() {
        let fx = Fixture::new().await;
        let inv = fx.seed_article("Playera", 10, 5, 25).await;

        let advisory = fx
            .store
            .patch_inventory(
                inv,
                InventoryPatch {
                    stock_actual: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .expect("stock below minimum should produce an advisory");
        assert_eq!(advisory.stock_actual, 2);
        assert_eq!(advisory.reorder_quantity, 23);

        // Threshold-only patches do not trigger stock advisories.
        let none = fx
            .store
            .patch_inventory(
                inv,
                InventoryPatch {
                    min_stock: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn inventory_creation_validates_references_and_uniqueness() {
        let fx = Fixture::new().await;
        let inv = fx.seed_article("Playera", 10, 5, 25).await;
        let existing = fx.store.get_inventory(inv).await.unwrap();

        // Same article+location pair again.
        let dup = InventoryRecord::new(
            InventoryId::new(),
            existing.record.article_id,
            fx.supplier_location,
            1,
            1,
            1,
            0,
        )
        .unwrap();
        let err = assert_domain(fx.store.create_inventory(dup).await.unwrap_err());
        assert!(matches!(err, DomainError::Conflict(_)));

        // Unknown article.
        let dangling = InventoryRecord::new(
            InventoryId::new(),
            ArticleId::new(),
            fx.supplier_location,
            1,
            1,
            1,
            0,
        )
        .unwrap();
        let err = assert_domain(fx.store.create_inventory(dangling).await.unwrap_err());
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
