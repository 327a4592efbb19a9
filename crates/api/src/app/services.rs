//! Service wiring: which store backs the API and where notifications go.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use sapitos_infra::{InMemoryStore, OrderFlowStore, PostgresStore};
use sapitos_inventory::LowStockAdvisory;
use sapitos_notifications::{notify_low_stock, NotificationEmitter, TracingEmitter};

pub struct AppServices {
    pub store: Arc<dyn OrderFlowStore>,
    pub emitter: Arc<dyn NotificationEmitter>,
}

impl AppServices {
    /// Emit low-stock notifications for a committed mutation on a detached
    /// task. Best-effort: emitter failures are logged inside
    /// `notify_low_stock` and never surface to the caller.
    pub fn emit_low_stock(&self, advisories: &[LowStockAdvisory]) {
        if advisories.is_empty() {
            return;
        }
        let emitter = Arc::clone(&self.emitter);
        let advisories = advisories.to_vec();
        tokio::spawn(async move {
            for advisory in &advisories {
                notify_low_stock(&*emitter, advisory);
            }
        });
    }
}

/// Pick the store backend from the environment.
///
/// `USE_PERSISTENT_STORES=true` selects Postgres via `DATABASE_URL`;
/// anything else gets the in-memory store (dev/test).
pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        return build_postgres_services().await;
    }

    build_in_memory_services()
}

fn build_in_memory_services() -> AppServices {
    AppServices {
        store: Arc::new(InMemoryStore::new()),
        emitter: Arc::new(TracingEmitter),
    }
}

async fn build_postgres_services() -> AppServices {
    let url = std::env::var("DATABASE_URL")
        .expect("USE_PERSISTENT_STORES=true requires DATABASE_URL");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("failed to connect to database");

    tracing::info!("connected to postgres store");

    AppServices {
        store: Arc::new(PostgresStore::new(pool)),
        emitter: Arc::new(TracingEmitter),
    }
}
