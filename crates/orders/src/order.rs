use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use sapitos_core::{DomainError, InventoryId, OrderId, Organization, UserId};

/// Policy constant: estimated delivery is acceptance date plus this many days.
pub const DELIVERY_LEAD_DAYS: i64 = 7;

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
    InTransit,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "approved" => Ok(OrderStatus::Approved),
            "rejected" => Ok(OrderStatus::Rejected),
            "in_transit" => Ok(OrderStatus::InTransit),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Completed)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One article/quantity/price entry within an order.
///
/// Quantity and unit price are fixed at order creation; the dispatch path
/// only ever reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub inventory_id: InventoryId,
    pub quantity: i64,
    pub unit_price_cents: u64,
}

impl OrderLine {
    pub fn new(
        inventory_id: InventoryId,
        quantity: i64,
        unit_price_cents: u64,
    ) -> Result<Self, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::validation("line quantity must be positive"));
        }
        Ok(Self {
            inventory_id,
            quantity,
            unit_price_cents,
        })
    }

    pub fn subtotal_cents(&self) -> u64 {
        (self.quantity as u64).saturating_mul(self.unit_price_cents)
    }
}

/// Estimated delivery date for an order accepted on `accepted`.
pub fn estimated_delivery(accepted: NaiveDate) -> NaiveDate {
    accepted + chrono::Duration::days(DELIVERY_LEAD_DAYS)
}

/// Outcome of the in-transit transition (delivery timing bookkeeping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub on_time: bool,
    pub delivery_days: i64,
}

impl DeliveryOutcome {
    /// On-time is inclusive: delivering exactly on the estimated date counts.
    pub fn compute(accepted: NaiveDate, estimated: NaiveDate, today: NaiveDate) -> Self {
        Self {
            on_time: estimated >= today,
            delivery_days: (today - accepted).num_days(),
        }
    }
}

/// A purchase order moving through its lifecycle.
///
/// Created once by a requester against a target supplier organization, then
/// mutated only by the transition methods below. Orders are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
    /// Target organization (the supplier fulfilling this order).
    pub organization: Organization,
    pub order_type: String,
    pub total_cents: u64,
    pub discount_cents: u64,
    pub status: OrderStatus,
    pub accepted_date: Option<NaiveDate>,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub delivered_date: Option<NaiveDate>,
    pub on_time: Option<bool>,
    pub delivery_days: Option<i64>,
    /// Display-only; stored verbatim, never validated.
    pub rejection_reason: Option<String>,
}

impl Order {
    /// Create a fresh pending order.
    pub fn create(
        id: OrderId,
        created_at: DateTime<Utc>,
        created_by: UserId,
        organization: Organization,
        order_type: impl Into<String>,
        total_cents: u64,
        discount_cents: u64,
    ) -> Self {
        Self {
            id,
            created_at,
            created_by,
            organization,
            order_type: order_type.into(),
            total_cents,
            discount_cents,
            status: OrderStatus::Pending,
            accepted_date: None,
            estimated_delivery_date: None,
            delivered_date: None,
            on_time: None,
            delivery_days: None,
            rejection_reason: None,
        }
    }

    fn require_status(&self, required: OrderStatus) -> Result<(), DomainError> {
        if self.status != required {
            return Err(DomainError::invalid_state(
                required.as_str(),
                self.status.as_str(),
            ));
        }
        Ok(())
    }

    /// Pending → Approved.
    ///
    /// Sets the acceptance date and the estimated delivery date
    /// (acceptance + [`DELIVERY_LEAD_DAYS`]).
    pub fn approve(&mut self, today: NaiveDate) -> Result<NaiveDate, DomainError> {
        self.require_status(OrderStatus::Pending)?;

        let estimated = estimated_delivery(today);
        self.status = OrderStatus::Approved;
        self.accepted_date = Some(today);
        self.estimated_delivery_date = Some(estimated);
        Ok(estimated)
    }

    /// Pending → Rejected (terminal).
    pub fn reject(&mut self, today: NaiveDate, reason: Option<String>) -> Result<(), DomainError> {
        self.require_status(OrderStatus::Pending)?;

        self.status = OrderStatus::Rejected;
        self.accepted_date = Some(today);
        self.rejection_reason = reason;
        Ok(())
    }

    /// Approved → InTransit.
    ///
    /// Records actual delivery date, the on-time flag (inclusive: delivering
    /// exactly on the estimated date counts as on time) and the delivery
    /// duration in whole days since acceptance. The caller is responsible
    /// for depleting stock atomically with this transition.
    pub fn mark_in_transit(&mut self, today: NaiveDate) -> Result<DeliveryOutcome, DomainError> {
        self.require_status(OrderStatus::Approved)?;

        // Both dates are set by approve(); an Approved order without them is
        // corrupt data, not a caller mistake.
        let accepted = self
            .accepted_date
            .ok_or_else(|| DomainError::validation("approved order missing acceptance date"))?;
        let estimated = self.estimated_delivery_date.ok_or_else(|| {
            DomainError::validation("approved order missing estimated delivery date")
        })?;

        let outcome = DeliveryOutcome::compute(accepted, estimated, today);

        self.status = OrderStatus::InTransit;
        self.delivered_date = Some(today);
        self.on_time = Some(outcome.on_time);
        self.delivery_days = Some(outcome.delivery_days);
        Ok(outcome)
    }

    /// InTransit → Completed (terminal).
    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.require_status(OrderStatus::InTransit)?;
        self.status = OrderStatus::Completed;
        Ok(())
    }
}
