use crate::error::{CycleError, Result};
use crate::messages;
use crate::reconcile::ScheduleSet;
use crate::types::{CycleStatus, EnterpriseId, OrderCycleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// An enterprise taking part in an order cycle. Incoming exchanges bring
/// supply from producers; outgoing exchanges hand it to distributors.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Exchange {
    pub enterprise_id: EnterpriseId,
    pub incoming: bool,
}

// ---------------------------------------------------------------------------
// OrderCycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCycle {
    /// 0 until the cycle is stored.
    pub id: OrderCycleId,
    pub name: String,
    pub orders_open_at: Option<DateTime<Utc>>,
    pub orders_close_at: Option<DateTime<Utc>>,
    pub coordinator_id: Option<EnterpriseId>,
    #[serde(default)]
    pub schedule_ids: ScheduleSet,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderCycle {
    pub fn new(name: impl Into<String>, coordinator_id: Option<EnterpriseId>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.into(),
            orders_open_at: None,
            orders_close_at: None,
            coordinator_id,
            schedule_ids: BTreeSet::new(),
            exchanges: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Copy for a new cycle: dates cleared, exchanges kept, schedules dropped.
    pub fn duplicate(&self) -> Self {
        let mut copy = OrderCycle::new(messages::cloned_name(&self.name), self.coordinator_id);
        copy.exchanges = self.exchanges.clone();
        copy
    }

    /// Apply scalar attributes. Schedules and exchanges are handled separately.
    pub fn apply(&mut self, params: &OrderCycleParams) {
        if let Some(name) = &params.name {
            self.name = name.clone();
        }
        if let Some(open) = params.orders_open_at {
            self.orders_open_at = open;
        }
        if let Some(close) = params.orders_close_at {
            self.orders_close_at = close;
        }
        if let Some(coordinator) = params.coordinator_id {
            self.coordinator_id = Some(coordinator);
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Name can't be blank".to_string());
        }
        if self.coordinator_id.is_none() {
            errors.push("Coordinator can't be blank".to_string());
        }
        if let (Some(open), Some(close)) = (self.orders_open_at, self.orders_close_at) {
            if close <= open {
                errors.push("Orders close at must be after orders open at".to_string());
            }
        }
        errors
    }

    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CycleError::ValidationFailed(errors))
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> CycleStatus {
        match (self.orders_open_at, self.orders_close_at) {
            (Some(_), Some(close)) if close < now => CycleStatus::Closed,
            (Some(open), Some(_)) if open > now => CycleStatus::Upcoming,
            (Some(_), Some(_)) => CycleStatus::Open,
            _ => CycleStatus::Undated,
        }
    }

    pub fn enterprise_ids(&self, incoming: bool) -> BTreeSet<EnterpriseId> {
        self.exchanges
            .iter()
            .filter(|e| e.incoming == incoming)
            .map(|e| e.enterprise_id)
            .collect()
    }

    /// Replace one direction of exchanges with the given enterprises.
    pub fn set_exchanges(&mut self, incoming: bool, enterprise_ids: &[EnterpriseId]) {
        self.exchanges.retain(|e| e.incoming != incoming);
        let ids: BTreeSet<EnterpriseId> = enterprise_ids.iter().copied().collect();
        self.exchanges.extend(ids.into_iter().map(|enterprise_id| Exchange {
            enterprise_id,
            incoming,
        }));
        self.exchanges.sort();
    }
}

// ---------------------------------------------------------------------------
// Index ordering
// ---------------------------------------------------------------------------

/// Undated first, then open (soonest closing), upcoming (soonest opening),
/// and closed (most recently closed). Each cycle appears once.
pub fn order_for_index(cycles: Vec<OrderCycle>, now: DateTime<Utc>) -> Vec<OrderCycle> {
    let mut undated = Vec::new();
    let mut open = Vec::new();
    let mut upcoming = Vec::new();
    let mut closed = Vec::new();
    for cycle in cycles {
        match cycle.status(now) {
            CycleStatus::Undated => undated.push(cycle),
            CycleStatus::Open => open.push(cycle),
            CycleStatus::Upcoming => upcoming.push(cycle),
            CycleStatus::Closed => closed.push(cycle),
        }
    }
    undated.sort_by_key(|c| c.id);
    open.sort_by_key(|c| (c.orders_close_at, c.id));
    upcoming.sort_by_key(|c| (c.orders_open_at, c.id));
    closed.sort_by(|a, b| b.orders_close_at.cmp(&a.orders_close_at).then(a.id.cmp(&b.id)));

    undated
        .into_iter()
        .chain(open)
        .chain(upcoming)
        .chain(closed)
        .collect()
}

// ---------------------------------------------------------------------------
// Request parameters
// ---------------------------------------------------------------------------

/// Order cycle attributes submitted by a caller. `None` means "not submitted".
/// For dates, `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCycleParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub orders_open_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub orders_close_at: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub coordinator_id: Option<EnterpriseId>,
    #[serde(default)]
    pub schedule_ids: Option<ScheduleSet>,
    #[serde(default)]
    pub incoming_exchanges: Option<Vec<EnterpriseId>>,
    #[serde(default)]
    pub outgoing_exchanges: Option<Vec<EnterpriseId>>,
}

impl OrderCycleParams {
    /// Drop attributes only coordinator managers may change.
    pub fn strip_coordinator_attrs(&mut self) {
        self.name = None;
        self.orders_open_at = None;
        self.orders_close_at = None;
    }

    pub fn exchanges_submitted(&self) -> bool {
        self.incoming_exchanges.is_some() || self.outgoing_exchanges.is_some()
    }
}

/// One row of a bulk update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkEntry {
    pub id: OrderCycleId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub orders_open_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub orders_close_at: Option<Option<DateTime<Utc>>>,
}

impl BulkEntry {
    pub fn params(&self) -> OrderCycleParams {
        OrderCycleParams {
            name: self.name.clone(),
            orders_open_at: self.orders_open_at,
            orders_close_at: self.orders_close_at,
            ..OrderCycleParams::default()
        }
    }
}

/// Distinguish an explicit `null` (`Some(None)`) from a missing field (`None`).
fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
