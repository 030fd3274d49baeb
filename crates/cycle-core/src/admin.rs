//! Admin operations on order cycles.
//!
//! Each operation takes untrusted parameters from the acting user, strips or
//! filters what that user may not change, persists the result, and resyncs
//! subscriptions when schedule links moved.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::destroy::{self, DestroyOutcome};
use crate::enterprise::{Enterprise, User};
use crate::error::{CycleError, Result};
use crate::messages;
use crate::order_cycle::{order_for_index, BulkEntry, OrderCycle, OrderCycleParams};
use crate::permissions::Permissions;
use crate::reconcile::{ScheduleReconciler, ScheduleSet};
use crate::schedule::Subscription;
use crate::store::{ProducerNotification, Store};
use crate::sync::{sync_subscriptions, SubscriptionSync};
use crate::types::{EnterpriseId, ListRole, OrderCycleId};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct IndexQuery {
    pub role: ListRole,
    /// Case-insensitive substring match on the name.
    pub name_contains: Option<String>,
    /// Replaces the default recent-window cutoff.
    pub closes_after: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NewOrderCycle {
    Ready { order_cycle: OrderCycle },
    ChooseCoordinator {
        candidates: Vec<Enterprise>,
        notice: Option<&'static str>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Saved {
    pub order_cycle: OrderCycle,
    /// Subscriptions handed to the sync because their schedule moved.
    pub resynced: Vec<Subscription>,
}

// ---------------------------------------------------------------------------
// OrderCycleAdmin
// ---------------------------------------------------------------------------

pub struct OrderCycleAdmin<'a> {
    store: &'a Store,
    user: &'a User,
    sync: &'a dyn SubscriptionSync,
    recent_window_days: u32,
}

impl<'a> OrderCycleAdmin<'a> {
    pub fn new(store: &'a Store, user: &'a User, sync: &'a dyn SubscriptionSync) -> Self {
        Self {
            store,
            user,
            sync,
            recent_window_days: 31,
        }
    }

    pub fn with_recent_window_days(mut self, days: u32) -> Self {
        self.recent_window_days = days;
        self
    }

    fn permissions(&self) -> Permissions<'a> {
        Permissions::new(self.store)
    }

    fn load_authorized(&self, id: OrderCycleId) -> Result<OrderCycle> {
        let oc = self.store.find_order_cycle(id)?;
        if !self.permissions().can_access(self.user, &oc)? {
            return Err(CycleError::Unauthorized(format!(
                "user {} cannot access order cycle {id}",
                self.user.id
            )));
        }
        Ok(oc)
    }

    pub fn index(&self, query: &IndexQuery, now: DateTime<Utc>) -> Result<Vec<OrderCycle>> {
        // A window reaching past the earliest representable time hides nothing.
        let cutoff = query.closes_after.or_else(|| {
            Duration::try_days(i64::from(self.recent_window_days))
                .and_then(|window| now.checked_sub_signed(window))
        });
        let needle = query.name_contains.as_ref().map(|n| n.to_lowercase());
        let cycles: Vec<OrderCycle> = self
            .permissions()
            .visible_order_cycles(self.user, query.role)?
            .into_iter()
            .filter(|oc| match (oc.orders_close_at, cutoff) {
                (Some(close), Some(cutoff)) => close > cutoff,
                _ => true,
            })
            .filter(|oc| {
                needle
                    .as_ref()
                    .map_or(true, |n| oc.name.to_lowercase().contains(n))
            })
            .collect();
        Ok(order_for_index(cycles, now))
    }

    pub fn show(&self, id: OrderCycleId) -> Result<OrderCycle> {
        self.load_authorized(id)
    }

    /// Pick a coordinator for a new cycle.
    pub fn new_order_cycle(&self, coordinator_id: Option<EnterpriseId>) -> Result<NewOrderCycle> {
        let mut candidates = self.permissions().coordinating_enterprises(self.user)?;
        if let Some(id) = coordinator_id {
            if candidates.iter().any(|e| e.id == id) {
                return Ok(NewOrderCycle::Ready {
                    order_cycle: OrderCycle::new("", Some(id)),
                });
            }
        }
        match candidates.len() {
            0 => Err(CycleError::NoCoordinatorPermission),
            1 => {
                let only = candidates.remove(0);
                Ok(NewOrderCycle::Ready {
                    order_cycle: OrderCycle::new("", Some(only.id)),
                })
            }
            _ => Ok(NewOrderCycle::ChooseCoordinator {
                candidates,
                notice: coordinator_id.map(|_| messages::NO_PERMISSION_TO_CREATE),
            }),
        }
    }

    pub fn create(&self, params: OrderCycleParams) -> Result<Saved> {
        if let Some(id) = params.coordinator_id {
            let permitted = self.permissions().coordinating_enterprises(self.user)?;
            if !permitted.iter().any(|e| e.id == id) {
                return Err(CycleError::CoordinatorNotPermitted(id));
            }
        }

        let mut oc = OrderCycle::new(String::new(), None);
        oc.apply(&params);

        let permissions = self.permissions();
        let reconciliation = ScheduleReconciler::new(&permissions).reconcile(
            self.user,
            params.schedule_ids.as_ref(),
            &ScheduleSet::new(),
        )?;
        oc.schedule_ids = reconciliation.schedule_ids.clone();
        self.apply_exchanges(&mut oc, &params)?;

        oc.ensure_valid()?;
        self.store.insert_order_cycle(&mut oc)?;
        info!(order_cycle = oc.id, user = self.user.id, "order cycle created");

        let resynced = sync_subscriptions(oc.id, &reconciliation, self.store, self.sync)?;
        Ok(Saved {
            order_cycle: oc,
            resynced,
        })
    }

    pub fn update(&self, id: OrderCycleId, mut params: OrderCycleParams) -> Result<Saved> {
        let mut oc = self.load_authorized(id)?;

        params.coordinator_id = None;
        let manages_coordinator = self.permissions().manages(self.user, oc.coordinator_id)?;
        if !manages_coordinator {
            params.strip_coordinator_attrs();
        }

        let permissions = self.permissions();
        let reconciliation = ScheduleReconciler::new(&permissions).reconcile(
            self.user,
            params.schedule_ids.as_ref(),
            &oc.schedule_ids,
        )?;

        oc.apply(&params);
        oc.schedule_ids = reconciliation.schedule_ids.clone();
        if params.exchanges_submitted() {
            if manages_coordinator {
                self.apply_exchanges(&mut oc, &params)?;
            } else {
                debug!(order_cycle = id, user = self.user.id, "ignoring exchange changes");
            }
        }

        oc.ensure_valid()?;
        self.store.update_order_cycle(&mut oc)?;
        info!(order_cycle = oc.id, user = self.user.id, "order cycle updated");

        let resynced = sync_subscriptions(oc.id, &reconciliation, self.store, self.sync)?;
        Ok(Saved {
            order_cycle: oc,
            resynced,
        })
    }

    /// Entries for cycles whose coordinator the user does not manage are
    /// dropped. Nothing is written unless every remaining cycle is valid.
    pub fn bulk_update(&self, entries: Option<Vec<BulkEntry>>) -> Result<Vec<OrderCycle>> {
        let entries = entries.ok_or(CycleError::NoBulkData)?;
        let managed = self.permissions().managed_enterprise_ids(self.user)?;

        let mut cycles = Vec::with_capacity(entries.len());
        for entry in &entries {
            let mut oc = self.store.find_order_cycle(entry.id)?;
            if !oc.coordinator_id.is_some_and(|c| managed.contains(&c)) {
                debug!(order_cycle = entry.id, user = self.user.id, "dropping unauthorized bulk entry");
                continue;
            }
            oc.apply(&entry.params());
            cycles.push(oc);
        }

        if let Some(errors) = cycles.iter().map(|oc| oc.validate()).find(|e| !e.is_empty()) {
            return Err(CycleError::ValidationFailed(errors));
        }

        self.store.update_order_cycles(&mut cycles)?;
        info!(count = cycles.len(), user = self.user.id, "order cycles bulk updated");
        Ok(cycles)
    }

    /// Returns the new copy; its source name is available for notices.
    pub fn clone_order_cycle(&self, id: OrderCycleId) -> Result<OrderCycle> {
        let source = self.load_authorized(id)?;
        let mut copy = source.duplicate();
        self.store.insert_order_cycle(&mut copy)?;
        info!(source = id, order_cycle = copy.id, "order cycle cloned");
        Ok(copy)
    }

    pub fn notify_producers(&self, id: OrderCycleId) -> Result<ProducerNotification> {
        self.load_authorized(id)?;
        let job = self.store.enqueue_producer_notification(id)?;
        info!(order_cycle = id, job = job.id, "producer notification enqueued");
        Ok(job)
    }

    pub fn destroy(&self, id: OrderCycleId) -> Result<DestroyOutcome> {
        let oc = self.load_authorized(id)?;
        destroy::destroy(&oc, self.store)
    }

    fn apply_exchanges(&self, oc: &mut OrderCycle, params: &OrderCycleParams) -> Result<()> {
        for (incoming, ids) in [
            (true, &params.incoming_exchanges),
            (false, &params.outgoing_exchanges),
        ] {
            let Some(ids) = ids else {
                continue;
            };
            for &enterprise_id in ids {
                self.store.find_enterprise(enterprise_id)?;
            }
            oc.set_exchanges(incoming, ids);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
