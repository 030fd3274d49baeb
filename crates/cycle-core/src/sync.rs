use tracing::info;

use crate::error::Result;
use crate::reconcile::{affected_subscriptions, Reconciliation, ScheduleLookup};
use crate::schedule::Subscription;
use crate::types::OrderCycleId;

/// Receives subscriptions whose schedule-to-cycle mapping changed.
/// Implementations must treat an empty slice as a no-op.
pub trait SubscriptionSync {
    fn sync(&self, order_cycle_id: OrderCycleId, subscriptions: &[Subscription]) -> Result<()>;
}

/// Logs the subscriptions that need their proxy orders regenerated.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSync;

impl SubscriptionSync for TracingSync {
    fn sync(&self, order_cycle_id: OrderCycleId, subscriptions: &[Subscription]) -> Result<()> {
        if subscriptions.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = subscriptions.iter().map(|s| s.id).collect();
        info!(order_cycle = order_cycle_id, subscriptions = ?ids, "subscriptions need resync");
        Ok(())
    }
}

/// Resync subscriptions after a save. Does nothing when no schedule ids were
/// submitted or the schedule set did not change.
pub fn sync_subscriptions<L, S>(
    order_cycle_id: OrderCycleId,
    reconciliation: &Reconciliation,
    lookup: &L,
    sync: &S,
) -> Result<Vec<Subscription>>
where
    L: ScheduleLookup + ?Sized,
    S: SubscriptionSync + ?Sized,
{
    if !reconciliation.submitted {
        return Ok(Vec::new());
    }
    let subscriptions = affected_subscriptions(&reconciliation.diff(), lookup)?;
    if !subscriptions.is_empty() {
        sync.sync(order_cycle_id, &subscriptions)?;
    }
    Ok(subscriptions)
}
