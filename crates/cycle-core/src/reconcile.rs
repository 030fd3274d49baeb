//! Schedule association reconciliation.
//!
//! An order cycle's schedule set is never taken from caller input as-is.
//! The requested ids are filtered through the actor's editable schedules:
//! ids the actor may not edit keep whatever membership they already had,
//! whether the request names them or not.
//!
//! ```text
//! result  = existing
//! result |= requested ∩ permitted
//! result -= (result ∩ permitted) − requested
//! ```

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::enterprise::User;
use crate::error::Result;
use crate::schedule::{Schedule, Subscription};
use crate::types::ScheduleId;

pub type ScheduleSet = BTreeSet<ScheduleId>;

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Capability check over schedules.
pub trait PermissionFilter {
    /// The subset of `candidates` that `actor` may attach or detach.
    fn editable_schedules(&self, actor: &User, candidates: &ScheduleSet) -> Result<ScheduleSet>;
}

/// Read-only lookups used to find the subscriptions a change touches.
pub trait ScheduleLookup {
    fn find_schedules_by_ids(&self, ids: &ScheduleSet) -> Result<Vec<Schedule>>;
    fn find_subscriptions_by_schedule_ids(&self, ids: &ScheduleSet) -> Result<Vec<Subscription>>;
}

// ---------------------------------------------------------------------------
// Pure set operations
// ---------------------------------------------------------------------------

/// Compute the new schedule set. `None` means no schedule ids were submitted,
/// which leaves `existing` unchanged (it is not "remove everything").
pub fn reconcile(
    requested: Option<&ScheduleSet>,
    existing: &ScheduleSet,
    permitted: &ScheduleSet,
) -> ScheduleSet {
    let Some(requested) = requested else {
        return existing.clone();
    };
    let mut result = existing.clone();
    result.extend(requested.intersection(permitted).copied());
    result.retain(|id| !permitted.contains(id) || requested.contains(id));
    result
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleDiff {
    pub added: ScheduleSet,
    pub removed: ScheduleSet,
}

impl ScheduleDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// `added ∪ removed`
    pub fn touched(&self) -> ScheduleSet {
        self.added.union(&self.removed).copied().collect()
    }
}

pub fn diff(existing: &ScheduleSet, final_set: &ScheduleSet) -> ScheduleDiff {
    ScheduleDiff {
        added: final_set.difference(existing).copied().collect(),
        removed: existing.difference(final_set).copied().collect(),
    }
}

/// Subscriptions whose schedule was attached or detached. An empty diff
/// returns immediately without touching `lookup`.
pub fn affected_subscriptions<L>(diff: &ScheduleDiff, lookup: &L) -> Result<Vec<Subscription>>
where
    L: ScheduleLookup + ?Sized,
{
    if diff.is_empty() {
        return Ok(Vec::new());
    }
    let schedules = lookup.find_schedules_by_ids(&diff.touched())?;
    let schedule_ids: ScheduleSet = schedules.iter().map(|s| s.id).collect();
    if schedule_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut subscriptions = lookup.find_subscriptions_by_schedule_ids(&schedule_ids)?;
    subscriptions.sort();
    subscriptions.dedup_by_key(|s| s.id);
    Ok(subscriptions)
}

// ---------------------------------------------------------------------------
// ScheduleReconciler
// ---------------------------------------------------------------------------

/// Result of filtering one request against one entity's schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub existing: ScheduleSet,
    pub schedule_ids: ScheduleSet,
    /// False when the caller sent no schedule ids at all.
    pub submitted: bool,
}

impl Reconciliation {
    pub fn unchanged(existing: ScheduleSet) -> Self {
        Self {
            schedule_ids: existing.clone(),
            existing,
            submitted: false,
        }
    }

    pub fn diff(&self) -> ScheduleDiff {
        diff(&self.existing, &self.schedule_ids)
    }
}

/// Reconciles requested schedule ids using an injected permission filter.
pub struct ScheduleReconciler<'a, P: ?Sized> {
    permissions: &'a P,
}

impl<'a, P> ScheduleReconciler<'a, P>
where
    P: PermissionFilter + ?Sized,
{
    pub fn new(permissions: &'a P) -> Self {
        Self { permissions }
    }

    /// Editable ids within `requested ∪ existing`.
    pub fn permitted(
        &self,
        actor: &User,
        requested: &ScheduleSet,
        existing: &ScheduleSet,
    ) -> Result<ScheduleSet> {
        let candidates: ScheduleSet = requested.union(existing).copied().collect();
        let editable = self.permissions.editable_schedules(actor, &candidates)?;
        Ok(editable.intersection(&candidates).copied().collect())
    }

    pub fn reconcile(
        &self,
        actor: &User,
        requested: Option<&ScheduleSet>,
        existing: &ScheduleSet,
    ) -> Result<Reconciliation> {
        let Some(requested) = requested else {
            return Ok(Reconciliation::unchanged(existing.clone()));
        };
        let permitted = self.permitted(actor, requested, existing)?;
        let schedule_ids = reconcile(Some(requested), existing, &permitted);
        debug!(
            user = actor.id,
            requested = ?requested,
            existing = ?existing,
            permitted = ?permitted,
            result = ?schedule_ids,
            "reconciled schedule ids"
        );
        Ok(Reconciliation {
            existing: existing.clone(),
            schedule_ids,
            submitted: true,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
