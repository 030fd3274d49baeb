//! What a user may see and change, derived from the enterprises they manage.

use std::collections::BTreeSet;

use crate::enterprise::{Enterprise, User};
use crate::error::Result;
use crate::order_cycle::OrderCycle;
use crate::reconcile::{PermissionFilter, ScheduleLookup, ScheduleSet};
use crate::store::Store;
use crate::types::{EnterpriseId, ListRole};

pub struct Permissions<'a> {
    store: &'a Store,
}

impl<'a> Permissions<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Admins manage every enterprise.
    pub fn managed_enterprise_ids(&self, user: &User) -> Result<BTreeSet<EnterpriseId>> {
        if user.admin {
            return Ok(self.store.list_enterprises()?.into_iter().map(|e| e.id).collect());
        }
        self.store.enterprise_ids_managed_by(user.id)
    }

    pub fn manages(&self, user: &User, enterprise_id: Option<EnterpriseId>) -> Result<bool> {
        let Some(id) = enterprise_id else {
            return Ok(false);
        };
        Ok(self.managed_enterprise_ids(user)?.contains(&id))
    }

    /// Managed enterprises that are allowed to coordinate a cycle.
    pub fn coordinating_enterprises(&self, user: &User) -> Result<Vec<Enterprise>> {
        let managed = self.managed_enterprise_ids(user)?;
        Ok(self
            .store
            .list_enterprises()?
            .into_iter()
            .filter(|e| e.is_distributor && managed.contains(&e.id))
            .collect())
    }

    pub fn can_access(&self, user: &User, oc: &OrderCycle) -> Result<bool> {
        if user.admin {
            return Ok(true);
        }
        let managed = self.managed_enterprise_ids(user)?;
        Ok(accessible(oc, &managed))
    }

    /// Cycles `user` can see, narrowed to the given role.
    pub fn visible_order_cycles(&self, user: &User, role: ListRole) -> Result<Vec<OrderCycle>> {
        let managed = self.managed_enterprise_ids(user)?;
        let cycles = self.store.list_order_cycles()?;
        Ok(cycles
            .into_iter()
            .filter(|oc| user.admin || accessible(oc, &managed))
            .filter(|oc| match role {
                ListRole::All => true,
                ListRole::Distributor => !oc.enterprise_ids(false).is_disjoint(&managed),
                ListRole::Producer => !oc.enterprise_ids(true).is_disjoint(&managed),
            })
            .collect())
    }
}

fn accessible(oc: &OrderCycle, managed: &BTreeSet<EnterpriseId>) -> bool {
    oc.coordinator_id.is_some_and(|id| managed.contains(&id))
        || oc.exchanges.iter().any(|e| managed.contains(&e.enterprise_id))
}

impl PermissionFilter for Permissions<'_> {
    /// Schedules attached to at least one cycle whose coordinator the user
    /// manages. Admins may edit every schedule that exists.
    fn editable_schedules(&self, actor: &User, candidates: &ScheduleSet) -> Result<ScheduleSet> {
        if candidates.is_empty() {
            return Ok(ScheduleSet::new());
        }
        let existing: ScheduleSet = self
            .store
            .find_schedules_by_ids(candidates)?
            .into_iter()
            .map(|s| s.id)
            .collect();
        if actor.admin {
            return Ok(existing);
        }
        let managed = self.managed_enterprise_ids(actor)?;
        let managed_cycles: BTreeSet<i64> = self
            .store
            .list_order_cycles()?
            .into_iter()
            .filter(|oc| oc.coordinator_id.is_some_and(|id| managed.contains(&id)))
            .map(|oc| oc.id)
            .collect();
        let links = self.store.order_cycle_ids_for_schedules(&existing)?;
        Ok(links
            .into_iter()
            .filter(|(_, cycles)| !cycles.is_disjoint(&managed_cycles))
            .map(|(schedule_id, _)| schedule_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        store: Store,
        manager: User,
        other: User,
        admin: User,
        own: OrderCycle,
        foreign: OrderCycle,
    }

    fn fixture() -> Fixture {
        let store = Store::open_in_memory().unwrap();
        let manager = store.insert_user("manager@example.com", false).unwrap();
        let other = store.insert_user("other@example.com", false).unwrap();
        let admin = store.insert_user("admin@example.com", true).unwrap();
        let hub = store.insert_enterprise("Hub", false, true).unwrap();
        let rival = store.insert_enterprise("Rival", false, true).unwrap();
        let farm = store.insert_enterprise("Farm", true, false).unwrap();
        store.add_manager(manager.id, hub.id).unwrap();
        store.add_manager(manager.id, farm.id).unwrap();
        store.add_manager(other.id, rival.id).unwrap();

        let mut own = OrderCycle::new("Own", Some(hub.id));
        store.insert_order_cycle(&mut own).unwrap();
        let mut foreign = OrderCycle::new("Foreign", Some(rival.id));
        foreign.set_exchanges(true, &[farm.id]);
        store.insert_order_cycle(&mut foreign).unwrap();

        Fixture {
            store,
            manager,
            other,
            admin,
            own,
            foreign,
        }
    }

    #[test]
    fn coordinators_must_be_managed_distributors() {
        let f = fixture();
        let perms = Permissions::new(&f.store);
        let names: Vec<String> = perms
            .coordinating_enterprises(&f.manager)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Hub"]);
        assert_eq!(perms.coordinating_enterprises(&f.admin).unwrap().len(), 2);
    }

    #[test]
    fn access_through_coordinator_or_exchange() {
        let f = fixture();
        let perms = Permissions::new(&f.store);
        assert!(perms.can_access(&f.manager, &f.own).unwrap());
        assert!(perms.can_access(&f.manager, &f.foreign).unwrap());
        assert!(!perms.can_access(&f.other, &f.own).unwrap());
        assert!(perms.can_access(&f.admin, &f.own).unwrap());
    }

    #[test]
    fn role_filters_use_exchange_direction() {
        let f = fixture();
        let perms = Permissions::new(&f.store);
        let producer = perms.visible_order_cycles(&f.manager, ListRole::Producer).unwrap();
        assert_eq!(producer.len(), 1);
        assert_eq!(producer[0].id, f.foreign.id);
        assert!(perms
            .visible_order_cycles(&f.manager, ListRole::Distributor)
            .unwrap()
            .is_empty());
        assert_eq!(perms.visible_order_cycles(&f.manager, ListRole::All).unwrap().len(), 2);
    }

    #[test]
    fn editable_schedules_follow_coordinated_cycles() {
        let f = fixture();
        let mine = f.store.insert_schedule("Mine", &[f.own.id]).unwrap();
        let theirs = f.store.insert_schedule("Theirs", &[f.foreign.id]).unwrap();
        let orphan = f.store.insert_schedule("Orphan", &[]).unwrap();
        let perms = Permissions::new(&f.store);
        let candidates = ScheduleSet::from([mine.id, theirs.id, orphan.id, 99]);

        let editable = perms.editable_schedules(&f.manager, &candidates).unwrap();
        assert_eq!(editable, ScheduleSet::from([mine.id]));

        let editable = perms.editable_schedules(&f.admin, &candidates).unwrap();
        assert_eq!(editable, ScheduleSet::from([mine.id, theirs.id, orphan.id]));
    }
}
