//! Destroy protection for order cycles.
//!
//! A cycle with schedules attached is refused before storage is touched.
//! Otherwise deletion is attempted, and storage reports whether orders
//! still reference the cycle.

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::messages;
use crate::order_cycle::OrderCycle;
use crate::types::OrderCycleId;

/// What storage reports for a delete attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    /// A referential-integrity constraint (orders) rejected the delete.
    Referenced,
}

pub trait OrderCycleDeleter {
    fn delete_order_cycle(&self, id: OrderCycleId) -> Result<Deletion>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DestroyOutcome {
    Destroyed,
    SchedulesPresent,
    OrdersPresent,
}

impl DestroyOutcome {
    pub fn is_destroyed(self) -> bool {
        matches!(self, DestroyOutcome::Destroyed)
    }

    pub fn message(self) -> &'static str {
        match self {
            DestroyOutcome::Destroyed => messages::DESTROY_NOTICE,
            DestroyOutcome::SchedulesPresent => messages::DESTROY_SCHEDULE_PRESENT,
            DestroyOutcome::OrdersPresent => messages::DESTROY_ORDERS_PRESENT,
        }
    }
}

pub fn destroy<D>(order_cycle: &OrderCycle, deleter: &D) -> Result<DestroyOutcome>
where
    D: OrderCycleDeleter + ?Sized,
{
    if !order_cycle.schedule_ids.is_empty() {
        info!(
            order_cycle = order_cycle.id,
            schedules = order_cycle.schedule_ids.len(),
            "destroy refused: schedules present"
        );
        return Ok(DestroyOutcome::SchedulesPresent);
    }
    match deleter.delete_order_cycle(order_cycle.id)? {
        Deletion::Deleted => {
            info!(order_cycle = order_cycle.id, "order cycle destroyed");
            Ok(DestroyOutcome::Destroyed)
        }
        Deletion::Referenced => {
            info!(order_cycle = order_cycle.id, "destroy refused: orders present");
            Ok(DestroyOutcome::OrdersPresent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct RecordingDeleter {
        result: Deletion,
        attempts: RefCell<Vec<OrderCycleId>>,
    }

    impl RecordingDeleter {
        fn new(result: Deletion) -> Self {
            Self {
                result,
                attempts: RefCell::new(Vec::new()),
            }
        }
    }

    impl OrderCycleDeleter for RecordingDeleter {
        fn delete_order_cycle(&self, id: OrderCycleId) -> Result<Deletion> {
            self.attempts.borrow_mut().push(id);
            Ok(self.result)
        }
    }

    fn cycle(schedules: &[i64]) -> OrderCycle {
        let mut oc = OrderCycle::new("Weekly", Some(1));
        oc.id = 3;
        oc.schedule_ids = schedules.iter().copied().collect();
        oc
    }

    #[test]
    fn schedules_present_never_reaches_storage() {
        let deleter = RecordingDeleter::new(Deletion::Deleted);
        let outcome = destroy(&cycle(&[1]), &deleter).unwrap();
        assert_eq!(outcome, DestroyOutcome::SchedulesPresent);
        assert!(deleter.attempts.borrow().is_empty());
    }

    #[test]
    fn referenced_cycle_reports_orders_present() {
        let deleter = RecordingDeleter::new(Deletion::Referenced);
        let outcome = destroy(&cycle(&[]), &deleter).unwrap();
        assert_eq!(outcome, DestroyOutcome::OrdersPresent);
        assert_eq!(*deleter.attempts.borrow(), vec![3]);
        assert!(outcome.message().contains("selected by a customer"));
    }

    #[test]
    fn unreferenced_cycle_is_destroyed() {
        let deleter = RecordingDeleter::new(Deletion::Deleted);
        let outcome = destroy(&cycle(&[]), &deleter).unwrap();
        assert!(outcome.is_destroyed());
    }
}
