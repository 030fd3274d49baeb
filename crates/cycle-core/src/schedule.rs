use crate::types::{EnterpriseId, OrderCycleId, OrderId, ScheduleId, SubscriptionId};
use serde::{Deserialize, Serialize};

/// A recurring time window. Order cycles and subscriptions point at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
}

/// A recurring commitment tied to exactly one schedule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub schedule_id: ScheduleId,
    pub shop_id: EnterpriseId,
    pub customer_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_cycle_id: OrderCycleId,
    pub customer_email: String,
}
