use crate::types::{EnterpriseId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enterprise {
    pub id: EnterpriseId,
    pub name: String,
    pub is_producer: bool,
    /// Only distributors may coordinate an order cycle.
    pub is_distributor: bool,
}

/// The acting principal of every admin operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub admin: bool,
}
