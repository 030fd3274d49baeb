use serde::{Deserialize, Serialize};
use std::fmt;

pub type OrderCycleId = i64;
pub type ScheduleId = i64;
pub type SubscriptionId = i64;
pub type EnterpriseId = i64;
pub type UserId = i64;
pub type OrderId = i64;

// ---------------------------------------------------------------------------
// CycleStatus
// ---------------------------------------------------------------------------

/// Where an order cycle sits relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// Open or close time missing.
    Undated,
    Upcoming,
    Open,
    Closed,
}

impl CycleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CycleStatus::Undated => "undated",
            CycleStatus::Upcoming => "upcoming",
            CycleStatus::Open => "open",
            CycleStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ListRole
// ---------------------------------------------------------------------------

/// Which perspective an index listing is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListRole {
    /// Every cycle the user can access.
    #[default]
    All,
    /// Cycles where a managed enterprise distributes (outgoing exchange).
    Distributor,
    /// Cycles where a managed enterprise supplies (incoming exchange).
    Producer,
}

impl ListRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ListRole::All => "all",
            ListRole::Distributor => "distributor",
            ListRole::Producer => "producer",
        }
    }
}

impl fmt::Display for ListRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListRole {
    type Err = crate::error::CycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ListRole::All),
            "distributor" => Ok(ListRole::Distributor),
            "producer" => Ok(ListRole::Producer),
            _ => Err(crate::error::CycleError::InvalidRole(s.to_string())),
        }
    }
}
