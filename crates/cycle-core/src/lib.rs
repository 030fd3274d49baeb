pub mod admin;
pub mod config;
pub mod destroy;
pub mod enterprise;
pub mod error;
pub mod io;
pub mod messages;
pub mod order_cycle;
pub mod paths;
pub mod permissions;
pub mod reconcile;
pub mod schedule;
pub mod store;
pub mod sync;
pub mod types;

pub use error::{CycleError, Result};
