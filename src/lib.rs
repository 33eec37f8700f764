//! Price-alert monitoring engine.
//!
//! A single background scheduler periodically refreshes prices through a
//! TTL-cached oracle, evaluates each active alert's trigger predicate,
//! advances its lifecycle state, and dispatches notifications on a fire.
//! Storage and user preferences are external collaborators behind the
//! traits in [`store`].

pub mod errors;
pub mod models;
pub mod monitor;
pub mod notify;
pub mod oracle;
pub mod store;
pub mod triggers;
pub mod utils;

pub use errors::{MonitorError, Result};
pub use monitor::AlertMonitor;
