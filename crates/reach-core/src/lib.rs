//! Shared data model for the monitoring engine and its collaborators.
//!
//! Kept dependency-light (serde + chrono + thiserror only) so that the
//! CLI and the engine can agree on wire/storage shapes without pulling
//! in tokio, rusqlite, or any networking stack.

pub mod alert;
pub mod clock;
pub mod config;
pub mod error;
pub mod host;
pub mod metric;
pub mod probe;

pub use alert::{AlertStatus, StatusType};
pub use clock::Clock;
pub use error::CoreError;
pub use host::{FailAlertOverride, Host};
pub use metric::{MetricName, MetricSample};
pub use probe::ProbeOutput;
