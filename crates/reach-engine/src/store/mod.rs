pub mod kv;
pub mod tsdb;

pub use kv::KvStore;
pub use tsdb::{parse_retention, Tsdb, TimeSeriesPoint};
