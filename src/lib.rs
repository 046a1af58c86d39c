//! OpenTelemetry instrumentation for the MongoDB Rust driver.
//!
//! The [`CommandMonitor`] subscribes to the driver's command events and emits
//! a client span for every command: started events open a span as a child of
//! the active context and the matching succeeded or failed event ends it.
pub mod client;
pub mod conf;
pub mod constants;
pub mod errors;
pub mod metrics;
pub mod monitor;

mod statement;

pub use self::conf::MonitorConf;
pub use self::monitor::CommandMonitor;
pub use self::monitor::MonitorBuilder;
