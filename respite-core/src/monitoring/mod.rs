//! Monitoring and observability
//!
//! Prometheus metrics for the break cycle and an HTTP server exposing
//! them for scraping, along with a JSON status snapshot.

pub mod metrics;
pub mod server;

pub use metrics::{CycleMetrics, MetricsRegistry, ReconnectMetrics, SystemMetrics};
pub use server::{MetricsServer, MetricsServerConfig};
