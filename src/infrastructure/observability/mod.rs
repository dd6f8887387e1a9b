//! Observability for crudeprice
//!
//! Metrics are exposed two ways:
//!
//! 1. **Prometheus text** at `GET /metrics`
//! 2. **Structured JSON logs**: periodic snapshots to stdout (for Loki, Fluentd, CloudWatch)

pub mod metrics;
pub mod reporter;

pub use metrics::Metrics;
pub use reporter::MetricsReporter;
