pub mod metrics;
pub mod tracing;

pub use metrics::Metrics;
pub use self::tracing::{TracingConfig, TracingError, TracingGuard, init_tracing};
