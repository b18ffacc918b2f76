pub mod api;
pub mod collectors;
pub mod config;
pub mod error;
pub mod model;

pub use api::{ClusterApi, ResourceEntry, StatusEntry, UsageKey};
pub use collectors::{default_registry, scrape, Collector, Registry};
pub use config::Config;
pub use error::{CoreError, Result};
pub use model::{render_families, MetricFamily, MetricKind, Sample};
