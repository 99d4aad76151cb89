//! Schema-aware field resolution.
//!
//! Three pieces sit between the parsed request and physical synthesis:
//!
//! 1. **Classify** - partition referenced fields into metrics and dimensions
//! 2. **Resolve** - map each identifier to the schema element it denotes
//! 3. **Default metric** - synthesize a metric when the request names none
//!
//! None of them fail: unknown fields are dropped from classification and
//! passed through by resolution, and an empty schema classifies nothing.

pub mod classify;
pub mod default_metric;
pub mod resolve;

pub use classify::{classify, Classification};
pub use default_metric::{CatalogDefaultMetric, DefaultMetricPolicy, SynthesizedMetric};
pub use resolve::{Resolution, Resolved, SchemaResolver};
