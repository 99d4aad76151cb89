//! Semantic model types.
//!
//! - [`schema`] - catalog entries: models, dimensions, metrics
//! - [`query`] - requests, logical tables and compiled statements

pub mod query;
pub mod schema;

pub use query::{LogicalRequest, LogicalTable, QueryRequest, QueryStatement, Warning};
pub use schema::{
    internal_column, Aggregation, DataType, DefaultMetric, ElementKind, ModelId, ModelSchema,
    SchemaElement, INTERNAL_COLUMNS,
};
