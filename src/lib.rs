//! # semql
//!
//! A semantic SQL compiler: turns SQL written against business names of a
//! semantic model into dialect-correct physical SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          QueryRequest (model id + logical SQL)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql::dialect]
//! ┌─────────────────────────────────────────────────────────┐
//! │       Engine adaptor: generic → native functions        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [corrector]
//! ┌─────────────────────────────────────────────────────────┐
//! │  Field append → keyword case → LIMIT → function names   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [semantic]
//! ┌─────────────────────────────────────────────────────────┐
//! │  Metrics / dimensions (+ synthesized default metric)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Physical SQL over the model's source table       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`compile::QueryConverter`] drives the whole flow; each stage is also
//! usable on its own.

pub mod catalog;
pub mod compile;
pub mod config;
pub mod corrector;
pub mod model;
pub mod planner;
pub mod semantic;
pub mod sql;

pub use sql::dialect;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{Catalog, InMemoryCatalog};
    pub use crate::compile::{CompileError, CompileResult, QueryConverter};
    pub use crate::corrector::{CorrectionContext, Corrector, CorrectorPipeline};
    pub use crate::dialect::{EngineAdaptor, EngineRegistry, EngineType};
    pub use crate::model::{
        ModelSchema, QueryRequest, QueryStatement, SchemaElement, Warning,
    };
    pub use crate::sql::{rewrite_fields, FieldNameMap};
}

pub use compile::{CompileError, QueryConverter};
pub use model::{ModelSchema, QueryRequest, QueryStatement};
