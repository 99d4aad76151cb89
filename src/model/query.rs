//! Request and result types flowing through the compiler.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::schema::ModelId;

/// Structured query request produced upstream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    pub model_id: ModelId,

    /// Logical SQL over the model's business names.
    pub sql: String,

    /// Explicit field selections made alongside the SQL.
    #[serde(default)]
    pub selected_fields: Vec<String>,
}

impl QueryRequest {
    pub fn new(model_id: ModelId, sql: impl Into<String>) -> Self {
        Self {
            model_id,
            sql: sql.into(),
            selected_fields: Vec::new(),
        }
    }

    pub fn with_selected_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Resolved metric/dimension reference set for one model.
///
/// Names are lower-cased; the two sets are disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogicalTable {
    /// Lower-cased logical table name as written in the request.
    pub alias: String,
    pub metrics: Vec<String>,
    pub dimensions: Vec<String>,
}

impl LogicalTable {
    pub fn is_metric(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.metrics.iter().any(|m| *m == name)
    }

    pub fn is_dimension(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.dimensions.iter().any(|d| *d == name)
    }
}

/// The request handed to physical synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogicalRequest {
    pub model_id: ModelId,
    pub sql: String,
    pub selected_fields: Vec<String>,
    pub root_path: Option<String>,
    pub tables: Vec<LogicalTable>,
}

impl LogicalRequest {
    /// Copy every request field and attach the resolved tables.
    pub fn from_request(
        request: &QueryRequest,
        sql: String,
        root_path: Option<String>,
        tables: Vec<LogicalTable>,
    ) -> Self {
        Self {
            model_id: request.model_id,
            sql,
            selected_fields: request.selected_fields.clone(),
            root_path,
            tables,
        }
    }
}

/// A non-fatal problem recorded during compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Stage that produced the warning.
    pub stage: String,
    pub message: String,
}

impl Warning {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

/// Final physical SQL plus compilation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryStatement {
    pub sql: String,
    pub logical_table: Option<LogicalTable>,
    pub has_aggregation: bool,
    pub warnings: Vec<Warning>,
}

impl QueryStatement {
    /// The "nothing to compile" result.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}
