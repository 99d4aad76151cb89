//! Semantic model catalog entries.
//!
//! A [`ModelSchema`] is the read-only description of one semantic model:
//! its physical source table, declared dimensions and metrics, and the
//! rule used to synthesize a default metric. Schemas are owned by the
//! catalog and borrowed by the compiler for a single request.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a semantic model in the catalog.
pub type ModelId = u64;

/// System-reserved columns that are implicitly dimensions of every model.
pub const INTERNAL_COLUMNS: [&str; 3] = ["sys_imp_date", "sys_imp_week", "sys_imp_month"];

/// Returns the canonical internal column matching `name`, if any.
pub fn internal_column(name: &str) -> Option<&'static str> {
    INTERNAL_COLUMNS
        .iter()
        .find(|col| col.eq_ignore_ascii_case(name))
        .copied()
}

/// Type tag of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    String,
    Int,
    Decimal,
    Float,
    Bool,
    Date,
    Timestamp,
}

/// Aggregation applied to a metric expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Sum,
    Count,
    CountDistinct,
    Avg,
    Max,
    Min,
}

impl Aggregation {
    /// Wrap `expr` in this aggregation.
    pub fn apply(&self, expr: &str) -> String {
        match self {
            Aggregation::Sum => format!("SUM({})", expr),
            Aggregation::Count => format!("COUNT({})", expr),
            Aggregation::CountDistinct => format!("COUNT(DISTINCT {})", expr),
            Aggregation::Avg => format!("AVG({})", expr),
            Aggregation::Max => format!("MAX({})", expr),
            Aggregation::Min => format!("MIN({})", expr),
        }
    }
}

/// Whether a declared field is a dimension or a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Dimension,
    Metric,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Dimension => write!(f, "dimension"),
            ElementKind::Metric => write!(f, "metric"),
        }
    }
}

/// A declared dimension or metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaElement {
    /// Business name, as users write it.
    pub name: String,

    /// Technical column name in the physical source.
    pub technical_name: String,

    #[serde(default)]
    pub data_type: DataType,

    /// Physical SQL expression; defaults to the technical name.
    #[serde(default)]
    pub expr: Option<String>,

    /// Aggregation for metrics; `SUM` when absent.
    #[serde(default)]
    pub aggregation: Option<Aggregation>,
}

impl SchemaElement {
    pub fn new(name: impl Into<String>, technical_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            technical_name: technical_name.into(),
            data_type: DataType::default(),
            expr: None,
            aggregation: None,
        }
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_expr(mut self, expr: impl Into<String>) -> Self {
        self.expr = Some(expr.into());
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    /// The physical expression this element reads from the source table.
    pub fn physical_expr(&self) -> &str {
        self.expr.as_deref().unwrap_or(&self.technical_name)
    }

    fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    fn matches_technical(&self, name: &str) -> bool {
        self.technical_name.to_lowercase() == name.to_lowercase()
    }
}

/// Catalog-configured rule for the metric synthesized when a query names none.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultMetric {
    /// Output name; `<model biz_name>_internal_cnt` when absent.
    pub name: Option<String>,

    pub aggregation: Aggregation,

    /// Column the aggregation reads; rows are counted when absent.
    pub column: Option<String>,
}

impl DefaultMetric {
    /// Count of rows.
    pub fn count_rows() -> Self {
        Self {
            name: None,
            aggregation: Aggregation::Count,
            column: None,
        }
    }
}

/// Per-model catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub id: ModelId,

    /// Business name of the model; doubles as its logical table name.
    pub name: String,

    /// Technical name of the model.
    pub biz_name: String,

    /// Physical table (or view) the model reads from.
    pub source_table: String,

    /// Domain path of the model, carried into the logical request.
    #[serde(default)]
    pub full_path: Option<String>,

    #[serde(default)]
    pub dimensions: Vec<SchemaElement>,

    #[serde(default)]
    pub metrics: Vec<SchemaElement>,

    #[serde(default)]
    pub default_metric: Option<DefaultMetric>,

    /// Physical expressions for internal columns; identity when absent.
    #[serde(default)]
    pub internal_columns: BTreeMap<String, String>,
}

impl ModelSchema {
    pub fn new(
        id: ModelId,
        name: impl Into<String>,
        biz_name: impl Into<String>,
        source_table: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            biz_name: biz_name.into(),
            source_table: source_table.into(),
            full_path: None,
            dimensions: Vec::new(),
            metrics: Vec::new(),
            default_metric: None,
            internal_columns: BTreeMap::new(),
        }
    }

    pub fn with_dimension(mut self, element: SchemaElement) -> Self {
        self.dimensions.push(element);
        self
    }

    pub fn with_metric(mut self, element: SchemaElement) -> Self {
        self.metrics.push(element);
        self
    }

    pub fn with_default_metric(mut self, rule: DefaultMetric) -> Self {
        self.default_metric = Some(rule);
        self
    }

    pub fn with_internal_column(
        mut self,
        column: impl Into<String>,
        expr: impl Into<String>,
    ) -> Self {
        self.internal_columns.insert(column.into(), expr.into());
        self
    }

    pub fn with_full_path(mut self, path: impl Into<String>) -> Self {
        self.full_path = Some(path.into());
        self
    }

    /// A schema with no declared fields is unusable for classification.
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty() && self.metrics.is_empty()
    }

    fn elements(&self) -> impl Iterator<Item = (ElementKind, &SchemaElement)> {
        self.metrics
            .iter()
            .map(|e| (ElementKind::Metric, e))
            .chain(self.dimensions.iter().map(|e| (ElementKind::Dimension, e)))
    }

    /// Find a field by business name (case-insensitive). Metrics win over
    /// dimensions when a name is declared twice.
    pub fn find_by_name(&self, name: &str) -> Option<(ElementKind, &SchemaElement)> {
        self.elements().find(|(_, e)| e.matches_name(name))
    }

    /// Find a field by technical name (case-insensitive).
    pub fn find_by_technical_name(&self, name: &str) -> Option<(ElementKind, &SchemaElement)> {
        self.elements().find(|(_, e)| e.matches_technical(name))
    }

    /// Find a field by business name first, then technical name.
    pub fn find(&self, name: &str) -> Option<(ElementKind, &SchemaElement)> {
        self.find_by_name(name)
            .or_else(|| self.find_by_technical_name(name))
    }

    /// Physical expression backing an internal column.
    pub fn internal_column_expr<'a>(&'a self, column: &'a str) -> &'a str {
        self.internal_columns
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(column))
            .map(|(_, v)| v.as_str())
            .unwrap_or(column)
    }
}
