//! Default-metric synthesis.
//!
//! When classification finds no metric, the converter asks a
//! [`DefaultMetricPolicy`] for exactly one. The standard policy reads the
//! model's catalog rule and falls back to a row count.

use std::fmt;

use crate::model::{DefaultMetric, ModelSchema};

/// A metric made up for a request that named none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedMetric {
    /// Lower-cased output name.
    pub name: String,

    /// Aggregated physical expression, e.g. `COUNT(1)`.
    pub expr: String,
}

/// Produces the default metric for a model at a dimension grain.
pub trait DefaultMetricPolicy: fmt::Debug + Send + Sync {
    fn synthesize(&self, schema: &ModelSchema, dimensions: &[String]) -> SynthesizedMetric;
}

/// Policy driven by `ModelSchema::default_metric`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogDefaultMetric;

impl DefaultMetricPolicy for CatalogDefaultMetric {
    fn synthesize(&self, schema: &ModelSchema, _dimensions: &[String]) -> SynthesizedMetric {
        let rule = schema
            .default_metric
            .clone()
            .unwrap_or_else(DefaultMetric::count_rows);

        let name = rule
            .name
            .unwrap_or_else(|| format!("{}_internal_cnt", schema.biz_name))
            .to_lowercase();

        let column = match rule.column.as_deref() {
            Some(column) => schema
                .find(column)
                .map(|(_, element)| element.physical_expr().to_string())
                .unwrap_or_else(|| column.to_string()),
            None => "1".to_string(),
        };

        SynthesizedMetric {
            name,
            expr: rule.aggregation.apply(&column),
        }
    }
}
