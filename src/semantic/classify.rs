//! Metric / dimension classification.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ElementKind, ModelSchema, INTERNAL_COLUMNS};

/// Whole-word matchers for each internal column, in `INTERNAL_COLUMNS` order.
static INTERNAL_COLUMN_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    INTERNAL_COLUMNS
        .iter()
        .map(|col| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(col))).unwrap();
            (*col, re)
        })
        .collect()
});

/// Referenced fields split by kind. Names are lower-cased business names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub metrics: Vec<String>,
    pub dimensions: Vec<String>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.dimensions.is_empty()
    }
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !names.contains(&name) {
        names.push(name);
    }
}

/// Internal columns whose name appears as a whole word in `sql`.
pub fn internal_columns_in(sql: &str) -> Vec<&'static str> {
    INTERNAL_COLUMN_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(sql))
        .map(|(col, _)| *col)
        .collect()
}

/// Partition `fields` into metrics and dimensions of `schema`.
///
/// Fields are matched by business or technical name, ignoring case.
/// Fields matching nothing are left out. Internal columns present in
/// `source_sql` join the dimensions. An empty schema yields empty sets.
pub fn classify(fields: &[String], schema: &ModelSchema, source_sql: &str) -> Classification {
    let mut classification = Classification::default();
    if schema.is_empty() {
        return classification;
    }

    for field in fields {
        match schema.find(field) {
            Some((ElementKind::Metric, element)) => {
                push_unique(&mut classification.metrics, element.name.to_lowercase());
            }
            Some((ElementKind::Dimension, element)) => {
                push_unique(&mut classification.dimensions, element.name.to_lowercase());
            }
            None => {}
        }
    }

    for col in internal_columns_in(source_sql) {
        push_unique(&mut classification.dimensions, col.to_string());
    }

    // A dimension whose lower-cased name collides with a metric is a metric.
    let Classification {
        metrics,
        dimensions,
    } = &mut classification;
    dimensions.retain(|d| !metrics.contains(d));

    classification
}
