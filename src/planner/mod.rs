//! Physical SQL synthesis - turns a logical request into SQL over the
//! model's source table.
//!
//! The logical table named in FROM is replaced by a derived table that
//! projects every classified field from the physical source:
//!
//! ```text
//! SELECT 歌手名 FROM 歌曲库 WHERE ...
//!        │
//!        ▼
//! SELECT singer_name FROM (
//!     SELECT singer_name, SUM(play_cnt) AS play_count
//!     FROM dw.song_lib GROUP BY singer_name
//! ) AS 歌曲库 WHERE ...
//! ```
//!
//! The outer statement is rewritten from business to technical names so
//! it addresses the derived table's columns.

use sqlparser::ast::{SetExpr, TableFactor, TableWithJoins};
use thiserror::Error;
use tracing::debug;

use crate::model::{internal_column, LogicalRequest, LogicalTable, ModelSchema, Warning};
use crate::semantic::{Resolved, SchemaResolver, SynthesizedMetric};
use crate::sql::{self, rewrite_fields, FieldNameMap, ParseError};

const STAGE: &str = "planner";

/// Errors that can occur during planning.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Request carries no logical table")]
    NoLogicalTable,
}

pub type PlanResult<T> = Result<T, PlanError>;

/// Physical SQL before limit enforcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalSql {
    pub sql: String,

    /// Whether the logical statement itself aggregates.
    pub has_aggregation: bool,

    pub warnings: Vec<Warning>,
}

/// Synthesize physical SQL for `request` over `schema`.
pub fn synthesize(
    request: &LogicalRequest,
    schema: &ModelSchema,
    default_metric: Option<&SynthesizedMetric>,
) -> PlanResult<PhysicalSql> {
    let table = request.tables.first().ok_or(PlanError::NoLogicalTable)?;
    let mut statement = sql::parse_statement(&request.sql)?;
    let has_aggregation = sql::is_aggregate_query(&statement);
    let mut warnings = Vec::new();

    let aliases = sql::select(&statement)
        .map(sql::select_aliases)
        .unwrap_or_default();
    let resolver = SchemaResolver::new(schema)
        .with_default_metric(default_metric.map(|m| m.name.as_str()))
        .with_aliases(&aliases);

    // Business to technical, resolved the same way as the derived table.
    let mut outer_names = FieldNameMap::new();
    for field in sql::all_fields(&statement) {
        let resolution = resolver.resolve(&field);
        if let Resolved::Dimension(element) | Resolved::Metric(element) = resolution.target {
            outer_names.insert(field.as_str(), element.technical_name.as_str());
        }
        if resolution.ambiguous {
            warnings.push(Warning::new(
                STAGE,
                format!("ambiguous identifier `{}` resolved by business name", field),
            ));
        }
        if resolution.is_unknown() {
            warnings.push(Warning::new(
                STAGE,
                format!("unknown identifier `{}` passed through", field),
            ));
        }
    }

    let inner = source_query(table, schema, default_metric, &resolver);
    debug!(model = schema.id, inner = %inner, "derived source query");

    // Runs before the derived table is attached so the inner query is left
    // alone.
    rewrite_fields(&mut statement, &outer_names);

    let replaced = match sql::query_mut(&mut statement).map(|q| q.body.as_mut()) {
        Some(SetExpr::Select(select)) => attach_source(&mut select.from, &table.alias, &inner)?,
        _ => 0,
    };
    if replaced == 0 {
        warnings.push(Warning::new(
            STAGE,
            format!("logical table `{}` not found in FROM", table.alias),
        ));
    }

    Ok(PhysicalSql {
        sql: statement.to_string(),
        has_aggregation,
        warnings,
    })
}

fn column(expr: &str, name: &str) -> String {
    if expr == name {
        expr.to_string()
    } else {
        format!("{} AS {}", expr, name)
    }
}

/// The derived query projecting the table's fields from the source.
fn source_query(
    table: &LogicalTable,
    schema: &ModelSchema,
    default_metric: Option<&SynthesizedMetric>,
    resolver: &SchemaResolver<'_>,
) -> String {
    let mut group_by = Vec::new();
    let mut columns = Vec::new();

    for name in &table.dimensions {
        let (expr, output) = match internal_column(name) {
            Some(col) => (schema.internal_column_expr(col), col),
            None => match resolver.resolve(name).target {
                Resolved::Dimension(element) | Resolved::Metric(element) => {
                    (element.physical_expr(), element.technical_name.as_str())
                }
                _ => continue,
            },
        };
        group_by.push(expr.to_string());
        columns.push(column(expr, output));
    }

    let mut aggregates = 0;
    for name in &table.metrics {
        match (default_metric, resolver.resolve(name).target) {
            (Some(metric), _) if metric.name == *name => {
                columns.push(column(&metric.expr, &metric.name));
            }
            (_, Resolved::Metric(element)) | (_, Resolved::Dimension(element)) => {
                let aggregation = element.aggregation.unwrap_or_default();
                columns.push(column(
                    &aggregation.apply(element.physical_expr()),
                    &element.technical_name,
                ));
            }
            _ => continue,
        }
        aggregates += 1;
    }

    let projection = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    };
    let mut inner = format!("SELECT {} FROM {}", projection, schema.source_table);
    if aggregates > 0 && !group_by.is_empty() {
        inner.push_str(" GROUP BY ");
        inner.push_str(&group_by.join(", "));
    }
    inner
}

/// Swap every FROM / JOIN reference to `alias` for the derived table.
///
/// Returns the number of references replaced.
fn attach_source(from: &mut [TableWithJoins], alias: &str, inner: &str) -> PlanResult<usize> {
    let mut replaced = 0;
    let relations = from.iter_mut().flat_map(|TableWithJoins { relation, joins }| {
        std::iter::once(relation).chain(joins.iter_mut().map(|join| &mut join.relation))
    });

    for relation in relations {
        let TableFactor::Table {
            name,
            alias: table_alias,
            ..
        } = relation
        else {
            continue;
        };
        let Some(table_ident) = name.0.last() else {
            continue;
        };
        if table_ident.value.to_lowercase() != alias.to_lowercase() {
            continue;
        }

        let output = table_alias
            .as_ref()
            .map(|a| a.name.clone())
            .unwrap_or_else(|| table_ident.clone());
        *relation = derived_table(inner, &output.to_string())?;
        replaced += 1;
    }
    Ok(replaced)
}

fn derived_table(inner: &str, alias: &str) -> PlanResult<TableFactor> {
    let wrapper = format!("SELECT * FROM ({}) AS {}", inner, alias);
    let statement = sql::parse_statement(&wrapper)?;
    sql::select(&statement)
        .and_then(|select| select.from.first())
        .map(|twj| twj.relation.clone())
        .ok_or_else(|| PlanError::Parse(ParseError::NotASelect(wrapper.clone())))
}
