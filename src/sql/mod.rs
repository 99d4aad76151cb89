//! SQL parsing and inspection.
//!
//! This module wraps sqlparser-rs for the compiler:
//!
//! - [`rewrite`] - column and function renaming over the expression tree
//! - [`dialect`] - engine adaptors for dialect-specific function syntax
//!
//! All parsing uses sqlparser's `GenericDialect`; engine specifics are
//! applied afterwards by the adaptors.

pub mod dialect;
pub mod rewrite;

use std::ops::ControlFlow;

use sqlparser::ast::{
    visit_expressions, Expr, Function, Ident, Query, Select, SelectItem, SetExpr, Statement,
    TableFactor, Visit, Visitor,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use thiserror::Error;

pub use dialect::{EngineAdaptor, EngineRegistry, EngineType};
pub use rewrite::{rename_functions, rewrite_fields, FieldNameMap};

/// Aggregate function names recognized when deciding whether a SELECT aggregates.
const AGGREGATE_FUNCTIONS: [&str; 5] = ["sum", "count", "avg", "max", "min"];

/// Errors raised while parsing SQL text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("SQL syntax error: {0}")]
    Syntax(String),

    #[error("Expected a single SELECT statement, found {0}")]
    NotASelect(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse exactly one query statement.
pub fn parse_statement(sql: &str) -> ParseResult<Statement> {
    let dialect = GenericDialect {};
    let mut statements =
        Parser::parse_sql(&dialect, sql).map_err(|e| ParseError::Syntax(e.to_string()))?;

    if statements.len() != 1 {
        return Err(ParseError::NotASelect(format!(
            "{} statements",
            statements.len()
        )));
    }

    let statement = statements.remove(0);
    match statement {
        Statement::Query(_) => Ok(statement),
        _ => Err(ParseError::NotASelect("a non-query statement".to_string())),
    }
}

/// Parse a standalone expression.
pub fn parse_expr(sql: &str) -> ParseResult<Expr> {
    let dialect = GenericDialect {};
    let mut parser = Parser::new(&dialect)
        .try_with_sql(sql)
        .map_err(|e| ParseError::Syntax(e.to_string()))?;
    parser
        .parse_expr()
        .map_err(|e| ParseError::Syntax(e.to_string()))
}

pub fn query(statement: &Statement) -> Option<&Query> {
    match statement {
        Statement::Query(query) => Some(query.as_ref()),
        _ => None,
    }
}

pub fn query_mut(statement: &mut Statement) -> Option<&mut Query> {
    match statement {
        Statement::Query(query) => Some(query.as_mut()),
        _ => None,
    }
}

/// The top-level SELECT of a query, if its body is a plain SELECT.
pub fn select(statement: &Statement) -> Option<&Select> {
    match query(statement)?.body.as_ref() {
        SetExpr::Select(select) => Some(select.as_ref()),
        _ => None,
    }
}

/// Column name referenced by an expression node (last part for `t.col`).
pub fn column_ident(expr: &Expr) -> Option<&Ident> {
    match expr {
        Expr::Identifier(ident) => Some(ident),
        Expr::CompoundIdentifier(parts) => parts.last(),
        _ => None,
    }
}

/// Every column identifier under `node`, deduplicated case-insensitively
/// in first-appearance order.
pub fn column_idents<V: Visit>(node: &V) -> Vec<Ident> {
    let mut idents: Vec<Ident> = Vec::new();
    let _ = visit_expressions(node, |expr| {
        if let Some(ident) = column_ident(expr) {
            let key = ident.value.to_lowercase();
            if !idents.iter().any(|i| i.value.to_lowercase() == key) {
                idents.push(ident.clone());
            }
        }
        ControlFlow::<()>::Continue(())
    });
    idents
}

fn names(idents: Vec<Ident>) -> Vec<String> {
    idents.into_iter().map(|i| i.value).collect()
}

/// All fields referenced anywhere in the statement.
pub fn all_fields(statement: &Statement) -> Vec<String> {
    names(column_idents(statement))
}

/// Fields referenced by the SELECT list, plus output aliases.
pub fn select_fields(select: &Select) -> Vec<String> {
    let mut fields = names(column_idents(&select.projection));
    for item in &select.projection {
        if let SelectItem::ExprWithAlias { alias, .. } = item {
            fields.push(alias.value.clone());
        }
    }
    fields
}

/// Collects column expressions outside nested queries.
#[derive(Default)]
struct OuterColumns {
    depth: usize,
    columns: Vec<Expr>,
}

impl OuterColumns {
    fn push(&mut self, expr: &Expr) {
        let Some(ident) = column_ident(expr) else {
            return;
        };
        let key = ident.value.to_lowercase();
        let seen = self
            .columns
            .iter()
            .filter_map(column_ident)
            .any(|i| i.value.to_lowercase() == key);
        if !seen {
            self.columns.push(expr.clone());
        }
    }
}

impl Visitor for OuterColumns {
    type Break = ();

    fn pre_visit_query(&mut self, _query: &Query) -> ControlFlow<()> {
        self.depth += 1;
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &Query) -> ControlFlow<()> {
        self.depth -= 1;
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<()> {
        if self.depth == 0 {
            self.push(expr);
        }
        ControlFlow::Continue(())
    }
}

/// Column expressions under `node` that belong to the enclosing query,
/// skipping subqueries. Qualifiers are kept; duplicates are detected on the
/// column name, ignoring case.
fn outer_columns<V: Visit>(node: &V) -> Vec<Expr> {
    let mut collector = OuterColumns::default();
    let _ = node.visit(&mut collector);
    collector.columns
}

/// Columns referenced by the WHERE clause itself.
pub fn where_fields(select: &Select) -> Vec<Expr> {
    outer_columns(&select.selection)
}

/// Columns referenced by the ORDER BY clause itself.
pub fn order_by_fields(query: &Query) -> Vec<Expr> {
    outer_columns(&query.order_by)
}

/// Output aliases declared in the SELECT list.
pub fn select_aliases(select: &Select) -> Vec<String> {
    select
        .projection
        .iter()
        .filter_map(|item| match item {
            SelectItem::ExprWithAlias { alias, .. } => Some(alias.value.clone()),
            _ => None,
        })
        .collect()
}

/// Whether the SELECT list is or contains a wildcard.
pub fn has_wildcard(select: &Select) -> bool {
    select.projection.iter().any(|item| {
        matches!(
            item,
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(_, _)
        )
    })
}

/// Lower-cased function name.
pub fn function_name(func: &Function) -> String {
    func.name.to_string().to_lowercase()
}

fn is_aggregate(func: &Function) -> bool {
    AGGREGATE_FUNCTIONS.contains(&function_name(func).as_str())
}

/// Whether the SELECT list calls an aggregate function.
pub fn has_aggregate_function(select: &Select) -> bool {
    visit_expressions(&select.projection, |expr| match expr {
        Expr::Function(func) if is_aggregate(func) => ControlFlow::Break(()),
        _ => ControlFlow::Continue(()),
    })
    .is_break()
}

/// Whether the top-level SELECT has a GROUP BY clause.
pub fn has_group_by(select: &Select) -> bool {
    visit_expressions(&select.group_by, |_| ControlFlow::Break(())).is_break()
}

/// Whether the statement aggregates (aggregate call or GROUP BY).
pub fn is_aggregate_query(statement: &Statement) -> bool {
    select(statement)
        .map(|s| has_aggregate_function(s) || has_group_by(s))
        .unwrap_or(false)
}

/// Name of the first table in the top-level FROM clause.
pub fn table_name(statement: &Statement) -> Option<String> {
    let select = select(statement)?;
    let relation = &select.from.first()?.relation;
    match relation {
        TableFactor::Table { name, .. } => name.0.last().map(|ident| ident.value.clone()),
        _ => None,
    }
}
