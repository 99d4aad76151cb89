//! Append WHERE / ORDER BY fields to the SELECT list.
//!
//! Result consumers expect every filtered or sorted field to be visible in
//! the result set. Fields already selected (by column or by output alias)
//! and internal date columns are skipped. Only the statement's own WHERE
//! and ORDER BY count; columns inside subqueries belong to those queries.
//! Qualified columns are appended with their qualifier.
//!
//! Appended fields follow hash-bucket order: a 31-multiplier hash over the
//! field's UTF-16 code units, spread by `h ^ (h >> 16)`, indexed into a
//! power-of-two table of at least 16 slots kept under a 0.75 load factor.
//! Fields sharing a bucket keep first-appearance order. Result consumers
//! were built against this column order.

use std::collections::HashSet;

use sqlparser::ast::{Expr, SelectItem, SetExpr};
use tracing::debug;

use super::{Correction, CorrectionContext, Corrector, CorrectorError};
use crate::model::internal_column;
use crate::sql;

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectFieldAppendCorrector;

impl Corrector for SelectFieldAppendCorrector {
    fn name(&self) -> &'static str {
        "select_field_append"
    }

    fn correct(&self, ctx: &mut CorrectionContext<'_>) -> Result<Correction, CorrectorError> {
        let statement = ctx.statement_mut()?;
        let Some(query) = sql::query_mut(statement) else {
            return Ok(Correction::Unchanged);
        };
        let order_by_fields = sql::order_by_fields(query);

        let SetExpr::Select(select) = query.body.as_mut() else {
            debug!("set operation has no single select list; nothing appended");
            return Ok(Correction::Unchanged);
        };
        if sql::has_wildcard(select)
            || sql::has_aggregate_function(select)
            || sql::has_group_by(select)
        {
            debug!("select list is a wildcard or grouped; nothing appended");
            return Ok(Correction::Unchanged);
        }

        let selected: HashSet<String> = sql::select_fields(select)
            .iter()
            .map(|f| f.to_lowercase())
            .collect();

        let mut referenced: Vec<(String, Expr)> = Vec::new();
        for expr in sql::where_fields(select).into_iter().chain(order_by_fields) {
            let Some(name) = sql::column_ident(&expr).map(|ident| ident.value.clone()) else {
                continue;
            };
            let key = name.to_lowercase();
            if !referenced.iter().any(|(n, _)| n.to_lowercase() == key) {
                referenced.push((name, expr));
            }
        }
        let table_hint = referenced.len();

        let missing: Vec<(String, Expr)> = referenced
            .into_iter()
            .filter(|(name, _)| !selected.contains(&name.to_lowercase()))
            .filter(|(name, _)| internal_column(name).is_none())
            .collect();
        if missing.is_empty() {
            return Ok(Correction::Unchanged);
        }

        for (_, expr) in bucket_order(missing, table_hint) {
            select.projection.push(SelectItem::UnnamedExpr(expr));
        }

        ctx.commit();
        Ok(Correction::Applied)
    }
}

/// 31-multiplier polynomial hash over UTF-16 code units.
fn string_hash(s: &str) -> u32 {
    s.encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

fn bucket(s: &str, slots: usize) -> usize {
    let h = string_hash(s);
    ((h ^ (h >> 16)) as usize) & (slots - 1)
}

/// Order `fields` by the bucket of their column name in a table sized for
/// `table_hint` entries.
fn bucket_order<T>(fields: Vec<(String, T)>, table_hint: usize) -> Vec<(String, T)> {
    let mut slots = 16usize;
    while table_hint * 4 > slots * 3 {
        slots *= 2;
    }

    let mut keyed: Vec<(usize, usize, (String, T))> = fields
        .into_iter()
        .enumerate()
        .map(|(position, field)| (bucket(&field.0, slots), position, field))
        .collect();
    keyed.sort_by_key(|(bucket, position, _)| (*bucket, *position));
    keyed.into_iter().map(|(_, _, field)| field).collect()
}
