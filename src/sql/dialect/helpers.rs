//! Shared helper functions for engine adaptors.
//!
//! This module provides the building blocks engines compose to implement
//! the `EngineAdaptor` trait with minimal duplication.

use std::str::FromStr;

use sqlparser::ast::{Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments, Value};

use crate::sql::function_name;

// =============================================================================
// Generic date difference
// =============================================================================

/// Unit argument of the generic `datediff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Day,
    Week,
    Month,
    Year,
}

impl DateUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateUnit::Day => "day",
            DateUnit::Week => "week",
            DateUnit::Month => "month",
            DateUnit::Year => "year",
        }
    }
}

impl FromStr for DateUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "days" => Ok(DateUnit::Day),
            "week" | "weeks" => Ok(DateUnit::Week),
            "month" | "months" => Ok(DateUnit::Month),
            "year" | "years" => Ok(DateUnit::Year),
            _ => Err(()),
        }
    }
}

/// Match `datediff('<unit>', start, end)`: exactly three positional
/// arguments, the first a string literal naming a known unit.
pub fn generic_date_diff(func: &Function) -> Option<(DateUnit, &Expr, &Expr)> {
    if function_name(func) != "datediff" {
        return None;
    }
    let FunctionArguments::List(list) = &func.args else {
        return None;
    };

    let args: Vec<&Expr> = list
        .args
        .iter()
        .filter_map(|arg| match arg {
            FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => Some(expr),
            _ => None,
        })
        .collect();
    if args.len() != 3 || list.args.len() != 3 {
        return None;
    }

    let Expr::Value(Value::SingleQuotedString(unit)) = args[0] else {
        return None;
    };
    let unit = unit.parse().ok()?;
    Some((unit, args[1], args[2]))
}

/// MySQL has no unit-taking DATEDIFF; express each unit natively.
pub fn date_diff_mysql(unit: DateUnit, start: &str, end: &str) -> String {
    match unit {
        DateUnit::Day => format!("DATEDIFF({}, {})", end, start),
        DateUnit::Week => format!("FLOOR(DATEDIFF({}, {}) / 7)", end, start),
        DateUnit::Month => format!(
            "PERIOD_DIFF(DATE_FORMAT({}, '%Y%m'), DATE_FORMAT({}, '%Y%m'))",
            end, start
        ),
        DateUnit::Year => format!("(YEAR({}) - YEAR({}))", end, start),
    }
}

// =============================================================================
// Function Remapping
// =============================================================================

/// Remap functions for MySQL.
pub fn remap_function_mysql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "YEAR" => Some("YEAR"),
        "MONTH" => Some("MONTH"),
        "DAY" => Some("DAY"),
        _ => None,
    }
}

/// Remap functions for ClickHouse.
pub fn remap_function_clickhouse(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "DATEDIFF" => Some("dateDiff"),
        "YEAR" => Some("toYear"),
        "MONTH" => Some("toMonth"),
        "DAY" => Some("toDayOfMonth"),
        _ => None,
    }
}

/// Remap functions for H2.
pub fn remap_function_h2(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "YEAR" => Some("YEAR"),
        "MONTH" => Some("MONTH"),
        "DAY" => Some("DAY_OF_MONTH"),
        _ => None,
    }
}
