//! LIMIT enforcement.
//!
//! Caps every statement at a configured row ceiling: a missing LIMIT is
//! added, a larger or non-numeric one is replaced. OFFSET is preserved.

use sqlparser::ast::{Expr, Query, Value};

use super::{Correction, CorrectionContext, Corrector, CorrectorError};
use crate::sql;

/// Default row ceiling.
pub const DEFAULT_LIMIT_CEILING: u64 = 1000;

#[derive(Debug, Clone, Copy)]
pub struct LimitCorrector {
    ceiling: u64,
}

impl LimitCorrector {
    pub fn new(ceiling: u64) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }
}

impl Default for LimitCorrector {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT_CEILING)
    }
}

impl Corrector for LimitCorrector {
    fn name(&self) -> &'static str {
        "limit"
    }

    fn correct(&self, ctx: &mut CorrectionContext<'_>) -> Result<Correction, CorrectorError> {
        let statement = ctx.statement_mut()?;
        let changed = sql::query_mut(statement)
            .map(|query| enforce_limit(query, self.ceiling))
            .unwrap_or(false);

        if changed {
            ctx.commit();
            Ok(Correction::Applied)
        } else {
            Ok(Correction::Unchanged)
        }
    }
}

/// Current numeric LIMIT of a query, if any.
pub fn limit_value(query: &Query) -> Option<u64> {
    match &query.limit {
        Some(Expr::Value(Value::Number(n, _))) => n.parse().ok(),
        _ => None,
    }
}

/// Bound the query's LIMIT by `ceiling`. Returns whether it changed.
pub fn enforce_limit(query: &mut Query, ceiling: u64) -> bool {
    match (&query.limit, limit_value(query)) {
        (Some(_), Some(current)) if current <= ceiling => false,
        _ => {
            query.limit = Some(Expr::Value(Value::Number(ceiling.to_string(), false)));
            true
        }
    }
}
