//! Engine adaptors.
//!
//! Generated SQL is written against a dialect-neutral function vocabulary.
//! Each supported engine implements [`EngineAdaptor`] to translate those
//! calls into native syntax:
//!
//! | Generic form | MySQL | ClickHouse | H2 |
//! |--------------|-------|------------|----|
//! | `datediff('day', a, b)` | `DATEDIFF(b, a)` | `dateDiff('day', a, b)` | native |
//! | `datediff('week', a, b)` | `FLOOR(DATEDIFF(b, a) / 7)` | `dateDiff('week', a, b)` | native |
//! | `datediff('month', a, b)` | `PERIOD_DIFF(...)` | `dateDiff('month', a, b)` | native |
//! | `datediff('year', a, b)` | `(YEAR(b) - YEAR(a))` | `dateDiff('year', a, b)` | native |
//! | `year(x)` / `month(x)` / `day(x)` | `YEAR` / `MONTH` / `DAY` | `toYear` / `toMonth` / `toDayOfMonth` | `YEAR` / `MONTH` / `DAY_OF_MONTH` |
//!
//! Adaptors are stateless and every rewrite is idempotent: a corrected
//! statement never matches a rewrite rule again.
//!
//! # Usage
//!
//! ```
//! use semql::sql::dialect::{EngineAdaptor, EngineRegistry, EngineType};
//!
//! let registry = EngineRegistry::standard();
//! let engine = registry.lookup("ClickHouse").unwrap();
//! assert_eq!(engine, EngineType::ClickHouse);
//! assert_eq!(
//!     engine.correct_function_names("SELECT month(d) FROM t"),
//!     "SELECT toMonth(d) FROM t"
//! );
//! ```

mod clickhouse;
mod h2;
pub mod helpers;
mod mysql;

pub use clickhouse::ClickHouse;
pub use h2::H2;
pub use mysql::MySql;

use std::collections::HashMap;
use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlparser::ast::{visit_expressions_mut, Expr, Statement};
use tracing::{debug, warn};

use super::rewrite::rename_function;
use super::{parse_expr, parse_statement, ParseError};
use helpers::DateUnit;

/// Dialect translation strategy for one database engine.
///
/// The default implementations leave SQL untouched; engines override the
/// hooks they need.
pub trait EngineAdaptor: fmt::Debug + Send + Sync {
    /// Engine name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Hooks
    // =========================================================================

    /// Remap a function name for this engine.
    ///
    /// Returns `Some(new_name)` to rename the call, `None` to keep it.
    /// The input is matched case-insensitively.
    fn remap_function(&self, name: &str) -> Option<&'static str> {
        let _ = name;
        None
    }

    /// Native replacement for the generic `datediff('<unit>', start, end)`.
    ///
    /// Receives the rendered start and end arguments and returns the
    /// replacement expression as SQL text, or `None` to keep the call.
    fn date_diff(&self, unit: DateUnit, start: &str, end: &str) -> Option<String> {
        let _ = (unit, start, end);
        None
    }

    // =========================================================================
    // Correction
    // =========================================================================

    /// Rewrite engine-specific function syntax in place.
    fn correct_statement(&self, statement: &mut Statement) -> Result<(), ParseError> {
        let flow = visit_expressions_mut(statement, |expr| {
            let replacement = match &*expr {
                Expr::Function(func) => helpers::generic_date_diff(func)
                    .and_then(|(unit, start, end)| {
                        self.date_diff(unit, &start.to_string(), &end.to_string())
                    }),
                _ => None,
            };

            if let Some(sql) = replacement {
                match parse_expr(&sql) {
                    Ok(new_expr) => *expr = new_expr,
                    Err(e) => return ControlFlow::Break(e),
                }
                return ControlFlow::Continue(());
            }

            if let Expr::Function(func) = expr {
                rename_function(func, |name| self.remap_function(name));
            }
            ControlFlow::Continue(())
        });

        match flow {
            ControlFlow::Break(e) => Err(e),
            ControlFlow::Continue(()) => Ok(()),
        }
    }

    /// Rewrite engine-specific function syntax in SQL text.
    ///
    /// SQL that cannot be parsed is returned unchanged.
    fn correct_function_names(&self, sql: &str) -> String {
        let mut statement = match parse_statement(sql) {
            Ok(statement) => statement,
            Err(e) => {
                debug!(engine = self.name(), error = %e, "function correction skipped");
                return sql.to_string();
            }
        };
        match self.correct_statement(&mut statement) {
            Ok(()) => statement.to_string(),
            Err(e) => {
                debug!(engine = self.name(), error = %e, "function correction skipped");
                sql.to_string()
            }
        }
    }
}

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    MySql,
    ClickHouse,
    H2,
}

impl EngineType {
    pub const ALL: [EngineType; 3] = [EngineType::MySql, EngineType::ClickHouse, EngineType::H2];

    /// Get the adaptor implementation.
    pub fn adaptor(&self) -> &'static dyn EngineAdaptor {
        match self {
            EngineType::MySql => &MySql,
            EngineType::ClickHouse => &ClickHouse,
            EngineType::H2 => &H2,
        }
    }
}

// Implement EngineAdaptor for EngineType by delegating to concrete types
impl EngineAdaptor for EngineType {
    fn name(&self) -> &'static str {
        self.adaptor().name()
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        self.adaptor().remap_function(name)
    }

    fn date_diff(&self, unit: DateUnit, start: &str, end: &str) -> Option<String> {
        self.adaptor().date_diff(unit, start, end)
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.adaptor().name())
    }
}

/// Error for engine names outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported engine type: {0}")]
pub struct UnknownEngine(pub String);

impl FromStr for EngineType {
    type Err = UnknownEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineType::ALL
            .into_iter()
            .find(|engine| engine.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownEngine(s.to_string()))
    }
}

/// Maps database-type identifiers to engine adaptors.
///
/// Built once at startup and shared read-only across compilations.
#[derive(Debug, Clone)]
pub struct EngineRegistry {
    engines: HashMap<String, EngineType>,
}

impl EngineRegistry {
    /// Registry with every engine under its own name plus common aliases.
    pub fn standard() -> Self {
        let mut registry = Self {
            engines: HashMap::new(),
        };
        for engine in EngineType::ALL {
            registry.register(engine.name(), engine);
        }
        for alias in ["mariadb", "doris", "starrocks", "tidb"] {
            registry.register(alias, EngineType::MySql);
        }
        registry
    }

    /// Standard registry extended with configured `alias -> engine` pairs.
    ///
    /// Aliases naming an unsupported engine are skipped.
    pub fn with_aliases(mut self, aliases: &HashMap<String, String>) -> Self {
        for (alias, target) in aliases {
            match target.parse::<EngineType>() {
                Ok(engine) => self.register(alias, engine),
                Err(e) => warn!(alias = %alias, error = %e, "ignoring engine alias"),
            }
        }
        self
    }

    pub fn register(&mut self, name: &str, engine: EngineType) {
        self.engines.insert(name.trim().to_lowercase(), engine);
    }

    /// Adaptor for a database type; `None` when the engine is unsupported.
    pub fn lookup(&self, engine_type: &str) -> Option<EngineType> {
        self.engines.get(&engine_type.trim().to_lowercase()).copied()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
