//! MySQL engine adaptor.
//!
//! MySQL differences from the generic vocabulary:
//! - DATEDIFF takes two arguments and always counts days (`end - start`)
//! - Week, month and year differences need their own formulas
//! - YEAR/MONTH/DAY are native; names are normalized to upper case
//!
//! Doris, StarRocks, TiDB and MariaDB share this adaptor.

use super::helpers::{self, DateUnit};
use super::EngineAdaptor;

/// MySQL engine adaptor.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl EngineAdaptor for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_mysql(name)
    }

    fn date_diff(&self, unit: DateUnit, start: &str, end: &str) -> Option<String> {
        Some(helpers::date_diff_mysql(unit, start, end))
    }
}
