//! ClickHouse engine adaptor.
//!
//! ClickHouse differences from the generic vocabulary:
//! - `dateDiff('<unit>', start, end)` is native, only the name differs
//! - Date parts use `toYear`, `toMonth`, `toDayOfMonth`

use super::helpers;
use super::EngineAdaptor;

/// ClickHouse engine adaptor.
#[derive(Debug, Clone, Copy)]
pub struct ClickHouse;

impl EngineAdaptor for ClickHouse {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    // Uses default date_diff (the generic form is native once renamed)

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_clickhouse(name)
    }
}
