//! H2 engine adaptor.
//!
//! H2 accepts `DATEDIFF('<unit>', start, end)` natively; only the
//! day-of-month accessor differs.

use super::helpers;
use super::EngineAdaptor;

/// H2 engine adaptor.
#[derive(Debug, Clone, Copy)]
pub struct H2;

impl EngineAdaptor for H2 {
    fn name(&self) -> &'static str {
        "h2"
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_h2(name)
    }
}
