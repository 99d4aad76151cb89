//! Function-name correction.
//!
//! Delegates to the engine adaptor of the request's target database.
//! Without an engine the stage does nothing.

use tracing::debug;

use super::{Correction, CorrectionContext, Corrector, CorrectorError};
use crate::sql::EngineAdaptor;

#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionNameCorrector;

impl Corrector for FunctionNameCorrector {
    fn name(&self) -> &'static str {
        "function_name"
    }

    fn correct(&self, ctx: &mut CorrectionContext<'_>) -> Result<Correction, CorrectorError> {
        let Some(engine) = ctx.engine() else {
            debug!("no engine configured; function names left as written");
            return Ok(Correction::Unchanged);
        };

        engine.correct_statement(ctx.statement_mut()?)?;
        if ctx.commit() {
            Ok(Correction::Applied)
        } else {
            Ok(Correction::Unchanged)
        }
    }
}
