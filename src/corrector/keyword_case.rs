//! Keyword-case normalization.
//!
//! Re-emits the statement through the SQL printer, which writes keywords
//! (SELECT, FROM, WHERE, AND, ORDER BY, DESC, LIMIT, ...) in upper case and
//! leaves identifiers and literals exactly as parsed.

use super::{Correction, CorrectionContext, Corrector, CorrectorError};

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordCaseCorrector;

impl Corrector for KeywordCaseCorrector {
    fn name(&self) -> &'static str {
        "keyword_case"
    }

    fn correct(&self, ctx: &mut CorrectionContext<'_>) -> Result<Correction, CorrectorError> {
        ctx.statement_mut()?;
        if ctx.commit() {
            Ok(Correction::Applied)
        } else {
            Ok(Correction::Unchanged)
        }
    }
}
