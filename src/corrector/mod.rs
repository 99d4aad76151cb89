//! Corrector pipeline.
//!
//! An ordered list of independent stages, each normalizing or repairing
//! generated SQL held in a shared [`CorrectionContext`]:
//!
//! ```text
//! SQL ─▶ select-field-append ─▶ keyword-case ─▶ limit ─▶ function-name ─▶ SQL
//! ```
//!
//! A stage reports [`Correction::Applied`] or [`Correction::Unchanged`],
//! or fails with a [`CorrectorError`]. On failure the pipeline restores the
//! text from before that stage, records a [`Warning`] and moves on, so
//! earlier progress is never lost.
//!
//! Every stage is idempotent; running the pipeline over its own output
//! yields the same text.

mod function_name;
mod keyword_case;
mod limit;
mod select_field;

pub use function_name::FunctionNameCorrector;
pub use keyword_case::KeywordCaseCorrector;
pub use limit::{enforce_limit, limit_value, LimitCorrector, DEFAULT_LIMIT_CEILING};
pub use select_field::SelectFieldAppendCorrector;

use std::fmt;

use sqlparser::ast::Statement;
use tracing::{debug, warn};

use crate::config::CompilerSettings;
use crate::model::{ModelSchema, Warning};
use crate::sql::{parse_statement, EngineType, ParseError};

/// Errors a corrector stage can report.
#[derive(Debug, thiserror::Error)]
pub enum CorrectorError {
    #[error("Unparsable SQL: {0}")]
    Parse(#[from] ParseError),
}

/// Outcome of a successful stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    Applied,
    Unchanged,
}

/// Mutable working state threaded through the pipeline for one request.
///
/// Holds the SQL text and, once a stage asks for it, the parsed
/// statement. Stages that edit the statement call [`commit`] to re-render
/// the text; stages that edit text directly call [`set_sql`], which drops
/// the cached parse.
///
/// [`commit`]: CorrectionContext::commit
/// [`set_sql`]: CorrectionContext::set_sql
#[derive(Debug, Clone)]
pub struct CorrectionContext<'a> {
    sql: String,
    statement: Option<Statement>,
    schema: Option<&'a ModelSchema>,
    engine: Option<EngineType>,
}

impl<'a> CorrectionContext<'a> {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            statement: None,
            schema: None,
            engine: None,
        }
    }

    pub fn with_schema(mut self, schema: &'a ModelSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_engine(mut self, engine: Option<EngineType>) -> Self {
        self.engine = engine;
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn into_sql(self) -> String {
        self.sql
    }

    pub fn schema(&self) -> Option<&'a ModelSchema> {
        self.schema
    }

    pub fn engine(&self) -> Option<EngineType> {
        self.engine
    }

    /// Replace the SQL text, dropping any cached parse.
    pub fn set_sql(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
        self.statement = None;
    }

    /// The parsed statement, parsing the current text on first use.
    pub fn statement_mut(&mut self) -> Result<&mut Statement, ParseError> {
        let statement = match self.statement.take() {
            Some(statement) => statement,
            None => parse_statement(&self.sql)?,
        };
        Ok(self.statement.insert(statement))
    }

    /// Re-render the cached statement into the SQL text.
    ///
    /// Returns whether the text changed.
    pub fn commit(&mut self) -> bool {
        let Some(statement) = &self.statement else {
            return false;
        };
        let rendered = statement.to_string();
        if rendered == self.sql {
            return false;
        }
        self.sql = rendered;
        true
    }
}

/// One SQL normalization rule.
pub trait Corrector: fmt::Debug + Send + Sync {
    /// Stage name for logging and warnings.
    fn name(&self) -> &'static str;

    fn correct(&self, ctx: &mut CorrectionContext<'_>) -> Result<Correction, CorrectorError>;
}

/// Ordered corrector stages.
#[derive(Debug)]
pub struct CorrectorPipeline {
    stages: Vec<Box<dyn Corrector>>,
}

impl CorrectorPipeline {
    pub fn new(stages: Vec<Box<dyn Corrector>>) -> Self {
        Self { stages }
    }

    /// The four standard stages in their fixed order.
    pub fn standard(limit_ceiling: u64) -> Self {
        Self::new(vec![
            Box::new(SelectFieldAppendCorrector),
            Box::new(KeywordCaseCorrector),
            Box::new(LimitCorrector::new(limit_ceiling)),
            Box::new(FunctionNameCorrector),
        ])
    }

    /// Standard stages, omitting select-field-append when disabled.
    pub fn from_settings(settings: &CompilerSettings) -> Self {
        let mut pipeline = Self::standard(settings.limit_ceiling);
        if !settings.append_filter_fields {
            pipeline.stages.retain(|s| s.name() != SelectFieldAppendCorrector.name());
        }
        pipeline
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over the context.
    ///
    /// Returns the warnings of stages that failed and were rolled back.
    pub fn run(&self, ctx: &mut CorrectionContext<'_>) -> Vec<Warning> {
        let mut warnings = Vec::new();

        for stage in &self.stages {
            let before = (ctx.sql.clone(), ctx.statement.clone());
            match stage.correct(ctx) {
                Ok(Correction::Applied) => {
                    debug!(stage = stage.name(), sql = %ctx.sql, "corrector applied");
                }
                Ok(Correction::Unchanged) => {}
                Err(e) => {
                    warn!(stage = stage.name(), error = %e, "corrector failed, keeping prior SQL");
                    (ctx.sql, ctx.statement) = before;
                    warnings.push(Warning::new(stage.name(), e.to_string()));
                }
            }
        }

        warnings
    }

    /// Convenience: run the pipeline over standalone SQL.
    pub fn correct_sql(&self, sql: &str, engine: Option<EngineType>) -> (String, Vec<Warning>) {
        let mut ctx = CorrectionContext::new(sql).with_engine(engine);
        let warnings = self.run(&mut ctx);
        (ctx.into_sql(), warnings)
    }
}
