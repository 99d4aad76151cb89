//! End-to-end compilation from a query request to physical SQL.
//!
//! ```text
//! QueryRequest ─▶ parse ─▶ engine function fix-up ─▶ corrector pipeline
//!                                                          │
//!     QueryStatement ◀─ LIMIT ◀─ synthesis ◀─ default metric ◀─ classify
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use semql::catalog::InMemoryCatalog;
//! use semql::compile::QueryConverter;
//! use semql::model::{ModelSchema, QueryRequest, SchemaElement};
//!
//! let catalog = InMemoryCatalog::new();
//! catalog.register(
//!     ModelSchema::new(1, "sales", "sales", "dw.sales")
//!         .with_dimension(SchemaElement::new("region", "region_code")),
//!     Some("mysql".to_string()),
//! );
//!
//! let converter = QueryConverter::new(Arc::new(catalog));
//! let statement = converter
//!     .compile(&QueryRequest::new(1, "select region from sales"))
//!     .unwrap();
//! assert_eq!(
//!     statement.sql,
//!     "SELECT region_code FROM (SELECT region_code, COUNT(1) AS sales_internal_cnt \
//!      FROM dw.sales GROUP BY region_code) AS sales LIMIT 1000"
//! );
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::corrector::{CorrectionContext, Corrector, CorrectorPipeline, LimitCorrector};
use crate::model::{
    LogicalRequest, LogicalTable, ModelSchema, QueryRequest, QueryStatement, Warning,
};
use crate::planner;
use crate::semantic::{classify, CatalogDefaultMetric, DefaultMetricPolicy};
use crate::sql::{self, EngineAdaptor, EngineRegistry, EngineType};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Malformed SQL: {message}\n  in: {sql}")]
    MalformedInput { sql: String, message: String },
}

impl CompileError {
    fn malformed(sql: &str, err: impl fmt::Display) -> Self {
        CompileError::MalformedInput {
            sql: sql.to_string(),
            message: err.to_string(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

// ============================================================================
// Converter
// ============================================================================

/// Compiles query requests against a catalog.
///
/// Shares nothing mutable between calls; one converter serves any number
/// of concurrent compilations.
pub struct QueryConverter {
    catalog: Arc<dyn Catalog>,
    engines: EngineRegistry,
    pipeline: CorrectorPipeline,
    limit: LimitCorrector,
    default_metric: Box<dyn DefaultMetricPolicy>,
}

impl fmt::Debug for QueryConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryConverter")
            .field("engines", &self.engines)
            .field("pipeline", &self.pipeline)
            .field("limit", &self.limit)
            .field("default_metric", &self.default_metric)
            .finish_non_exhaustive()
    }
}

impl QueryConverter {
    /// Converter with default settings.
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self::from_settings(catalog, &Settings::default())
    }

    pub fn from_settings(catalog: Arc<dyn Catalog>, settings: &Settings) -> Self {
        Self {
            catalog,
            engines: EngineRegistry::standard().with_aliases(&settings.engines.aliases),
            pipeline: CorrectorPipeline::from_settings(&settings.compiler),
            limit: LimitCorrector::new(settings.compiler.limit_ceiling),
            default_metric: Box::new(CatalogDefaultMetric),
        }
    }

    pub fn with_default_metric_policy(mut self, policy: impl DefaultMetricPolicy + 'static) -> Self {
        self.default_metric = Box::new(policy);
        self
    }

    pub fn with_engines(mut self, engines: EngineRegistry) -> Self {
        self.engines = engines;
        self
    }

    /// Compile against the catalog's current snapshot of the model.
    pub fn compile(&self, request: &QueryRequest) -> CompileResult<QueryStatement> {
        let schemas: Vec<Arc<ModelSchema>> =
            self.catalog.schema(request.model_id).into_iter().collect();
        self.convert(request, &schemas)
    }

    /// Compile against the given schemas.
    ///
    /// The schema whose id matches the request is used, else the first.
    /// Returns [`QueryStatement::empty`] when there is no schema or the
    /// SQL names no table; fails only on unparsable SQL.
    pub fn convert(
        &self,
        request: &QueryRequest,
        schemas: &[Arc<ModelSchema>],
    ) -> CompileResult<QueryStatement> {
        let statement = sql::parse_statement(&request.sql)
            .map_err(|e| CompileError::malformed(&request.sql, e))?;
        let table_name = sql::table_name(&statement);
        let schema = schemas
            .iter()
            .find(|s| s.id == request.model_id)
            .or_else(|| schemas.first());

        let (Some(schema), Some(table_name)) = (schema, table_name) else {
            debug!(model = request.model_id, "no schema or table; nothing to compile");
            return Ok(QueryStatement::empty());
        };

        let mut warnings = Vec::new();
        let engine = self.engine_for(request, &mut warnings);
        let logical_sql = match engine {
            Some(engine) => engine.correct_function_names(&request.sql),
            None => request.sql.clone(),
        };

        let mut ctx = CorrectionContext::new(logical_sql)
            .with_schema(schema)
            .with_engine(engine);
        warnings.extend(self.pipeline.run(&mut ctx));
        let logical_sql = ctx.into_sql();

        let corrected = sql::parse_statement(&logical_sql)
            .map_err(|e| CompileError::malformed(&logical_sql, e))?;
        let mut fields = sql::all_fields(&corrected);
        fields.extend(request.selected_fields.iter().cloned());

        if schema.is_empty() {
            warnings.push(Warning::new(
                "schema",
                format!("model {} declares no fields", schema.id),
            ));
        }
        let classification = classify(&fields, schema, &logical_sql);

        let mut table = LogicalTable {
            alias: table_name.to_lowercase(),
            metrics: classification.metrics,
            dimensions: classification.dimensions,
        };
        let default_metric = table.metrics.is_empty().then(|| {
            let metric = self.default_metric.synthesize(schema, &table.dimensions);
            debug!(metric = %metric.name, expr = %metric.expr, "synthesized default metric");
            metric
        });
        if let Some(metric) = &default_metric {
            table.metrics = vec![metric.name.clone()];
        }

        let logical = LogicalRequest::from_request(
            request,
            logical_sql,
            schema.full_path.clone(),
            vec![table.clone()],
        );
        let physical = planner::synthesize(&logical, schema, default_metric.as_ref())
            .map_err(|e| CompileError::malformed(&logical.sql, e))?;
        warnings.extend(physical.warnings);

        let mut ctx = CorrectionContext::new(physical.sql);
        if let Err(e) = self.limit.correct(&mut ctx) {
            warnings.push(Warning::new(self.limit.name(), e.to_string()));
        }

        Ok(QueryStatement {
            sql: ctx.into_sql(),
            logical_table: Some(table),
            has_aggregation: physical.has_aggregation,
            warnings,
        })
    }

    /// Engine configured for the request's model, looked up once.
    fn engine_for(&self, request: &QueryRequest, warnings: &mut Vec<Warning>) -> Option<EngineType> {
        let database_type = self.catalog.database_type(request.model_id)?;
        match self.engines.lookup(&database_type) {
            Some(engine) => {
                info!(database_type = %database_type, engine = engine.name(), "engine adaptor selected");
                Some(engine)
            }
            None => {
                warnings.push(Warning::new(
                    "engine",
                    format!("no adaptor for database type `{}`", database_type),
                ));
                None
            }
        }
    }
}
