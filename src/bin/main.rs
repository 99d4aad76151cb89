//! semql CLI - compile semantic SQL to physical SQL
//!
//! Usage:
//!   semql compile --catalog <catalog.toml> --model <id> <sql> [--output sql|json]
//!   semql correct <sql> [--engine <type>] [--limit <n>]
//!   semql models --catalog <catalog.toml>
//!
//! Examples:
//!   semql compile --catalog catalog.toml --model 1 "select 歌手名 from 歌曲库"
//!   semql correct "select a from t where b = 1" --engine clickhouse
//!   semql models --catalog catalog.json

use clap::{Parser, Subcommand, ValueEnum};
use semql::catalog::{Catalog, InMemoryCatalog};
use semql::compile::QueryConverter;
use semql::config::Settings;
use semql::corrector::CorrectorPipeline;
use semql::dialect::EngineRegistry;
use semql::model::{ModelId, QueryRequest};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "semql")]
#[command(about = "semql - compile semantic SQL to dialect-correct physical SQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile logical SQL against a model
    Compile {
        /// Logical SQL over the model's business names
        sql: String,

        /// Catalog file (.toml or .json); defaults to [catalog] path in settings
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Model id to compile against
        #[arg(short, long)]
        model: ModelId,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Run only the corrector pipeline over SQL
    Correct {
        sql: String,

        /// Database type whose function syntax to apply
        #[arg(short, long)]
        engine: Option<String>,

        /// LIMIT ceiling (defaults to the configured one)
        #[arg(short, long)]
        limit: Option<u64>,
    },

    /// List models in a catalog
    Models {
        /// Catalog file (.toml or .json); defaults to [catalog] path in settings
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output the full statement with metadata as JSON
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Compile {
            sql,
            catalog,
            model,
            output,
        } => cmd_compile(&settings, catalog, model, sql, output),
        Commands::Correct { sql, engine, limit } => cmd_correct(&settings, sql, engine, limit),
        Commands::Models { catalog } => cmd_models(&settings, catalog),
    }
}

fn load_catalog(settings: &Settings, path: Option<PathBuf>) -> Result<InMemoryCatalog, String> {
    let path = match path {
        Some(path) => path,
        None => settings
            .catalog_path()
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "no catalog given and no [catalog] path configured".to_string())?,
    };
    InMemoryCatalog::from_file(&path)
        .map_err(|e| format!("Error loading catalog '{}': {}", path.display(), e))
}

fn cmd_compile(
    settings: &Settings,
    catalog: Option<PathBuf>,
    model: ModelId,
    sql: String,
    output: OutputFormat,
) -> ExitCode {
    let catalog = match load_catalog(settings, catalog) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let converter = QueryConverter::from_settings(Arc::new(catalog), settings);
    let statement = match converter.compile(&QueryRequest::new(model, sql)) {
        Ok(statement) => statement,
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if statement.is_empty() {
        eprintln!("Nothing to compile: model {} not found or SQL names no table", model);
        return ExitCode::FAILURE;
    }

    match output {
        OutputFormat::Sql => {
            for warning in &statement.warnings {
                eprintln!("warning: {}", warning);
            }
            println!("{}", statement.sql);
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&statement) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing statement: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }
    ExitCode::SUCCESS
}

fn cmd_correct(
    settings: &Settings,
    sql: String,
    engine: Option<String>,
    limit: Option<u64>,
) -> ExitCode {
    let engine = match engine {
        Some(name) => {
            let registry = EngineRegistry::standard().with_aliases(&settings.engines.aliases);
            match registry.lookup(&name) {
                Some(engine) => Some(engine),
                None => {
                    eprintln!("Unsupported engine type: {}", name);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => None,
    };

    let mut compiler = settings.compiler.clone();
    if let Some(limit) = limit {
        compiler.limit_ceiling = limit;
    }

    let (corrected, warnings) = CorrectorPipeline::from_settings(&compiler).correct_sql(&sql, engine);
    for warning in &warnings {
        eprintln!("warning: {}", warning);
    }
    println!("{}", corrected);
    ExitCode::SUCCESS
}

fn cmd_models(settings: &Settings, catalog: Option<PathBuf>) -> ExitCode {
    let catalog = match load_catalog(settings, catalog) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if catalog.is_empty() {
        println!("No models defined.");
        return ExitCode::SUCCESS;
    }

    println!("Models:");
    for id in catalog.model_ids() {
        let Some(schema) = catalog.schema(id) else {
            continue;
        };
        let database_type = catalog
            .database_type(id)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  - {} {} (source: \"{}\", engine: {}, {} dimensions, {} metrics)",
            id,
            schema.name,
            schema.source_table,
            database_type,
            schema.dimensions.len(),
            schema.metrics.len()
        );
    }
    ExitCode::SUCCESS
}
