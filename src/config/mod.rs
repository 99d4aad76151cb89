//! Configuration module for semql.
//!
//! Handles compiler settings, engine aliases and the catalog location.

mod settings;

pub use settings::{
    expand_env_vars, CatalogSettings, CompilerSettings, EngineSettings, Settings, SettingsError,
};
