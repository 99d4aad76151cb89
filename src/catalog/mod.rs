//! Model catalog.
//!
//! The compiler reads model schemas and their database types through the
//! [`Catalog`] trait. [`InMemoryCatalog`] hands out `Arc` snapshots, so a
//! schema replaced mid-compilation never changes what an in-flight
//! request sees.
//!
//! Catalog files list models in TOML or JSON:
//!
//! ```toml
//! [[models]]
//! id = 1
//! name = "歌曲库"
//! biz_name = "song"
//! source_table = "dw.song_lib"
//! database_type = "mysql"
//!
//! [[models.dimensions]]
//! name = "歌手名"
//! technical_name = "singer_name"
//!
//! [[models.metrics]]
//! name = "播放量"
//! technical_name = "play_count"
//! aggregation = "sum"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::{ModelId, ModelSchema};

/// Error type for catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read catalog file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML catalog: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported catalog format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("Duplicate model id: {0}")]
    DuplicateModel(ModelId),
}

/// Read-only access to model metadata.
pub trait Catalog: Send + Sync {
    /// Snapshot of a model's schema.
    fn schema(&self, model_id: ModelId) -> Option<Arc<ModelSchema>>;

    /// Database type the model's source lives in, e.g. `"mysql"`.
    fn database_type(&self, model_id: ModelId) -> Option<String>;
}

/// One model entry of a catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogModel {
    #[serde(flatten)]
    pub schema: ModelSchema,

    #[serde(default)]
    pub database_type: Option<String>,
}

/// On-disk catalog layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub models: Vec<CatalogModel>,
}

#[derive(Debug, Clone)]
struct Entry {
    schema: Arc<ModelSchema>,
    database_type: Option<String>,
}

/// Catalog held in memory.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    entries: RwLock<BTreeMap<ModelId, Entry>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog file, choosing the format by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let catalog = match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            _ => return Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
        };
        info!(path = %path.display(), models = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::from_catalog_file(file)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content)?;
        Self::from_catalog_file(file)
    }

    fn from_catalog_file(file: CatalogFile) -> Result<Self, CatalogError> {
        let catalog = Self::new();
        for model in file.models {
            let id = model.schema.id;
            if catalog.contains(id) {
                return Err(CatalogError::DuplicateModel(id));
            }
            catalog.register(model.schema, model.database_type);
        }
        Ok(catalog)
    }

    /// Add or overwrite a model.
    pub fn register(&self, schema: ModelSchema, database_type: Option<String>) {
        let entry = Entry {
            schema: Arc::new(schema),
            database_type,
        };
        let id = entry.schema.id;
        self.write().insert(id, entry);
        debug!(model = id, "registered model");
    }

    /// Swap a model's schema, keeping its database type.
    ///
    /// Snapshots already handed out are unaffected. Returns the previous
    /// schema, if the model was registered.
    pub fn replace(&self, schema: ModelSchema) -> Option<Arc<ModelSchema>> {
        let id = schema.id;
        let mut entries = self.write();
        match entries.get_mut(&id) {
            Some(entry) => Some(std::mem::replace(&mut entry.schema, Arc::new(schema))),
            None => {
                entries.insert(
                    id,
                    Entry {
                        schema: Arc::new(schema),
                        database_type: None,
                    },
                );
                None
            }
        }
    }

    pub fn remove(&self, model_id: ModelId) -> Option<Arc<ModelSchema>> {
        self.write().remove(&model_id).map(|entry| entry.schema)
    }

    pub fn contains(&self, model_id: ModelId) -> bool {
        self.read().contains_key(&model_id)
    }

    /// Registered model ids, ascending.
    pub fn model_ids(&self) -> Vec<ModelId> {
        self.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Mutations are single map operations, so a poisoned map is still consistent.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<ModelId, Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<ModelId, Entry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Catalog for InMemoryCatalog {
    fn schema(&self, model_id: ModelId) -> Option<Arc<ModelSchema>> {
        self.read().get(&model_id).map(|entry| Arc::clone(&entry.schema))
    }

    fn database_type(&self, model_id: ModelId) -> Option<String> {
        self.read()
            .get(&model_id)
            .and_then(|entry| entry.database_type.clone())
    }
}
