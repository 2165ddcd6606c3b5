//! Persisted user functions: a name -> script source map.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::StoreError;

/// Source of user-authored functions. The registry only reads it, apart
/// from asking it to reload.
pub trait FunctionStore: Send {
    /// Reload from the backing storage.
    fn refresh(&mut self) -> Result<(), StoreError>;

    /// Current `(name, source)` pairs, in storage order.
    fn entries(&self) -> Vec<(String, String)>;
}

/// Store backed by a JSON object file mapping names to sources.
///
/// A missing file is an empty store, so a fresh installation needs no setup.
#[derive(Debug, Clone)]
pub struct JsonFunctionStore {
    path: PathBuf,
    functions: IndexMap<String, String>,
}

impl JsonFunctionStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let mut store = Self {
            path: path.into(),
            functions: IndexMap::new(),
        };
        store.refresh()?;
        Ok(store)
    }

    fn load(path: &Path) -> Result<IndexMap<String, String>, StoreError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(IndexMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if text.trim().is_empty() {
            return Ok(IndexMap::new());
        }
        serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl FunctionStore for JsonFunctionStore {
    fn refresh(&mut self) -> Result<(), StoreError> {
        self.functions = Self::load(&self.path)?;
        Ok(())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.functions
            .iter()
            .map(|(name, source)| (name.clone(), source.clone()))
            .collect()
    }
}

/// In-memory store, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryFunctionStore {
    functions: IndexMap<String, String>,
}

impl MemoryFunctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(mut self, name: &str, source: &str) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: &str, source: &str) {
        self.functions.insert(name.to_string(), source.to_string());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.functions.shift_remove(name)
    }
}

impl FunctionStore for MemoryFunctionStore {
    fn refresh(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.functions
            .iter()
            .map(|(name, source)| (name.clone(), source.clone()))
            .collect()
    }
}
