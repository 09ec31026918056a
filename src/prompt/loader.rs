//! Prompt Loader - Load and cache prompt templates
//!
//! Templates come from an optional directory of `<name>.md` files and fall
//! back to the built-in set. Loaded templates are cached in memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::debug;

use super::templates;
use crate::error::{AutodocError, Result};

/// Loads and caches prompt templates
pub struct PromptLoader {
    /// Directory containing override templates
    templates_dir: Option<PathBuf>,
    /// In-memory cache of loaded templates
    cache: RwLock<HashMap<String, String>>,
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptLoader {
    /// Create a loader that reads `<name>.md` from the given directory
    pub fn new(templates_dir: impl AsRef<Path>) -> Self {
        Self {
            templates_dir: Some(templates_dir.as_ref().to_path_buf()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a loader that only serves the built-in templates
    pub fn builtin() -> Self {
        Self {
            templates_dir: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Load a template by name (without .md extension)
    pub fn load(&self, name: &str) -> Result<String> {
        {
            let cache = self
                .cache
                .read()
                .map_err(|e| AutodocError::Template(format!("Failed to acquire read lock: {}", e)))?;
            if let Some(content) = cache.get(name) {
                return Ok(content.clone());
            }
        }

        let content = match self.template_path(name).filter(|p| p.exists()) {
            Some(path) => {
                debug!("Loading template '{}' from {}", name, path.display());
                std::fs::read_to_string(&path).map_err(|e| {
                    AutodocError::Template(format!("Failed to load template '{}' from {:?}: {}", name, path, e))
                })?
            }
            None => templates::builtin(name)
                .map(str::to_string)
                .ok_or_else(|| AutodocError::Template(format!("Unknown template '{}'", name)))?,
        };

        {
            let mut cache = self
                .cache
                .write()
                .map_err(|e| AutodocError::Template(format!("Failed to acquire write lock: {}", e)))?;
            cache.insert(name.to_string(), content.clone());
        }

        Ok(content)
    }

    /// Get a cached template without loading it
    pub fn get(&self, name: &str) -> Option<String> {
        let cache = self.cache.read().ok()?;
        cache.get(name).cloned()
    }

    /// Full path for a template in the override directory
    fn template_path(&self, name: &str) -> Option<PathBuf> {
        self.templates_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.md", name)))
    }

    /// Get the override directory, if any
    pub fn templates_dir(&self) -> Option<&Path> {
        self.templates_dir.as_deref()
    }
}
