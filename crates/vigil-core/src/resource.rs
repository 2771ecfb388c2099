//! Resource lookup for rule files and message bundles
//!
//! Resources are addressed by slash-separated names such as
//! `rules/i18n/order-rules_en.properties`. A leading `/` is treated as
//! "relative to a resource root", the same way classpath-style names work.

use crate::error::Result;
use std::collections::HashMap;
use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Source of named text resources
pub trait ResourceLocator: Debug + Send + Sync {
    /// Read a resource as UTF-8 text. `Ok(None)` means the resource does not exist.
    fn read_to_string(&self, name: &str) -> Result<Option<String>>;
}

fn relative_name(name: &str) -> &str {
    name.trim_start_matches('/')
}

/// Locates resources under a list of root directories, first hit wins
#[derive(Debug, Clone, Default)]
pub struct FileSystemLocator {
    roots: Vec<PathBuf>,
}

impl FileSystemLocator {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add_root(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn read_path(path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl ResourceLocator for FileSystemLocator {
    fn read_to_string(&self, name: &str) -> Result<Option<String>> {
        let relative = relative_name(name);
        for root in &self.roots {
            let candidate = root.join(relative);
            log::trace!("Looking for resource '{}' at {}", name, candidate.display());
            if let Some(content) = Self::read_path(&candidate)? {
                return Ok(Some(content));
            }
        }

        // Absolute names that are not under any root are read as-is
        let path = Path::new(name);
        if path.is_absolute() {
            return Self::read_path(path);
        }

        Ok(None)
    }
}

/// In-memory resources, handy for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryLocator {
    resources: HashMap<String, String>,
}

impl MemoryLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, content: impl Into<String>) -> Self {
        self.insert(name, content);
        self
    }

    pub fn insert(&mut self, name: &str, content: impl Into<String>) {
        self.resources
            .insert(relative_name(name).to_string(), content.into());
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceLocator for MemoryLocator {
    fn read_to_string(&self, name: &str) -> Result<Option<String>> {
        Ok(self.resources.get(relative_name(name)).cloned())
    }
}
