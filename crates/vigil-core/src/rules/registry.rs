//! Application-wide lookup of rule providers by name

use super::RuleProvider;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registered rule providers, shared by every validation step
#[derive(Debug, Default)]
pub struct RuleProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn RuleProvider>>>,
}

impl RuleProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own name, replacing any previous one
    pub fn register(&self, provider: Arc<dyn RuleProvider>) -> Option<Arc<dyn RuleProvider>> {
        let name = provider.name().to_string();
        log::debug!("Registering rule provider '{}' ({})", name, provider.src());
        self.providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, provider)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RuleProvider>> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Like [`get`](Self::get), but an unknown name is a configuration error
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn RuleProvider>> {
        self.get(name).ok_or_else(|| Error::UnknownRuleProvider {
            name: name.to_string(),
        })
    }

    /// Registered provider names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
