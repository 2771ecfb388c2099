//! Pass-wide execution context
//!
//! One [`ExecutionContext`] exists per document pass. It carries the
//! configuration parameters the validation steps read, the mutable variable
//! scope the traversal maintains, and the result objects of the pass (most
//! importantly the [`ResultAggregator`](crate::ResultAggregator)), keyed by
//! their type.
//!
//! Copyright (c) 2025 Vigil Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Parameter holding the maximum number of failures tolerated per pass
pub const MAX_FAILS: &str = "validation.maxFails";

/// Variable bindings visible to rules and message templates
///
/// Values are shared, so copying the bindings copies only the map.
pub type Variables = BTreeMap<String, Arc<Value>>;

/// Bind each member of a JSON object
pub fn variables_from_object(object: Map<String, Value>) -> Variables {
    object
        .into_iter()
        .map(|(name, value)| (name, Arc::new(value)))
        .collect()
}

/// State shared by every validation step invoked during one pass
#[derive(Default)]
pub struct ExecutionContext {
    params: HashMap<String, String>,
    variables: Variables,
    results: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style parameter setter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_param(name, value);
        self
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    /// Get a configuration parameter by name
    pub fn config_param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The `validation.maxFails` parameter, unlimited when absent
    ///
    /// A negative value is accepted; every failure exceeds it.
    pub fn max_fails(&self) -> Result<i64> {
        let Some(raw) = self.config_param(MAX_FAILS) else {
            return Ok(i64::MAX);
        };
        let raw = raw.trim();
        raw.parse::<i64>().map_err(|e| Error::Configuration {
            message: format!(
                "Invalid config value '{}' for global parameter '{}'. Must be an integer.",
                raw, MAX_FAILS
            ),
            source: Some(e.into()),
        })
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }

    /// Bind a variable, returning the previous value if there was one
    pub fn set_variable(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Arc<Value>>,
    ) -> Option<Arc<Value>> {
        self.variables.insert(name.into(), value.into())
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Arc<Value>> {
        self.variables.remove(name)
    }

    /// Attach a result object to the pass, replacing any of the same type
    pub fn set_result<T: Any + Send>(&mut self, result: T) {
        self.results.insert(TypeId::of::<T>(), Box::new(result));
    }

    pub fn result<T: Any + Send>(&self) -> Option<&T> {
        self.results
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    pub fn result_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
        self.results
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<T>())
    }

    /// Get the result of type `T`, creating and storing a default one if the
    /// caller did not supply it
    pub fn result_or_default<T: Any + Send + Default>(&mut self) -> &mut T {
        let entry = self
            .results
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()));
        match entry.downcast_mut::<T>() {
            Some(result) => result,
            None => unreachable!("result slot holds a value of the keyed type"),
        }
    }

    /// Detach a result object from the pass
    pub fn take_result<T: Any + Send>(&mut self) -> Option<T> {
        self.results
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("params", &self.params)
            .field("variables", &self.variables)
            .field("results", &self.results.len())
            .finish()
    }
}
