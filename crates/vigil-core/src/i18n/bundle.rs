//! Localized message bundles
//!
//! A bundle family shares a base name, e.g. `rules/i18n/order-rules`, and is
//! stored as one `.properties` resource per locale:
//! `order-rules.properties`, `order-rules_en.properties`,
//! `order-rules_en_IE.properties`, ... Lookup walks from the most specific
//! loaded bundle to its parents, so a key missing from `_en_IE` is still
//! found in `_en` or the default bundle.

use super::locale::Locale;
use super::properties;
use crate::error::Result;
use crate::resource::ResourceLocator;
use std::collections::HashMap;
use std::sync::Arc;

/// File extension of bundle resources
pub const BUNDLE_EXTENSION: &str = ".properties";

/// Derive the message bundle base name for a rule source.
///
/// `a/b/rules.xml` becomes `a/b/i18n/rules`; a source without a directory
/// becomes `i18n/<stem>`. Windows separators are normalized to `/`.
pub fn bundle_base_name(rule_source: &str) -> String {
    let normalized = rule_source.replace('\\', "/");
    let (parent, file_name) = match normalized.rfind('/') {
        Some(0) => (Some("/"), &normalized[1..]),
        Some(idx) => (Some(&normalized[..idx]), &normalized[idx + 1..]),
        None => (None, normalized.as_str()),
    };
    let stem = match file_name.rfind('.') {
        Some(idx) => &file_name[..idx],
        None => file_name,
    };

    match parent {
        Some(parent) => format!("{}/i18n/{}", parent, stem),
        None => format!("i18n/{}", stem),
    }
}

/// One loaded bundle file
#[derive(Debug, Clone)]
struct BundleLevel {
    locale: Locale,
    messages: HashMap<String, String>,
}

/// A resolved bundle chain for one requested locale
#[derive(Debug, Clone)]
pub struct MessageBundle {
    base_name: String,
    levels: Vec<BundleLevel>,
}

impl MessageBundle {
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Locale of the most specific bundle that was found
    pub fn locale(&self) -> &Locale {
        &self.levels[0].locale
    }

    /// Look up a message, falling back through parent bundles
    pub fn get(&self, key: &str) -> Option<&str> {
        self.levels
            .iter()
            .find_map(|level| level.messages.get(key))
            .map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Loads bundle chains through a [`ResourceLocator`]
#[derive(Debug, Clone)]
pub struct BundleLoader {
    locator: Arc<dyn ResourceLocator>,
}

impl BundleLoader {
    pub fn new(locator: Arc<dyn ResourceLocator>) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &Arc<dyn ResourceLocator> {
        &self.locator
    }

    /// Load the bundle chain for `locale`.
    ///
    /// Returns `Ok(None)` when no bundle of the family exists for any
    /// candidate locale. A bundle that exists but cannot be parsed is an error.
    pub fn load(&self, base_name: &str, locale: &Locale) -> Result<Option<MessageBundle>> {
        let mut levels = Vec::new();

        for candidate in locale.candidates() {
            let resource = format!("{}{}{}", base_name, candidate.bundle_suffix(), BUNDLE_EXTENSION);
            log::trace!("Trying message bundle '{}'", resource);

            if let Some(content) = self.locator.read_to_string(&resource)? {
                let messages = properties::parse(&resource, &content)?
                    .into_iter()
                    .collect::<HashMap<_, _>>();
                levels.push(BundleLevel {
                    locale: candidate,
                    messages,
                });
            }
        }

        if levels.is_empty() {
            return Ok(None);
        }

        Ok(Some(MessageBundle {
            base_name: base_name.to_string(),
            levels,
        }))
    }
}
