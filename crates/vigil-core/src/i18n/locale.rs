//! Locale identifiers and fallback candidates

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A language/country/variant triple such as `en_IE` or `de_DE_POSIX`.
///
/// The root locale (all parts empty) selects the default bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locale {
    language: String,
    country: String,
    variant: String,
}

impl Locale {
    /// The root locale
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_country(language: &str, country: &str) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            country: country.to_ascii_uppercase(),
            variant: String::new(),
        }
    }

    pub fn with_variant(mut self, variant: &str) -> Self {
        self.variant = variant.to_string();
        self
    }

    /// Parse `en`, `en_IE`, `en-IE` or `de_DE_POSIX`
    pub fn parse(tag: &str) -> Result<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(Self::root());
        }

        let mut parts = tag.splitn(3, ['_', '-']);
        let language = parts.next().unwrap_or_default();
        let country = parts.next().unwrap_or_default();
        let variant = parts.next().unwrap_or_default();

        let valid = |s: &str| s.chars().all(|c| c.is_ascii_alphanumeric());
        if language.is_empty() && !country.is_empty() {
            return Err(invalid(tag, "missing language"));
        }
        if !valid(language) || !valid(country) {
            return Err(invalid(tag, "language and country must be alphanumeric"));
        }
        if !variant.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(invalid(tag, "variant contains unsupported characters"));
        }

        Ok(Self {
            language: language.to_ascii_lowercase(),
            country: country.to_ascii_uppercase(),
            variant: variant.to_string(),
        })
    }

    /// Default locale from the POSIX environment (`LC_ALL`, `LC_MESSAGES`, `LANG`)
    pub fn from_env() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .map(|value| Self::from_posix(&value))
            .unwrap_or_default()
    }

    /// Interpret a POSIX locale string such as `en_US.UTF-8` or `de_DE@euro`
    pub fn from_posix(value: &str) -> Self {
        let base = value
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .trim();
        if base.eq_ignore_ascii_case("C") || base.eq_ignore_ascii_case("POSIX") {
            return Self::root();
        }
        Self::parse(base).unwrap_or_default()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    pub fn is_root(&self) -> bool {
        self.language.is_empty() && self.country.is_empty() && self.variant.is_empty()
    }

    /// Bundle lookup order, most specific first, ending with the root locale
    pub fn candidates(&self) -> Vec<Locale> {
        let mut candidates = Vec::with_capacity(4);
        if !self.variant.is_empty() {
            candidates.push(self.clone());
        }
        if !self.country.is_empty() {
            candidates.push(Self::with_country(&self.language, &self.country));
        }
        if !self.language.is_empty() {
            candidates.push(Self::new(&self.language));
        }
        candidates.push(Self::root());
        candidates
    }

    /// Suffix appended to a bundle base name, e.g. `_en_IE`; empty for root
    pub fn bundle_suffix(&self) -> String {
        if self.is_root() {
            String::new()
        } else {
            format!("_{}", self)
        }
    }
}

fn invalid(tag: &str, reason: &str) -> Error {
    Error::configuration(format!("Invalid locale '{}': {}", tag, reason))
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        if !self.country.is_empty() || !self.variant.is_empty() {
            write!(f, "_{}", self.country)?;
        }
        if !self.variant.is_empty() {
            write!(f, "_{}", self.variant)?;
        }
        Ok(())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
