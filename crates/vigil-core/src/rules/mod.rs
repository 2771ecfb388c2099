//! Rule providers and their evaluation results
//!
//! A rule is addressed by a composite name `"<provider>.<rule>"`. The
//! provider part selects a [`RuleProvider`] from a [`RuleProviderRegistry`];
//! the rule part is handed to that provider together with the text to check.
//! Providers answer with an opaque [`RuleEvalResult`] that the validation
//! core stores but never mutates.

pub mod regex;
pub mod registry;

pub use self::regex::{RegexProvider, RegexRuleEvalResult};
pub use registry::RuleProviderRegistry;

use crate::error::{Error, Result};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A rule that could not be evaluated, e.g. an unknown rule or a broken
/// expression. Its message is shown to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EvaluationError {
    pub rule: String,
    pub message: String,
}

impl EvaluationError {
    pub fn new(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Evidence of one rule check
///
/// `Display` is the provider's diagnostic string, used in default failure
/// messages. [`to_value`](RuleEvalResult::to_value) exposes the same evidence
/// to message templates as `ruleResult`.
pub trait RuleEvalResult: fmt::Display + fmt::Debug + Send + Sync {
    fn matched(&self) -> bool;

    fn rule_name(&self) -> &str;

    fn provider_name(&self) -> &str;

    fn evaluation_error(&self) -> Option<&EvaluationError> {
        None
    }

    /// Structured view for templates, with camelCase field names
    fn to_value(&self) -> Value {
        json!({
            "matched": self.matched(),
            "ruleName": self.rule_name(),
            "providerName": self.provider_name(),
        })
    }
}

/// A named source of rules
pub trait RuleProvider: fmt::Debug + Send + Sync {
    /// Name the provider is registered under
    fn name(&self) -> &str;

    /// Identifier of the rule source, e.g. the rule file path. Message bundle
    /// names are derived from it.
    fn src(&self) -> &str;

    fn evaluate(&self, rule_name: &str, text: &str) -> Arc<dyn RuleEvalResult>;
}

/// A composite rule name split into provider and rule parts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleName {
    composite: String,
    split: usize,
}

impl RuleName {
    pub fn parse(composite: &str) -> Result<Self> {
        let composite = composite.trim();
        let split = composite.find('.').ok_or_else(|| Error::InvalidRuleName {
            name: composite.to_string(),
            message: "expected '<provider>.<rule>'".to_string(),
        })?;

        if split == 0 || split + 1 == composite.len() {
            return Err(Error::InvalidRuleName {
                name: composite.to_string(),
                message: "provider and rule names must not be empty".to_string(),
            });
        }

        Ok(Self {
            composite: composite.to_string(),
            split,
        })
    }

    pub fn composite(&self) -> &str {
        &self.composite
    }

    pub fn provider(&self) -> &str {
        &self.composite[..self.split]
    }

    pub fn rule(&self) -> &str {
        &self.composite[self.split + 1..]
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.composite)
    }
}

impl std::str::FromStr for RuleName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// General purpose [`RuleEvalResult`] for providers without their own
/// evidence type
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleEvalResult {
    matched: bool,
    provider_name: String,
    rule_name: String,
    diagnostic: String,
    error: Option<EvaluationError>,
}

impl SimpleEvalResult {
    pub fn matched(provider: &str, rule: &str) -> Self {
        Self {
            matched: true,
            provider_name: provider.to_string(),
            rule_name: rule.to_string(),
            diagnostic: format!("{}.{} matched", provider, rule),
            error: None,
        }
    }

    pub fn mismatch(provider: &str, rule: &str, diagnostic: impl Into<String>) -> Self {
        Self {
            matched: false,
            provider_name: provider.to_string(),
            rule_name: rule.to_string(),
            diagnostic: diagnostic.into(),
            error: None,
        }
    }

    /// A rule that could not be evaluated; counts as a mismatch
    pub fn failed(provider: &str, rule: &str, error: EvaluationError) -> Self {
        Self {
            matched: false,
            provider_name: provider.to_string(),
            rule_name: rule.to_string(),
            diagnostic: error.to_string(),
            error: Some(error),
        }
    }
}

impl fmt::Display for SimpleEvalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.diagnostic)
    }
}

impl RuleEvalResult for SimpleEvalResult {
    fn matched(&self) -> bool {
        self.matched
    }

    fn rule_name(&self) -> &str {
        &self.rule_name
    }

    fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn evaluation_error(&self) -> Option<&EvaluationError> {
        self.error.as_ref()
    }
}
