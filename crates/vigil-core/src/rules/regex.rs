//! Regular expression rule provider
//!
//! Rules are read from a `.properties` resource of `name=pattern` entries:
//!
//! ```text
//! email=\\w+([-+.]\\w+)*@\\w+([-.]\\w+)*\\.\\w+([-.]\\w+)*
//! customerNumber=[A-Z]-[0-9]{5}
//! ```
//!
//! A rule matches when its pattern matches the whole text.

use super::{EvaluationError, RuleEvalResult, RuleProvider};
use crate::error::{Error, Result};
use crate::i18n::properties;
use crate::resource::ResourceLocator;
use ::regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: String,
    regex: Regex,
}

/// Rule provider backed by named regular expressions
#[derive(Debug, Clone)]
pub struct RegexProvider {
    name: String,
    src: String,
    rules: HashMap<String, CompiledRule>,
}

impl RegexProvider {
    /// Load the rule file `src` through `locator`
    pub fn from_src(name: &str, src: &str, locator: &dyn ResourceLocator) -> Result<Self> {
        let content = locator.read_to_string(src)?.ok_or_else(|| {
            Error::configuration(format!(
                "Rule file '{}' for provider '{}' was not found",
                src, name
            ))
        })?;
        let entries = properties::parse(src, &content)?;
        Self::from_patterns(name, src, entries)
    }

    /// Build a provider from in-memory patterns; `src` still names the rule
    /// source for message bundle lookup
    pub fn from_patterns<I, K, V>(name: &str, src: &str, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut rules = HashMap::new();
        for (rule, pattern) in patterns {
            let rule = rule.into();
            let pattern = pattern.into();
            let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
                Error::Pattern {
                    rule: format!("{}.{}", name, rule),
                    source,
                }
            })?;
            rules.insert(rule, CompiledRule { pattern, regex });
        }

        log::debug!(
            "Loaded {} regex rule(s) for provider '{}' from '{}'",
            rules.len(),
            name,
            src
        );

        Ok(Self {
            name: name.to_string(),
            src: src.to_string(),
            rules,
        })
    }

    pub fn pattern(&self, rule_name: &str) -> Option<&str> {
        self.rules.get(rule_name).map(|rule| rule.pattern.as_str())
    }

    /// Rule names, sorted
    pub fn rule_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl RuleProvider for RegexProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn src(&self) -> &str {
        &self.src
    }

    fn evaluate(&self, rule_name: &str, text: &str) -> Arc<dyn RuleEvalResult> {
        let result = match self.rules.get(rule_name) {
            Some(rule) => RegexRuleEvalResult {
                matched: rule.regex.is_match(text),
                provider_name: self.name.clone(),
                rule_name: rule_name.to_string(),
                text: text.to_string(),
                pattern: rule.pattern.clone(),
                error: None,
            },
            None => RegexRuleEvalResult {
                matched: false,
                provider_name: self.name.clone(),
                rule_name: rule_name.to_string(),
                text: text.to_string(),
                pattern: String::new(),
                error: Some(EvaluationError::new(
                    rule_name,
                    format!(
                        "Unknown rule '{}' in regex provider '{}' ({})",
                        rule_name, self.name, self.src
                    ),
                )),
            },
        };
        Arc::new(result)
    }
}

/// Outcome of a regex rule check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexRuleEvalResult {
    matched: bool,
    provider_name: String,
    rule_name: String,
    text: String,
    pattern: String,
    #[serde(skip)]
    error: Option<EvaluationError>,
}

impl RegexRuleEvalResult {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for RegexRuleEvalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RegexRuleEvalResult, matched={}, providerName={}, ruleName={}, text={}, pattern={}",
            self.matched, self.provider_name, self.rule_name, self.text, self.pattern
        )
    }
}

impl RuleEvalResult for RegexRuleEvalResult {
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

    fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
