//! Validation failure records
//!
//! A [`FailureRecord`] is built exactly once per rule mismatch. It keeps the
//! rule result, where in the document the failure happened, and a copy of the
//! variable bindings at that moment, so that its message can be produced
//! later (per locale, on demand) without evaluating the rule again.
//!
//! Copyright (c) 2025 Vigil Team
//! Licensed under the Apache-2.0 license

use crate::context::Variables;
use crate::error::Result;
use crate::i18n::Locale;
use crate::message::MessageResolver;
use crate::rules::RuleEvalResult;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Template variable bound to the rule evaluation result
pub const RULE_RESULT_VAR: &str = "ruleResult";
/// Template variable bound to the failing fragment path
pub const PATH_VAR: &str = "path";

/// Placeholder for the fragment path of failures recorded outside a fragment
const UNKNOWN_PATH: &str = "unknown";

/// One validation failure
#[derive(Debug)]
pub struct FailureRecord {
    fragment_path: Option<String>,
    rule_result: Arc<dyn RuleEvalResult>,
    context: Variables,
    recorded_at: DateTime<Utc>,
    messages: Option<Arc<MessageResolver>>,
    resolved: Mutex<HashMap<Locale, String>>,
    unresolved: Mutex<HashSet<Locale>>,
}

impl FailureRecord {
    /// Create a record, copying `context` so later changes to the caller's
    /// bindings do not leak into this record's messages
    ///
    /// Bound values are shared with the caller, not copied.
    pub fn new(
        rule_result: Arc<dyn RuleEvalResult>,
        fragment_path: Option<String>,
        context: &Variables,
    ) -> Self {
        Self {
            fragment_path,
            rule_result,
            context: context.clone(),
            recorded_at: Utc::now(),
            messages: None,
            resolved: Mutex::new(HashMap::new()),
            unresolved: Mutex::new(HashSet::new()),
        }
    }

    /// Attach the resolver used for localized messages
    pub fn with_message_resolver(mut self, resolver: Arc<MessageResolver>) -> Self {
        self.messages = Some(resolver);
        self
    }

    pub fn fragment_path(&self) -> Option<&str> {
        self.fragment_path.as_deref()
    }

    pub fn rule_result(&self) -> &Arc<dyn RuleEvalResult> {
        &self.rule_result
    }

    /// Variable bindings captured when the failure was recorded
    pub fn context(&self) -> &Variables {
        &self.context
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// `[<fragment path>] <rule diagnostic>`
    pub fn default_message(&self) -> String {
        self.to_string()
    }

    /// Variables visible to message templates: the captured bindings plus
    /// `ruleResult` and `path`
    pub fn template_scope(&self) -> Variables {
        let mut scope = self.context.clone();
        scope.insert(RULE_RESULT_VAR.to_string(), Arc::new(self.rule_result.to_value()));
        scope.insert(
            PATH_VAR.to_string(),
            Arc::new(
                self.fragment_path
                    .as_ref()
                    .map_or(Value::Null, |path| Value::String(path.clone())),
            ),
        );
        scope
    }

    /// The failure message for `locale`
    ///
    /// Successful resolutions are memoized per locale; errors are returned to
    /// the caller each time and never cached.
    pub fn message(&self, locale: &Locale) -> Result<String> {
        if let Some(message) = self.cache().get(locale) {
            return Ok(message.clone());
        }

        let message = match &self.messages {
            Some(resolver) => resolver.resolve(self, locale)?,
            None => match self.rule_result.evaluation_error() {
                Some(error) => error.to_string(),
                None => self.default_message(),
            },
        };

        self.cache().insert(locale.clone(), message.clone());
        Ok(message)
    }

    /// Message for `locale`, falling back to the default message when
    /// resolution fails
    ///
    /// The resolution error is logged on the first fallback per locale.
    pub fn display_message(&self, locale: &Locale) -> String {
        self.message(locale).unwrap_or_else(|e| {
            if self.first_fallback(locale) {
                log::debug!("{}", e);
            }
            self.default_message()
        })
    }

    fn first_fallback(&self, locale: &Locale) -> bool {
        self.unresolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(locale.clone())
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HashMap<Locale, String>> {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.fragment_path.as_deref().unwrap_or(UNKNOWN_PATH),
            self.rule_result
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{EvaluationError, SimpleEvalResult};
    use serde_json::json;

    fn vars(value: Value) -> Variables {
        match value {
            Value::Object(map) => crate::context::variables_from_object(map),
            _ => Variables::new(),
        }
    }

    #[test]
    fn test_default_message() {
        let record = FailureRecord::new(
            Arc::new(SimpleEvalResult::mismatch("p", "r", "diag")),
            Some("/order/header".to_string()),
            &Variables::new(),
        );
        assert_eq!(record.default_message(), "[/order/header] diag");
        assert_eq!(record.message(&Locale::root()).unwrap(), "[/order/header] diag");
    }

    #[test]
    fn test_unknown_path() {
        let record = FailureRecord::new(
            Arc::new(SimpleEvalResult::mismatch("p", "r", "diag")),
            None,
            &Variables::new(),
        );
        assert_eq!(record.to_string(), "[unknown] diag");
        assert!(record.fragment_path().is_none());
        assert_eq!(*record.template_scope()[PATH_VAR], Value::Null);
    }

    #[test]
    fn test_context_is_a_snapshot() {
        let mut bindings = vars(json!({"order": {"id": 1}}));
        let record = FailureRecord::new(
            Arc::new(SimpleEvalResult::mismatch("p", "r", "diag")),
            Some("/a".to_string()),
            &bindings,
        );

        bindings.insert("order".to_string(), Arc::new(json!({"id": 2})));
        bindings.insert("extra".to_string(), Arc::new(json!(true)));

        assert_eq!(record.context()["order"]["id"], 1);
        assert!(!record.context().contains_key("extra"));
    }

    #[test]
    fn test_snapshot_shares_bound_values() {
        let order = Arc::new(json!({"items": [{"product": "222"}, {"product": "333"}]}));
        let mut bindings = Variables::new();
        bindings.insert("order".to_string(), Arc::clone(&order));

        let record = FailureRecord::new(
            Arc::new(SimpleEvalResult::mismatch("p", "r", "diag")),
            Some("/order/items/0/product".to_string()),
            &bindings,
        );
        assert!(Arc::ptr_eq(&record.context()["order"], &order));
        assert!(Arc::ptr_eq(&record.template_scope()["order"], &order));

        bindings.insert("order".to_string(), Arc::new(json!(null)));
        assert!(Arc::ptr_eq(&record.context()["order"], &order));
        assert_eq!(Arc::strong_count(&order), 2);
    }

    #[test]
    fn test_fallback_error_noted_once_per_locale() {
        let record = FailureRecord::new(
            Arc::new(SimpleEvalResult::mismatch("p", "r", "diag")),
            None,
            &Variables::new(),
        );
        assert!(record.first_fallback(&Locale::new("de")));
        assert!(!record.first_fallback(&Locale::new("de")));
        assert!(record.first_fallback(&Locale::new("fr")));
    }

    #[test]
    fn test_template_scope() {
        let record = FailureRecord::new(
            Arc::new(SimpleEvalResult::mismatch("p", "r", "diag")),
            Some("/a".to_string()),
            &vars(json!({"customer": "Joe"})),
        );
        let scope = record.template_scope();
        assert_eq!(*scope["customer"], "Joe");
        assert_eq!(*scope[PATH_VAR], "/a");
        assert_eq!(scope[RULE_RESULT_VAR]["ruleName"], "r");
        assert!(!record.context().contains_key(RULE_RESULT_VAR));
    }

    #[test]
    fn test_evaluation_error_message_without_resolver() {
        let record = FailureRecord::new(
            Arc::new(SimpleEvalResult::failed(
                "p",
                "r",
                EvaluationError::new("r", "Unknown rule 'r'"),
            )),
            Some("/a".to_string()),
            &Variables::new(),
        );
        assert_eq!(record.message(&Locale::new("en")).unwrap(), "Unknown rule 'r'");
    }
}
