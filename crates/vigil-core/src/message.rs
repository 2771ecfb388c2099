//! Localized failure message resolution
//!
//! Messages are looked up by rule name in the bundle family derived from the
//! rule source (see [`bundle_base_name`](crate::i18n::bundle_base_name)).
//! Resolution order for a failure:
//!
//! 1. an evaluation error on the rule result is returned verbatim
//! 2. the bundle message for the rule, for the requested locale or its parents
//! 3. the failure's default message, `[<path>] <diagnostic>`
//!
//! A bundle message starting with [`TEMPLATE_PREFIX`] is rendered as a
//! [`Template`](crate::template::Template) over the failure's captured
//! variables plus `ruleResult` and `path`.

use crate::error::{Error, Result};
use crate::failure::FailureRecord;
use crate::i18n::{BundleLoader, Locale};
use crate::template::Template;
use std::sync::Arc;

/// Marks a bundle message as a template
pub const TEMPLATE_PREFIX: &str = "ftl:";

/// Resolves messages for the failures of one rule
#[derive(Debug, Clone)]
pub struct MessageResolver {
    rule_name: String,
    base_name: String,
    loader: Arc<BundleLoader>,
}

impl MessageResolver {
    pub fn new(rule_name: impl Into<String>, base_name: impl Into<String>, loader: Arc<BundleLoader>) -> Self {
        Self {
            rule_name: rule_name.into(),
            base_name: base_name.into(),
            loader,
        }
    }

    /// Message key within the bundle
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn resolve(&self, failure: &FailureRecord, locale: &Locale) -> Result<String> {
        if let Some(error) = failure.rule_result().evaluation_error() {
            return Ok(error.to_string());
        }

        let bundle = match self.loader.load(&self.base_name, locale)? {
            Some(bundle) => bundle,
            None => {
                log::warn!(
                    "Failed to load validation rule message bundle '{}' for locale '{}'. Using the default message.",
                    self.base_name,
                    locale
                );
                return Ok(failure.default_message());
            }
        };

        let message = match bundle.get(&self.rule_name) {
            Some(message) => message,
            None => {
                log::debug!(
                    "No message for rule '{}' in bundle '{}'",
                    self.rule_name,
                    self.base_name
                );
                return Ok(failure.default_message());
            }
        };

        match message.strip_prefix(TEMPLATE_PREFIX) {
            Some(template) => Template::parse(template)
                .and_then(|template| template.render(&failure.template_scope()))
                .map_err(|source| Error::MessageResolution {
                    rule: self.rule_name.clone(),
                    locale: locale.to_string(),
                    source,
                }),
            None => Ok(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Variables;
    use crate::resource::MemoryLocator;
    use crate::rules::{EvaluationError, RegexProvider, RuleProvider, SimpleEvalResult};
    use crate::template::TemplateError;
    use serde_json::json;

    fn loader(locator: MemoryLocator) -> Arc<BundleLoader> {
        Arc::new(BundleLoader::new(Arc::new(locator)))
    }

    fn bundles() -> MemoryLocator {
        MemoryLocator::new()
            .with(
                "rules/i18n/order.properties",
                "customer=ftl:Invalid customer number '${ruleResult.text}' at '${path}'.\n\
                 plain=Plain default message\n\
                 broken=ftl:Hello ${customer.name}\n",
            )
            .with("rules/i18n/order_de.properties", "plain=Einfache Meldung\n")
    }

    fn record(provider: &RegexProvider, rule: &str, text: &str, context: Variables) -> FailureRecord {
        FailureRecord::new(
            provider.evaluate(rule, text),
            Some("/order/header/customer/@number".to_string()),
            &context,
        )
    }

    fn provider() -> RegexProvider {
        RegexProvider::from_patterns(
            "order",
            "rules/order.properties",
            [("customer", "[A-Z]-[0-9]{5}"), ("plain", "x"), ("broken", "x"), ("other", "x")],
        )
        .unwrap()
    }

    #[test]
    fn test_template_message() {
        let resolver = MessageResolver::new("customer", "rules/i18n/order", loader(bundles()));
        let failure = record(&provider(), "customer", "123123", Variables::new());
        assert_eq!(
            resolver.resolve(&failure, &Locale::root()).unwrap(),
            "Invalid customer number '123123' at '/order/header/customer/@number'."
        );
    }

    #[test]
    fn test_plain_message_per_locale() {
        let resolver = MessageResolver::new("plain", "rules/i18n/order", loader(bundles()));
        let failure = record(&provider(), "plain", "y", Variables::new());
        assert_eq!(resolver.resolve(&failure, &Locale::new("en")).unwrap(), "Plain default message");
        assert_eq!(
            resolver.resolve(&failure, &Locale::with_country("de", "AT")).unwrap(),
            "Einfache Meldung"
        );
    }

    #[test]
    fn test_missing_key_uses_default_message() {
        let resolver = MessageResolver::new("other", "rules/i18n/order", loader(bundles()));
        let failure = record(&provider(), "other", "y", Variables::new());
        assert_eq!(
            resolver.resolve(&failure, &Locale::root()).unwrap(),
            failure.default_message()
        );
    }

    #[test]
    fn test_missing_bundle_uses_default_message() {
        let resolver = MessageResolver::new("plain", "rules/i18n/missing", loader(bundles()));
        let failure = record(&provider(), "plain", "y", Variables::new());
        assert_eq!(
            resolver.resolve(&failure, &Locale::new("en")).unwrap(),
            failure.default_message()
        );
    }

    #[test]
    fn test_evaluation_error_bypasses_bundles() {
        let resolver = MessageResolver::new("plain", "rules/i18n/order", loader(bundles()));
        let failure = FailureRecord::new(
            Arc::new(SimpleEvalResult::failed("order", "plain", EvaluationError::new("plain", "bad expression"))),
            None,
            &Variables::new(),
        );
        assert_eq!(resolver.resolve(&failure, &Locale::root()).unwrap(), "bad expression");
    }

    #[test]
    fn test_template_failure_is_surfaced() {
        let resolver = MessageResolver::new("broken", "rules/i18n/order", loader(bundles()));
        let failure = record(&provider(), "broken", "y", Variables::new());
        let err = resolver.resolve(&failure, &Locale::root()).unwrap_err();
        match err {
            Error::MessageResolution { rule, source, .. } => {
                assert_eq!(rule, "broken");
                assert!(matches!(source, TemplateError::Undefined { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_template_sees_captured_variables() {
        let resolver = MessageResolver::new("broken", "rules/i18n/order", loader(bundles()));
        let context = match json!({"customer": {"name": "Joe"}}) {
            serde_json::Value::Object(map) => crate::context::variables_from_object(map),
            _ => unreachable!(),
        };
        let failure = record(&provider(), "broken", "y", context);
        assert_eq!(resolver.resolve(&failure, &Locale::root()).unwrap(), "Hello Joe");
    }
}
