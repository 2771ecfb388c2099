//! Validation steps
//!
//! A [`ValidationStep`] applies one rule, at one configured severity, to each
//! fragment its caller selects. On first use it resolves its rule provider
//! and message bundle exactly once, even when the step is shared between
//! threads processing different documents.
//!
//! Copyright (c) 2025 Vigil Team
//! Licensed under the Apache-2.0 license

use crate::aggregator::{Flow, ResultAggregator};
use crate::context::ExecutionContext;
use crate::error::{Result, ValidationAbort};
use crate::failure::FailureRecord;
use crate::i18n::{bundle_base_name, BundleLoader};
use crate::message::MessageResolver;
use crate::rules::{RuleName, RuleProvider, RuleProviderRegistry};
use crate::severity::Severity;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// State resolved on first use
#[derive(Debug)]
struct Resolved {
    provider: Arc<dyn RuleProvider>,
    messages: Arc<MessageResolver>,
}

/// One rule check with its failure severity
#[derive(Debug)]
pub struct ValidationStep {
    rule: RuleName,
    on_fail: Severity,
    registry: Arc<RuleProviderRegistry>,
    bundles: Arc<BundleLoader>,
    resolved: OnceCell<Resolved>,
}

impl ValidationStep {
    /// Create a step for `composite_rule` (`"<provider>.<rule>"`)
    ///
    /// The provider is not looked up until the step is first used.
    pub fn new(
        composite_rule: &str,
        on_fail: Severity,
        registry: Arc<RuleProviderRegistry>,
        bundles: Arc<BundleLoader>,
    ) -> Result<Self> {
        Ok(Self {
            rule: RuleName::parse(composite_rule)?,
            on_fail,
            registry,
            bundles,
            resolved: OnceCell::new(),
        })
    }

    pub fn rule(&self) -> &RuleName {
        &self.rule
    }

    pub fn composite_rule_name(&self) -> &str {
        self.rule.composite()
    }

    pub fn on_fail(&self) -> Severity {
        self.on_fail
    }

    pub fn is_initialized(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Bundle base name used for this step's messages, once initialized
    pub fn message_bundle_base_name(&self) -> Option<&str> {
        self.resolved.get().map(|resolved| resolved.messages.base_name())
    }

    /// Resolve the rule provider and message bundle name
    ///
    /// Runs at most once per step; concurrent callers block until the first
    /// resolution completes and then share its outcome. A failed resolution
    /// is not stored, so the next call tries again.
    pub fn initialize(&self) -> Result<()> {
        self.resolve().map(|_| ())
    }

    fn resolve(&self) -> Result<&Resolved> {
        self.resolved.get_or_try_init(|| {
            let provider = self.registry.lookup(self.rule.provider())?;
            let base_name = bundle_base_name(provider.src());
            log::debug!(
                "Resolved rule provider '{}' for '{}', message bundle '{}'",
                provider.name(),
                self.rule,
                base_name
            );

            let messages = Arc::new(MessageResolver::new(
                self.rule.rule(),
                base_name,
                Arc::clone(&self.bundles),
            ));
            Ok(Resolved { provider, messages })
        })
    }

    /// Check `text` without a fragment path
    pub fn validate(&self, text: &str, ctx: &mut ExecutionContext) -> Result<Option<Arc<FailureRecord>>> {
        self.evaluate(text, None, ctx)
    }

    /// Check `text` found at `fragment_path`
    ///
    /// Returns `Ok(None)` when the rule matches and `Ok(Some(failure))` for a
    /// recorded failure that lets the pass continue. A FATAL failure, or a
    /// failure that takes the pass over `validation.maxFails`, is returned
    /// as [`Error::Validation`](crate::Error::Validation) and must end the pass.
    pub fn evaluate(
        &self,
        text: &str,
        fragment_path: Option<&str>,
        ctx: &mut ExecutionContext,
    ) -> Result<Option<Arc<FailureRecord>>> {
        let resolved = self.resolve()?;
        let max_fails = ctx.max_fails()?;

        let result = resolved.provider.evaluate(self.rule.rule(), text);
        log::debug!("{}", result);
        if result.matched() {
            return Ok(None);
        }

        let failure = Arc::new(
            FailureRecord::new(result, fragment_path.map(str::to_string), ctx.variables())
                .with_message_resolver(Arc::clone(&resolved.messages)),
        );

        let aggregator = ctx.result_or_default::<ResultAggregator>();
        match aggregator.record(Arc::clone(&failure), self.on_fail)? {
            Flow::Stop => Err(ValidationAbort::fatal(failure).into()),
            Flow::Continue if exceeds(aggregator.total_failures(), max_fails) => {
                Err(ValidationAbort::threshold_exceeded(max_fails, failure).into())
            }
            Flow::Continue => Ok(Some(failure)),
        }
    }
}

impl fmt::Display for ValidationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidationStep [rule={}, onFail={}]", self.rule, self.on_fail)
    }
}

fn exceeds(total: usize, max_fails: i64) -> bool {
    i64::try_from(total).map_or(true, |total| total > max_fails)
}
