//! Vigil Core - severity-classified rule validation
//!
//! This crate checks fragments of a document against named rules and
//! collects the failures of each document pass, classified by severity, with
//! localized and optionally templated failure messages.
//!
//! # Main Components
//!
//! - **Rules**: [`RuleProvider`] implementations looked up by name from a
//!   [`RuleProviderRegistry`]; a regex provider is included
//! - **Validation Steps**: [`ValidationStep`] applies one rule at one
//!   [`Severity`] and escalates FATAL failures or an exceeded threshold
//! - **Aggregation**: [`ResultAggregator`] holds the failures of one pass
//! - **Messages**: [`MessageResolver`] turns a [`FailureRecord`] into a
//!   localized string using `.properties` bundles and `ftl:` templates
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vigil_core::{
//!     BundleLoader, ExecutionContext, MemoryLocator, RegexProvider, ResultAggregator,
//!     RuleProviderRegistry, Severity, ValidationStep,
//! };
//!
//! fn example() -> vigil_core::Result<()> {
//!     let registry = Arc::new(RuleProviderRegistry::new());
//!     registry.register(Arc::new(RegexProvider::from_patterns(
//!         "addressing",
//!         "rules/addressing.properties",
//!         [("zip", "[0-9]{5}")],
//!     )?));
//!     let bundles = Arc::new(BundleLoader::new(Arc::new(MemoryLocator::new())));
//!
//!     let step = ValidationStep::new("addressing.zip", Severity::Warn, registry, bundles)?;
//!     let mut ctx = ExecutionContext::new();
//!     step.evaluate("ABC", Some("/address/zip"), &mut ctx)?;
//!
//!     let results = ctx.result::<ResultAggregator>().map(|r| r.warnings().len());
//!     assert_eq!(results, Some(1));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod aggregator;
pub mod context;
pub mod error;
pub mod failure;
pub mod i18n;
pub mod message;
pub mod report;
pub mod resource;
pub mod rules;
pub mod severity;
pub mod step;
pub mod template;

// Re-export main types for convenience
pub use aggregator::{Flow, ResultAggregator};
pub use context::{variables_from_object, ExecutionContext, Variables, MAX_FAILS};
pub use error::{AbortCause, Error, Result, ValidationAbort};
pub use failure::FailureRecord;
pub use i18n::{bundle_base_name, BundleLoader, Locale, MessageBundle};
pub use message::{MessageResolver, TEMPLATE_PREFIX};
pub use report::{ReportEntry, Termination, ValidationReport};
pub use resource::{FileSystemLocator, MemoryLocator, ResourceLocator};
pub use rules::{
    EvaluationError, RegexProvider, RegexRuleEvalResult, RuleEvalResult, RuleName, RuleProvider,
    RuleProviderRegistry, SimpleEvalResult,
};
pub use severity::{Disposition, Severity, SoftSeverity};
pub use step::ValidationStep;
pub use template::{Template, TemplateError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
