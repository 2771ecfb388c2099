//! Check command handler
//!
//! Runs one validation pass per document. Every scalar fragment is offered,
//! in document order, to each validator whose selector matches it. The pass
//! ends early when a step reports a FATAL failure or the failure threshold
//! is exceeded; the partial report is still produced.

use crate::cli::{CheckArgs, OutputFormat};
use crate::config::{ProviderKind, Ruleset};
use crate::document::{flatten, load_document, Selector};
use crate::error::{Error, Result};
use crate::logging::{generate_id, timing::Timer};
use crate::output::{DocumentReport, OutputWriter};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vigil_core::{
    BundleLoader, ExecutionContext, FileSystemLocator, Locale, RegexProvider, ResourceLocator,
    ResultAggregator, RuleProviderRegistry, Severity, ValidationReport, ValidationStep, MAX_FAILS,
};

/// Variable bound to the object or array holding the current fragment
pub const FRAGMENT_VAR: &str = "fragment";

/// A rule applied to every fragment its selector matches
struct Validator {
    selector: Selector,
    step: ValidationStep,
}

/// Validators and pass settings built from a rule set
pub struct Checker {
    validators: Vec<Validator>,
    params: Vec<(String, String)>,
    locale: Locale,
}

impl Checker {
    /// Build the providers and validation steps of `ruleset`
    ///
    /// All steps are initialized up front, so an unknown provider or a bad
    /// `validation.maxFails` is reported before any document is read.
    pub fn new(
        ruleset: &Ruleset,
        locator: Arc<dyn ResourceLocator>,
        max_fails: Option<usize>,
        locale: Locale,
    ) -> Result<Self> {
        ruleset.validate()?;

        let registry = Arc::new(build_registry(ruleset, locator.as_ref())?);
        let bundles = Arc::new(BundleLoader::new(locator));

        let validators = ruleset
            .validators
            .iter()
            .map(|config| {
                let step = ValidationStep::new(
                    &config.rule,
                    config.on_fail,
                    Arc::clone(&registry),
                    Arc::clone(&bundles),
                )?;
                step.initialize()?;
                let validator = Validator {
                    selector: Selector::parse(&config.select)?,
                    step,
                };
                tracing::debug!(
                    select = validator.selector.source(),
                    step = %validator.step,
                    "Validator ready"
                );
                Ok(validator)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut params: Vec<(String, String)> = ruleset
            .param_strings()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        if let Some(max_fails) = max_fails {
            params.push((MAX_FAILS.to_string(), max_fails.to_string()));
        }

        let checker = Self {
            validators,
            params,
            locale,
        };
        checker.pass_context().max_fails()?;
        Ok(checker)
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    fn pass_context(&self) -> ExecutionContext {
        let mut ctx = ExecutionContext::new();
        for (name, value) in &self.params {
            ctx.set_param(name.as_str(), value.as_str());
        }
        ctx
    }

    /// Run one pass over `document`
    pub fn check(&self, document: &Value) -> Result<ValidationReport> {
        let mut ctx = self.pass_context();
        if let Value::Object(members) = document {
            for (name, value) in members {
                ctx.set_variable(name.as_str(), value.clone());
            }
        }

        let mut abort = None;
        'pass: for fragment in flatten(document) {
            let mut bound = false;
            for validator in &self.validators {
                if !validator.selector.matches(&fragment) {
                    continue;
                }
                if !bound {
                    ctx.set_variable(FRAGMENT_VAR, Arc::clone(fragment.parent()));
                    bound = true;
                }

                match validator
                    .step
                    .evaluate(fragment.text(), Some(fragment.path()), &mut ctx)
                {
                    Ok(_) => {}
                    Err(vigil_core::Error::Validation(terminated)) => {
                        tracing::warn!(path = fragment.path(), "{}", terminated);
                        abort = Some(terminated);
                        break 'pass;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        let aggregator = ctx.take_result::<ResultAggregator>().unwrap_or_default();
        tracing::info!("{}", aggregator.summary(&self.locale));

        let report = ValidationReport::new(&aggregator, &self.locale);
        Ok(match &abort {
            Some(terminated) => report.with_termination(terminated),
            None => report,
        })
    }
}

/// Register one provider per rule set declaration
fn build_registry(ruleset: &Ruleset, locator: &dyn ResourceLocator) -> Result<RuleProviderRegistry> {
    let registry = RuleProviderRegistry::new();
    for provider in &ruleset.providers {
        match provider.kind {
            ProviderKind::Regex => {
                let regex = RegexProvider::from_src(&provider.name, &provider.src, locator)?;
                registry.register(Arc::new(regex));
            }
        }
    }
    Ok(registry)
}

/// Resource roots: the rule set's directory, then each extra directory
fn resource_roots(ruleset_path: &Path, extra: &[PathBuf]) -> Vec<PathBuf> {
    let base = match ruleset_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::iter::once(base).chain(extra.iter().cloned()).collect()
}

/// Map the reports of a check run to the command outcome
fn outcome(reports: &[DocumentReport], fail_on: Severity) -> Result<()> {
    let checked = reports.len();
    let terminated = reports
        .iter()
        .filter(|r| r.report.terminated.is_some())
        .count();
    if terminated > 0 {
        return Err(Error::Terminated {
            documents: terminated,
            checked,
        });
    }

    let invalid = reports
        .iter()
        .filter(|r| r.report.max_severity.map_or(false, |max| max >= fail_on))
        .count();
    if invalid > 0 {
        return Err(Error::Invalid {
            documents: invalid,
            checked,
        });
    }

    Ok(())
}

/// Handle the check command
pub fn handle_check(args: CheckArgs, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("check", &args.ruleset.display().to_string());

    let ruleset = Ruleset::load(&args.ruleset)?;
    let locator: Arc<dyn ResourceLocator> = Arc::new(FileSystemLocator::new(resource_roots(
        &args.ruleset,
        &args.resource_dirs,
    )));
    let locale = match &args.locale {
        Some(tag) => Locale::parse(tag)?,
        None => Locale::from_env(),
    };
    let checker = Checker::new(&ruleset, locator, args.max_fails, locale)?;
    let fail_on: Severity = args.fail_on.into();

    output.info(&format!(
        "Checking {} document(s) against {} ({} validator(s), locale '{}')",
        args.documents.len(),
        args.ruleset.display(),
        ruleset.validators.len(),
        checker.locale()
    ))?;

    let mut reports = Vec::with_capacity(args.documents.len());
    for path in &args.documents {
        let pass_id = generate_id("pass");
        let timer = Timer::with_details(
            "check_document",
            &format!("{} pass_id={}", path.display(), pass_id),
        );
        let _entered = timer.span().enter();
        tracing::info!(pass_id = %pass_id, document = %path.display(), "Starting validation pass");

        let document = load_document(path)?;
        let report = DocumentReport {
            document: path.display().to_string(),
            pass_id,
            report: checker.check(&document)?,
        };
        if output.format() == OutputFormat::Human {
            output.section(&report.document)?;
            output.report(&report)?;
            if report.report.terminated.is_some() {
                output.warning("Pass terminated early; the report is partial")?;
            } else if report.report.max_severity.map_or(false, |max| max >= fail_on) {
                output.error(&format!("{} failed validation", report.document))?;
            }
        }
        reports.push(report);
    }

    if output.format() != OutputFormat::Human {
        output.data(&reports)?;
    }

    let result = outcome(&reports, fail_on);
    if result.is_ok() {
        output.success(&format!("All {} document(s) passed", reports.len()))?;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileFormat;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use vigil_core::Termination;

    const RULESET: &str = r#"
[[providers]]
name = "order"
src = "config/order/order-rules.properties"

[[validators]]
select = "/order/header/customerNumber"
rule = "order.customerNumber"

[[validators]]
select = "/order/items/*/quantity"
rule = "order.quantity"
on_fail = "WARN"
"#;

    const RULES: &str = "customerNumber=[A-Z]-[0-9]{5}\nquantity=[1-5]\n";

    const MESSAGES: &str = "\
customerNumber=ftl:Invalid customer number '${ruleResult.text}' at '${path}'.
quantity=ftl:Order ${order.header.orderId} has product ${fragment.product} with invalid quantity ${ruleResult.text}.
";

    fn order() -> Value {
        json!({
            "order": {
                "header": {"orderId": 12129, "customerNumber": "123123"},
                "items": [
                    {"product": "222", "quantity": 7},
                    {"product": "333333", "quantity": 1},
                    {"product": "444", "quantity": 9}
                ]
            }
        })
    }

    fn resources() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let i18n = dir.path().join("config/order/i18n");
        fs::create_dir_all(&i18n).unwrap();
        fs::write(dir.path().join("config/order/order-rules.properties"), RULES).unwrap();
        fs::write(i18n.join("order-rules.properties"), MESSAGES).unwrap();
        dir
    }

    fn checker(dir: &Path, ruleset: &str, max_fails: Option<usize>) -> Result<Checker> {
        let ruleset = Ruleset::parse(ruleset, FileFormat::Toml)?;
        let locator: Arc<dyn ResourceLocator> = Arc::new(FileSystemLocator::new([dir]));
        Checker::new(&ruleset, locator, max_fails, Locale::root())
    }

    #[test]
    fn test_pass_records_failures_with_messages() {
        let dir = resources();
        let report = checker(dir.path(), RULESET, None).unwrap().check(&order()).unwrap();

        assert_eq!(report.total_failures, 3);
        assert_eq!(report.count(Severity::Warn), 2);
        assert_eq!(report.count(Severity::Error), 1);
        assert_eq!(report.max_severity, Some(Severity::Error));
        assert!(report.terminated.is_none());

        // least severe first, document order within a severity
        let messages: Vec<_> = report.failures.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Order 12129 has product 222 with invalid quantity 7.",
                "Order 12129 has product 444 with invalid quantity 9.",
                "Invalid customer number '123123' at '/order/header/customerNumber'.",
            ]
        );
    }

    #[test]
    fn test_threshold_terminates_pass() {
        let dir = resources();
        let report = checker(dir.path(), RULESET, Some(1)).unwrap().check(&order()).unwrap();

        assert_eq!(report.total_failures, 2);
        match report.terminated {
            Some(Termination::ThresholdExceeded { max_fails, .. }) => assert_eq!(max_fails, 1),
            other => panic!("unexpected termination: {other:?}"),
        }
    }

    #[test]
    fn test_rule_set_param_sets_threshold() {
        let dir = resources();
        let ruleset = format!("[params]\n\"validation.maxFails\" = 0\n{}", RULESET);
        let report = checker(dir.path(), &ruleset, None).unwrap().check(&order()).unwrap();
        assert_eq!(report.total_failures, 1);
        assert!(report.terminated.is_some());

        // the command-line override wins
        let report = checker(dir.path(), &ruleset, Some(10)).unwrap().check(&order()).unwrap();
        assert_eq!(report.total_failures, 3);
        assert!(report.terminated.is_none());
    }

    #[test]
    fn test_negative_threshold_stops_at_first_failure() {
        let dir = resources();
        let ruleset = format!("[params]\n\"validation.maxFails\" = -1\n{}", RULESET);
        let report = checker(dir.path(), &ruleset, None).unwrap().check(&order()).unwrap();

        assert_eq!(report.total_failures, 1);
        assert_eq!(report.failures[0].path.as_deref(), Some("/order/header/customerNumber"));
        match report.terminated {
            Some(Termination::ThresholdExceeded { max_fails, .. }) => assert_eq!(max_fails, -1),
            other => panic!("unexpected termination: {other:?}"),
        }
    }

    #[test]
    fn test_fatal_terminates_pass() {
        let dir = resources();
        let ruleset = RULESET.replace("on_fail = \"WARN\"", "on_fail = \"FATAL\"");
        let report = checker(dir.path(), &ruleset, None).unwrap().check(&order()).unwrap();

        // customerNumber comes first in the document, then the first bad quantity
        assert_eq!(report.total_failures, 2);
        assert_eq!(report.count(Severity::Fatal), 1);
        match &report.terminated {
            Some(Termination::Fatal { message }) => {
                assert!(message.starts_with("A FATAL validation failure has occurred [/order/items/0/quantity]"));
            }
            other => panic!("unexpected termination: {other:?}"),
        }
    }

    #[test]
    fn test_missing_rule_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            checker(dir.path(), RULESET, None),
            Err(Error::Core(vigil_core::Error::Configuration { .. }))
        ));
    }

    #[test]
    fn test_invalid_threshold_parameter() {
        let dir = resources();
        let ruleset = format!("[params]\n\"validation.maxFails\" = \"many\"\n{}", RULESET);
        assert!(matches!(
            checker(dir.path(), &ruleset, None),
            Err(Error::Core(vigil_core::Error::Configuration { .. }))
        ));
    }

    #[test]
    fn test_resource_roots() {
        assert_eq!(
            resource_roots(Path::new("rules.toml"), &[PathBuf::from("shared")]),
            vec![PathBuf::from("."), PathBuf::from("shared")]
        );
        assert_eq!(
            resource_roots(Path::new("conf/rules.toml"), &[]),
            vec![PathBuf::from("conf")]
        );
    }

    fn document_report(max_severity: Option<Severity>, terminated: bool) -> DocumentReport {
        DocumentReport {
            document: "order.json".to_string(),
            pass_id: generate_id("pass"),
            report: ValidationReport {
                locale: String::new(),
                total_failures: 0,
                max_severity,
                terminated: terminated.then(|| Termination::Fatal {
                    message: "stop".to_string(),
                }),
                failures: Vec::new(),
            },
        }
    }

    #[test]
    fn test_outcome() {
        let clean = document_report(None, false);
        let warned = document_report(Some(Severity::Warn), false);
        let failed = document_report(Some(Severity::Error), false);
        let stopped = document_report(Some(Severity::Fatal), true);

        assert!(outcome(&[clean.clone(), warned.clone()], Severity::Error).is_ok());
        assert!(matches!(
            outcome(&[clean.clone(), warned], Severity::Warn),
            Err(Error::Invalid { documents: 1, checked: 2 })
        ));
        assert!(matches!(
            outcome(&[failed.clone(), clean], Severity::Error),
            Err(Error::Invalid { documents: 1, checked: 2 })
        ));
        assert!(matches!(
            outcome(&[failed, stopped], Severity::Error),
            Err(Error::Terminated { documents: 1, checked: 2 })
        ));
    }
}
