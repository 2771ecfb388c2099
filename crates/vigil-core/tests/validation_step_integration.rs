//! Integration tests for validation steps, aggregation and escalation


use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_support::{context_with_max_fails, Fixture, EMAIL_PATTERN};
use vigil_core::{
    AbortCause, Error, ExecutionContext, Locale, ResultAggregator, Severity, ValidationReport,
};

fn email_diagnostic(text: &str) -> String {
    format!(
        "RegexRuleEvalResult, matched=false, providerName=addressing, ruleName=email, text={}, pattern={}",
        text, EMAIL_PATTERN
    )
}

fn run_three_times(on_fail: Severity) -> ResultAggregator {
    let fixture = Fixture::new();
    let step = fixture.step("addressing.email", on_fail);
    let mut ctx = ExecutionContext::new();
    ctx.set_result(ResultAggregator::new());

    for _ in 0..3 {
        let failure = step.validate("xyz", &mut ctx).expect("soft failures do not abort");
        assert!(failure.is_some());
    }

    ctx.take_result::<ResultAggregator>().expect("aggregator supplied by the caller")
}

#[test]
fn test_validate_warn() {
    let result = run_three_times(Severity::Warn);
    assert_eq!(result.oks().len(), 0);
    assert_eq!(result.warnings().len(), 3);
    assert_eq!(result.errors().len(), 0);
}

#[test]
fn test_validate_oks() {
    let result = run_three_times(Severity::Ok);
    assert_eq!(result.oks().len(), 3);
    assert_eq!(result.warnings().len(), 0);
    assert_eq!(result.errors().len(), 0);
}

#[test]
fn test_validate_errors() {
    let result = run_three_times(Severity::Error);
    assert_eq!(result.oks().len(), 0);
    assert_eq!(result.warnings().len(), 0);
    assert_eq!(result.errors().len(), 3);
    assert_eq!(result.total_failures(), 3);
}

#[test]
fn test_matching_text_records_nothing() {
    let fixture = Fixture::new();
    let step = fixture.step("addressing.email", Severity::Error);
    let mut ctx = ExecutionContext::new();

    assert!(step.validate("joe@example.com", &mut ctx).unwrap().is_none());
    assert!(ctx.result::<ResultAggregator>().is_none());
}

#[test]
fn test_validate_fatal() {
    let fixture = Fixture::new();
    let step = fixture.step("addressing.email", Severity::Fatal);
    let mut ctx = ExecutionContext::new();

    let err = step.validate("xyz", &mut ctx).unwrap_err();
    let abort = err.abort().expect("a FATAL failure aborts the pass");
    assert_eq!(abort.cause(), AbortCause::Fatal);

    let expected = format!("[unknown] {}", email_diagnostic("xyz"));
    assert_eq!(abort.failure().message(&Locale::root()).unwrap(), expected);
    assert_eq!(err.to_string(), format!("A FATAL validation failure has occurred {}", expected));

    let aggregator = ctx.result::<ResultAggregator>().expect("aggregator created on demand");
    let fatal = aggregator.fatal().expect("fatal slot filled");
    assert!(Arc::ptr_eq(fatal, abort.failure()));
    assert_eq!(aggregator.total_failures(), 1);
}

#[test]
fn test_fatal_with_fragment_path() {
    let fixture = Fixture::new();
    let step = fixture.step("order.failProduct", Severity::Fatal);
    let mut ctx = ExecutionContext::new();

    let err = step
        .evaluate("true", Some("/order/order-items/order-item/fail"), &mut ctx)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "A FATAL validation failure has occurred [/order/order-items/order-item/fail] \
         RegexRuleEvalResult, matched=false, providerName=order, ruleName=failProduct, text=true, pattern=false"
    );
}

#[test]
fn test_threshold_allows_exactly_max_fails() {
    let fixture = Fixture::new();
    let step = fixture.step("addressing.email", Severity::Error);
    let mut ctx = context_with_max_fails(3);

    for i in 0..3 {
        let path = format!("/contacts/{}", i);
        assert!(step.evaluate("xyz", Some(&path), &mut ctx).unwrap().is_some());
    }

    let err = step.evaluate("xyz", Some("/contacts/3"), &mut ctx).unwrap_err();
    let abort = err.abort().expect("threshold exceeded");
    assert_eq!(abort.cause(), AbortCause::ThresholdExceeded { max_fails: 3 });
    assert_eq!(abort.failure().fragment_path(), Some("/contacts/3"));
    assert_eq!(
        err.to_string(),
        "The maximum number of allowed validation failures (3) has been exceeded."
    );

    let aggregator = ctx.result::<ResultAggregator>().unwrap();
    assert_eq!(aggregator.total_failures(), 4);
    assert!(Arc::ptr_eq(&aggregator.errors()[3], abort.failure()));
}

#[test]
fn test_zero_max_fails_aborts_on_first_failure() {
    let fixture = Fixture::new();
    let step = fixture.step("addressing.email", Severity::Ok);
    let mut ctx = context_with_max_fails(0);

    let err = step.validate("xyz", &mut ctx).unwrap_err();
    assert_eq!(
        err.abort().map(|a| a.cause()),
        Some(AbortCause::ThresholdExceeded { max_fails: 0 })
    );
}

#[test]
fn test_threshold_counts_every_severity() {
    let fixture = Fixture::new();
    let errors = fixture.step("order.customerNumber", Severity::Error);
    let warnings = fixture.step("order.customerName", Severity::Warn);
    let mut ctx = context_with_max_fails(5);

    for _ in 0..3 {
        errors.validate("123123", &mut ctx).unwrap();
    }
    warnings.validate("Joe", &mut ctx).unwrap();

    // the 5th failure brings the total to exactly 5
    assert!(errors.validate("123123", &mut ctx).unwrap().is_some());
    assert_eq!(ctx.result::<ResultAggregator>().unwrap().total_failures(), 5);

    let err = warnings.validate("Joe", &mut ctx).unwrap_err();
    assert_eq!(
        err.to_string(),
        "The maximum number of allowed validation failures (5) has been exceeded."
    );
    let aggregator = ctx.result::<ResultAggregator>().unwrap();
    assert_eq!(aggregator.total_failures(), 6);
    assert_eq!(aggregator.errors().len(), 4);
    assert_eq!(aggregator.warnings().len(), 2);
}

#[test]
fn test_fatal_terminates_regardless_of_count() {
    let fixture = Fixture::new();
    let errors = fixture.step("order.customerNumber", Severity::Error);
    let warnings = fixture.step("order.customerName", Severity::Warn);
    let fatal = fixture.step("order.failProduct", Severity::Fatal);
    let mut ctx = context_with_max_fails(5);

    for _ in 0..3 {
        errors.validate("123123", &mut ctx).unwrap();
    }
    warnings.validate("Joe", &mut ctx).unwrap();

    let err = fatal
        .evaluate("true", Some("/order/order-items/order-item/fail"), &mut ctx)
        .unwrap_err();
    assert_eq!(err.abort().map(|a| a.cause()), Some(AbortCause::Fatal));

    let aggregator = ctx.result::<ResultAggregator>().unwrap();
    assert_eq!(aggregator.total_failures(), 5);
    assert_eq!(
        aggregator.fatal().map(|f| f.to_string()).as_deref(),
        Some(
            "[/order/order-items/order-item/fail] RegexRuleEvalResult, matched=false, \
             providerName=order, ruleName=failProduct, text=true, pattern=false"
        )
    );

    let report = ValidationReport::new(aggregator, &Locale::root()).with_termination(err.abort().unwrap());
    assert_eq!(report.count(Severity::Error), 3);
    assert_eq!(report.count(Severity::Fatal), 1);
    assert!(!report.is_valid());
}

#[test]
fn test_configuration_errors_surface_before_evaluation() {
    let fixture = Fixture::new();

    let unknown = fixture.step("billing.iban", Severity::Error);
    let err = unknown.validate("x", &mut ExecutionContext::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownRuleProvider { ref name } if name == "billing"));

    let step = fixture.step("addressing.email", Severity::Error);
    let mut ctx = ExecutionContext::new().with_param(vigil_core::MAX_FAILS, "lots");
    let err = step.validate("xyz", &mut ctx).unwrap_err();
    assert!(err.to_string().contains("validation.maxFails"));
    assert!(ctx.result::<ResultAggregator>().is_none());
}

#[test]
fn test_step_is_reusable_across_passes() {
    let fixture = Fixture::new();
    let step = fixture.step("addressing.email", Severity::Warn);

    let mut first = context_with_max_fails(1);
    step.validate("xyz", &mut first).unwrap();
    assert!(step.validate("xyz", &mut first).is_err());

    let mut second = ExecutionContext::new();
    for _ in 0..5 {
        step.validate("xyz", &mut second).unwrap();
    }
    assert_eq!(second.result::<ResultAggregator>().unwrap().warnings().len(), 5);
    assert_eq!(step.message_bundle_base_name(), Some("//i18n/smooks-regex"));
}

#[test]
fn test_unknown_rule_is_a_recorded_failure() {
    let fixture = Fixture::new();
    let step = fixture.step("addressing.phone", Severity::Warn);
    let mut ctx = ExecutionContext::new();

    let failure = step.validate("555-1234", &mut ctx).unwrap().expect("evaluation errors count as failures");
    let message = failure.message(&Locale::root()).unwrap();
    assert!(message.starts_with("Unknown rule 'phone'"), "{message}");
    assert_eq!(ctx.result::<ResultAggregator>().unwrap().warnings().len(), 1);
}

#[test]
fn test_summary_display() {
    let result = run_three_times(Severity::Warn);
    let expected_line = format!("\t- [unknown] {}\n", email_diagnostic("xyz"));
    let expected = format!(
        "OK Failures:\n\t(none)\nWARN Failures:\n{0}{0}{0}ERROR Failures:\n\t(none)\nFATAL Failure:\n\t(none)\n",
        expected_line
    );
    assert_eq!(result.summary(&Locale::root()), expected);
}
