//! Serializable validation reports
//!
//! A [`ValidationReport`] is a snapshot of a [`ResultAggregator`] with every
//! failure message resolved for one locale. A message that cannot be resolved
//! is reported with its default message and the resolution error, so one
//! broken template never hides the rest of the report.

use crate::aggregator::ResultAggregator;
use crate::error::{AbortCause, ValidationAbort};
use crate::failure::FailureRecord;
use crate::i18n::Locale;
use crate::severity::Severity;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One reported failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub provider: String,
    pub rule: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl ReportEntry {
    pub fn new(severity: Severity, failure: &FailureRecord, locale: &Locale) -> Self {
        let (message, message_error) = match failure.message(locale) {
            Ok(message) => (message, None),
            Err(e) => (failure.default_message(), Some(e.to_string())),
        };
        let result = failure.rule_result();

        Self {
            severity,
            path: failure.fragment_path().map(str::to_string),
            provider: result.provider_name().to_string(),
            rule: result.rule_name().to_string(),
            message,
            message_error,
            recorded_at: failure.recorded_at(),
        }
    }
}

/// Why the pass ended early, if it did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    Fatal { message: String },
    ThresholdExceeded { max_fails: i64, message: String },
}

impl From<&ValidationAbort> for Termination {
    fn from(abort: &ValidationAbort) -> Self {
        match abort.cause() {
            AbortCause::Fatal => Termination::Fatal {
                message: abort.to_string(),
            },
            AbortCause::ThresholdExceeded { max_fails } => Termination::ThresholdExceeded {
                max_fails,
                message: abort.to_string(),
            },
        }
    }
}

/// Failures of one pass, resolved for a locale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub locale: String,
    pub total_failures: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminated: Option<Termination>,
    pub failures: Vec<ReportEntry>,
}

impl ValidationReport {
    pub fn new(aggregator: &ResultAggregator, locale: &Locale) -> Self {
        Self {
            locale: locale.to_string(),
            total_failures: aggregator.total_failures(),
            max_severity: aggregator.max_severity(),
            terminated: None,
            failures: aggregator
                .iter()
                .map(|(severity, failure)| ReportEntry::new(severity, failure, locale))
                .collect(),
        }
    }

    /// Record that the pass was cut short by `abort`
    pub fn with_termination(mut self, abort: &ValidationAbort) -> Self {
        self.terminated = Some(abort.into());
        self
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.failures.iter().filter(|e| e.severity == severity).count()
    }

    /// True when nothing at ERROR or above was recorded
    pub fn is_valid(&self) -> bool {
        self.max_severity.map_or(true, |max| max < Severity::Error)
    }
}
