//! Per-pass, severity-classified failure aggregation
//!
//! A [`ResultAggregator`] collects the failures of one document pass. OK,
//! WARN and ERROR failures are appended to their own bucket in arrival
//! order; a FATAL failure fills the single fatal slot and tells the caller to
//! stop. The failure threshold is not checked here: it is pass configuration
//! and is applied by [`ValidationStep`](crate::step::ValidationStep).

use crate::error::{Error, Result};
use crate::failure::FailureRecord;
use crate::i18n::Locale;
use crate::severity::{Disposition, Severity, SoftSeverity};
use std::fmt;
use std::sync::Arc;

/// Whether the pass may continue after a failure was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Failures of a single pass, bucketed by severity
#[derive(Debug, Default, Clone)]
pub struct ResultAggregator {
    oks: Vec<Arc<FailureRecord>>,
    warnings: Vec<Arc<FailureRecord>>,
    errors: Vec<Arc<FailureRecord>>,
    fatal: Option<Arc<FailureRecord>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// File `failure` under `severity`
    ///
    /// Returns [`Flow::Stop`] for a FATAL failure. Offering a second FATAL
    /// failure is an error and leaves the first one in place.
    pub fn record(&mut self, failure: Arc<FailureRecord>, severity: Severity) -> Result<Flow> {
        match severity.disposition() {
            Disposition::Accumulate(soft) => {
                self.bucket_mut(soft).push(failure);
                Ok(Flow::Continue)
            }
            Disposition::Terminate => match &self.fatal {
                Some(existing) => Err(Error::DuplicateFatal {
                    existing: existing.to_string(),
                }),
                None => {
                    self.fatal = Some(failure);
                    Ok(Flow::Stop)
                }
            },
        }
    }

    fn bucket_mut(&mut self, severity: SoftSeverity) -> &mut Vec<Arc<FailureRecord>> {
        match severity {
            SoftSeverity::Ok => &mut self.oks,
            SoftSeverity::Warn => &mut self.warnings,
            SoftSeverity::Error => &mut self.errors,
        }
    }

    /// Failures recorded at `severity`, in arrival order. For FATAL this is
    /// empty or the single fatal failure.
    pub fn get(&self, severity: Severity) -> &[Arc<FailureRecord>] {
        match severity.disposition() {
            Disposition::Accumulate(SoftSeverity::Ok) => &self.oks,
            Disposition::Accumulate(SoftSeverity::Warn) => &self.warnings,
            Disposition::Accumulate(SoftSeverity::Error) => &self.errors,
            Disposition::Terminate => self.fatal.as_slice(),
        }
    }

    pub fn oks(&self) -> &[Arc<FailureRecord>] {
        &self.oks
    }

    pub fn warnings(&self) -> &[Arc<FailureRecord>] {
        &self.warnings
    }

    pub fn errors(&self) -> &[Arc<FailureRecord>] {
        &self.errors
    }

    pub fn fatal(&self) -> Option<&Arc<FailureRecord>> {
        self.fatal.as_ref()
    }

    /// `|OK| + |WARN| + |ERROR| + (1 if a FATAL failure was recorded)`
    pub fn total_failures(&self) -> usize {
        self.oks.len() + self.warnings.len() + self.errors.len() + usize::from(self.fatal.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.total_failures() == 0
    }

    /// Highest severity with at least one failure
    pub fn max_severity(&self) -> Option<Severity> {
        Severity::ALL
            .into_iter()
            .rev()
            .find(|severity| !self.get(*severity).is_empty())
    }

    /// All failures with their severity, least severe first
    pub fn iter(&self) -> impl Iterator<Item = (Severity, &Arc<FailureRecord>)> + '_ {
        Severity::ALL
            .into_iter()
            .flat_map(move |severity| self.get(severity).iter().map(move |f| (severity, f)))
    }

    /// Multi-line summary with every failure's message for `locale`
    pub fn summary(&self, locale: &Locale) -> String {
        let mut out = String::new();
        for (heading, failures) in [
            ("OK Failures:", self.oks()),
            ("WARN Failures:", self.warnings()),
            ("ERROR Failures:", self.errors()),
        ] {
            out.push_str(heading);
            out.push('\n');
            if failures.is_empty() {
                out.push_str("\t(none)\n");
            }
            for failure in failures {
                out.push_str("\t- ");
                out.push_str(&failure.display_message(locale));
                out.push('\n');
            }
        }

        out.push_str("FATAL Failure:\n");
        match &self.fatal {
            Some(fatal) => {
                out.push('\t');
                out.push_str(&fatal.display_message(locale));
                out.push('\n');
            }
            None => out.push_str("\t(none)\n"),
        }
        out
    }
}

impl fmt::Display for ResultAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary(&Locale::from_env()))
    }
}
