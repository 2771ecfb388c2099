//! Failure severities and their aggregation policy
//!
//! A rule is bound to exactly one [`Severity`] when it is configured. OK, WARN
//! and ERROR failures are accumulated; a FATAL failure terminates the pass.
//! [`Severity::disposition`] is the single place that decides which.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification of a rule failure, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Failure is recorded but considered acceptable
    Ok,
    /// Failure should be reviewed
    Warn,
    /// Failure makes the document invalid
    #[default]
    Error,
    /// Failure terminates the pass immediately
    Fatal,
}

/// Severities that are accumulated into an aggregator bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SoftSeverity {
    Ok,
    Warn,
    Error,
}

/// What the aggregation policy does with a failure of a given severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Append to the matching bucket and keep going
    Accumulate(SoftSeverity),
    /// Fill the fatal slot and stop the pass
    Terminate,
}

impl Severity {
    /// All severities in ascending order
    pub const ALL: [Severity; 4] = [Severity::Ok, Severity::Warn, Severity::Error, Severity::Fatal];

    pub fn disposition(self) -> Disposition {
        match self {
            Severity::Ok => Disposition::Accumulate(SoftSeverity::Ok),
            Severity::Warn => Disposition::Accumulate(SoftSeverity::Warn),
            Severity::Error => Disposition::Accumulate(SoftSeverity::Error),
            Severity::Fatal => Disposition::Terminate,
        }
    }

    pub fn is_fatal(self) -> bool {
        matches!(self.disposition(), Disposition::Terminate)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl From<SoftSeverity> for Severity {
    fn from(soft: SoftSeverity) -> Self {
        match soft {
            SoftSeverity::Ok => Severity::Ok,
            SoftSeverity::Warn => Severity::Warn,
            SoftSeverity::Error => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" => Ok(Severity::Ok),
            "WARN" | "WARNING" => Ok(Severity::Warn),
            "ERROR" => Ok(Severity::Error),
            "FATAL" => Ok(Severity::Fatal),
            other => Err(Error::configuration(format!(
                "Unknown severity '{}'. Expected one of OK, WARN, ERROR, FATAL.",
                other
            ))),
        }
    }
}
