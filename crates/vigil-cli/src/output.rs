//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable), with a dedicated
//! layout for per-document validation reports.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use tracing::{debug, trace};
use vigil_core::{ReportEntry, Severity, Termination, ValidationReport};

/// Validation report for one checked document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document: String,
    pub pass_id: String,
    #[serde(flatten)]
    pub report: ValidationReport,
}

/// Trait for formatting output with specialized support for reports
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format the report of one document pass
    fn format_report(&self, report: &DocumentReport) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => {
                // For human format, use pretty JSON as fallback
                Ok(serde_json::to_string_pretty(value)?)
            }
        }
    }

    fn format_report(&self, report: &DocumentReport) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_report_human(report)),
            _ => self.format(report),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write raw output
    #[allow(dead_code)]
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!("Outputting data: {}", formatted);
        self.writeln(formatted.trim_end())
    }

    /// Write a document report with specialized formatting
    pub fn report(&mut self, report: &DocumentReport) -> Result<()> {
        let formatted = self.format.format_report(report)?;
        self.writeln(formatted.trim_end())
    }
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Ok => "•",
        Severity::Warn => "⚠️",
        Severity::Error => "❌",
        Severity::Fatal => "⛔",
    }
}

/// Format a document report for human reading
fn format_report_human(report: &DocumentReport) -> String {
    let mut output = String::new();
    let inner = &report.report;

    output.push_str(&format!("📄 Document: {}\n", report.document));
    output.push_str(&format!("   Locale: {}\n", inner.locale));
    output.push('\n');

    for entry in &inner.failures {
        output.push_str(&format_entry_human(entry));
    }

    if inner.failures.is_empty() {
        output.push_str("✅ No failures\n");
    } else {
        output.push_str(&format!(
            "📊 Summary: {} failure(s) - OK: {}, WARN: {}, ERROR: {}, FATAL: {}\n",
            inner.total_failures,
            inner.count(Severity::Ok),
            inner.count(Severity::Warn),
            inner.count(Severity::Error),
            inner.count(Severity::Fatal),
        ));
    }

    match &inner.terminated {
        Some(Termination::Fatal { message }) => {
            output.push_str(&format!("⛔ Terminated: {}\n", message));
        }
        Some(Termination::ThresholdExceeded { message, .. }) => {
            output.push_str(&format!("⛔ Terminated: {}\n", message));
        }
        None => {}
    }

    output
}

/// Format a single report entry for human reading
fn format_entry_human(entry: &ReportEntry) -> String {
    let mut output = format!(
        "{} {} {} ({}.{})\n",
        severity_icon(entry.severity),
        entry.severity,
        entry.path.as_deref().unwrap_or("[unknown]"),
        entry.provider,
        entry.rule,
    );
    output.push_str(&format!("   💬 {}\n", entry.message));
    if let Some(error) = &entry.message_error {
        output.push_str(&format!("   (message unavailable: {})\n", error));
    }
    output
}
