use std::fmt;

#[cfg(feature = "colorized_output")]
use console::style;

use super::{Detail, Severity};
use crate::encode::{EncodeError, JsonWrapper};

/// Outcome of a conversion that did not hit a hard failure.
///
/// Holds the encoded output (with metadata still attached) and every problem
/// collected along the way. A report with errors is a rejected submission; its
/// [`ConversionReport::errors_json`] is what gets written instead of the QPP JSON.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    source_name: String,
    encoded: JsonWrapper,
    details: Vec<Detail>,
}

impl ConversionReport {
    /// Create a report for `source_name`
    pub fn new(source_name: impl Into<String>, encoded: JsonWrapper, details: Vec<Detail>) -> Self {
        Self {
            source_name: source_name.into(),
            encoded,
            details,
        }
    }

    /// Name of the converted source
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// All details, errors and warnings, in discovery order
    pub fn details(&self) -> &[Detail] {
        &self.details
    }

    /// Details with [`Severity::Error`]
    pub fn errors(&self) -> impl Iterator<Item = &Detail> {
        self.details.iter().filter(|d| d.severity == Severity::Error)
    }

    /// Details with [`Severity::Warning`]
    pub fn warnings(&self) -> impl Iterator<Item = &Detail> {
        self.details.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Number of errors
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Number of warnings
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// True if any error was recorded
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// True if no error was recorded (warnings allowed)
    pub fn is_success(&self) -> bool {
        !self.has_errors()
    }

    /// Encoded output including `metadata_holder` records
    pub fn encoded(&self) -> &JsonWrapper {
        &self.encoded
    }

    /// Encoded output ready for submission (metadata stripped)
    pub fn qpp(&self) -> JsonWrapper {
        self.encoded.copy_without_metadata()
    }

    /// `{"errors":[{"sourceIdentifier": ..., "details": [...]}]}`, plus the warnings when any.
    pub fn errors_json(&self) -> Result<JsonWrapper, EncodeError> {
        let mut error = JsonWrapper::new();
        error.put_string("sourceIdentifier", &self.source_name)?;
        error.put_object("details", to_json(self.errors())?)?;

        let mut errors = JsonWrapper::new();
        errors.push_object(error)?;

        let mut document = JsonWrapper::new();
        document.put_object("errors", errors)?;
        if self.warning_count() > 0 {
            document.put_object("warnings", to_json(self.warnings())?)?;
        }
        Ok(document)
    }

    /// Format the report with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::Emoji;

            static OK: Emoji<'_, '_> = Emoji("✓", "[OK]");
            static WARN: Emoji<'_, '_> = Emoji("⚠", "[WARN]");
            static FAIL: Emoji<'_, '_> = Emoji("✗", "[FAIL]");

            let mut output = String::new();

            output.push_str(&format!("{}\n", style("QRDA III Conversion Report").bold().cyan()));
            output.push_str(&format!("{}\n", style("==========================").cyan()));
            output.push_str(&format!("{}: {}\n\n", style("Source").bold(), self.source_name));

            if self.details.is_empty() {
                output.push_str(&format!("[{}] {}\n", OK, style("No problems found").green()));
            }
            for detail in &self.details {
                match detail.severity {
                    Severity::Warning => output.push_str(&format!(
                        "[{}] {}: {}\n",
                        WARN,
                        style("WARNING").yellow().bold(),
                        detail
                    )),
                    Severity::Error => output.push_str(&format!(
                        "[{}] {}: {}\n",
                        FAIL,
                        style("ERROR").red().bold(),
                        detail
                    )),
                }
            }

            output.push('\n');
            output.push_str(&format!(
                "{}: {} errors, {} warnings\n\n",
                style("Summary").bold(),
                style(self.error_count()).red(),
                style(self.warning_count()).yellow()
            ));

            if self.has_errors() {
                output.push_str(&format!("{}\n", style("Conversion FAILED").red().bold()));
            } else if self.warning_count() > 0 {
                output.push_str(&format!(
                    "{}\n",
                    style("Conversion PASSED with warnings").yellow().bold()
                ));
            } else {
                output.push_str(&format!("{}\n", style("Conversion PASSED").green().bold()));
            }

            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

fn to_json<'a>(details: impl Iterator<Item = &'a Detail>) -> Result<serde_json::Value, EncodeError> {
    let details: Vec<&Detail> = details.collect();
    serde_json::to_value(details)
        .map_err(|e| EncodeError::new("Issue serializing conversion details").with_cause(e))
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "QRDA III Conversion Report")?;
        writeln!(f, "==========================")?;
        writeln!(f, "Source: {}", self.source_name)?;
        writeln!(f)?;

        if self.details.is_empty() {
            writeln!(f, "[✓] No problems found")?;
        }
        for detail in &self.details {
            match detail.severity {
                Severity::Warning => writeln!(f, "[⚠] WARNING: {}", detail)?,
                Severity::Error => writeln!(f, "[✗] ERROR: {}", detail)?,
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Summary: {} errors, {} warnings",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        if self.has_errors() {
            writeln!(f, "Conversion FAILED")
        } else if self.warning_count() > 0 {
            writeln!(f, "Conversion PASSED with warnings")
        } else {
            writeln!(f, "Conversion PASSED")
        }
    }
}
