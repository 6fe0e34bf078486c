//! Validation status records, the reporting sink and the result aggregator

use std::fmt;
use std::path::PathBuf;

/// Outcome of one validator run (or one synthetic status)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Success,
    Failure,
    Warning,
    NotRun,
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationOutcome::Success => "success",
            ValidationOutcome::Failure => "failure",
            ValidationOutcome::Warning => "warning",
            ValidationOutcome::NotRun => "not-run",
        };
        write!(f, "{s}")
    }
}

/// Status information for one validated (or skipped) instance.
///
/// Produced by the output parser or synthesized by the exclusion filter
/// and the instance availability check. The error/warning/note counts are
/// derived from the list lengths, so the count == len invariant holds
/// structurally.
#[derive(Debug, Clone)]
pub struct ValidationStatus {
    pub outcome: ValidationOutcome,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
    /// Name of the profile the instance was validated against
    pub profile: String,
    /// Name of the validated instance
    pub instance: String,
    /// Full raw validator output for this status, when available
    pub output: Option<String>,
    /// Instance filename recovered from the validator output
    pub instance_filename: Option<PathBuf>,
}

impl ValidationStatus {
    /// Create an empty not-run status
    pub fn not_run() -> Self {
        Self {
            outcome: ValidationOutcome::NotRun,
            errors: Vec::new(),
            warnings: Vec::new(),
            notes: Vec::new(),
            profile: String::new(),
            instance: String::new(),
            output: None,
            instance_filename: None,
        }
    }

    /// Create a synthetic failure status
    pub fn failure(errors: Vec<String>, profile: impl Into<String>) -> Self {
        Self {
            outcome: ValidationOutcome::Failure,
            errors,
            profile: profile.into(),
            ..Self::not_run()
        }
    }

    /// Create a synthetic warning status
    pub fn warning(warnings: Vec<String>, profile: impl Into<String>) -> Self {
        Self {
            outcome: ValidationOutcome::Warning,
            warnings,
            profile: profile.into(),
            ..Self::not_run()
        }
    }

    pub fn n_errors(&self) -> usize {
        self.errors.len()
    }

    pub fn n_warnings(&self) -> usize {
        self.warnings.len()
    }

    pub fn n_notes(&self) -> usize {
        self.notes.len()
    }

    /// Check whether this validation run failed
    pub fn failed(&self) -> bool {
        self.outcome == ValidationOutcome::Failure
    }

    /// One-line summary in the validator's own format
    pub fn summary(&self) -> String {
        let outcome = match self.outcome {
            ValidationOutcome::Success => "Success",
            ValidationOutcome::Failure => "Failure",
            ValidationOutcome::Warning => "Warning",
            ValidationOutcome::NotRun => "Not-Run",
        };
        format!(
            "{}: {} errors, {} warnings, {} notes",
            outcome,
            self.n_errors(),
            self.n_warnings(),
            self.n_notes()
        )
    }
}

/// Reporting sink for pipeline progress and results.
///
/// The pipeline has no direct console coupling; the CLI installs a console
/// implementation, tests install a collecting one.
pub trait StatusSink {
    /// Emit a top-level heading (profile group, run phase)
    fn heading(&self, text: &str);

    /// Emit a secondary heading (single instance)
    fn subheading(&self, text: &str);

    /// Emit one validation status
    fn status(&self, status: &ValidationStatus);
}

/// Sink that discards everything
pub struct NullSink;

impl StatusSink for NullSink {
    fn heading(&self, _text: &str) {}
    fn subheading(&self, _text: &str) {}
    fn status(&self, _status: &ValidationStatus) {}
}

/// Render a message in a bordered box, one string per run heading.
///
/// Matches the transcript format consumed by downstream log tooling.
pub fn boxed(message: &str, border: char) -> String {
    let width = 100usize.max(message.chars().count());
    let padded = format!("{message:<width$}");
    let rule: String = border.to_string().repeat(width + 4);

    format!("{rule}\n* {padded} *\n{rule}")
}

/// Merge the per-stage result lists into the final report.
///
/// Order is fixed: availability failures first, then exclusion warnings,
/// then parsed invocation results in profile-group order.
pub fn merge_results(
    availability_failures: Vec<ValidationStatus>,
    exclusion_warnings: Vec<ValidationStatus>,
    invocation_results: Vec<ValidationStatus>,
) -> Vec<ValidationStatus> {
    let mut merged = availability_failures;
    merged.extend(exclusion_warnings);
    merged.extend(invocation_results);
    merged
}

/// The overall run failed exactly when any status has outcome Failure
pub fn run_failed(results: &[ValidationStatus]) -> bool {
    results.iter().any(ValidationStatus::failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_list_lengths() {
        let status = ValidationStatus::failure(
            vec!["Error @ a".into(), "Error @ b".into()],
            "SomeProfile",
        );
        assert_eq!(status.n_errors(), 2);
        assert_eq!(status.n_warnings(), 0);
        assert_eq!(status.n_notes(), 0);
        assert!(status.failed());
    }

    #[test]
    fn merge_keeps_stage_order() {
        let fail = ValidationStatus::failure(vec!["e".into()], "P1");
        let warn = ValidationStatus::warning(vec!["w".into()], "P2");
        let ok = ValidationStatus {
            outcome: ValidationOutcome::Success,
            ..ValidationStatus::not_run()
        };

        let merged = merge_results(vec![fail], vec![warn], vec![ok]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].outcome, ValidationOutcome::Failure);
        assert_eq!(merged[1].outcome, ValidationOutcome::Warning);
        assert_eq!(merged[2].outcome, ValidationOutcome::Success);
        assert!(run_failed(&merged));
    }

    #[test]
    fn run_without_failures_passes() {
        let warn = ValidationStatus::warning(vec!["w".into()], "P");
        assert!(!run_failed(&[warn]));
    }

    #[test]
    fn boxed_pads_to_minimum_width() {
        let s = boxed("hello", '=');
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 104);
        assert!(lines[1].starts_with("* hello"));
        assert!(lines[1].ends_with(" *"));
    }
}
