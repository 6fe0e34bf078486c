//! Console reporting for validation runs

use colored::Colorize;

use fshv_core::{StatusSink, ValidationOutcome, ValidationStatus, boxed};

/// Prints pipeline progress and results to stdout
pub struct ConsoleSink;

impl ConsoleSink {
    /// Print the final run verdict
    pub fn verdict(&self, passed: bool) {
        if passed {
            println!("{}", boxed("Validation successful!", '=').green());
        } else {
            println!("{}", boxed("Validation failed", '=').red());
        }
    }
}

impl StatusSink for ConsoleSink {
    fn heading(&self, text: &str) {
        println!("{}", boxed(text, '='));
    }

    fn subheading(&self, text: &str) {
        println!("{}", boxed(text, '-'));
    }

    fn status(&self, status: &ValidationStatus) {
        match &status.output {
            Some(raw) => println!("{raw}"),
            None => {
                for line in &status.errors {
                    println!("  {}", line.red());
                }
                for line in &status.warnings {
                    println!("  {}", line.yellow());
                }
            }
        }

        let summary = status.summary();
        let summary = match status.outcome {
            ValidationOutcome::Failure => summary.red(),
            ValidationOutcome::Warning | ValidationOutcome::NotRun => summary.yellow(),
            ValidationOutcome::Success => summary.green(),
        };
        println!("{summary}");
    }
}
