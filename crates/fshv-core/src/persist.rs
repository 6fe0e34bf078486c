//! Persisting validation results to disk
//!
//! One run produces three files sharing a timestamped stem: a plain-text
//! transcript (`.log`), a markdown summary table (`.md`) and the same table
//! as CSV (`.csv`).

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::FshvError;
use crate::report::{boxed, ValidationStatus};
use crate::result::Result;

/// Write the run's results under `log_dir` and return the created paths.
///
/// The directory is created when missing. The stem is derived from the
/// local time, so repeated runs never overwrite each other.
pub fn store_log(results: &[ValidationStatus], log_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(log_dir).map_err(|e| FshvError::io_error(log_dir, e))?;

    let stem = format!("validation_{}", Local::now().format("%y%m%dT%H%M%S"));
    let paths = vec![
        log_dir.join(format!("{stem}.log")),
        log_dir.join(format!("{stem}.md")),
        log_dir.join(format!("{stem}.csv")),
    ];

    write_file(&paths[0], &render_transcript(results))?;
    write_file(&paths[1], &render_markdown(results))?;
    write_file(&paths[2], &render_csv(results))?;

    info!("stored validation log as {}", paths[0].display());
    Ok(paths)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| FshvError::io_error(path, e))
}

fn render_transcript(results: &[ValidationStatus]) -> String {
    let mut out = String::new();
    for status in results {
        let heading = if status.instance.is_empty() {
            format!("Profile {}", status.profile)
        } else {
            format!("Validating {} on profile {}", status.instance, status.profile)
        };
        out.push_str(&boxed(&heading, '='));
        out.push('\n');

        match &status.output {
            Some(raw) => out.push_str(raw),
            None => {
                out.push_str(&status.summary());
                for line in status
                    .errors
                    .iter()
                    .chain(&status.warnings)
                    .chain(&status.notes)
                {
                    out.push('\n');
                    out.push_str("  ");
                    out.push_str(line);
                }
            }
        }
        out.push_str("\n\n");
    }
    out
}

fn render_markdown(results: &[ValidationStatus]) -> String {
    let mut out = String::from(
        "| status | errors | warnings | notes | instance | profile |\n\
         | --- | --- | --- | --- | --- | --- |\n",
    );
    for status in results {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            status.outcome,
            status.n_errors(),
            status.n_warnings(),
            status.n_notes(),
            status.instance,
            status.profile
        ));
    }
    out
}

fn render_csv(results: &[ValidationStatus]) -> String {
    let mut out = String::from("status,n_errors,n_warnings,n_notes,instance,profile\n");
    for status in results {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            status.outcome,
            status.n_errors(),
            status.n_warnings(),
            status.n_notes(),
            csv_field(&status.instance),
            csv_field(&status.profile)
        ));
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ValidationOutcome;
    use tempfile::TempDir;

    fn sample() -> Vec<ValidationStatus> {
        let mut ok = ValidationStatus::not_run();
        ok.outcome = ValidationOutcome::Success;
        ok.instance = "ExamplePatient".into();
        ok.profile = "http://example.org/StructureDefinition/patient".into();
        ok.output = Some("Success: 0 errors, 0 warnings, 0 notes".into());

        let failed = ValidationStatus::failure(
            vec!["No instances defined for profile PatientProfile".into()],
            "PatientProfile",
        );
        vec![ok, failed]
    }

    #[test]
    fn writes_all_three_files() {
        let dir = TempDir::new().unwrap();
        let paths = store_log(&sample(), dir.path()).unwrap();
        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert!(path.exists(), "missing {}", path.display());
        }
        assert!(paths[0].extension().is_some_and(|e| e == "log"));
        assert!(paths[2].extension().is_some_and(|e| e == "csv"));
    }

    #[test]
    fn transcript_contains_headings_and_raw_output() {
        let transcript = render_transcript(&sample());
        assert!(transcript.contains("Validating ExamplePatient on profile"));
        assert!(transcript.contains("Success: 0 errors, 0 warnings, 0 notes"));
        assert!(transcript.contains("Profile PatientProfile"));
        assert!(transcript.contains("No instances defined for profile PatientProfile"));
    }

    #[test]
    fn csv_has_one_row_per_status() {
        let csv = render_csv(&sample());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "status,n_errors,n_warnings,n_notes,instance,profile");
        assert!(lines[1].starts_with("success,0,0,0,ExamplePatient,"));
        assert!(lines[2].starts_with("failure,1,0,0,,"));
    }

    #[test]
    fn csv_quotes_fields_with_commas() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("plain"), "plain");
    }

    #[test]
    fn markdown_table_lists_outcomes() {
        let md = render_markdown(&sample());
        assert!(md.starts_with("| status |"));
        assert!(md.contains("| success | 0 | 0 | 0 | ExamplePatient |"));
        assert!(md.contains("| failure | 1 | 0 | 0 |  |"));
    }

    #[test]
    fn creates_missing_log_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("logs/out");
        store_log(&sample(), &nested).unwrap();
        assert!(nested.is_dir());
    }
}
