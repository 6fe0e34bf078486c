//! Parser for the validator's semi-structured text output
//!
//! One invocation validates many instances; the combined output carries one
//! block per instance, separated by rules of four or more `-` characters.
//! Each block names the instance file, a summary line and indented message
//! lines, which are extracted into a typed [`ValidationStatus`].

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::report::{ValidationOutcome, ValidationStatus};

/// The validator produced output that does not match the expected block
/// shape. Carries the raw text for diagnosis; the caller reports it as one
/// synthetic Failure for the whole invocation.
#[derive(Debug, Error)]
#[error("could not parse validator output: {message}")]
pub struct OutputParseError {
    pub message: String,
    pub raw: String,
}

static BLOCK_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n-{4,}").expect("separator pattern is valid"));

static FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-- (.*) --{4,}\n").expect("filename pattern is valid"));

static FILENAME_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"  Validate (.*)\n").expect("filename pattern is valid"));

static SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<outcome>\*FAILURE\*|Success): (?P<errors>\d+) errors, (?P<warnings>\d+) warnings, (?P<notes>\d+) notes",
    )
    .expect("summary pattern is valid")
});

static ERROR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^  (Error @ .*)").expect("error pattern is valid"));

static WARNING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^  (Warning @ .*)").expect("warning pattern is valid"));

static NOTE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^  (Information @ .*)").expect("note pattern is valid"));

/// Parse the full output of one invocation into per-instance statuses,
/// in block order.
pub fn parse_transcript(output: &str) -> Result<Vec<ValidationStatus>, OutputParseError> {
    let mut results = Vec::new();

    for block in BLOCK_SEPARATOR.split(output) {
        if block.trim().is_empty() {
            continue;
        }
        let status = parse_block(block).map_err(|message| OutputParseError {
            message,
            raw: output.to_string(),
        })?;
        results.push(status);
    }

    Ok(results)
}

fn parse_block(block: &str) -> Result<ValidationStatus, String> {
    let instance_filename = locate_filename(block)?;

    let summary = SUMMARY
        .captures(block)
        .ok_or_else(|| "no summary line found in validator output".to_string())?;

    let mut outcome = match &summary["outcome"] {
        "Success" => ValidationOutcome::Success,
        _ => ValidationOutcome::Failure,
    };
    let summary_warnings: usize = summary["warnings"].parse().map_err(|_| {
        "summary line carries a non-numeric warning count".to_string()
    })?;

    let errors = collect(&ERROR_LINE, block);
    let warnings = collect(&WARNING_LINE, block);
    let notes = collect(&NOTE_LINE, block);

    // Warnings demote a success; notes never do.
    if outcome == ValidationOutcome::Success && (summary_warnings > 0 || !warnings.is_empty()) {
        outcome = ValidationOutcome::Warning;
    }

    Ok(ValidationStatus {
        outcome,
        errors,
        warnings,
        notes,
        profile: String::new(),
        instance: String::new(),
        output: Some(block.to_string()),
        instance_filename: Some(PathBuf::from(instance_filename)),
    })
}

fn locate_filename(block: &str) -> Result<String, String> {
    // Exactly one filename line per block, whichever pattern names it.
    match exactly_one(&FILENAME, block)? {
        Some(filename) => Ok(filename),
        None => exactly_one(&FILENAME_SINGLE, block)?
            .ok_or_else(|| "no filename found in validator output".to_string()),
    }
}

fn exactly_one(pattern: &Regex, block: &str) -> Result<Option<String>, String> {
    let matches: Vec<String> = pattern
        .captures_iter(block)
        .map(|captures| captures[1].to_string())
        .collect();

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.into_iter().next()),
        _ => Err("multiple filenames found in validator output".to_string()),
    }
}

fn collect(pattern: &Regex, block: &str) -> Vec<String> {
    pattern
        .captures_iter(block)
        .map(|captures| captures[1].trim().to_string())
        .collect()
}
