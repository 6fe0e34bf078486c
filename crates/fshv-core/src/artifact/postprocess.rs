//! Post-processing of generated instance files before validation
//!
//! Upstream code-generator defects are patched here as pluggable steps over
//! the indexed instances. Each step rewrites the instance file in place and
//! must be idempotent: the pipeline applies all steps exactly once, before
//! any validator invocation reads the files.

use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::artifact::{ArtifactIndex, InstanceRecord};
use crate::error::FshvError;
use crate::result::Result;

/// One in-place fix over a generated instance file
pub trait InstancePostprocessor {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Apply the fix to the instance's file on disk
    fn apply(&self, instance: &InstanceRecord) -> Result<()>;
}

/// Apply all postprocessors to every indexed instance
pub fn apply_postprocessors(
    index: &ArtifactIndex,
    postprocessors: &[Box<dyn InstancePostprocessor>],
) -> Result<()> {
    for instance in index.instances.values() {
        for postprocessor in postprocessors {
            postprocessor.apply(instance)?;
        }
    }
    Ok(())
}

/// The default set of workarounds for known upstream defects
pub fn default_postprocessors() -> Vec<Box<dyn InstancePostprocessor>> {
    vec![Box::new(DuplicateObiCodingFix)]
}

const V2_0203_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v2-0203";
const OBI_CODE: &str = "OBI";

/// Remove duplicate `v2-0203#OBI` identifier type codings.
///
/// SUSHI v2.1.1 emits the `identifier.type` coding for
/// `http://terminology.hl7.org/CodeSystem/v2-0203#OBI` twice on instances of
/// the MII laboratory observation profile, although the element has
/// cardinality 1, so the validator rejects the instance. Surplus codings are
/// removed until exactly one remains.
pub struct DuplicateObiCodingFix;

impl DuplicateObiCodingFix {
    fn dedup(&self, file: &Path) -> Result<bool> {
        let content = std::fs::read_to_string(file).map_err(|e| FshvError::io_error(file, e))?;
        let mut json: Value = serde_json::from_str(&content)
            .map_err(|e| FshvError::artifact_error(file, format!("invalid JSON: {e}")))?;

        let Some(identifiers) = json.get_mut("identifier").and_then(Value::as_array_mut) else {
            return Ok(false);
        };

        let mut changed = false;
        for identifier in identifiers {
            let Some(codings) = identifier
                .pointer_mut("/type/coding")
                .and_then(Value::as_array_mut)
            else {
                continue;
            };

            while count_obi_codings(codings) > 1 {
                let position = codings.iter().position(is_obi_coding);
                if let Some(position) = position {
                    codings.remove(position);
                    changed = true;
                }
            }
        }

        if changed {
            warn!("found multiple OBI codes in {}, removing", file.display());
            let output = serde_json::to_string_pretty(&json)
                .map_err(|e| FshvError::artifact_error(file, format!("serialization: {e}")))?;
            std::fs::write(file, output).map_err(|e| FshvError::io_error(file, e))?;
        }

        Ok(changed)
    }
}

impl InstancePostprocessor for DuplicateObiCodingFix {
    fn name(&self) -> &'static str {
        "duplicate-obi-coding"
    }

    fn apply(&self, instance: &InstanceRecord) -> Result<()> {
        self.dedup(&instance.filename)?;
        Ok(())
    }
}

fn is_obi_coding(coding: &Value) -> bool {
    coding.get("system").and_then(Value::as_str) == Some(V2_0203_SYSTEM)
        && coding.get("code").and_then(Value::as_str) == Some(OBI_CODE)
}

fn count_obi_codings(codings: &[Value]) -> usize {
    codings.iter().filter(|c| is_obi_coding(c)).count()
}
