//! The validation pipeline
//!
//! Single-pass, strictly sequential orchestration: index the generated
//! artifacts, apply instance workarounds, scan the FSH sources, check
//! instance availability, filter exclusions, run one validator invocation
//! per profile group and merge all statuses into the final report.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::artifact::postprocess::{apply_postprocessors, default_postprocessors};
use crate::artifact::ArtifactIndex;
use crate::error::FshvError;
use crate::exclude::ExclusionFilter;
use crate::executor::ValidatorExecutor;
use crate::invoke::{group_by_profile, InvocationBuilder, InvocationPlan, PlannedInstance};
use crate::output_parser::parse_transcript;
use crate::report::{merge_results, StatusSink, ValidationStatus};
use crate::result::Result;
use crate::scanner::{profiles_without_instance, scan_declarations};

/// Options for one validation run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Path to the validator jar
    pub validator_jar: PathBuf,
    /// FHIR version passed to the validator
    pub fhir_version: String,
}

/// Validate the instances declared in the given FSH files against the
/// generated artifacts in `generated_dir`.
///
/// Returns every per-instance status, synthetic or parsed, in
/// file-then-instance-then-invocation order. The caller decides the run
/// verdict with [`crate::report::run_failed`].
pub async fn validate_files(
    generated_dir: &Path,
    fsh_files: &[PathBuf],
    options: &PipelineOptions,
    filter: &ExclusionFilter,
    executor: &dyn ValidatorExecutor,
    sink: &dyn StatusSink,
) -> Result<Vec<ValidationStatus>> {
    let index = ArtifactIndex::build(generated_dir)?;

    // Instance files must be patched before any invocation reads them.
    apply_postprocessors(&index, &default_postprocessors())?;

    let abstract_ids = index.abstract_profile_ids();

    let mut availability_failures: Vec<ValidationStatus> = Vec::new();
    let mut exclusion_warnings: Vec<ValidationStatus> = Vec::new();
    let mut planned: Vec<PlannedInstance> = Vec::new();

    for file in fsh_files {
        if !file.exists() {
            return Err(FshvError::file_not_found(file));
        }
        let source =
            std::fs::read_to_string(file).map_err(|e| FshvError::io_error(file, e))?;

        let (profiles, instances) = scan_declarations(&source);
        info!(
            profiles = profiles.len(),
            instances = instances.len(),
            "processing {}",
            file.display()
        );

        let missing = profiles_without_instance(&profiles, &instances, &abstract_ids);
        if !missing.is_empty() {
            // A file with uninstantiated profiles contributes only the
            // availability failures; none of its instances are validated.
            for profile in missing {
                let status = ValidationStatus::failure(
                    vec![format!("No instances defined for profile {profile}")],
                    profile.clone(),
                );
                sink.heading(&format!("Profile {profile}"));
                sink.status(&status);
                availability_failures.push(status);
            }
            continue;
        }

        for declaration in &instances {
            let record = index.instances.get(&declaration.name).ok_or_else(|| {
                FshvError::MissingInstance {
                    instance: declaration.name.clone(),
                    file: file.clone(),
                }
            })?;

            if let Some(status) = filter.skip_status(declaration, record) {
                sink.heading(&format!("Profile {}", status.profile));
                sink.status(&status);
                exclusion_warnings.push(status);
            } else {
                planned.push(PlannedInstance::new(declaration, record));
            }
        }
    }

    let builder = InvocationBuilder::new(&index, &options.validator_jar, &options.fhir_version);
    let plans = builder.plan(group_by_profile(planned))?;

    let mut invocation_results: Vec<ValidationStatus> = Vec::new();
    for plan in &plans {
        match &plan.profile {
            Some(profile) => {
                sink.heading(&format!("Validating instances against profile {profile}"))
            }
            None => sink.heading("Validating instances against all profiles"),
        }
        invocation_results.extend(run_invocation(plan, executor, sink).await?);
    }

    Ok(merge_results(
        availability_failures,
        exclusion_warnings,
        invocation_results,
    ))
}

/// Run one invocation, parse its output and enrich the parsed statuses
/// with the instance and profile names they belong to.
async fn run_invocation(
    plan: &InvocationPlan,
    executor: &dyn ValidatorExecutor,
    sink: &dyn StatusSink,
) -> Result<Vec<ValidationStatus>> {
    let group_profile = plan.profile.clone().unwrap_or_default();

    let output = match executor.execute(&plan.command).await {
        Ok(output) => output,
        Err(e) => {
            // Process-execution failure: one synthetic status for the
            // whole invocation, the run continues with the next group.
            let status = ValidationStatus::failure(vec![e.to_string()], group_profile);
            sink.status(&status);
            return Ok(vec![status]);
        }
    };

    let mut statuses = match parse_transcript(&output) {
        Ok(statuses) => statuses,
        Err(e) => {
            // Output-parsing failure: keep the raw text for diagnosis.
            let mut status = ValidationStatus::failure(
                vec![format!("Error during validator execution: {}", e.message)],
                group_profile,
            );
            status.output = Some(e.raw);
            sink.status(&status);
            return Ok(vec![status]);
        }
    };

    if statuses.len() != plan.instances.len() {
        return Err(FshvError::internal_error(format!(
            "validator reported {} instances, expected {}",
            statuses.len(),
            plan.instances.len()
        )));
    }

    for (status, instance) in statuses.iter_mut().zip(&plan.instances) {
        if status.instance_filename.as_deref() != Some(instance.filename.as_path()) {
            return Err(FshvError::internal_error(format!(
                "status and instance filename do not match: {:?} vs {}",
                status.instance_filename,
                instance.filename.display()
            )));
        }
        status.instance = instance.name.clone();
        status.profile = instance.profile.clone();
        sink.subheading(&format!("Instance {}", status.instance));
        sink.status(status);
    }

    Ok(statuses)
}
