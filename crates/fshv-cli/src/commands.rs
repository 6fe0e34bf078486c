//! The validate command: project discovery, compiler run, validator
//! provisioning and the validation pipeline itself.

use std::path::{Path, PathBuf};

use tracing::info;

use fshv_core::{
    ExclusionsConfig, FshvError, JavaValidatorExecutor, PipelineOptions, ProjectLayout, Result,
    SushiConfig, run_failed, store_log, validate_files,
};

use crate::output::ConsoleSink;

const VALIDATOR_JAR: &str = "validator_cli.jar";
const VALIDATOR_URL: &str =
    "https://github.com/hapifhir/org.hl7.fhir.core/releases/latest/download/validator_cli.jar";

pub struct ValidateArgs {
    pub filenames: Vec<PathBuf>,
    pub all: bool,
    pub subdir: String,
    pub validator_path: Option<PathBuf>,
    pub no_sushi: bool,
    pub log_path: Option<PathBuf>,
}

/// Run one full validation. Returns whether the run passed.
pub async fn validate(args: ValidateArgs) -> Result<bool> {
    let (layout, fsh_files) = resolve_inputs(&args)?;
    info!(
        files = fsh_files.len(),
        "validating project at {}",
        layout.base().display()
    );

    let sushi_config = SushiConfig::load(layout.base())?;
    let exclusions = ExclusionsConfig::load(layout.base())?;

    if !args.no_sushi {
        run_sushi(layout.base()).await?;
    }

    let validator_dir = args
        .validator_path
        .clone()
        .unwrap_or_else(|| layout.base().to_path_buf());
    let validator_jar = ensure_validator(&validator_dir).await?;

    let options = PipelineOptions {
        validator_jar,
        fhir_version: sushi_config.primary_fhir_version()?.to_string(),
    };

    let sink = ConsoleSink;
    let results = validate_files(
        &layout.generated_resources(),
        &fsh_files,
        &options,
        &exclusions.filter(),
        &JavaValidatorExecutor,
        &sink,
    )
    .await?;

    if let Some(log_path) = &args.log_path {
        store_log(&results, log_path)?;
    }

    let passed = !run_failed(&results);
    sink.verdict(passed);
    Ok(passed)
}

/// Locate the project and the FSH files to validate, either from explicit
/// filenames or from `--all` relative to the current directory.
fn resolve_inputs(args: &ValidateArgs) -> Result<(ProjectLayout, Vec<PathBuf>)> {
    if args.all {
        let cwd = std::env::current_dir().map_err(FshvError::from)?;
        let layout = ProjectLayout::discover(&cwd)?;
        let files = layout.discover_fsh_files(&args.subdir)?;
        Ok((layout, files))
    } else if !args.filenames.is_empty() {
        let layout = ProjectLayout::from_files(&args.filenames)?;
        Ok((layout, args.filenames.clone()))
    } else {
        Err(FshvError::config_error(
            "either FSH filenames or --all must be given",
        ))
    }
}

/// Run the FSH compiler in the project base directory
async fn run_sushi(base: &Path) -> Result<()> {
    info!("running sushi in {}", base.display());

    let status = tokio::process::Command::new("sushi")
        .arg(".")
        .current_dir(base)
        .status()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FshvError::command_error(
                "sushi not found - install it with 'npm install -g fsh-sushi'",
            ),
            _ => FshvError::command_error(format!("could not run sushi: {e}")),
        })?;

    if !status.success() {
        return Err(FshvError::command_error(format!(
            "sushi failed with {status}"
        )));
    }
    Ok(())
}

/// Return the path to validator_cli.jar, downloading it first when absent
async fn ensure_validator(dir: &Path) -> Result<PathBuf> {
    let jar = dir.join(VALIDATOR_JAR);
    if jar.exists() {
        return Ok(jar);
    }

    info!("downloading the HL7 validator to {}", jar.display());
    let response = reqwest::get(VALIDATOR_URL)
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| FshvError::command_error(format!("could not download validator: {e}")))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| FshvError::command_error(format!("could not download validator: {e}")))?;

    std::fs::write(&jar, &bytes).map_err(|e| FshvError::io_error(&jar, e))?;
    Ok(jar)
}
