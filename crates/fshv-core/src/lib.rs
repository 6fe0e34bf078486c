//! FSH Validator Core
//!
//! Orchestration engine for validating FHIR Shorthand (FSH) projects:
//! indexes the compiler's generated artifacts, scans FSH sources for
//! declarations, plans HL7 validator invocations and turns the validator's
//! semi-structured output into per-instance statuses.

pub mod artifact;
pub mod config;
pub mod error;
pub mod exclude;
pub mod executor;
pub mod invoke;
pub mod output_parser;
pub mod persist;
pub mod pipeline;
pub mod project;
pub mod report;
pub mod resolve;
pub mod result;
pub mod scanner;

// Re-export commonly used types
pub use artifact::{
    ArtifactIndex, DependencyRef, InstanceRecord, StructureDefinitionRecord, TerminologyRecord,
};
pub use config::{ExclusionsConfig, SushiConfig};
pub use error::{ErrorKind, FshvError};
pub use exclude::{ExclusionDecision, ExclusionFilter};
pub use executor::{ExecutionError, JavaValidatorExecutor, ValidatorExecutor};
pub use invoke::{InvocationBuilder, InvocationPlan, PlannedInstance, ValidatorCommand};
pub use output_parser::{OutputParseError, parse_transcript};
pub use persist::store_log;
pub use pipeline::{PipelineOptions, validate_files};
pub use project::ProjectLayout;
pub use report::{
    NullSink, StatusSink, ValidationOutcome, ValidationStatus, boxed, merge_results, run_failed,
};
pub use result::Result;
pub use scanner::{
    InstanceDeclaration, ProfileDeclaration, profiles_without_instance, scan_declarations,
};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fshv_core=info,fshv_cli=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
