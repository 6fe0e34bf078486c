//! Configuration loading
//!
//! Two files drive a validation run: the project's `sushi-config.yaml`
//! (the compiler's own configuration, read for identity and FHIR version)
//! and the optional `.fsh-validator.yml` with exclusion sets.

mod exclusions;
mod sushi;

pub use exclusions::ExclusionsConfig;
pub use sushi::SushiConfig;
