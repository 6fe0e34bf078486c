//! Validator exclusion configuration (.fsh-validator.yml)

use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

use crate::error::FshvError;
use crate::exclude::ExclusionFilter;
use crate::result::Result;

pub const EXCLUSIONS_FILENAME: &str = ".fsh-validator.yml";

/// Exclusion sets read from the project's `.fsh-validator.yml`.
/// A missing file means nothing is excluded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExclusionsConfig {
    #[serde(default)]
    pub exclude_code_systems: IndexSet<String>,

    #[serde(default, rename = "exclude_resource_type", alias = "exclude_resource_types")]
    pub exclude_resource_types: IndexSet<String>,
}

impl ExclusionsConfig {
    /// Load the configuration from a project base path
    pub fn load(base_path: &Path) -> Result<Self> {
        let path = base_path.join(EXCLUSIONS_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| FshvError::io_error(&path, e))?;
        serde_yaml::from_str(&content).map_err(|e| {
            FshvError::config_error(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Build the exclusion filter from the configured sets
    pub fn filter(&self) -> ExclusionFilter {
        ExclusionFilter::new(
            self.exclude_code_systems.clone(),
            self.exclude_resource_types.clone(),
        )
    }
}
