//! Minimal SUSHI configuration reader (sushi-config.yaml)
//!
//! Only the subset the validation pipeline needs is modeled; unknown keys
//! are ignored. `fhirVersion` accepts a scalar or a sequence, as SUSHI does.

use serde::{Deserialize, Deserializer};
use std::path::Path;

use crate::error::FshvError;
use crate::result::Result;

pub const SUSHI_CONFIG_FILENAME: &str = "sushi-config.yaml";

/// The validation-relevant subset of sushi-config.yaml
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SushiConfig {
    /// Implementation guide id
    pub id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub canonical: Option<String>,
    /// FHIR version(s) - can be single string or array
    #[serde(deserialize_with = "deserialize_fhir_version")]
    pub fhir_version: Vec<String>,
}

impl SushiConfig {
    /// Load the configuration from a project base path
    pub fn load(base_path: &Path) -> Result<Self> {
        let path = base_path.join(SUSHI_CONFIG_FILENAME);
        if !path.exists() {
            return Err(FshvError::config_error(format!(
                "Could not find {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| FshvError::io_error(&path, e))?;
        serde_yaml::from_str(&content).map_err(|e| {
            FshvError::config_error(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// The FHIR version passed to the validator's `-version` argument
    pub fn primary_fhir_version(&self) -> Result<&str> {
        self.fhir_version
            .first()
            .map(String::as_str)
            .ok_or_else(|| FshvError::config_error("sushi-config.yaml declares no fhirVersion"))
    }
}

fn deserialize_fhir_version<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(version) => vec![version],
        OneOrMany::Many(versions) => versions,
    })
}
