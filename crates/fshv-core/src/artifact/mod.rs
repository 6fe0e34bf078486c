//! Artifact index over compiler-generated FHIR resource files
//!
//! The FSH compiler writes one JSON resource per file into the generated
//! resources directory. This module parses that directory into typed lookup
//! tables keyed the way the rest of the pipeline needs them: profiles and
//! extensions by canonical url, instances by resource id, implementation
//! guide dependencies by package id, value sets and code systems by url.
//!
//! A file missing a required field fails the whole index build: dependency
//! resolution assumes the index is complete, so a partial index would
//! silently degrade every later invocation.

pub mod postprocess;

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::debug;

use crate::error::FshvError;
use crate::result::Result;

/// A locally defined StructureDefinition (profile or extension)
#[derive(Debug, Clone)]
pub struct StructureDefinitionRecord {
    /// Canonical url (index key)
    pub url: String,
    pub id: String,
    /// FHIR `type` field; "Extension" selects the extension table
    pub type_name: String,
    /// `baseDefinition` url; followed while it stays inside the index
    pub base: String,
    /// Profile urls referenced from the differential element types
    pub profiles_additional: Vec<String>,
    pub is_abstract: bool,
    pub filename: PathBuf,
}

/// A generated example instance
#[derive(Debug, Clone)]
pub struct InstanceRecord {
    /// Resource id (index key)
    pub id: String,
    /// Declared profile url from `meta.profile`, or the resource type when
    /// the instance declares none
    pub profile: String,
    /// True when `meta.profile` was present
    pub explicit_profile: bool,
    pub resource_type: String,
    /// Code system urls referenced from top-level codings
    pub code_systems: IndexSet<String>,
    /// Profiles of bundled entries; non-empty only for Bundle resources
    pub profiles_additional: Vec<String>,
    pub filename: PathBuf,
}

/// One `dependsOn` entry from the generated ImplementationGuide
#[derive(Debug, Clone)]
pub struct DependencyRef {
    pub package_id: String,
    pub version: String,
}

impl DependencyRef {
    /// Render as a validator `-ig` package directive
    pub fn directive(&self) -> String {
        format!("{}#{}", self.package_id, self.version)
    }
}

/// A generated ValueSet or CodeSystem
#[derive(Debug, Clone)]
pub struct TerminologyRecord {
    pub url: String,
    pub id: String,
    pub filename: PathBuf,
}

/// Typed lookup tables over one generated resources directory.
///
/// Built fresh per run and read-only afterwards. All maps preserve
/// insertion order (files are visited in sorted name order) so that
/// materialized command lines are reproducible.
#[derive(Debug, Default)]
pub struct ArtifactIndex {
    pub profiles: IndexMap<String, StructureDefinitionRecord>,
    pub extensions: IndexMap<String, StructureDefinitionRecord>,
    pub instances: IndexMap<String, InstanceRecord>,
    pub dependencies: IndexMap<String, DependencyRef>,
    pub value_sets: IndexMap<String, TerminologyRecord>,
    pub code_systems: IndexMap<String, TerminologyRecord>,
}

impl ArtifactIndex {
    /// Build the index from a directory of generated JSON resource files
    pub fn build(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(FshvError::file_not_found(dir));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| FshvError::io_error(dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut index = Self::default();
        for file in &files {
            index.index_file(file)?;
        }

        debug!(
            profiles = index.profiles.len(),
            extensions = index.extensions.len(),
            instances = index.instances.len(),
            dependencies = index.dependencies.len(),
            value_sets = index.value_sets.len(),
            code_systems = index.code_systems.len(),
            "built artifact index from {}",
            dir.display()
        );

        Ok(index)
    }

    /// Ids of all abstract profiles, exempt from the instance availability check
    pub fn abstract_profile_ids(&self) -> IndexSet<String> {
        self.profiles
            .values()
            .filter(|sd| sd.is_abstract)
            .map(|sd| sd.id.clone())
            .collect()
    }

    fn index_file(&mut self, file: &Path) -> Result<()> {
        let content =
            std::fs::read_to_string(file).map_err(|e| FshvError::io_error(file, e))?;
        let json: Value = serde_json::from_str(&content)
            .map_err(|e| FshvError::artifact_error(file, format!("invalid JSON: {e}")))?;

        let resource_type = require_str(file, &json, "resourceType")?;

        match resource_type.as_str() {
            "StructureDefinition" => {
                let record = parse_structure_definition(file, &json)?;
                if record.type_name == "Extension" {
                    self.extensions.insert(record.url.clone(), record);
                } else {
                    self.profiles.insert(record.url.clone(), record);
                }
            }
            "ImplementationGuide" => {
                for dep in parse_implementation_guide(file, &json)? {
                    self.dependencies.insert(dep.package_id.clone(), dep);
                }
            }
            "ValueSet" => {
                let record = parse_terminology(file, &json)?;
                self.value_sets.insert(record.url.clone(), record);
            }
            "CodeSystem" => {
                let record = parse_terminology(file, &json)?;
                self.code_systems.insert(record.url.clone(), record);
            }
            _ => {
                let record = parse_instance(file, &json, resource_type)?;
                self.instances.insert(record.id.clone(), record);
            }
        }

        Ok(())
    }
}

fn require_str(file: &Path, json: &Value, field: &str) -> Result<String> {
    json.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FshvError::artifact_error(file, format!("missing required field '{field}'")))
}

fn require_bool(file: &Path, json: &Value, field: &str) -> Result<bool> {
    json.get(field)
        .and_then(Value::as_bool)
        .ok_or_else(|| FshvError::artifact_error(file, format!("missing required field '{field}'")))
}

fn parse_structure_definition(file: &Path, json: &Value) -> Result<StructureDefinitionRecord> {
    // Profiles referenced by the differential's own element types: the
    // first profile url of every `type` entry that carries one.
    let profiles_additional = json
        .pointer("/differential/element")
        .and_then(Value::as_array)
        .map(|elements| {
            elements
                .iter()
                .filter_map(|element| element.get("type").and_then(Value::as_array))
                .flatten()
                .filter_map(|ty| ty.get("profile").and_then(Value::as_array))
                .filter_map(|profiles| profiles.first().and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(StructureDefinitionRecord {
        url: require_str(file, json, "url")?,
        id: require_str(file, json, "id")?,
        type_name: require_str(file, json, "type")?,
        base: require_str(file, json, "baseDefinition")?,
        profiles_additional,
        is_abstract: require_bool(file, json, "abstract")?,
        filename: file.to_path_buf(),
    })
}

fn parse_implementation_guide(file: &Path, json: &Value) -> Result<Vec<DependencyRef>> {
    let Some(depends_on) = json.get("dependsOn").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    depends_on
        .iter()
        .map(|dep| {
            Ok(DependencyRef {
                package_id: require_str(file, dep, "packageId")?,
                version: require_str(file, dep, "version")?,
            })
        })
        .collect()
}

fn parse_terminology(file: &Path, json: &Value) -> Result<TerminologyRecord> {
    Ok(TerminologyRecord {
        url: require_str(file, json, "url")?,
        id: require_str(file, json, "id")?,
        filename: file.to_path_buf(),
    })
}

fn parse_instance(file: &Path, json: &Value, resource_type: String) -> Result<InstanceRecord> {
    let (profile, explicit_profile) = match json
        .pointer("/meta/profile")
        .and_then(Value::as_array)
        .and_then(|profiles| profiles.first())
        .and_then(Value::as_str)
    {
        Some(url) => (url.to_string(), true),
        None => (resource_type.clone(), false),
    };

    // Code systems referenced from top-level codings only (`field.coding[*].system`).
    // Nested codings are not scanned; exclusion checks operate on this shallow set.
    let code_systems = json
        .as_object()
        .map(|obj| {
            obj.values()
                .filter_map(|value| value.get("coding").and_then(Value::as_array))
                .flatten()
                .filter_map(|coding| coding.get("system").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    // Bundles carry their entries' profiles so the resolver can pull in
    // every profile the bundled resources conform to.
    let profiles_additional = if resource_type == "Bundle" {
        json.get("entry")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        entry
                            .pointer("/resource/meta/profile")
                            .and_then(Value::as_array)
                            .and_then(|profiles| profiles.first())
                            .and_then(Value::as_str)
                    })
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    Ok(InstanceRecord {
        id: require_str(file, json, "id")?,
        profile,
        explicit_profile,
        resource_type,
        code_systems,
        profiles_additional,
        filename: file.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_json(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn profile_json(url: &str, id: &str, base: &str) -> String {
        format!(
            r#"{{
                "resourceType": "StructureDefinition",
                "url": "{url}",
                "id": "{id}",
                "type": "Patient",
                "baseDefinition": "{base}",
                "abstract": false,
                "differential": {{"element": []}}
            }}"#
        )
    }

    #[test]
    fn builds_all_six_tables() {
        let dir = TempDir::new().unwrap();
        write_json(
            dir.path(),
            "StructureDefinition-my-patient.json",
            &profile_json(
                "http://example.org/StructureDefinition/my-patient",
                "my-patient",
                "http://hl7.org/fhir/StructureDefinition/Patient",
            ),
        );
        write_json(
            dir.path(),
            "StructureDefinition-my-ext.json",
            r#"{
                "resourceType": "StructureDefinition",
                "url": "http://example.org/StructureDefinition/my-ext",
                "id": "my-ext",
                "type": "Extension",
                "baseDefinition": "http://hl7.org/fhir/StructureDefinition/Extension",
                "abstract": false
            }"#,
        );
        write_json(
            dir.path(),
            "ImplementationGuide-my.ig.json",
            r#"{
                "resourceType": "ImplementationGuide",
                "id": "my.ig",
                "dependsOn": [
                    {"packageId": "de.basisprofil.r4", "version": "1.3.5"}
                ]
            }"#,
        );
        write_json(
            dir.path(),
            "ValueSet-my-vs.json",
            r#"{"resourceType": "ValueSet", "url": "http://example.org/ValueSet/my-vs", "id": "my-vs"}"#,
        );
        write_json(
            dir.path(),
            "CodeSystem-my-cs.json",
            r#"{"resourceType": "CodeSystem", "url": "http://example.org/CodeSystem/my-cs", "id": "my-cs"}"#,
        );
        write_json(
            dir.path(),
            "Patient-example.json",
            r#"{
                "resourceType": "Patient",
                "id": "patient-example",
                "meta": {"profile": ["http://example.org/StructureDefinition/my-patient"]}
            }"#,
        );

        let index = ArtifactIndex::build(dir.path()).unwrap();

        assert_eq!(index.profiles.len(), 1);
        assert_eq!(index.extensions.len(), 1);
        assert_eq!(index.instances.len(), 1);
        assert_eq!(index.dependencies.len(), 1);
        assert_eq!(index.value_sets.len(), 1);
        assert_eq!(index.code_systems.len(), 1);

        let instance = &index.instances["patient-example"];
        assert!(instance.explicit_profile);
        assert_eq!(
            instance.profile,
            "http://example.org/StructureDefinition/my-patient"
        );
        assert_eq!(
            index.dependencies["de.basisprofil.r4"].directive(),
            "de.basisprofil.r4#1.3.5"
        );
    }

    #[test]
    fn instance_without_meta_profile_falls_back_to_resource_type() {
        let dir = TempDir::new().unwrap();
        write_json(
            dir.path(),
            "Observation-obs.json",
            r#"{"resourceType": "Observation", "id": "obs"}"#,
        );

        let index = ArtifactIndex::build(dir.path()).unwrap();
        let instance = &index.instances["obs"];
        assert!(!instance.explicit_profile);
        assert_eq!(instance.profile, "Observation");
    }

    #[test]
    fn instance_code_systems_are_collected_from_top_level_codings() {
        let dir = TempDir::new().unwrap();
        write_json(
            dir.path(),
            "Observation-obs.json",
            r#"{
                "resourceType": "Observation",
                "id": "obs",
                "code": {
                    "coding": [
                        {"system": "http://loinc.org", "code": "1234-5"},
                        {"system": "http://snomed.info/sct", "code": "42"}
                    ]
                }
            }"#,
        );

        let index = ArtifactIndex::build(dir.path()).unwrap();
        let instance = &index.instances["obs"];
        assert!(instance.code_systems.contains("http://loinc.org"));
        assert!(instance.code_systems.contains("http://snomed.info/sct"));
    }

    #[test]
    fn bundle_collects_entry_profiles() {
        let dir = TempDir::new().unwrap();
        write_json(
            dir.path(),
            "Bundle-bundle.json",
            r#"{
                "resourceType": "Bundle",
                "id": "bundle-example",
                "entry": [
                    {"resource": {"resourceType": "Patient", "meta": {"profile": ["http://example.org/StructureDefinition/my-patient"]}}},
                    {"resource": {"resourceType": "Observation"}}
                ]
            }"#,
        );

        let index = ArtifactIndex::build(dir.path()).unwrap();
        let instance = &index.instances["bundle-example"];
        assert_eq!(
            instance.profiles_additional,
            vec!["http://example.org/StructureDefinition/my-patient"]
        );
    }

    #[test]
    fn missing_required_field_fails_build_and_names_file() {
        let dir = TempDir::new().unwrap();
        write_json(
            dir.path(),
            "StructureDefinition-broken.json",
            r#"{"resourceType": "StructureDefinition", "id": "broken"}"#,
        );

        let err = ArtifactIndex::build(dir.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("StructureDefinition-broken.json"));
        assert!(message.contains("url"));
    }

    #[test]
    fn differential_type_profiles_are_indexed() {
        let dir = TempDir::new().unwrap();
        write_json(
            dir.path(),
            "StructureDefinition-with-refs.json",
            r#"{
                "resourceType": "StructureDefinition",
                "url": "http://example.org/StructureDefinition/with-refs",
                "id": "with-refs",
                "type": "Observation",
                "baseDefinition": "http://hl7.org/fhir/StructureDefinition/Observation",
                "abstract": false,
                "differential": {
                    "element": [
                        {
                            "id": "Observation.subject",
                            "type": [
                                {"code": "Reference", "profile": ["http://example.org/StructureDefinition/my-patient"]}
                            ]
                        }
                    ]
                }
            }"#,
        );

        let index = ArtifactIndex::build(dir.path()).unwrap();
        let sd = &index.profiles["http://example.org/StructureDefinition/with-refs"];
        assert_eq!(
            sd.profiles_additional,
            vec!["http://example.org/StructureDefinition/my-patient"]
        );
    }
}
