//! Transitive dependency resolution for profiles and instances
//!
//! The external validator only knows about locally generated profiles when
//! they are passed as `-ig` arguments, so every invocation needs the full
//! closure of profiles an instance can touch: its own profile's parent
//! chain, profiles referenced from differential element types, and (for
//! bundles) the profiles of every bundled entry.

use std::collections::VecDeque;

use indexmap::IndexSet;

use crate::artifact::{ArtifactIndex, InstanceRecord};
use crate::error::FshvError;
use crate::result::Result;

/// The ordered parent chain of a locally defined profile.
///
/// Follows `baseDefinition` pointers while the target is itself in the
/// index; the first base outside the index (a core FHIR type) terminates
/// the chain. The chain starts with the profile itself.
///
/// Generated artifacts with a cyclic chain are an upstream defect and are
/// reported as such instead of looping.
pub fn profile_chain(index: &ArtifactIndex, profile_url: &str) -> Result<Vec<String>> {
    let mut chain: Vec<String> = Vec::new();
    let mut current = profile_url.to_string();

    loop {
        if chain.contains(&current) {
            chain.push(current);
            return Err(FshvError::CyclicProfileChain {
                chain: chain.join(" -> "),
            });
        }
        chain.push(current.clone());

        match index.profiles.get(&current) {
            Some(sd) if index.profiles.contains_key(&sd.base) => current = sd.base.clone(),
            _ => break,
        }
    }

    Ok(chain)
}

/// The set of locally defined profiles the validator needs to check an
/// instance, in deterministic first-seen order.
pub fn profiles_to_include(
    index: &ArtifactIndex,
    instance: &InstanceRecord,
) -> Result<IndexSet<String>> {
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(instance.profile.clone());
    if instance.resource_type == "Bundle" {
        queue.extend(instance.profiles_additional.iter().cloned());
    }

    let mut processed: IndexSet<String> = IndexSet::new();
    let mut include: IndexSet<String> = IndexSet::new();

    while let Some(profile) = queue.pop_front() {
        if !processed.insert(profile.clone()) {
            continue;
        }

        // Profiles outside the index are core FHIR types: the validator
        // already knows them, so they contribute nothing.
        let Some(sd) = index.profiles.get(&profile) else {
            continue;
        };

        for referenced in &sd.profiles_additional {
            if !processed.contains(referenced) {
                queue.push_back(referenced.clone());
            }
        }

        for link in profile_chain(index, &profile)? {
            include.insert(link);
        }
    }

    Ok(include)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::StructureDefinitionRecord;
    use crate::error::ErrorKind;
    use indexmap::IndexSet;
    use std::path::PathBuf;

    fn sd(url: &str, base: &str, additional: &[&str]) -> StructureDefinitionRecord {
        StructureDefinitionRecord {
            url: url.to_string(),
            id: url.rsplit('/').next().unwrap().to_string(),
            type_name: "Patient".to_string(),
            base: base.to_string(),
            profiles_additional: additional.iter().map(|s| s.to_string()).collect(),
            is_abstract: false,
            filename: PathBuf::from(format!("{}.json", url.rsplit('/').next().unwrap())),
        }
    }

    fn instance(profile: &str, resource_type: &str, additional: &[&str]) -> InstanceRecord {
        InstanceRecord {
            id: "example".to_string(),
            profile: profile.to_string(),
            explicit_profile: true,
            resource_type: resource_type.to_string(),
            code_systems: IndexSet::new(),
            profiles_additional: additional.iter().map(|s| s.to_string()).collect(),
            filename: PathBuf::from("example.json"),
        }
    }

    const CORE_PATIENT: &str = "http://hl7.org/fhir/StructureDefinition/Patient";

    fn index_with(sds: Vec<StructureDefinitionRecord>) -> ArtifactIndex {
        let mut index = ArtifactIndex::default();
        for sd in sds {
            index.profiles.insert(sd.url.clone(), sd);
        }
        index
    }

    #[test]
    fn chain_stops_at_core_fhir_base() {
        let index = index_with(vec![
            sd("http://x/child", "http://x/parent", &[]),
            sd("http://x/parent", CORE_PATIENT, &[]),
        ]);

        let chain = profile_chain(&index, "http://x/child").unwrap();
        assert_eq!(chain, vec!["http://x/child", "http://x/parent"]);
    }

    #[test]
    fn chain_of_unknown_profile_is_the_profile_itself() {
        let index = index_with(vec![]);
        let chain = profile_chain(&index, CORE_PATIENT).unwrap();
        assert_eq!(chain, vec![CORE_PATIENT]);
    }

    #[test]
    fn cyclic_chain_is_a_distinct_error() {
        let index = index_with(vec![
            sd("http://x/a", "http://x/b", &[]),
            sd("http://x/b", "http://x/a", &[]),
        ]);

        let err = profile_chain(&index, "http://x/a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CyclicProfileChain);
        assert!(err.to_string().contains("http://x/a -> http://x/b"));
    }

    #[test]
    fn closure_includes_parent_chain_and_referenced_profiles() {
        let index = index_with(vec![
            sd("http://x/obs", CORE_PATIENT, &["http://x/pat"]),
            sd("http://x/pat", "http://x/pat-base", &[]),
            sd("http://x/pat-base", CORE_PATIENT, &[]),
        ]);

        let include = profiles_to_include(&index, &instance("http://x/obs", "Observation", &[])).unwrap();
        let expected: Vec<&str> = vec!["http://x/obs", "http://x/pat", "http://x/pat-base"];
        assert_eq!(include.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn bundle_seeds_queue_with_entry_profiles() {
        let index = index_with(vec![
            sd("http://x/pat", CORE_PATIENT, &[]),
            sd("http://x/obs", CORE_PATIENT, &[]),
        ]);

        let bundle = instance("Bundle", "Bundle", &["http://x/pat", "http://x/obs"]);
        let include = profiles_to_include(&index, &bundle).unwrap();
        assert_eq!(
            include.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["http://x/pat", "http://x/obs"]
        );
    }

    #[test]
    fn core_type_instance_contributes_nothing() {
        let index = index_with(vec![]);
        let include = profiles_to_include(&index, &instance("Patient", "Patient", &[])).unwrap();
        assert!(include.is_empty());
    }

    #[test]
    fn resolution_is_idempotent() {
        let index = index_with(vec![
            sd("http://x/obs", CORE_PATIENT, &["http://x/pat"]),
            sd("http://x/pat", CORE_PATIENT, &[]),
        ]);
        let inst = instance("http://x/obs", "Observation", &[]);

        let first = profiles_to_include(&index, &inst).unwrap();
        let second = profiles_to_include(&index, &inst).unwrap();
        assert_eq!(first, second);
    }
}
