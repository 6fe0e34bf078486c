//! Declaration scanner over raw FSH source text
//!
//! Extracts `Profile:`/`Parent:`/`Id:` triples and `Instance:`/`InstanceOf:`
//! pairs with line-anchored patterns. This is a lossy front-end by design:
//! declarations whose defining lines are not adjacent in the expected shape
//! are silently skipped, and no semantic validation happens here.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;

/// A `Profile:` declaration with its `Parent:` and `Id:` lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDeclaration {
    pub name: String,
    pub parent: String,
    pub id: String,
}

/// An `Instance:` declaration with its `InstanceOf:` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDeclaration {
    pub name: String,
    pub instance_of: String,
}

// FSH names: letters, digits, underscore, hyphen, and `$` for aliases.
const NAME: &str = r"[A-Za-z0-9_$-]+";

static PROFILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^Profile: (?P<name>{NAME})[^\n]*\nParent: (?P<parent>{NAME})[^\n]*\nId: (?P<id>{NAME})"
    ))
    .expect("profile pattern is valid")
});

static INSTANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^Instance: (?P<name>{NAME})[^\n]*\nInstanceOf: (?P<instanceof>{NAME})"
    ))
    .expect("instance pattern is valid")
});

/// Extract all profile and instance declarations, in order of appearance
pub fn scan_declarations(source: &str) -> (Vec<ProfileDeclaration>, Vec<InstanceDeclaration>) {
    let profiles = PROFILE_RE
        .captures_iter(source)
        .map(|captures| ProfileDeclaration {
            name: captures["name"].to_string(),
            parent: captures["parent"].to_string(),
            id: captures["id"].to_string(),
        })
        .collect();

    let instances = INSTANCE_RE
        .captures_iter(source)
        .map(|captures| InstanceDeclaration {
            name: captures["name"].to_string(),
            instance_of: captures["instanceof"].to_string(),
        })
        .collect();

    (profiles, instances)
}

/// Ids of declared non-abstract profiles without any instance declaring
/// `InstanceOf` equal to the profile id
pub fn profiles_without_instance(
    profiles: &[ProfileDeclaration],
    instances: &[InstanceDeclaration],
    abstract_profile_ids: &IndexSet<String>,
) -> Vec<String> {
    profiles
        .iter()
        .filter(|profile| !abstract_profile_ids.contains(&profile.id))
        .filter(|profile| !instances.iter().any(|i| i.instance_of == profile.id))
        .map(|profile| profile.id.clone())
        .collect()
}
