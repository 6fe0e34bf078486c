//! Validator invocation construction
//!
//! Instances are batched by effective profile and each group becomes one
//! validator invocation: the validator's startup and terminology-load cost
//! is fixed per process, so all of a group's instance files ride along as
//! trailing positional arguments.
//!
//! Commands are structured argument vectors, never shell strings, and the
//! argument order is fixed (IG package directives, resolved local profiles,
//! value sets, code systems, extensions, optional `-profile`, instance
//! files) so two runs over identical input produce byte-identical commands.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};

use crate::artifact::ArtifactIndex;
use crate::error::FshvError;
use crate::resolve::profiles_to_include;
use crate::result::Result;
use crate::scanner::InstanceDeclaration;

/// A fully resolved external command (argv form)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for ValidatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program, self.args.join(" "))
    }
}

/// One instance scheduled for validation
#[derive(Debug, Clone)]
pub struct PlannedInstance {
    /// Declared instance name (`Instance:` line)
    pub name: String,
    /// Declared target profile name (`InstanceOf:` line)
    pub instance_of: String,
    /// Profile url from the generated instance, or the resource type when
    /// none was declared
    pub profile: String,
    /// True when the generated instance carries `meta.profile`
    pub explicit_profile: bool,
    /// Generated instance file handed to the validator
    pub filename: PathBuf,
}

impl PlannedInstance {
    pub fn new(declaration: &InstanceDeclaration, record: &crate::artifact::InstanceRecord) -> Self {
        Self {
            name: declaration.name.clone(),
            instance_of: declaration.instance_of.clone(),
            profile: record.profile.clone(),
            explicit_profile: record.explicit_profile,
            filename: record.filename.clone(),
        }
    }

    /// Group key: the declared profile url, or None for instances without
    /// an explicit profile (validated generically, no `-profile` argument).
    pub fn group_key(&self) -> Option<String> {
        if self.explicit_profile {
            Some(self.profile.clone())
        } else {
            None
        }
    }
}

/// One validator invocation for a group of instances
#[derive(Debug, Clone)]
pub struct InvocationPlan {
    /// Profile url the group is validated against, if any
    pub profile: Option<String>,
    pub instances: Vec<PlannedInstance>,
    pub command: ValidatorCommand,
}

/// Group planned instances by effective profile, preserving first-seen
/// group order and instance order within each group.
pub fn group_by_profile(
    instances: Vec<PlannedInstance>,
) -> IndexMap<Option<String>, Vec<PlannedInstance>> {
    let mut groups: IndexMap<Option<String>, Vec<PlannedInstance>> = IndexMap::new();
    for instance in instances {
        groups.entry(instance.group_key()).or_default().push(instance);
    }
    groups
}

/// Builds validator commands against one artifact index
pub struct InvocationBuilder<'a> {
    index: &'a ArtifactIndex,
    validator_jar: &'a Path,
    fhir_version: &'a str,
}

impl<'a> InvocationBuilder<'a> {
    pub fn new(index: &'a ArtifactIndex, validator_jar: &'a Path, fhir_version: &'a str) -> Self {
        Self {
            index,
            validator_jar,
            fhir_version,
        }
    }

    /// Produce one invocation plan per profile group
    pub fn plan(
        &self,
        groups: IndexMap<Option<String>, Vec<PlannedInstance>>,
    ) -> Result<Vec<InvocationPlan>> {
        groups
            .into_iter()
            .map(|(profile, instances)| {
                let command = self.build_command(profile.as_deref(), &instances)?;
                Ok(InvocationPlan {
                    profile,
                    instances,
                    command,
                })
            })
            .collect()
    }

    fn build_command(
        &self,
        profile: Option<&str>,
        instances: &[PlannedInstance],
    ) -> Result<ValidatorCommand> {
        let mut args: Vec<String> = vec![
            "-jar".into(),
            self.validator_jar.display().to_string(),
            "-version".into(),
            self.fhir_version.into(),
            "-txLog".into(),
            "logs/txlog.html".into(),
        ];

        for dep in self.index.dependencies.values() {
            args.push("-ig".into());
            args.push(dep.directive());
        }

        // Union of each instance's dependency closure, first-seen order.
        let mut closure: IndexSet<String> = IndexSet::new();
        for instance in instances {
            let record = self.index.instances.get(&instance.name).ok_or_else(|| {
                FshvError::internal_error(format!(
                    "planned instance '{}' is not in the artifact index",
                    instance.name
                ))
            })?;
            closure.extend(profiles_to_include(self.index, record)?);
        }
        for url in &closure {
            if let Some(sd) = self.index.profiles.get(url) {
                args.push("-ig".into());
                args.push(sd.filename.display().to_string());
            }
        }

        // Terminology and extensions are global includes on every call.
        for vs in self.index.value_sets.values() {
            args.push("-ig".into());
            args.push(vs.filename.display().to_string());
        }
        for cs in self.index.code_systems.values() {
            args.push("-ig".into());
            args.push(cs.filename.display().to_string());
        }
        for extension in self.index.extensions.values() {
            args.push("-ig".into());
            args.push(extension.filename.display().to_string());
        }

        if let Some(profile) = profile {
            args.push("-profile".into());
            args.push(profile.into());
        }

        for instance in instances {
            args.push(instance.filename.display().to_string());
        }

        Ok(ValidatorCommand {
            program: "java".into(),
            args,
        })
    }
}
