//! Exclusion filter for instances that must not reach the validator
//!
//! Projects can exclude instances by code system url or by resource type
//! (typically because the terminology server cannot resolve project-local
//! systems). Excluded instances are reported as warnings, not failures, so
//! the run finishes and is marked as partially validated.

use indexmap::IndexSet;

use crate::artifact::InstanceRecord;
use crate::report::ValidationStatus;
use crate::scanner::InstanceDeclaration;

/// Why an instance was kept from the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionDecision {
    /// The instance uses at least one excluded code system
    ExcludedCodeSystem,
    /// The instance's resource type is excluded
    ExcludedResourceType,
    /// The instance may be validated
    Pass,
}

/// Configured exclusion sets
#[derive(Debug, Default, Clone)]
pub struct ExclusionFilter {
    code_systems: IndexSet<String>,
    resource_types: IndexSet<String>,
}

impl ExclusionFilter {
    pub fn new(code_systems: IndexSet<String>, resource_types: IndexSet<String>) -> Self {
        Self {
            code_systems,
            resource_types,
        }
    }

    /// Decide whether an instance may be validated. The code system check
    /// runs first; only the first matching reason is reported.
    pub fn decide(&self, instance: &InstanceRecord) -> ExclusionDecision {
        if instance
            .code_systems
            .iter()
            .any(|cs| self.code_systems.contains(cs))
        {
            ExclusionDecision::ExcludedCodeSystem
        } else if self.resource_types.contains(&instance.resource_type) {
            ExclusionDecision::ExcludedResourceType
        } else {
            ExclusionDecision::Pass
        }
    }

    /// Synthetic warning status for a skipped instance, or None when the
    /// instance passes the filter.
    pub fn skip_status(
        &self,
        declaration: &InstanceDeclaration,
        instance: &InstanceRecord,
    ) -> Option<ValidationStatus> {
        let warning = match self.decide(instance) {
            ExclusionDecision::ExcludedCodeSystem => format!(
                "Skipped instance {} due to excluded code system(s) used in the instance",
                declaration.name
            ),
            ExclusionDecision::ExcludedResourceType => format!(
                "Skipped instance {} due to excluded resource type {}",
                declaration.name, instance.resource_type
            ),
            ExclusionDecision::Pass => return None,
        };

        let mut status = ValidationStatus::warning(vec![warning], declaration.instance_of.clone());
        status.instance = declaration.name.clone();
        Some(status)
    }
}
