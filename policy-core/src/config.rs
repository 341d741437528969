//! Configuration for the policy engine.

use crate::error::{Error, QueryError};
use serde::{Deserialize, Serialize};

/// Capacity hints for the arenas a `Policy` allocates while loading.
///
/// These only pre-size `Vec`s; under-estimating is never incorrect, just
/// slower (more reallocation during load).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CapacityHints {
    pub types: usize,
    pub classes: usize,
    pub roles: usize,
    pub users: usize,
    pub av_rules: usize,
    pub te_rules: usize,
}

impl Default for CapacityHints {
    fn default() -> Self {
        Self {
            types: 256,
            classes: 64,
            roles: 16,
            users: 8,
            av_rules: 4096,
            te_rules: 256,
        }
    }
}

/// Master configuration struct for the policy engine.
///
/// All values are required — no defaults are chosen silently for anything
/// that changes analysis results (the `domain_attribute` name, in
/// particular, is policy-dependent and must be supplied explicitly).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PolicyEngineConfig {
    /// Capacity hints applied when constructing a `Policy`.
    pub capacity_hints: CapacityHints,

    /// Name of the attribute the "find domains" analysis treats as marking
    /// a type as a process domain (commonly `"domain"`).
    pub domain_attribute: String,

    /// Severity threshold below which analysis Proofs are suppressed from
    /// the default reporter (still computed, just not surfaced).
    pub min_reported_severity: crate::reporter::Severity,

    /// Whether `Query::run` should eagerly build the rule hash index before
    /// the first lookup (`true`) or build it lazily on first access
    /// (`false`). Either is a conforming implementation of the
    /// "one-shot initialization barrier" contract.
    pub eager_index_build: bool,
}

impl PolicyEngineConfig {
    /// Build a configuration with the conventional SELinux reference-policy
    /// defaults (`domain_attribute = "domain"`, lazy index, all Proofs
    /// reported).
    pub fn reference_policy_defaults() -> Self {
        Self {
            capacity_hints: CapacityHints::default(),
            domain_attribute: "domain".to_string(),
            min_reported_severity: crate::reporter::Severity::None,
            eager_index_build: false,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), Error> {
        if self.domain_attribute.trim().is_empty() {
            return Err(Error::Query(QueryError::InvalidArgument {
                reason: "domain_attribute must not be empty".to_string(),
            }));
        }
        Ok(())
    }
}
