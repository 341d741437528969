//! Structural analyses (spec §4.7): a battery of checks that walk a loaded
//! `Policy` looking for suspicious shapes — domains, file types, orphan
//! roles, impossible range transitions, and the like — each producing
//! `Item`s carrying `Proof`s rather than booleans.
//!
//! The original sechecker library registered each check as a callback
//! struct (`sechk_module_t`) pushed into a runtime list and wired by name
//! at init time. Spec §9's redesign note replaces that with a tagged-variant
//! registry: `AnalysisKind` enumerates every module, `depends_on` declares
//! static dependency edges, and `AnalysisRegistry::run` topologically sorts
//! and dispatches through a plain `match` instead of indirecting through
//! function pointers filled in at registration time.

mod constraints;
mod domains;
mod emptiness;
mod net_file;
mod range_transition;

use crate::error::AnalysisError;
use crate::fcontext::FileContextDb;
use crate::policy::Policy;
use crate::reporter::Proof;
use std::collections::HashMap;

/// External data an analysis may consult beyond the `Policy` itself.
/// Modules that don't need any of it simply ignore the fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisOptions<'a> {
    pub file_context: Option<&'a FileContextDb>,
}

/// One object under test and the proofs gathered about it. An `Item` with
/// no proofs is never constructed; a module that finds nothing produces an
/// `AnalysisResult` with an empty `items` vector instead.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Item {
    pub object: String,
    pub proofs: Vec<Proof>,
}

impl Item {
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            proofs: Vec::new(),
        }
    }

    pub fn with_proof(mut self, proof: Proof) -> Self {
        self.proofs.push(proof);
        self
    }
}

/// The result of running one analysis module.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnalysisResult {
    pub test_name: &'static str,
    pub item_kind: &'static str,
    pub items: Vec<Item>,
}

impl AnalysisResult {
    pub fn new(test_name: &'static str, item_kind: &'static str) -> Self {
        Self {
            test_name,
            item_kind,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn skipped(test_name: &'static str, item_kind: &'static str, requirement: &'static str) -> Self {
        Self {
            test_name,
            item_kind,
            items: vec![Item::new(format!("<{test_name}>")).with_proof(Proof::diagnostic(format!(
                "module skipped: unmet requirement '{requirement}'"
            )))],
        }
    }
}

/// Every registered analysis module, in the order sechecker's own
/// `sechk_register_modules` table lists the equivalent checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    FindDomains,
    FindFileTypes,
    FindNetTypes,
    FindAssociationTypes,
    ImpossibleRangeTransition,
    ConstraintInspection,
    AttribsWithoutTypes,
    AttribsWithoutRules,
    EmptyAttribute,
    RolesWithoutTypes,
    RolesWithoutAllow,
    RolesWithoutUsers,
    UnusedRole,
    TypesWithoutAllow,
    UsersWithoutRoles,
}

impl AnalysisKind {
    pub const ALL: &'static [AnalysisKind] = &[
        AnalysisKind::FindDomains,
        AnalysisKind::FindFileTypes,
        AnalysisKind::FindNetTypes,
        AnalysisKind::FindAssociationTypes,
        AnalysisKind::ImpossibleRangeTransition,
        AnalysisKind::ConstraintInspection,
        AnalysisKind::AttribsWithoutTypes,
        AnalysisKind::AttribsWithoutRules,
        AnalysisKind::EmptyAttribute,
        AnalysisKind::RolesWithoutTypes,
        AnalysisKind::RolesWithoutAllow,
        AnalysisKind::RolesWithoutUsers,
        AnalysisKind::UnusedRole,
        AnalysisKind::TypesWithoutAllow,
        AnalysisKind::UsersWithoutRoles,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AnalysisKind::FindDomains => "find_domains",
            AnalysisKind::FindFileTypes => "find_file_types",
            AnalysisKind::FindNetTypes => "find_net_types",
            AnalysisKind::FindAssociationTypes => "find_association_types",
            AnalysisKind::ImpossibleRangeTransition => "impossible_range_transition",
            AnalysisKind::ConstraintInspection => "constraint_inspection",
            AnalysisKind::AttribsWithoutTypes => "attribs_without_types",
            AnalysisKind::AttribsWithoutRules => "attribs_without_rules",
            AnalysisKind::EmptyAttribute => "empty_attribute",
            AnalysisKind::RolesWithoutTypes => "roles_without_types",
            AnalysisKind::RolesWithoutAllow => "roles_without_allow",
            AnalysisKind::RolesWithoutUsers => "roles_without_users",
            AnalysisKind::UnusedRole => "unused_role",
            AnalysisKind::TypesWithoutAllow => "types_without_allow",
            AnalysisKind::UsersWithoutRoles => "users_without_roles",
        }
    }

    pub fn from_name(name: &str) -> Option<AnalysisKind> {
        Self::ALL.iter().find(|k| k.name() == name).copied()
    }

    /// Static dependency edges. `unused_role` is the one module that reuses
    /// another two modules' findings rather than re-walking the policy
    /// (spec §9: "a stricter union of roles_without_allow and
    /// roles_without_users").
    pub fn depends_on(&self) -> &'static [&'static str] {
        match self {
            AnalysisKind::UnusedRole => &["roles_without_allow", "roles_without_users"],
            _ => &[],
        }
    }

    /// An unmet requirement, if any, that causes this module to skip rather
    /// than run against a policy that was not retained with enough detail
    /// (spec §7's "analyses that can run with reduced information emit a
    /// diagnostic proof of severity low rather than failing").
    fn requirement(&self, policy: &Policy) -> Option<&'static str> {
        match self {
            AnalysisKind::FindDomains if !policy.capabilities.attribute_names => {
                Some("policy must retain attribute names")
            }
            AnalysisKind::ConstraintInspection if policy.constraints.is_empty() && !policy.capabilities.source_form => {
                Some("policy must retain constraints in source form")
            }
            _ => None,
        }
    }

    fn run(
        &self,
        policy: &Policy,
        opts: &AnalysisOptions,
        deps: &HashMap<&'static str, AnalysisResult>,
    ) -> Result<AnalysisResult, AnalysisError> {
        if let Some(requirement) = self.requirement(policy) {
            return Ok(AnalysisResult::skipped(self.name(), self.item_kind(), requirement));
        }
        match self {
            AnalysisKind::FindDomains => domains::find_domains(policy),
            AnalysisKind::FindFileTypes => net_file::find_file_types(policy, opts),
            AnalysisKind::FindNetTypes => net_file::find_net_types(policy),
            AnalysisKind::FindAssociationTypes => net_file::find_association_types(policy),
            AnalysisKind::ImpossibleRangeTransition => range_transition::impossible_range_transition(policy),
            AnalysisKind::ConstraintInspection => constraints::constraint_inspection(policy),
            AnalysisKind::AttribsWithoutTypes => emptiness::attribs_without_types(policy),
            AnalysisKind::AttribsWithoutRules => emptiness::attribs_without_rules(policy),
            AnalysisKind::EmptyAttribute => emptiness::empty_attribute(policy),
            AnalysisKind::RolesWithoutTypes => emptiness::roles_without_types(policy),
            AnalysisKind::RolesWithoutAllow => emptiness::roles_without_allow(policy),
            AnalysisKind::RolesWithoutUsers => emptiness::roles_without_users(policy),
            AnalysisKind::UnusedRole => emptiness::unused_role(policy, deps),
            AnalysisKind::TypesWithoutAllow => emptiness::types_without_allow(policy),
            AnalysisKind::UsersWithoutRoles => emptiness::users_without_roles(policy),
        }
    }

    fn item_kind(&self) -> &'static str {
        match self {
            AnalysisKind::FindDomains
            | AnalysisKind::FindFileTypes
            | AnalysisKind::FindNetTypes
            | AnalysisKind::FindAssociationTypes
            | AnalysisKind::AttribsWithoutTypes
            | AnalysisKind::AttribsWithoutRules
            | AnalysisKind::EmptyAttribute
            | AnalysisKind::TypesWithoutAllow => "type",
            AnalysisKind::ImpossibleRangeTransition => "range_transition",
            AnalysisKind::ConstraintInspection => "constraint",
            AnalysisKind::RolesWithoutTypes
            | AnalysisKind::RolesWithoutAllow
            | AnalysisKind::RolesWithoutUsers
            | AnalysisKind::UnusedRole => "role",
            AnalysisKind::UsersWithoutRoles => "user",
        }
    }
}

/// Dispatches `AnalysisKind`s against a `Policy` in dependency order.
pub struct AnalysisRegistry;

impl AnalysisRegistry {
    /// Run every kind in `selected`, plus whatever dependencies they
    /// declare, each exactly once, dependencies before dependents. Returns
    /// one `AnalysisResult` per distinct name reached, keyed by
    /// `AnalysisKind::name()`.
    pub fn run(
        policy: &Policy,
        selected: &[AnalysisKind],
        opts: &AnalysisOptions,
    ) -> Result<HashMap<&'static str, AnalysisResult>, AnalysisError> {
        let order = topo_order(selected)?;
        let mut results = HashMap::new();
        for kind in order {
            let result = kind.run(policy, opts, &results)?;
            results.insert(kind.name(), result);
        }
        Ok(results)
    }
}

/// Expand `selected` to include its transitive dependencies and return a
/// dependency-respecting order via iterative-deepening DFS post-order.
fn topo_order(selected: &[AnalysisKind]) -> Result<Vec<AnalysisKind>, AnalysisError> {
    #[derive(PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut marks: HashMap<&'static str, Mark> = HashMap::new();
    let mut order = Vec::new();
    let mut stack: Vec<&'static str> = Vec::new();

    fn visit(
        name: &'static str,
        marks: &mut HashMap<&'static str, Mark>,
        stack: &mut Vec<&'static str>,
        order: &mut Vec<AnalysisKind>,
    ) -> Result<(), AnalysisError> {
        match marks.get(&name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let mut cycle: Vec<&'static str> = stack.clone();
                cycle.push(name);
                return Err(AnalysisError::DependencyCycle { cycle });
            }
            None => {}
        }
        let kind = AnalysisKind::from_name(name).ok_or(AnalysisError::UnknownDependency {
            module: stack.last().copied().unwrap_or(name),
            dependency: name,
        })?;
        marks.insert(name, Mark::Visiting);
        stack.push(name);
        for dep in kind.depends_on() {
            visit(dep, marks, stack, order)?;
        }
        stack.pop();
        marks.insert(name, Mark::Done);
        order.push(kind);
        Ok(())
    }

    for kind in selected {
        visit(kind.name(), &mut marks, &mut stack, &mut order)?;
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_name_roundtrips() {
        for kind in AnalysisKind::ALL {
            assert_eq!(AnalysisKind::from_name(kind.name()), Some(*kind));
        }
    }

    #[test]
    fn unused_role_dependencies_run_first() {
        let order = topo_order(&[AnalysisKind::UnusedRole]).unwrap();
        let positions: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, k)| (k.name(), i))
            .collect();
        assert!(positions["roles_without_allow"] < positions["unused_role"]);
        assert!(positions["roles_without_users"] < positions["unused_role"]);
    }

    #[test]
    fn selecting_the_same_dependency_twice_runs_it_once() {
        let order = topo_order(&[AnalysisKind::RolesWithoutAllow, AnalysisKind::UnusedRole]).unwrap();
        let count = order.iter().filter(|k| **k == AnalysisKind::RolesWithoutAllow).count();
        assert_eq!(count, 1);
    }
}
