//! The "declared but unused" family of analyses (spec §4.7): attributes,
//! roles, types, and users that exist in the policy but never participate
//! in anything that would give them effect.

use super::{AnalysisResult, Item};
use crate::error::AnalysisError;
use crate::policy::Policy;
use crate::rbac::OBJECT_R;
use crate::reporter::Proof;
use crate::rules::AvRuleKind;
use crate::types::TypeKind;
use std::collections::{HashMap, HashSet};

pub fn attribs_without_types(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("attribs_without_types", "attribute");
    for (id, record) in policy.types.iter() {
        if record.kind != TypeKind::Attribute {
            continue;
        }
        if policy.types.members_of(id).next().is_none() {
            result
                .items
                .push(Item::new(record.name.clone()).with_proof(Proof::missing(format!("{} has no member types", record.name))));
        }
    }
    Ok(result)
}

/// Attributes that do have members but whose expansion is never named as
/// the source or target of any AV or TE rule — distinct from
/// `attribs_without_types`, which flags attributes with no members at all.
pub fn attribs_without_rules(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("attribs_without_rules", "attribute");
    for (id, record) in policy.types.iter() {
        if record.kind != TypeKind::Attribute {
            continue;
        }
        if policy.types.members_of(id).next().is_none() {
            continue;
        }
        let used = policy.av_rules().iter().any(|r| r.source.types.contains(id) || r.target.types.contains(id))
            || policy.te_rules().iter().any(|r| r.source.types.contains(id) || r.target.types.contains(id));
        if !used {
            result.items.push(Item::new(record.name.clone()).with_proof(Proof::missing(format!(
                "{} is never named as source or target of any rule",
                record.name
            ))));
        }
    }
    Ok(result)
}

/// Kept as a separate module (distinct `test_name`) for parity with
/// sechecker's own module list, even though the check it runs coincides
/// with `attribs_without_types`'s "zero member types" clause — see
/// DESIGN.md for the resolution of this overlap.
pub fn empty_attribute(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut inner = attribs_without_types(policy)?;
    inner.test_name = "empty_attribute";
    Ok(inner)
}

pub fn roles_without_types(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("roles_without_types", "role");
    for (_, role) in policy.roles.iter() {
        if role.name == OBJECT_R {
            continue;
        }
        if role.types.is_empty() {
            result
                .items
                .push(Item::new(role.name.clone()).with_proof(Proof::missing(format!("{} has no assigned types", role.name))));
        }
    }
    Ok(result)
}

pub fn roles_without_allow(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("roles_without_allow", "role");
    for (id, role) in policy.roles.iter() {
        if role.name == OBJECT_R {
            continue;
        }
        let used = policy.role_allows.iter().any(|ra| ra.source.contains(id) || ra.target.contains(id));
        if !used {
            result.items.push(Item::new(role.name.clone()).with_proof(Proof::missing(format!(
                "{} does not appear in any role_allow rule",
                role.name
            ))));
        }
    }
    Ok(result)
}

pub fn roles_without_users(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("roles_without_users", "role");
    for (id, role) in policy.roles.iter() {
        if role.name == OBJECT_R {
            continue;
        }
        let held = policy.users.iter().any(|(_, u)| u.roles.contains(id));
        if !held {
            result
                .items
                .push(Item::new(role.name.clone()).with_proof(Proof::missing(format!("no user holds {}", role.name))));
        }
    }
    Ok(result)
}

/// A role unreachable through any of role_allow, role_transition, or user
/// assignment: the intersection of `roles_without_allow` and
/// `roles_without_users`, further narrowed by checking it is never a
/// role_transition default either.
pub fn unused_role(policy: &Policy, deps: &HashMap<&'static str, AnalysisResult>) -> Result<AnalysisResult, AnalysisError> {
    let without_allow = deps.get("roles_without_allow").ok_or(AnalysisError::UnmetRequirement {
        module: "unused_role",
        requirement: "roles_without_allow",
    })?;
    let without_users = deps.get("roles_without_users").ok_or(AnalysisError::UnmetRequirement {
        module: "unused_role",
        requirement: "roles_without_users",
    })?;

    let allow_set: HashSet<&str> = without_allow.items.iter().map(|i| i.object.as_str()).collect();
    let users_set: HashSet<&str> = without_users.items.iter().map(|i| i.object.as_str()).collect();

    let mut result = AnalysisResult::new("unused_role", "role");
    for (id, role) in policy.roles.iter() {
        if role.name == OBJECT_R {
            continue;
        }
        if !allow_set.contains(role.name.as_str()) || !users_set.contains(role.name.as_str()) {
            continue;
        }
        let is_transition_default = policy.role_transitions.iter().any(|rt| rt.default_role == id);
        if is_transition_default {
            continue;
        }
        result.items.push(Item::new(role.name.clone()).with_proof(Proof::missing(format!(
            "{} is never a role_allow endpoint, role_transition default, or user's role",
            role.name
        ))));
    }
    Ok(result)
}

pub fn types_without_allow(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("types_without_allow", "type");
    for (id, record) in policy.types.iter() {
        if record.kind != TypeKind::Concrete {
            continue;
        }
        let used = policy.av_rules().iter().any(|r| {
            r.kind == AvRuleKind::Allow
                && (r.source.expand_literal(&policy.types).contains(id) || r.target.expand_literal(&policy.types).contains(id))
        });
        if !used {
            result.items.push(Item::new(record.name.clone()).with_proof(Proof::missing(format!(
                "{} never appears as source or target of an allow rule",
                record.name
            ))));
        }
    }
    Ok(result)
}

pub fn users_without_roles(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("users_without_roles", "user");
    for (_, user) in policy.users.iter() {
        if user.roles.is_empty() {
            result
                .items
                .push(Item::new(user.name.clone()).with_proof(Proof::missing(format!("{} has no assigned roles", user.name))));
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisOptions;
    use crate::config::PolicyEngineConfig;
    use crate::rbac::{Role, User};
    use crate::rules::{RoleAllow, RoleTransition, TypeSet};
    use crate::idset::IdSet;

    #[test]
    fn attribute_with_no_members_is_reported() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        policy.types.declare("a", TypeKind::Attribute);
        let result = attribs_without_types(&policy).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].object, "a");
    }

    #[test]
    fn attribute_with_members_but_unused_in_rules_is_reported() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let a = policy.types.declare("a", TypeKind::Attribute);
        let t = policy.types.declare("t_a", TypeKind::Concrete);
        policy.types.add_member(a, t);
        let result = attribs_without_rules(&policy).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].object, "a");
    }

    #[test]
    fn scenario_f_orphan_role_has_no_allow_and_no_user() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let t = policy.types.declare("t_orphan", TypeKind::Concrete);
        let mut orphan = Role::new("r_orphan");
        orphan.types.insert(t);
        policy.roles.insert("r_orphan", orphan);

        let mut staff = Role::new("staff_r");
        staff.types.insert(t);
        let staff_id = policy.roles.insert("staff_r", staff);
        let mut user = User::new("staff_u");
        user.roles.insert(staff_id);
        policy.users.insert("staff_u", user);

        let mut source = IdSet::new();
        source.insert(staff_id);
        policy.role_allows.push(RoleAllow { source, target: IdSet::new() });

        let without_allow = roles_without_allow(&policy).unwrap();
        let without_users = roles_without_users(&policy).unwrap();
        assert!(without_allow.items.iter().any(|i| i.object == "r_orphan"));
        assert!(without_users.items.iter().any(|i| i.object == "r_orphan"));

        let mut deps = HashMap::new();
        deps.insert("roles_without_allow", without_allow);
        deps.insert("roles_without_users", without_users);
        let unused = unused_role(&policy, &deps).unwrap();
        assert_eq!(unused.items.len(), 1);
        assert_eq!(unused.items[0].object, "r_orphan");
        let _ = AnalysisOptions::default();
    }

    #[test]
    fn object_r_is_excluded_from_the_without_family() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        policy.roles.insert(OBJECT_R, Role::new(OBJECT_R));

        let without_types = roles_without_types(&policy).unwrap();
        let without_allow = roles_without_allow(&policy).unwrap();
        let without_users = roles_without_users(&policy).unwrap();
        assert!(without_types.items.is_empty());
        assert!(without_allow.items.is_empty());
        assert!(without_users.items.is_empty());
    }

    #[test]
    fn role_transition_default_excuses_a_role_from_unused_role() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let t = policy.types.declare("t_a", TypeKind::Concrete);
        let role_id = policy.roles.insert("sysadm_r", Role::new("sysadm_r"));
        policy.role_transitions.push(RoleTransition {
            source_roles: IdSet::new(),
            target_types: TypeSet::single(t),
            default_role: role_id,
        });

        let without_allow = roles_without_allow(&policy).unwrap();
        let without_users = roles_without_users(&policy).unwrap();
        let mut deps = HashMap::new();
        deps.insert("roles_without_allow", without_allow);
        deps.insert("roles_without_users", without_users);
        let unused = unused_role(&policy, &deps).unwrap();
        assert!(unused.items.is_empty());
    }
}
