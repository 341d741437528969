//! `impossible_range_transition` (spec §4.7, Scenario E): a range_transition
//! rule is impossible unless three things all hold — an AV rule allows
//! `file execute` from source to target, some role is bound to the source
//! type, and some user holding that role has an MLS range wide enough to
//! contain the transition's target range. Each missing piece is its own
//! `Proof::missing`; the rule is impossible iff at least one is missing.

use super::{AnalysisResult, Item};
use crate::error::AnalysisError;
use crate::identity::TypeId;
use crate::policy::Policy;
use crate::reporter::Proof;
use crate::rules::{AvRuleKind, TypeSet};

fn type_set_label(set: &TypeSet, policy: &Policy) -> String {
    let mut names: Vec<&str> = set
        .types
        .iter()
        .filter_map(|id| policy.types.get(id))
        .map(|t| t.name.as_str())
        .collect();
    names.sort_unstable();
    if set.includes_self {
        names.push("self");
    }
    match names.as_slice() {
        [] => "<empty>".to_string(),
        [single] => single.to_string(),
        many => format!("{{ {} }}", many.join(" ")),
    }
}

fn av_allows(policy: &Policy, src: TypeId, tgt: TypeId, class_name: &str, perm_name: &str) -> bool {
    let Some(class_id) = policy.classes.id_of(class_name) else {
        return false;
    };
    let Some(class) = policy.classes.get(class_id) else {
        return false;
    };
    let Some(perm_idx) = class.local_index_of(perm_name) else {
        return false;
    };
    policy.av_rules().iter().any(|r| {
        r.kind == AvRuleKind::Allow
            && r.source.expand_literal(&policy.types).contains(src)
            && r.target.expand(src, &policy.types).contains(tgt)
            && r.perms.get(&class_id).map(|p| p.contains(perm_idx)).unwrap_or(false)
    })
}

pub fn impossible_range_transition(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("impossible_range_transition", "range_transition");

    for rule in &policy.range_transitions {
        let mut proofs = Vec::new();
        let expanded_sources: Vec<TypeId> = rule.source.expand_literal(&policy.types).iter().collect();

        let mut has_execute = false;
        'outer: for &source in &expanded_sources {
            for target in rule.target.expand(source, &policy.types).iter() {
                if av_allows(policy, source, target, "file", "execute") {
                    has_execute = true;
                    break 'outer;
                }
            }
        }
        if !has_execute {
            proofs.push(Proof::missing(format!(
                "Missing: allow {} {} : file execute;",
                type_set_label(&rule.source, policy),
                type_set_label(&rule.target, policy)
            )));
        }

        let role_ids_for_source: Vec<_> = policy
            .roles
            .iter()
            .filter(|(_, role)| expanded_sources.iter().any(|s| role.types.contains(*s)))
            .map(|(id, _)| id)
            .collect();
        if role_ids_for_source.is_empty() {
            proofs.push(Proof::missing(format!(
                "Missing: a role bound to {}",
                type_set_label(&rule.source, policy)
            )));
        }

        let has_qualifying_user = policy.users.iter().any(|(_, user)| {
            user.roles.iter().any(|r| role_ids_for_source.contains(&r))
                && user
                    .range
                    .as_ref()
                    .map(|range| range.contains_range(&rule.target_range, &policy.sens))
                    .unwrap_or(false)
        });
        if !has_qualifying_user {
            proofs.push(Proof::missing(
                "Missing: a user holding that role with an MLS range containing the transition's range",
            ));
        }

        if !proofs.is_empty() {
            let label = crate::render::render_range_transition(rule, policy);
            result.items.push(Item { object: label, proofs });
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{ObjectClass, PermissionSet};
    use crate::config::PolicyEngineConfig;
    use crate::identity::{HandleId, PermId};
    use crate::mls::{Level, Range, Sensitivity};
    use crate::rbac::{Role, User};
    use crate::idset::IdSet;
    use crate::types::TypeKind;
    use std::collections::HashMap;

    fn s0_level(policy: &mut Policy) -> Level {
        let s0 = policy.sens.insert(
            "s0",
            Sensitivity {
                name: "s0".into(),
                order: 0,
                legal_cats: IdSet::new(),
            },
        );
        Level::new(s0, IdSet::new())
    }

    #[test]
    fn scenario_e_missing_execute_rule_is_impossible() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let sysadm_t = policy.types.declare("sysadm_t", TypeKind::Concrete);
        let passwd_exec_t = policy.types.declare("passwd_exec_t", TypeKind::Concrete);
        let level = s0_level(&mut policy);

        let mut role = Role::new("sysadm_r");
        role.types.insert(sysadm_t);
        let role_id = policy.roles.insert("sysadm_r", role);
        let mut user = User::new("sysadm_u");
        user.roles.insert(role_id);
        user.range = Some(Range::single(level.clone()));
        policy.users.insert("sysadm_u", user);

        policy.range_transitions.push(crate::rules::RangeTransition {
            source: TypeSet::single(sysadm_t),
            target: TypeSet::single(passwd_exec_t),
            target_range: Range::single(level),
        });

        let result = impossible_range_transition(&policy).unwrap();
        assert_eq!(result.items.len(), 1);
        assert!(result.items[0]
            .proofs
            .iter()
            .any(|p| p.text == "Missing: allow sysadm_t passwd_exec_t : file execute;"));
    }

    #[test]
    fn fully_satisfied_transition_reports_nothing() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let sysadm_t = policy.types.declare("sysadm_t", TypeKind::Concrete);
        let passwd_exec_t = policy.types.declare("passwd_exec_t", TypeKind::Concrete);
        let level = s0_level(&mut policy);

        let file_id = policy.classes.insert("file", ObjectClass::new("file", None));
        let exec_idx = policy
            .classes
            .get_mut(file_id)
            .unwrap()
            .add_perm(PermId::from_index(0), "execute", file_id);
        let mut perms = PermissionSet::new();
        perms.insert(exec_idx);
        let mut perm_map = HashMap::new();
        perm_map.insert(file_id, perms);
        policy.add_av_rule(crate::rules::AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(sysadm_t),
            target: TypeSet::single(passwd_exec_t),
            perms: perm_map,
            conditional: None,
        });

        let mut role = Role::new("sysadm_r");
        role.types.insert(sysadm_t);
        let role_id = policy.roles.insert("sysadm_r", role);
        let mut user = User::new("sysadm_u");
        user.roles.insert(role_id);
        user.range = Some(Range::single(level.clone()));
        policy.users.insert("sysadm_u", user);

        policy.range_transitions.push(crate::rules::RangeTransition {
            source: TypeSet::single(sysadm_t),
            target: TypeSet::single(passwd_exec_t),
            target_range: Range::single(level),
        });

        let result = impossible_range_transition(&policy).unwrap();
        assert!(result.items.is_empty());
    }
}
