//! `find_domains` (spec §4.7): a type is a domain when it carries the
//! configured domain attribute, is the source of a non-filesystem AV rule,
//! is the default type of a `type_transition` to class `process`, or is
//! assigned to a role other than `object_r`. Any one clause is sufficient;
//! every clause that holds is recorded as a `Proof::satisfied`.

use super::{AnalysisResult, Item};
use crate::error::AnalysisError;
use crate::rbac::OBJECT_R;
use crate::reporter::Proof;
use crate::policy::Policy;
use crate::rules::TeRuleKind;
use crate::types::TypeKind;

pub fn find_domains(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("find_domains", "type");
    let domain_attr_id = policy.types.id_of(&policy.config.domain_attribute);

    for (type_id, record) in policy.types.iter() {
        if record.kind != TypeKind::Concrete {
            continue;
        }
        let mut proofs = Vec::new();

        if let Some(attr_id) = domain_attr_id {
            if policy.types.attributes_of(type_id).any(|a| a == attr_id) {
                proofs.push(Proof::satisfied(format!(
                    "{} carries the {} attribute",
                    record.name, policy.config.domain_attribute
                )));
            }
        }

        let is_source_of_non_fs_rule = policy.av_rules().iter().any(|rule| {
            rule.source.expand_literal(&policy.types).contains(type_id)
                && rule
                    .classes()
                    .any(|c| policy.classes.get(c).map(|cl| cl.name != "filesystem").unwrap_or(false))
        });
        if is_source_of_non_fs_rule {
            proofs.push(Proof::satisfied(format!(
                "{} is the source of an AV rule on a non-filesystem class",
                record.name
            )));
        }

        let is_process_transition_default = policy.te_rules().iter().any(|rule| {
            rule.kind == TeRuleKind::TypeTransition
                && rule.default_type == type_id
                && rule
                    .classes
                    .iter()
                    .any(|c| policy.classes.get(c).map(|cl| cl.name == "process").unwrap_or(false))
        });
        if is_process_transition_default {
            proofs.push(Proof::satisfied(format!(
                "{} is the default type of a type_transition to class process",
                record.name
            )));
        }

        let has_non_object_r_role = policy
            .roles
            .iter()
            .any(|(_, role)| role.name != OBJECT_R && role.types.contains(type_id));
        if has_non_object_r_role {
            proofs.push(Proof::satisfied(format!(
                "{} is assigned to a role other than object_r",
                record.name
            )));
        }

        if !proofs.is_empty() {
            result.items.push(Item {
                object: record.name.clone(),
                proofs,
            });
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::ObjectClass;
    use crate::config::PolicyEngineConfig;
    use crate::identity::{HandleId, PermId};
    use crate::rbac::Role;
    use crate::rules::{AvRule, AvRuleKind, TypeSet};
    use std::collections::HashMap;

    #[test]
    fn domain_attribute_member_is_reported() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let domain = policy.types.declare("domain", TypeKind::Attribute);
        let t = policy.types.declare("sshd_t", TypeKind::Concrete);
        policy.types.add_member(domain, t);

        let result = find_domains(&policy).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].object, "sshd_t");
    }

    #[test]
    fn source_of_non_filesystem_rule_is_reported() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let t_a = policy.types.declare("t_a", TypeKind::Concrete);
        let t_b = policy.types.declare("t_b", TypeKind::Concrete);
        let process_id = policy.classes.insert("process", ObjectClass::new("process", None));
        let sig_idx = policy
            .classes
            .get_mut(process_id)
            .unwrap()
            .add_perm(PermId::from_index(0), "sigkill", process_id);
        let mut perms = crate::classes::PermissionSet::new();
        perms.insert(sig_idx);
        let mut perm_map = HashMap::new();
        perm_map.insert(process_id, perms);
        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t_a),
            target: TypeSet::single(t_b),
            perms: perm_map,
            conditional: None,
        });

        let result = find_domains(&policy).unwrap();
        assert_eq!(result.items.iter().find(|i| i.object == "t_a").unwrap().proofs.len(), 1);
        assert!(result.items.iter().all(|i| i.object != "t_b"));
    }

    #[test]
    fn role_assignment_other_than_object_r_is_reported() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let t = policy.types.declare("sysadm_t", TypeKind::Concrete);
        let mut role = Role::new("sysadm_r");
        role.types.insert(t);
        policy.roles.insert("sysadm_r", role);

        let result = find_domains(&policy).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].object, "sysadm_t");
    }
}
