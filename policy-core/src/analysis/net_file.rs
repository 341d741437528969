//! `find_file_types`, `find_net_types`, `find_association_types` (spec
//! §4.7): symmetric "does this type show up where files/network endpoints
//! usually show up" checks, each keyed off a fixed class-name list the way
//! sechecker's own modules hardcode `file`/`dir`/`tcp_socket` and friends.

use super::{AnalysisOptions, AnalysisResult, Item};
use crate::context::InitialSid;
use crate::error::AnalysisError;
use crate::policy::Policy;
use crate::reporter::Proof;
use crate::types::TypeKind;

const FILE_CLASSES: &[&str] = &[
    "file",
    "dir",
    "lnk_file",
    "chr_file",
    "blk_file",
    "sock_file",
    "fifo_file",
    "filesystem",
];

const NET_CLASSES: &[&str] = &["netif", "tcp_socket", "udp_socket", "node", "association"];

pub fn find_file_types(policy: &Policy, opts: &AnalysisOptions) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("find_file_types", "type");

    let associate_lookup = policy.classes.id_of("filesystem").and_then(|fs_class_id| {
        policy
            .classes
            .get(fs_class_id)
            .and_then(|cl| cl.local_index_of("associate"))
            .map(|idx| (fs_class_id, idx))
    });

    for (type_id, record) in policy.types.iter() {
        if record.kind != TypeKind::Concrete {
            continue;
        }
        let mut proofs = Vec::new();

        let is_target_of_file_class = policy.av_rules().iter().any(|r| {
            r.target.expand_literal(&policy.types).contains(type_id)
                && r.classes()
                    .any(|c| policy.classes.get(c).map(|cl| FILE_CLASSES.contains(&cl.name.as_str())).unwrap_or(false))
        });
        if is_target_of_file_class {
            proofs.push(Proof::satisfied(format!(
                "{} is the target of an AV rule on a filesystem-related class",
                record.name
            )));
        }

        if let Some((fs_class_id, associate_idx)) = associate_lookup {
            let has_associate = policy.av_rules().iter().any(|r| {
                r.source.expand_literal(&policy.types).contains(type_id)
                    && r.perms.get(&fs_class_id).map(|p| p.contains(associate_idx)).unwrap_or(false)
            });
            if has_associate {
                proofs.push(Proof::satisfied(format!(
                    "{} has associate permission on class filesystem",
                    record.name
                )));
            }
        }

        if let Some(db) = opts.file_context {
            if db.entries().iter().any(|e| e.context.type_ == type_id) {
                proofs.push(Proof::satisfied(format!(
                    "{} labels an entry in the supplied file-context database",
                    record.name
                )));
            }
        } else {
            proofs.push(Proof::diagnostic(
                "no file-context database was supplied to this analysis",
            ));
        }

        if proofs.iter().any(|p| p.kind == crate::reporter::ProofKind::Satisfied) {
            result.items.push(Item {
                object: record.name.clone(),
                proofs,
            });
        }
    }

    Ok(result)
}

pub fn find_net_types(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("find_net_types", "type");

    for (type_id, record) in policy.types.iter() {
        if record.kind != TypeKind::Concrete {
            continue;
        }
        let is_source_of_net_class = policy.av_rules().iter().any(|r| {
            r.source.expand_literal(&policy.types).contains(type_id)
                && r.classes()
                    .any(|c| policy.classes.get(c).map(|cl| NET_CLASSES.contains(&cl.name.as_str())).unwrap_or(false))
        });
        if is_source_of_net_class {
            let proofs = vec![
                Proof::satisfied(format!("{} is the source of an AV rule on a network class", record.name)),
                Proof::diagnostic("portcon/nodecon/netifcon entries were not supplied to this analysis"),
            ];
            result.items.push(Item {
                object: record.name.clone(),
                proofs,
            });
        }
    }

    Ok(result)
}

pub fn find_association_types(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("find_association_types", "type");

    if let Some(ctx) = policy.initial_sids.get(&InitialSid::Unlabeled) {
        if let Some(t) = policy.types.get(ctx.type_) {
            result.items.push(Item::new(t.name.clone()).with_proof(Proof::satisfied(format!(
                "{} labels the unlabeled initial SID",
                t.name
            ))));
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{ObjectClass, PermissionSet};
    use crate::config::PolicyEngineConfig;
    use crate::context::Context;
    use crate::identity::{HandleId, PermId, RoleId, UserId};
    use crate::rules::{AvRule, AvRuleKind, TypeSet};
    use std::collections::HashMap;

    #[test]
    fn target_of_file_class_rule_is_reported() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let t_a = policy.types.declare("t_a", TypeKind::Concrete);
        let etc_t = policy.types.declare("etc_t", TypeKind::Concrete);
        let file_id = policy.classes.insert("file", ObjectClass::new("file", None));
        let read_idx = policy
            .classes
            .get_mut(file_id)
            .unwrap()
            .add_perm(PermId::from_index(0), "read", file_id);
        let mut perms = PermissionSet::new();
        perms.insert(read_idx);
        let mut perm_map = HashMap::new();
        perm_map.insert(file_id, perms);
        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t_a),
            target: TypeSet::single(etc_t),
            perms: perm_map,
            conditional: None,
        });

        let result = find_file_types(&policy, &AnalysisOptions::default()).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].object, "etc_t");
    }

    #[test]
    fn unlabeled_initial_sid_type_is_an_association_type() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let t = policy.types.declare("unlabeled_t", TypeKind::Concrete);
        let role = policy.roles.insert("object_r", crate::rbac::Role::new("object_r"));
        let user = policy.users.insert("system_u", crate::rbac::User::new("system_u"));
        let _ = (role, user);
        policy.initial_sids.insert(
            InitialSid::Unlabeled,
            Context {
                user: UserId::from_index(0),
                role: RoleId::from_index(0),
                type_: t,
                range: None,
            },
        );

        let result = find_association_types(&policy).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].object, "unlabeled_t");
    }
}
