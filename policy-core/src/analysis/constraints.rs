//! `constraint_inspection` (spec §4.7): walks every declared constraint and
//! reports its restricted class, permission list, and expression clauses as
//! diagnostic proofs. This is a structural report, not an evaluator — no
//! judgement is made about whether a constraint is well-formed.

use super::{AnalysisResult, Item};
use crate::error::AnalysisError;
use crate::policy::Policy;
use crate::reporter::Proof;

pub fn constraint_inspection(policy: &Policy) -> Result<AnalysisResult, AnalysisError> {
    let mut result = AnalysisResult::new("constraint_inspection", "constraint");

    for (idx, constraint) in policy.constraints.iter().enumerate() {
        let class_name = policy.classes.get(constraint.class).map(|c| c.name.as_str()).unwrap_or("<unknown-class>");
        let perm_str = crate::render::render_perm_set(constraint.class, &constraint.perms, policy);
        let object = format!("constrain {class_name} {perm_str} (#{idx})");

        let proofs: Vec<Proof> = constraint.describe_nodes().into_iter().map(Proof::diagnostic).collect();
        result.items.push(Item { object, proofs });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{ObjectClass, PermissionSet};
    use crate::config::PolicyEngineConfig;
    use crate::constraint::{Constraint, ConstraintAttr, ConstraintExprNode, ConstraintOp};
    use crate::identity::{HandleId, PermId};

    #[test]
    fn one_item_per_constraint_with_structural_proofs() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let process_id = policy.classes.insert("process", ObjectClass::new("process", None));
        let idx = policy
            .classes
            .get_mut(process_id)
            .unwrap()
            .add_perm(PermId::from_index(0), "transition", process_id);
        let mut perms = PermissionSet::new();
        perms.insert(idx);

        policy.constraints.push(Constraint {
            class: process_id,
            perms,
            nodes: vec![ConstraintExprNode::AttrOpAttr {
                attr: ConstraintAttr::User,
                op: ConstraintOp::Eq,
            }],
        });

        let result = constraint_inspection(&policy).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].proofs.len(), 1);
        assert_eq!(result.items[0].proofs[0].text, "User == User");
    }
}
