//! Constraints: predicates over context attributes evaluated per access
//! attempt, here inspected structurally rather than evaluated (spec §3,
//! §4.7).

use crate::classes::PermissionSet;
use crate::identity::ClassId;

/// Which context field an expression node compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ConstraintAttr {
    User,
    Role,
    Type,
    Level,
}

/// Comparison operator applied to a `ConstraintAttr` (spec §3's operator
/// set, minus the boolean combinators which get their own node variants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ConstraintOp {
    Eq,
    Neq,
    Dom,
    Domby,
    Incomp,
}

impl ConstraintOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ConstraintOp::Eq => "==",
            ConstraintOp::Neq => "!=",
            ConstraintOp::Dom => "dom",
            ConstraintOp::Domby => "domby",
            ConstraintOp::Incomp => "incomp",
        }
    }
}

/// One node of a constraint's RPN expression stream (design note in
/// spec §9: "model expression nodes as a sum type with explicit variants").
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ConstraintExprNode {
    /// Compares the same attribute of source and target context, e.g.
    /// `u1 == u2` or `t1 dom t2`.
    AttrOpAttr {
        attr: ConstraintAttr,
        op: ConstraintOp,
    },
    /// Compares a context attribute against an explicit literal name set,
    /// e.g. `r1 == { sysadm_r staff_r }`.
    AttrOpNameSet {
        attr: ConstraintAttr,
        op: ConstraintOp,
        names: Vec<String>,
    },
    And,
    Or,
    Not,
    Xor,
}

/// A declared constraint restricting a subset of a class's permissions.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Constraint {
    pub class: ClassId,
    pub perms: PermissionSet,
    pub nodes: Vec<ConstraintExprNode>,
}

impl Constraint {
    /// Render each node as a human-readable clause, in stream order, for
    /// the constraint-inspection analysis. This is a structural walk, not
    /// an evaluation against a concrete pair of contexts.
    pub fn describe_nodes(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|node| match node {
                ConstraintExprNode::AttrOpAttr { attr, op } => {
                    format!("{attr:?} {} {attr:?}", op.symbol())
                }
                ConstraintExprNode::AttrOpNameSet { attr, op, names } => {
                    format!("{attr:?} {} {{ {} }}", op.symbol(), names.join(" "))
                }
                ConstraintExprNode::And => "and".to_string(),
                ConstraintExprNode::Or => "or".to_string(),
                ConstraintExprNode::Not => "not".to_string(),
                ConstraintExprNode::Xor => "xor".to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::HandleId;

    #[test]
    fn describe_nodes_renders_attr_op_attr() {
        let constraint = Constraint {
            class: ClassId::from_index(0),
            perms: PermissionSet::new(),
            nodes: vec![ConstraintExprNode::AttrOpAttr {
                attr: ConstraintAttr::User,
                op: ConstraintOp::Eq,
            }],
        };
        assert_eq!(constraint.describe_nodes(), vec!["User == User".to_string()]);
    }

    #[test]
    fn describe_nodes_renders_attr_op_name_set() {
        let constraint = Constraint {
            class: ClassId::from_index(0),
            perms: PermissionSet::new(),
            nodes: vec![ConstraintExprNode::AttrOpNameSet {
                attr: ConstraintAttr::Role,
                op: ConstraintOp::Eq,
                names: vec!["sysadm_r".to_string(), "staff_r".to_string()],
            }],
        };
        assert_eq!(
            constraint.describe_nodes(),
            vec!["Role == { sysadm_r staff_r }".to_string()]
        );
    }
}
