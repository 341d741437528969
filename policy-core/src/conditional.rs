//! Booleans and conditional expressions (spec §3, §4.4).

use crate::identity::BoolId;
use crate::symbol::SymbolTable;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Boolean {
    pub name: String,
    pub default_value: bool,
    pub current_value: bool,
}

impl Boolean {
    pub fn new(name: impl Into<String>, default_value: bool) -> Self {
        Self {
            name: name.into(),
            default_value,
            current_value: default_value,
        }
    }
}

pub type BoolStore = SymbolTable<BoolId, Boolean>;

/// One node of a conditional expression's reverse-Polish stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum CondExprNode {
    BoolRef(BoolId),
    Not,
    And,
    Or,
    Xor,
    Eq,
    Neq,
}

/// Which branch of an `if (expr) { ... } else { ... }` block a rule
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum BranchSide {
    True,
    False,
}

/// A boolean expression over Booleans, stored as its RPN stream.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConditionalExpr {
    pub nodes: Vec<CondExprNode>,
}

impl ConditionalExpr {
    pub fn new(nodes: Vec<CondExprNode>) -> Self {
        Self { nodes }
    }

    /// Fold the RPN stream over an explicit value stack (mirrors the
    /// kernel's `cond_evaluate_expr`).
    pub fn evaluate(&self, bools: &BoolStore) -> bool {
        let mut stack: Vec<bool> = Vec::new();
        for node in &self.nodes {
            match node {
                CondExprNode::BoolRef(id) => {
                    let value = bools.get(*id).map(|b| b.current_value).unwrap_or(false);
                    stack.push(value);
                }
                CondExprNode::Not => {
                    let a = stack.pop().unwrap_or(false);
                    stack.push(!a);
                }
                CondExprNode::And => {
                    let b = stack.pop().unwrap_or(false);
                    let a = stack.pop().unwrap_or(false);
                    stack.push(a && b);
                }
                CondExprNode::Or => {
                    let b = stack.pop().unwrap_or(false);
                    let a = stack.pop().unwrap_or(false);
                    stack.push(a || b);
                }
                CondExprNode::Xor => {
                    let b = stack.pop().unwrap_or(false);
                    let a = stack.pop().unwrap_or(false);
                    stack.push(a ^ b);
                }
                CondExprNode::Eq => {
                    let b = stack.pop().unwrap_or(false);
                    let a = stack.pop().unwrap_or(false);
                    stack.push(a == b);
                }
                CondExprNode::Neq => {
                    let b = stack.pop().unwrap_or(false);
                    let a = stack.pop().unwrap_or(false);
                    stack.push(a != b);
                }
            }
        }
        stack.pop().unwrap_or(false)
    }

    /// True iff a rule guarded by this expression on `branch` is enabled
    /// under the current Boolean valuation.
    pub fn enabled_on(&self, branch: BranchSide, bools: &BoolStore) -> bool {
        let value = self.evaluate(bools);
        match branch {
            BranchSide::True => value,
            BranchSide::False => !value,
        }
    }

    /// Every Boolean this expression references, in RPN-stream order,
    /// without deduplication (callers that need a set should collect into
    /// one).
    pub fn referenced_booleans(&self) -> impl Iterator<Item = BoolId> + '_ {
        self.nodes.iter().filter_map(|n| match n {
            CondExprNode::BoolRef(id) => Some(*id),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bools_with(values: &[bool]) -> BoolStore {
        let mut store = BoolStore::default();
        for (i, v) in values.iter().enumerate() {
            store.insert(format!("b{i}"), Boolean::new(format!("b{i}"), *v));
        }
        store
    }

    #[test]
    fn single_boolean_reference() {
        let store = bools_with(&[true]);
        let b0 = store.id_of("b0").unwrap();
        let expr = ConditionalExpr::new(vec![CondExprNode::BoolRef(b0)]);
        assert!(expr.evaluate(&store));
    }

    #[test]
    fn and_or_not_xor_eq_neq() {
        let store = bools_with(&[true, false]);
        let b0 = store.id_of("b0").unwrap();
        let b1 = store.id_of("b1").unwrap();

        let and_expr = ConditionalExpr::new(vec![
            CondExprNode::BoolRef(b0),
            CondExprNode::BoolRef(b1),
            CondExprNode::And,
        ]);
        assert!(!and_expr.evaluate(&store));

        let or_expr = ConditionalExpr::new(vec![
            CondExprNode::BoolRef(b0),
            CondExprNode::BoolRef(b1),
            CondExprNode::Or,
        ]);
        assert!(or_expr.evaluate(&store));

        let not_expr = ConditionalExpr::new(vec![CondExprNode::BoolRef(b1), CondExprNode::Not]);
        assert!(not_expr.evaluate(&store));

        let xor_expr = ConditionalExpr::new(vec![
            CondExprNode::BoolRef(b0),
            CondExprNode::BoolRef(b1),
            CondExprNode::Xor,
        ]);
        assert!(xor_expr.evaluate(&store));
    }

    #[test]
    fn enabled_on_respects_branch_side() {
        let store = bools_with(&[false]);
        let b0 = store.id_of("b0").unwrap();
        let expr = ConditionalExpr::new(vec![CondExprNode::BoolRef(b0)]);
        assert!(!expr.enabled_on(BranchSide::True, &store));
        assert!(expr.enabled_on(BranchSide::False, &store));
    }

    #[test]
    fn referenced_booleans_collects_all_refs() {
        let store = bools_with(&[true, false]);
        let b0 = store.id_of("b0").unwrap();
        let b1 = store.id_of("b1").unwrap();
        let expr = ConditionalExpr::new(vec![
            CondExprNode::BoolRef(b0),
            CondExprNode::BoolRef(b1),
            CondExprNode::And,
        ]);
        let refs: Vec<_> = expr.referenced_booleans().collect();
        assert_eq!(refs, vec![b0, b1]);
    }
}
