//! Canonical declarative-syntax rendering for every rule kind (spec §4.5
//! "Rule rendering") plus the string round-trip tables spec §6 names for
//! rule kinds and conditional operators.
//!
//! Rendering is side-effect-free: it borrows a `Policy` and produces owned
//! `String`s, used by the diff engine and by analysis reports. Table-driven
//! per spec.md §9's note against "ad hoc match trees duplicated per call
//! site" (grounded in `libapol/src/util.c`'s string-table functions).

use crate::classes::PermissionSet;
use crate::conditional::CondExprNode;
use crate::identity::{ClassId, HandleId, TypeId};
use crate::mls::{Level, Range};
use crate::policy::Policy;
use crate::rules::{AvRule, RangeTransition, RoleAllow, RoleTransition, TeRule, TypeSet};

fn render_name_list(names: &[&str]) -> String {
    match names {
        [] => "<empty>".to_string(),
        [single] => single.to_string(),
        many => format!("{{ {} }}", many.join(" ")),
    }
}

fn type_set_names<'a>(set: &TypeSet, policy: &'a Policy) -> Vec<&'a str> {
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
    names
}

fn render_type_set(set: &TypeSet, policy: &Policy) -> String {
    render_name_list(&type_set_names(set, policy))
}

/// Render a class's effective permission set (by local index, matching
/// `ObjectClass::effective_perms`'s indexing) as the `{ p1 p2 }` / bare `p1`
/// form spec §4.5 describes.
pub fn render_perm_set(class: ClassId, perms: &PermissionSet, policy: &Policy) -> String {
    let Some(class_record) = policy.classes.get(class) else {
        return "<unknown-class>".to_string();
    };
    let effective = class_record.effective_perms(&policy.classes);
    let mut names: Vec<&str> = effective
        .iter()
        .enumerate()
        .filter(|(idx, _)| perms.contains(*idx))
        .map(|(_, perm)| perm.name.as_str())
        .collect();
    names.sort_unstable();
    render_name_list(&names)
}

/// Render one AV rule, one clause per class it names (spec's canonical
/// form is per-class; classes sharing an identical permission-name set are
/// grouped into one `{ c1 c2 } : perms` clause, matching how reference
/// policy sources are usually written).
pub fn render_av_rule(rule: &AvRule, policy: &Policy) -> String {
    let source = render_type_set(&rule.source, policy);
    let target = render_type_set(&rule.target, policy);

    // Group classes by their rendered permission string so identical
    // clauses collapse into one line.
    let mut groups: Vec<(String, Vec<&str>)> = Vec::new();
    let mut classes: Vec<ClassId> = rule.classes().collect();
    classes.sort_by_key(|c| c.index());
    for class in classes {
        let perms = rule.perms.get(&class).cloned().unwrap_or_default();
        let rendered_perms = render_perm_set(class, &perms, policy);
        let class_name = policy.classes.get(class).map(|c| c.name.as_str()).unwrap_or("<unknown-class>");
        match groups.iter_mut().find(|(p, _)| *p == rendered_perms) {
            Some((_, names)) => names.push(class_name),
            None => groups.push((rendered_perms, vec![class_name])),
        }
    }

    let clauses: Vec<String> = groups
        .into_iter()
        .map(|(perms, mut class_names)| {
            class_names.sort_unstable();
            format!(
                "{} {} : {} {};",
                rule.kind.keyword(),
                source,
                render_name_list(&class_names),
                perms
            )
        })
        .collect();
    clauses.join("\n")
}

pub fn render_te_rule(rule: &TeRule, policy: &Policy) -> String {
    let source = render_type_set(&rule.source, policy);
    let target = render_type_set(&rule.target, policy);
    let mut class_names: Vec<&str> = rule
        .classes
        .iter()
        .filter_map(|id| policy.classes.get(id))
        .map(|c| c.name.as_str())
        .collect();
    class_names.sort_unstable();
    let default_name = policy.types.get(rule.default_type).map(|t| t.name.as_str()).unwrap_or("<unknown-type>");
    format!(
        "{} {} {} : {} {};",
        rule.kind.keyword(),
        source,
        target,
        render_name_list(&class_names),
        default_name
    )
}

pub fn render_role_allow(rule: &RoleAllow, policy: &Policy) -> String {
    let mut source: Vec<&str> = rule.source.iter().filter_map(|id| policy.roles.get(id)).map(|r| r.name.as_str()).collect();
    let mut target: Vec<&str> = rule.target.iter().filter_map(|id| policy.roles.get(id)).map(|r| r.name.as_str()).collect();
    source.sort_unstable();
    target.sort_unstable();
    format!("allow {} {};", render_name_list(&source), render_name_list(&target))
}

pub fn render_role_transition(rule: &RoleTransition, policy: &Policy) -> String {
    let mut source: Vec<&str> = rule.source_roles.iter().filter_map(|id| policy.roles.get(id)).map(|r| r.name.as_str()).collect();
    source.sort_unstable();
    let target = render_type_set(&rule.target_types, policy);
    let default_name = policy.roles.get(rule.default_role).map(|r| r.name.as_str()).unwrap_or("<unknown-role>");
    format!("role_transition {} {} {};", render_name_list(&source), target, default_name)
}

pub fn render_level(level: &Level, policy: &Policy) -> String {
    let sens_name = policy.sens.get(level.sens).map(|s| s.name.as_str()).unwrap_or("<unknown-sens>");
    if level.cats.is_empty() {
        return sens_name.to_string();
    }
    let mut cat_names: Vec<&str> = level.cats.iter().filter_map(|id| policy.cats.get(id)).map(|c| c.name.as_str()).collect();
    cat_names.sort_unstable();
    format!("{sens_name}:{}", cat_names.join(","))
}

pub fn render_range(range: &Range, policy: &Policy) -> String {
    if range.low == range.high {
        render_level(&range.low, policy)
    } else {
        format!("{}-{}", render_level(&range.low, policy), render_level(&range.high, policy))
    }
}

pub fn render_range_transition(rule: &RangeTransition, policy: &Policy) -> String {
    let source = render_type_set(&rule.source, policy);
    let target = render_type_set(&rule.target, policy);
    format!("range_transition {} {} {};", source, target, render_range(&rule.target_range, policy))
}

/// Round-trip string for a conditional-expression operator node (spec §6).
/// Returns `None` for `BoolRef`, which renders as the Boolean's name
/// instead of an operator symbol.
pub fn cond_operator_symbol(node: &CondExprNode) -> Option<&'static str> {
    match node {
        CondExprNode::BoolRef(_) => None,
        CondExprNode::Not => Some("!"),
        CondExprNode::And => Some("&&"),
        CondExprNode::Or => Some("||"),
        CondExprNode::Xor => Some("^"),
        CondExprNode::Eq => Some("=="),
        CondExprNode::Neq => Some("!="),
    }
}

pub fn cond_operator_from_symbol(s: &str) -> Option<&'static str> {
    match s {
        "!" => Some("!"),
        "&&" => Some("&&"),
        "||" => Some("||"),
        "^" => Some("^"),
        "==" => Some("=="),
        "!=" => Some("!="),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::ObjectClass;
    use crate::config::PolicyEngineConfig;
    use crate::identity::PermId;
    use crate::rules::AvRuleKind;
    use crate::types::TypeKind;
    use std::collections::HashMap;

    #[test]
    fn renders_scenario_a_allow_rule() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let t_a = policy.types.declare("t_a", TypeKind::Concrete);
        let t_b = policy.types.declare("t_b", TypeKind::Concrete);
        let file_id = policy.classes.insert("file", ObjectClass::new("file", None));
        let read_idx = {
            let file = policy.classes.get_mut(file_id).unwrap();
            file.add_perm(PermId::from_index(0), "read", file_id)
        };
        let write_idx = {
            let file = policy.classes.get_mut(file_id).unwrap();
            file.add_perm(PermId::from_index(1), "write", file_id)
        };
        let mut perms = PermissionSet::new();
        perms.insert(read_idx);
        perms.insert(write_idx);
        let mut perm_map = HashMap::new();
        perm_map.insert(file_id, perms);

        let rule = AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t_a),
            target: TypeSet::single(t_b),
            perms: perm_map,
            conditional: None,
        };
        assert_eq!(render_av_rule(&rule, &policy), "allow t_a t_b : file { read write };");
    }

    #[test]
    fn cond_operator_roundtrip() {
        for (node, sym) in [
            (CondExprNode::Not, "!"),
            (CondExprNode::And, "&&"),
            (CondExprNode::Or, "||"),
            (CondExprNode::Xor, "^"),
            (CondExprNode::Eq, "=="),
            (CondExprNode::Neq, "!="),
        ] {
            assert_eq!(cond_operator_symbol(&node), Some(sym));
            assert_eq!(cond_operator_from_symbol(sym), Some(sym));
        }
    }
}
