//! Pretty-prints a compiled [`Policy`] back to the text language the
//! lexer/parser front end accepts — the "renderer" half spec §6 and
//! §12 pair with the loader.
//!
//! Rule clauses reuse `policy_core::render`'s canonical strings verbatim
//! (this module never re-implements that formatting); what it adds is the
//! declaration section — types, classes, Booleans, MLS components, roles,
//! users — that `policy-core` has no reason to render itself, since only
//! the loader's text front end round-trips declarations as source.

use policy_core::{
    render_av_rule, render_range, render_range_transition, render_role_allow,
    render_role_transition, render_te_rule, ObjectClass, Policy, TypeKind,
};

/// Render `policy` as a complete text-language source file, declarations
/// first (in id order, which is load order) followed by rules.
pub fn print_policy(policy: &Policy) -> String {
    let mut out = String::new();
    print_declarations(policy, &mut out);
    print_rules(policy, &mut out);
    out
}

fn print_declarations(policy: &Policy, out: &mut String) {
    for (_, class) in policy.classes.iter() {
        if class.common.is_none() && class_is_common(policy, class) {
            print_class(class, "common", policy, out);
        }
    }
    for (_, class) in policy.classes.iter() {
        if !(class.common.is_none() && class_is_common(policy, class)) {
            print_class(class, "class", policy, out);
        }
    }
    for (_, ty) in policy.types.iter() {
        match ty.kind {
            TypeKind::Attribute => out.push_str(&format!("attribute {};\n", ty.name)),
            TypeKind::Concrete => out.push_str(&format!("type {};\n", ty.name)),
        }
    }
    for (_, boolean) in policy.bools.iter() {
        out.push_str(&format!("bool {} {};\n", boolean.name, boolean.default_value));
    }
    for (_, sens) in policy.sens.iter() {
        out.push_str(&format!("sensitivity {};\n", sens.name));
    }
    for (_, cat) in policy.cats.iter() {
        out.push_str(&format!("category {};\n", cat.name));
    }
    for (_, role) in policy.roles.iter() {
        let mut type_names: Vec<&str> = role.types.iter().filter_map(|id| policy.types.get(id)).map(|t| t.name.as_str()).collect();
        type_names.sort_unstable();
        if type_names.is_empty() {
            out.push_str(&format!("role {};\n", role.name));
        } else {
            out.push_str(&format!("role {} types {{ {} }};\n", role.name, type_names.join(" ")));
        }
    }
    for (_, user) in policy.users.iter() {
        let mut role_names: Vec<&str> = user.roles.iter().filter_map(|id| policy.roles.get(id)).map(|r| r.name.as_str()).collect();
        role_names.sort_unstable();
        let range = user.range.as_ref().map(|r| format!(" range {}", render_range(r, policy)));
        out.push_str(&format!(
            "user {} roles {{ {} }}{};\n",
            user.name,
            role_names.join(" "),
            range.unwrap_or_default()
        ));
    }
}

/// There is no separate "is this a common" flag on `ObjectClass` — a class
/// counts as a common iff some other class declares it as its `inherits`
/// target. `print_declarations` checks that before choosing a keyword.
fn class_is_common(policy: &Policy, candidate: &ObjectClass) -> bool {
    let Some(candidate_id) = policy.classes.id_of(&candidate.name) else { return false };
    policy.classes.iter().any(|(_, c)| c.common == Some(candidate_id))
}

fn print_class(class: &ObjectClass, keyword: &str, policy: &Policy, out: &mut String) {
    let inherits = class.common.and_then(|id| policy.classes.get(id)).map(|c| format!(" inherits {}", c.name)).unwrap_or_default();
    let mut perm_names: Vec<&str> = class.own_perms().iter().map(|p| p.name.as_str()).collect();
    perm_names.sort_unstable();
    out.push_str(&format!("{keyword} {}{} {{ {} }};\n", class.name, inherits, perm_names.join(" ")));
}

fn print_rules(policy: &Policy, out: &mut String) {
    for rule in policy.av_rules() {
        out.push_str(&render_av_rule(rule, policy));
        out.push('\n');
    }
    for rule in policy.te_rules() {
        out.push_str(&render_te_rule(rule, policy));
        out.push('\n');
    }
    for rule in &policy.role_allows {
        out.push_str(&render_role_allow(rule, policy));
        out.push('\n');
    }
    for rule in &policy.role_transitions {
        out.push_str(&render_role_transition(rule, policy));
        out.push('\n');
    }
    for rule in &policy.range_transitions {
        out.push_str(&render_range_transition(rule, policy));
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::parser::parse;
    use policy_core::PolicyEngineConfig;

    #[test]
    fn printed_declarations_and_rules_are_nonempty_for_a_small_policy() {
        let source = "\
            type t_a;\n\
            type t_b;\n\
            class file { read write };\n\
            allow t_a t_b : file { read };\n\
        ";
        let ast = parse(source).unwrap();
        let policy = compile(&ast, PolicyEngineConfig::reference_policy_defaults()).unwrap();
        let printed = print_policy(&policy);
        assert!(printed.contains("type t_a;"));
        assert!(printed.contains("class file"));
        assert!(printed.contains("allow t_a t_b : file { read };"));
    }
}
