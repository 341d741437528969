//! Compiles a parsed [`PolicyAst`] into a [`policy_core::Policy`].
//!
//! This is the "loader" spec.md §1 calls an external collaborator: it is
//! treated as opaque by `policy-core`'s query/diff/analysis code, but is
//! implemented here for real (not stubbed) so the round-trip property and
//! the end-to-end scenarios in spec.md §8 are executable tests.
//!
//! Compilation runs in three passes over the flat statement list, mirroring
//! the two-pass symbol-table-then-rules shape `libsepol`'s own compiler
//! uses (declarations must resolve before the rules that reference them,
//! but need not themselves appear in a single dependency-respecting order):
//!
//! 1. **Symbols** — declare every type, attribute, class, common, Boolean,
//!    sensitivity, category, role, and user, assigning each its arena id.
//!    Commons are declared before classes regardless of source order so a
//!    class's `inherits` clause always resolves.
//! 2. **Relations** — resolve cross-references between symbols declared in
//!    pass 1: attribute membership, sensitivity ordering and legal
//!    categories, role type-sets, user role-sets and MLS ranges, type
//!    aliases.
//! 3. **Rules** — walk the statement list once more in source order,
//!    compiling AV/TE/RBAC/MLS rules, constraints, conditionals, and
//!    initial SIDs against the now-complete symbol tables.

use crate::parser::ast::*;
use policy_core::{
    AvRule, AvRuleKind, BoolId, BranchSide, ClassId, CondBinding, CondExprNode, CondId,
    ConditionalExpr, Constraint, ConstraintAttr, ConstraintExprNode, ConstraintOp, Context,
    HandleId, IdSet, InitialSid, Level, LoadError, ObjectClass, PermissionSet, Policy,
    PolicyEngineConfig, Range, RangeTransition, Role, RoleAllow, RoleId, RoleTransition,
    SensId, TeRule, TeRuleKind, TypeId, TypeKind, TypeSet, User,
};
use std::collections::HashMap;

/// Compile one already-resolved statement (an AV/TE/RBAC/MLS rule, a
/// constraint, a conditional, or a SID binding) against an existing
/// policy's symbol tables, without re-running the declaration passes.
/// Used by the round-trip test: render a rule, reparse it alone, and
/// recompile it against the policy that produced it in the first place.
pub fn compile_statement_into(stmt: &Statement, policy: &mut Policy) -> Result<(), LoadError> {
    compile_statement(stmt, policy)
}

/// Compile a parsed policy source into a fully-populated `Policy`.
pub fn compile(ast: &PolicyAst, config: PolicyEngineConfig) -> Result<Policy, LoadError> {
    let mut policy = Policy::new(config);
    declare_symbols(ast, &mut policy)?;
    resolve_relations(ast, &mut policy)?;
    compile_rules(ast, &mut policy)?;
    policy.capabilities = infer_capabilities(&policy);
    policy.finish();
    Ok(policy)
}

fn malformed(reason: impl Into<String>) -> LoadError {
    LoadError::MalformedPolicy { line: 0, reason: reason.into() }
}

fn no_such(kind: &str, name: &str) -> LoadError {
    malformed(format!("no such {kind} '{name}'"))
}

// ---------------------------------------------------------------------
// Pass 1: symbols
// ---------------------------------------------------------------------

fn declare_symbols(ast: &PolicyAst, policy: &mut Policy) -> Result<(), LoadError> {
    // Commons first so classes' `inherits` always resolves regardless of
    // source order.
    for stmt in &ast.statements {
        if let Statement::Common(decl) = stmt {
            declare_class(decl, None, policy)?;
        }
    }
    for stmt in &ast.statements {
        match stmt {
            Statement::Attribute(name) => {
                if policy.types.id_of(name).is_none() {
                    policy.types.declare(name.clone(), TypeKind::Attribute);
                }
            }
            Statement::Type(decl) => {
                if policy.types.id_of(&decl.name).is_none() {
                    policy.types.declare(decl.name.clone(), TypeKind::Concrete);
                }
            }
            Statement::Class(decl) => {
                let common = match &decl.inherits {
                    Some(name) => {
                        Some(policy.classes.id_of(name).ok_or_else(|| no_such("common", name))?)
                    }
                    None => None,
                };
                declare_class(decl, common, policy)?;
            }
            Statement::Bool { name, default } => {
                policy.bools.insert(name.clone(), policy_core::Boolean::new(name.clone(), *default));
            }
            Statement::Sensitivity { name, .. } => {
                let order = policy.sens.len() as u32;
                policy.sens.insert(
                    name.clone(),
                    policy_core::Sensitivity { name: name.clone(), order, legal_cats: IdSet::new() },
                );
            }
            Statement::Category { name, .. } => {
                policy.cats.insert(name.clone(), policy_core::Category { name: name.clone() });
            }
            Statement::Role(decl) => {
                if policy.roles.id_of(&decl.name).is_none() {
                    policy.roles.insert(decl.name.clone(), Role::new(decl.name.clone()));
                }
            }
            Statement::User(decl) => {
                if policy.users.id_of(&decl.name).is_none() {
                    policy.users.insert(decl.name.clone(), User::new(decl.name.clone()));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn declare_class(decl: &ClassDecl, common: Option<ClassId>, policy: &mut Policy) -> Result<(), LoadError> {
    if policy.classes.id_of(&decl.name).is_some() {
        return Ok(());
    }
    let class_id = policy.classes.insert(decl.name.clone(), ObjectClass::new(decl.name.clone(), common));
    // Permission ids are allocated from a running counter over the whole
    // policy; see `perm_counter_next`.
    for perm_name in &decl.perms {
        let perm_id = policy_core::PermId::from_index(perm_counter_next(policy));
        let class = policy.classes.get_mut(class_id).expect("just inserted");
        class.add_perm(perm_id, perm_name.clone(), class_id);
    }
    Ok(())
}

/// `PermId` is only used for identity/equality by the model; class-local
/// bit position (not this id) is what `PermissionSet` actually indexes by.
/// A simple running counter across the whole policy is sufficient and
/// matches how a single compiled binary policy assigns global permission
/// ids.
fn perm_counter_next(policy: &Policy) -> u32 {
    policy.classes.iter().map(|(_, c)| c.own_perms().len() as u32).sum()
}

// ---------------------------------------------------------------------
// Pass 2: relations between already-declared symbols
// ---------------------------------------------------------------------

fn resolve_relations(ast: &PolicyAst, policy: &mut Policy) -> Result<(), LoadError> {
    // Sensitivity ordering: an explicit `dominance { s0 s1 s2 }` statement
    // overrides the declaration-order default assigned in pass 1.
    for stmt in &ast.statements {
        if let Statement::Dominance(order) = stmt {
            for (rank, name) in order.iter().enumerate() {
                let id = policy.sens.id_of(name).ok_or_else(|| no_such("sensitivity", name))?;
                if let Some(sens) = policy.sens.get_mut(id) {
                    sens.order = rank as u32;
                }
            }
        }
    }

    for stmt in &ast.statements {
        match stmt {
            Statement::Type(decl) => {
                let ty_id = resolve_type(&decl.name, policy)?;
                for attr_name in &decl.attrs {
                    let attr_id = resolve_type(attr_name, policy)?;
                    policy.types.add_member(attr_id, ty_id);
                }
            }
            Statement::TypeAttribute { ty, attrs } => {
                let ty_id = resolve_type(ty, policy)?;
                for attr_name in attrs {
                    let attr_id = resolve_type(attr_name, policy)?;
                    policy.types.add_member(attr_id, ty_id);
                }
            }
            Statement::TypeAlias { name, aliases } => {
                let primary = resolve_type(name, policy)?;
                for alias in aliases {
                    policy.types.declare_alias(alias.clone(), primary);
                }
            }
            Statement::Category { name, alias } => {
                if let Some(alias) = alias {
                    let id = policy.cats.id_of(name).ok_or_else(|| no_such("category", name))?;
                    policy.cats.alias(alias.clone(), id);
                }
            }
            Statement::Sensitivity { name, alias } => {
                if let Some(alias) = alias {
                    let id = policy.sens.id_of(name).ok_or_else(|| no_such("sensitivity", name))?;
                    policy.sens.alias(alias.clone(), id);
                }
            }
            Statement::Level { sensitivity, categories } => {
                let sens_id = policy.sens.id_of(sensitivity).ok_or_else(|| no_such("sensitivity", sensitivity))?;
                let mut legal = IdSet::new();
                for cat_name in categories {
                    legal.union_with(&resolve_category_token(cat_name, policy)?);
                }
                if let Some(sens) = policy.sens.get_mut(sens_id) {
                    sens.legal_cats.union_with(&legal);
                }
            }
            Statement::Role(decl) => {
                let role_id = policy.roles.id_of(&decl.name).ok_or_else(|| no_such("role", &decl.name))?;
                let mut type_ids = Vec::new();
                for name in &decl.types {
                    type_ids.push(resolve_type(name, policy)?);
                }
                let role = policy.roles.get_mut(role_id).expect("declared in pass 1");
                for id in type_ids {
                    role.types.insert(id);
                }
            }
            Statement::User(decl) => {
                let user_id = policy.users.id_of(&decl.name).ok_or_else(|| no_such("user", &decl.name))?;
                let mut role_ids = IdSet::new();
                for name in &decl.roles {
                    role_ids.insert(policy.roles.id_of(name).ok_or_else(|| no_such("role", name))?);
                }
                let range = match &decl.range {
                    Some(r) => Some(compile_range(r, policy)?),
                    None => None,
                };
                let user = policy.users.get_mut(user_id).expect("declared in pass 1");
                user.roles = role_ids;
                user.default_level = range.as_ref().map(|r: &Range| r.low.clone());
                user.range = range;
            }
            _ => {}
        }
    }
    Ok(())
}

fn resolve_type(name: &str, policy: &Policy) -> Result<TypeId, LoadError> {
    policy.types.resolve(name).ok_or_else(|| no_such("type", name))
}

/// A category token is either a bare name or a `cLow.cHigh` range, which
/// `level` statements use to declare a contiguous legal range in one shot.
fn resolve_category_token(token: &str, policy: &Policy) -> Result<IdSet<policy_core::CatId>, LoadError> {
    let mut set = IdSet::new();
    if let Some((low, high)) = token.split_once('.') {
        let low_id = policy.cats.id_of(low).ok_or_else(|| no_such("category", low))?;
        let high_id = policy.cats.id_of(high).ok_or_else(|| no_such("category", high))?;
        let (lo, hi) = (low_id.index().min(high_id.index()), low_id.index().max(high_id.index()));
        for idx in lo..=hi {
            set.insert(policy_core::CatId::from_index(idx));
        }
    } else {
        set.insert(policy.cats.id_of(token).ok_or_else(|| no_such("category", token))?);
    }
    Ok(set)
}

fn compile_level(level: &LevelAst, policy: &Policy) -> Result<Level, LoadError> {
    let sens_id: SensId = policy.sens.id_of(&level.sensitivity).ok_or_else(|| no_such("sensitivity", &level.sensitivity))?;
    let mut cats = IdSet::new();
    for token in &level.categories {
        cats.union_with(&resolve_category_token(token, policy)?);
    }
    Ok(Level::new(sens_id, cats))
}

fn compile_range(range: &RangeAst, policy: &Policy) -> Result<Range, LoadError> {
    Ok(Range { low: compile_level(&range.low, policy)?, high: compile_level(&range.high, policy)? })
}

// ---------------------------------------------------------------------
// Pass 3: rules, constraints, conditionals, initial SIDs
// ---------------------------------------------------------------------

fn compile_rules(ast: &PolicyAst, policy: &mut Policy) -> Result<(), LoadError> {
    for stmt in &ast.statements {
        compile_statement(stmt, policy)?;
    }
    Ok(())
}

fn compile_statement(stmt: &Statement, policy: &mut Policy) -> Result<(), LoadError> {
    match stmt {
        Statement::Av(decl) => {
            let rule = compile_av(decl, policy)?;
            policy.add_av_rule(rule);
        }
        Statement::Te(decl) => {
            let rule = compile_te(decl, policy)?;
            policy.add_te_rule(rule);
        }
        Statement::RoleAllow { source, target } => {
            let rule = RoleAllow { source: resolve_role_set(source, policy)?, target: resolve_role_set(target, policy)? };
            policy.role_allows.push(rule);
        }
        Statement::RoleTransition { source_roles, target_types, default_role } => {
            let rule = RoleTransition {
                source_roles: resolve_role_set(source_roles, policy)?,
                target_types: compile_type_set(target_types, policy)?,
                default_role: policy.roles.id_of(default_role).ok_or_else(|| no_such("role", default_role))?,
            };
            policy.role_transitions.push(rule);
        }
        Statement::RangeTransition { source, target, range } => {
            let rule = RangeTransition {
                source: compile_type_set(source, policy)?,
                target: compile_type_set(target, policy)?,
                target_range: compile_range(range, policy)?,
            };
            policy.range_transitions.push(rule);
        }
        Statement::Constrain { class, perms, expr, .. } => {
            let class_id = policy.classes.id_of(class).ok_or_else(|| no_such("class", class))?;
            let perm_set = compile_perm_set(class_id, perms, policy)?;
            let mut nodes = Vec::new();
            flatten_constraint_expr(expr, &mut nodes)?;
            policy.constraints.push(Constraint { class: class_id, perms: perm_set, nodes });
        }
        Statement::Conditional(decl) => {
            let mut nodes = Vec::new();
            flatten_bool_expr(&decl.expr, policy, &mut nodes)?;
            let cond_id = policy.add_conditional(ConditionalExpr::new(nodes));
            for inner in &decl.true_branch {
                compile_branch_statement(inner, cond_id, BranchSide::True, policy)?;
            }
            for inner in &decl.false_branch {
                compile_branch_statement(inner, cond_id, BranchSide::False, policy)?;
            }
        }
        Statement::Sid { name, context } => {
            let sid = InitialSid::from_name(name).ok_or_else(|| no_such("initial SID", name))?;
            let ctx = compile_context(context, policy)?;
            policy.initial_sids.insert(sid, ctx);
        }
        // Declarations were fully handled in passes 1-2.
        Statement::Type(_)
        | Statement::TypeAlias { .. }
        | Statement::Attribute(_)
        | Statement::TypeAttribute { .. }
        | Statement::Class(_)
        | Statement::Common(_)
        | Statement::Bool { .. }
        | Statement::Sensitivity { .. }
        | Statement::Dominance(_)
        | Statement::Category { .. }
        | Statement::Level { .. }
        | Statement::Role(_)
        | Statement::User(_) => {}
    }
    Ok(())
}

/// A rule nested inside an `if` block only ever parses to `Av` or `Te`
/// (the parser enforces this); anything else is unreachable.
fn compile_branch_statement(stmt: &Statement, cond: CondId, branch: BranchSide, policy: &mut Policy) -> Result<(), LoadError> {
    match stmt {
        Statement::Av(decl) => {
            let mut rule = compile_av(decl, policy)?;
            rule.conditional = Some(CondBinding { cond, branch });
            policy.add_av_rule(rule);
            Ok(())
        }
        Statement::Te(decl) => {
            let mut rule = compile_te(decl, policy)?;
            rule.conditional = Some(CondBinding { cond, branch });
            policy.add_te_rule(rule);
            Ok(())
        }
        _ => Err(malformed("only AV/TE rules may appear inside a conditional block")),
    }
}

fn compile_type_set(ast: &TypeSetAst, policy: &Policy) -> Result<TypeSet, LoadError> {
    let mut ids = IdSet::new();
    for name in &ast.names {
        ids.insert(resolve_type(name, policy)?);
    }
    let mut set = TypeSet::of(ids);
    if ast.includes_self {
        set = set.with_self();
    }
    Ok(set)
}

fn resolve_role_set(names: &[String], policy: &Policy) -> Result<IdSet<RoleId>, LoadError> {
    let mut ids = IdSet::new();
    for name in names {
        ids.insert(policy.roles.id_of(name).ok_or_else(|| no_such("role", name))?);
    }
    Ok(ids)
}

fn compile_perm_set(class_id: ClassId, names: &[String], policy: &Policy) -> Result<PermissionSet, LoadError> {
    let class = policy.classes.get(class_id).ok_or_else(|| malformed("unknown class while resolving permissions"))?;
    let mut set = PermissionSet::new();
    for name in names {
        let idx = class.effective_index_of(name, &policy.classes).ok_or_else(|| {
            no_such("permission", &format!("{}:{name}", class.name))
        })?;
        set.insert(idx);
    }
    Ok(set)
}

fn compile_av(decl: &AvDecl, policy: &mut Policy) -> Result<AvRule, LoadError> {
    let kind = match decl.kind {
        AvKind::Allow => AvRuleKind::Allow,
        AvKind::NeverAllow => AvRuleKind::Neverallow,
        AvKind::AuditAllow => AvRuleKind::Auditallow,
        AvKind::DontAudit => AvRuleKind::Dontaudit,
    };
    let source = compile_type_set(&decl.source, policy)?;
    let target = compile_type_set(&decl.target, policy)?;
    let mut perms = HashMap::new();
    for class_name in &decl.classes {
        let class_id = policy.classes.id_of(class_name).ok_or_else(|| no_such("class", class_name))?;
        let set = compile_perm_set(class_id, &decl.perms, policy)?;
        perms.insert(class_id, set);
    }
    let conditional = compile_cond_binding(&decl.conditional, policy)?;
    Ok(AvRule { kind, source, target, perms, conditional })
}

fn compile_te(decl: &TeDecl, policy: &mut Policy) -> Result<TeRule, LoadError> {
    let kind = match decl.kind {
        TeKind::TypeTransition => TeRuleKind::TypeTransition,
        TeKind::TypeChange => TeRuleKind::TypeChange,
        TeKind::TypeMember => TeRuleKind::TypeMember,
    };
    let source = compile_type_set(&decl.source, policy)?;
    let target = compile_type_set(&decl.target, policy)?;
    let mut classes = IdSet::new();
    for class_name in &decl.classes {
        classes.insert(policy.classes.id_of(class_name).ok_or_else(|| no_such("class", class_name))?);
    }
    let default_type = resolve_type(&decl.default_type, policy)?;
    let conditional = compile_cond_binding(&decl.conditional, policy)?;
    Ok(TeRule { kind, source, target, classes, default_type, conditional })
}

/// A rule's own inline `if (...)` binding (distinct from a rule nested
/// inside a `Conditional` block, which gets its binding from the caller).
fn compile_cond_binding(ast: &Option<CondBindingAst>, policy: &mut Policy) -> Result<Option<CondBinding>, LoadError> {
    let Some(binding) = ast else { return Ok(None) };
    let mut nodes = Vec::new();
    flatten_bool_expr(&binding.expr, policy, &mut nodes)?;
    let cond = policy.add_conditional(ConditionalExpr::new(nodes));
    let branch = match binding.branch {
        BranchSideAst::True => BranchSide::True,
        BranchSideAst::False => BranchSide::False,
    };
    Ok(Some(CondBinding { cond, branch }))
}

fn resolve_bool(name: &str, policy: &Policy) -> Result<BoolId, LoadError> {
    policy.bools.id_of(name).ok_or_else(|| no_such("boolean", name))
}

fn flatten_bool_expr(ast: &BoolExprAst, policy: &Policy, out: &mut Vec<CondExprNode>) -> Result<(), LoadError> {
    match ast {
        BoolExprAst::Ref(name) => out.push(CondExprNode::BoolRef(resolve_bool(name, policy)?)),
        BoolExprAst::Not(inner) => {
            flatten_bool_expr(inner, policy, out)?;
            out.push(CondExprNode::Not);
        }
        BoolExprAst::And(l, r) => {
            flatten_bool_expr(l, policy, out)?;
            flatten_bool_expr(r, policy, out)?;
            out.push(CondExprNode::And);
        }
        BoolExprAst::Or(l, r) => {
            flatten_bool_expr(l, policy, out)?;
            flatten_bool_expr(r, policy, out)?;
            out.push(CondExprNode::Or);
        }
        BoolExprAst::Xor(l, r) => {
            flatten_bool_expr(l, policy, out)?;
            flatten_bool_expr(r, policy, out)?;
            out.push(CondExprNode::Xor);
        }
        BoolExprAst::Eq(l, r) => {
            flatten_bool_expr(l, policy, out)?;
            flatten_bool_expr(r, policy, out)?;
            out.push(CondExprNode::Eq);
        }
        BoolExprAst::Neq(l, r) => {
            flatten_bool_expr(l, policy, out)?;
            flatten_bool_expr(r, policy, out)?;
            out.push(CondExprNode::Neq);
        }
    }
    Ok(())
}

fn constraint_attr(token: &str) -> Result<ConstraintAttr, LoadError> {
    match token.chars().next() {
        Some('u') => Ok(ConstraintAttr::User),
        Some('r') => Ok(ConstraintAttr::Role),
        Some('t') => Ok(ConstraintAttr::Type),
        Some('l') | Some('h') => Ok(ConstraintAttr::Level),
        _ => Err(malformed(format!("unrecognized constraint attribute token '{token}'"))),
    }
}

fn constraint_op(sym: &str) -> Result<ConstraintOp, LoadError> {
    match sym {
        "==" => Ok(ConstraintOp::Eq),
        "!=" => Ok(ConstraintOp::Neq),
        "dom" => Ok(ConstraintOp::Dom),
        "domby" => Ok(ConstraintOp::Domby),
        "incomp" => Ok(ConstraintOp::Incomp),
        other => Err(malformed(format!("unrecognized constraint operator '{other}'"))),
    }
}

fn flatten_constraint_expr(ast: &ConstraintExprAst, out: &mut Vec<ConstraintExprNode>) -> Result<(), LoadError> {
    match ast {
        ConstraintExprAst::AttrOpAttr { attr, op } => {
            out.push(ConstraintExprNode::AttrOpAttr { attr: constraint_attr(attr)?, op: constraint_op(op)? });
        }
        ConstraintExprAst::AttrOpNameSet { attr, op, names } => {
            out.push(ConstraintExprNode::AttrOpNameSet {
                attr: constraint_attr(attr)?,
                op: constraint_op(op)?,
                names: names.clone(),
            });
        }
        ConstraintExprAst::Not(inner) => {
            flatten_constraint_expr(inner, out)?;
            out.push(ConstraintExprNode::Not);
        }
        ConstraintExprAst::And(l, r) => {
            flatten_constraint_expr(l, out)?;
            flatten_constraint_expr(r, out)?;
            out.push(ConstraintExprNode::And);
        }
        ConstraintExprAst::Or(l, r) => {
            flatten_constraint_expr(l, out)?;
            flatten_constraint_expr(r, out)?;
            out.push(ConstraintExprNode::Or);
        }
    }
    Ok(())
}

fn compile_context(ast: &ContextAst, policy: &Policy) -> Result<Context, LoadError> {
    Ok(Context {
        user: policy.users.id_of(&ast.user).ok_or_else(|| no_such("user", &ast.user))?,
        role: policy.roles.id_of(&ast.role).ok_or_else(|| no_such("role", &ast.role))?,
        type_: resolve_type(&ast.type_, policy)?,
        range: match &ast.range {
            Some(r) => Some(compile_range(r, policy)?),
            None => None,
        },
    })
}

/// Derive `PolicyCapabilities` from what the loaded policy actually
/// contains — a textual-form load always retains attribute names, syntactic
/// rules, and source form; MLS/conditionals are reported iff the policy
/// declared any.
fn infer_capabilities(policy: &Policy) -> policy_core::PolicyCapabilities {
    policy_core::PolicyCapabilities {
        attribute_names: true,
        syntactic_rules: true,
        line_numbers: false,
        conditionals: !policy.bools.is_empty(),
        mls: !policy.sens.is_empty(),
        policy_capabilities: false,
        source_form: true,
        is_module: false,
    }
}
