//! Conjunctive query layer (spec §4.5).
//!
//! Each query kind is a builder that accumulates filter parameters and a
//! `run(policy)` method that executes the conjunctive-AND semantics spec
//! §4.5 defines. All builders share the candidate-expansion and
//! source-as-any machinery in this module; each rule kind's `run` is a thin
//! wrapper that iterates its own table and applies the shared predicates.

use crate::error::QueryError;
use crate::identity::{ClassId, RoleId, RuleId, TypeId};
use crate::idset::IdSet;
use crate::mls::{CompareMode, Range};
use crate::policy::Policy;
use crate::rules::{AvRuleKind, RoleTransition, TeRuleKind, TypeSet};
use crate::types::{TypeKind, TypeStore};
use regex::Regex;

bitflags::bitflags! {
    /// Flag bitmask shared by every query builder (spec §4.5's "flag
    /// bitmask (regex, only-enabled, source-as-any, source-indirect,
    /// target-indirect, ...)").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct QueryFlags: u16 {
        const REGEX          = 0b0000_0001;
        const ONLY_ENABLED   = 0b0000_0010;
        const SOURCE_AS_ANY  = 0b0000_0100;
        const SOURCE_INDIRECT = 0b0000_1000;
        const TARGET_INDIRECT = 0b0001_0000;
    }
}

/// Candidate type-id set for a type/attribute-name filter, with indirect
/// expansion per spec §4.5: a matched concrete type unions in the
/// attributes it belongs to; a matched attribute unions in its member
/// types. Regex matches every primary type name (concrete or attribute).
fn type_candidates(name: &str, flags: QueryFlags, type_store: &TypeStore) -> Result<IdSet<TypeId>, QueryError> {
    let mut set = IdSet::new();
    if flags.contains(QueryFlags::REGEX) {
        let re = Regex::new(name).map_err(|e| QueryError::RegexCompile {
            pattern: name.to_string(),
            reason: e.to_string(),
        })?;
        for (id, record) in type_store.iter() {
            if re.is_match(&record.name) {
                set.insert(id);
            }
        }
    } else if let Some(id) = type_store.resolve(name) {
        set.insert(id);
    }
    Ok(set)
}

fn indirect_expand(candidates: &IdSet<TypeId>, indirect: bool, type_store: &TypeStore) -> IdSet<TypeId> {
    let mut result = candidates.clone();
    if !indirect {
        return result;
    }
    for id in candidates.iter() {
        match type_store.kind_of(id) {
            Some(TypeKind::Attribute) => {
                for member in type_store.members_of(id) {
                    result.insert(member);
                }
            }
            _ => {
                for attr in type_store.attributes_of(id) {
                    result.insert(attr);
                }
            }
        }
    }
    result
}

fn class_candidates(name: &str, regex: bool, policy: &Policy) -> Result<IdSet<ClassId>, QueryError> {
    let mut set = IdSet::new();
    if regex {
        let re = Regex::new(name).map_err(|e| QueryError::RegexCompile {
            pattern: name.to_string(),
            reason: e.to_string(),
        })?;
        for (id, class) in policy.classes.iter() {
            if re.is_match(&class.name) {
                set.insert(id);
            }
        }
    } else if let Some(id) = policy.classes.id_of(name) {
        set.insert(id);
    }
    Ok(set)
}

/// Whether `candidates` intersects `operand`'s *literal* (unexpanded) type
/// ids — the query layer matches symbolic operand membership, not ground
/// attribute expansion; only `indirect` widens the candidate side (spec
/// §4.5, Scenario B).
fn type_set_matches(operand: &TypeSet, candidates: &IdSet<TypeId>) -> bool {
    operand.types.iter().any(|id| candidates.contains(id))
}

/// Effective permission-name → local-index map for a class, used by
/// permission-name filters.
fn effective_perm_names(class_id: ClassId, policy: &Policy) -> Vec<(usize, String)> {
    let Some(class) = policy.classes.get(class_id) else {
        return Vec::new();
    };
    class
        .effective_perms(&policy.classes)
        .into_iter()
        .enumerate()
        .map(|(idx, perm)| (idx, perm.name.clone()))
        .collect()
}

fn perm_local_indices_matching(
    class_id: ClassId,
    perm_names: &[String],
    regex: bool,
    policy: &Policy,
) -> Result<Vec<usize>, QueryError> {
    let effective = effective_perm_names(class_id, policy);
    let mut indices = Vec::new();
    for wanted in perm_names {
        if regex {
            let re = Regex::new(wanted).map_err(|e| QueryError::RegexCompile {
                pattern: wanted.clone(),
                reason: e.to_string(),
            })?;
            indices.extend(effective.iter().filter(|(_, n)| re.is_match(n)).map(|(i, _)| *i));
        } else {
            indices.extend(effective.iter().filter(|(_, n)| n == wanted).map(|(i, _)| *i));
        }
    }
    Ok(indices)
}

/// Query builder over access-vector rules (allow/neverallow/auditallow/
/// dontaudit).
#[derive(Debug, Clone, Default)]
pub struct AvQuery {
    source: Option<String>,
    target: Option<String>,
    classes: Vec<String>,
    perms: Vec<String>,
    bool_name: Option<String>,
    kinds: Vec<AvRuleKind>,
    flags: QueryFlags,
}

impl AvQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source filter. An empty string clears it (spec §4.5:
    /// "empty string clears the filter").
    pub fn set_source(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.source = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn set_target(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.target = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn add_class(&mut self, name: impl Into<String>) -> &mut Self {
        self.classes.push(name.into());
        self
    }

    pub fn add_perm(&mut self, name: impl Into<String>) -> &mut Self {
        self.perms.push(name.into());
        self
    }

    pub fn set_bool_name(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.bool_name = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn restrict_kind(&mut self, kind: AvRuleKind) -> &mut Self {
        self.kinds.push(kind);
        self
    }

    pub fn set_flags(&mut self, flags: QueryFlags) -> &mut Self {
        self.flags = flags;
        self
    }

    pub fn regex(&mut self, on: bool) -> &mut Self {
        self.flags.set(QueryFlags::REGEX, on);
        self
    }

    pub fn only_enabled(&mut self, on: bool) -> &mut Self {
        self.flags.set(QueryFlags::ONLY_ENABLED, on);
        self
    }

    pub fn source_as_any(&mut self, on: bool) -> &mut Self {
        self.flags.set(QueryFlags::SOURCE_AS_ANY, on);
        self
    }

    pub fn source_indirect(&mut self, on: bool) -> &mut Self {
        self.flags.set(QueryFlags::SOURCE_INDIRECT, on);
        self
    }

    pub fn target_indirect(&mut self, on: bool) -> &mut Self {
        self.flags.set(QueryFlags::TARGET_INDIRECT, on);
        self
    }

    /// Execute the query (spec §4.5's numbered semantics).
    pub fn run(&self, policy: &Policy) -> Result<Vec<RuleId>, QueryError> {
        // source-as-any (spec §4.5 Invariant 9): a query naming only a
        // source `X` also matches rules where `X` appears as the target.
        // We implement this by evaluating the source filter against both
        // the source and target operand of each rule and OR-ing the hits,
        // rather than computing a literal union of two separate queries.
        let source_as_any = self.flags.contains(QueryFlags::SOURCE_AS_ANY) && self.source.is_some() && self.target.is_none();

        let source_candidates = match &self.source {
            Some(name) => {
                let exact = type_candidates(name, self.flags, &policy.types)?;
                if exact.is_empty() {
                    return Ok(Vec::new());
                }
                Some(indirect_expand(&exact, self.flags.contains(QueryFlags::SOURCE_INDIRECT), &policy.types))
            }
            None => None,
        };

        let target_candidates = if source_as_any {
            source_candidates.clone().map(|c| indirect_expand(&c, self.flags.contains(QueryFlags::TARGET_INDIRECT), &policy.types))
        } else {
            match &self.target {
                Some(name) => {
                    let exact = type_candidates(name, self.flags, &policy.types)?;
                    if exact.is_empty() {
                        return Ok(Vec::new());
                    }
                    Some(indirect_expand(&exact, self.flags.contains(QueryFlags::TARGET_INDIRECT), &policy.types))
                }
                None => None,
            }
        };

        let mut class_ids: Vec<ClassId> = Vec::new();
        for name in &self.classes {
            let matched = class_candidates(name, self.flags.contains(QueryFlags::REGEX), policy)?;
            if matched.is_empty() {
                return Ok(Vec::new());
            }
            class_ids.extend(matched.iter());
        }

        let mut results = Vec::new();
        for (table_index, rule) in policy.av_rules().iter().enumerate() {
            if !self.kinds.is_empty() && !self.kinds.contains(&rule.kind) {
                continue;
            }

            if self.flags.contains(QueryFlags::ONLY_ENABLED) {
                if let Some(binding) = rule.conditional {
                    let enabled = policy
                        .conditional(binding.cond)
                        .map(|expr| expr.enabled_on(binding.branch, &policy.bools))
                        .unwrap_or(true);
                    if !enabled {
                        continue;
                    }
                }
            }

            if let Some(bool_name) = &self.bool_name {
                let Some(binding) = rule.conditional else { continue };
                let Some(expr) = policy.conditional(binding.cond) else { continue };
                let matches_bool = if self.flags.contains(QueryFlags::REGEX) {
                    let re = Regex::new(bool_name).map_err(|e| QueryError::RegexCompile {
                        pattern: bool_name.clone(),
                        reason: e.to_string(),
                    })?;
                    expr.referenced_booleans()
                        .filter_map(|id| policy.bools.get(id))
                        .any(|b| re.is_match(&b.name))
                } else {
                    expr.referenced_booleans()
                        .filter_map(|id| policy.bools.get(id))
                        .any(|b| b.name == *bool_name)
                };
                if !matches_bool {
                    continue;
                }
            }

            let source_hit = match &source_candidates {
                Some(c) => type_set_matches(&rule.source, c),
                None => true,
            };
            let target_hit = match &target_candidates {
                Some(c) => type_set_matches(&rule.target, c),
                None => true,
            };

            let passes_source_target = if source_as_any {
                source_hit || target_hit
            } else {
                source_hit && target_hit
            };
            if !passes_source_target {
                continue;
            }

            if !class_ids.is_empty() && !rule.classes().any(|c| class_ids.contains(&c)) {
                continue;
            }

            if !self.perms.is_empty() {
                let mut any_perm_matches = false;
                for class in rule.classes() {
                    let indices = perm_local_indices_matching(class, &self.perms, self.flags.contains(QueryFlags::REGEX), policy)?;
                    if let Some(perm_set) = rule.perms.get(&class) {
                        if indices.iter().any(|i| perm_set.contains(*i)) {
                            any_perm_matches = true;
                            break;
                        }
                    }
                }
                if !any_perm_matches {
                    continue;
                }
            }

            if let Some(id) = policy.rule_id_for_av(table_index) {
                results.push(id);
            }
        }
        Ok(results)
    }
}

/// Query builder over type-enforcement (transition/change/member) rules.
#[derive(Debug, Clone, Default)]
pub struct TeQuery {
    source: Option<String>,
    target: Option<String>,
    classes: Vec<String>,
    default_type: Option<String>,
    kinds: Vec<TeRuleKind>,
    flags: QueryFlags,
}

impl TeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_source(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.source = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn set_target(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.target = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn add_class(&mut self, name: impl Into<String>) -> &mut Self {
        self.classes.push(name.into());
        self
    }

    pub fn set_default(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.default_type = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn restrict_kind(&mut self, kind: TeRuleKind) -> &mut Self {
        self.kinds.push(kind);
        self
    }

    pub fn set_flags(&mut self, flags: QueryFlags) -> &mut Self {
        self.flags = flags;
        self
    }

    pub fn run(&self, policy: &Policy) -> Result<Vec<RuleId>, QueryError> {
        let source_candidates = match &self.source {
            Some(name) => {
                let exact = type_candidates(name, self.flags, &policy.types)?;
                if exact.is_empty() {
                    return Ok(Vec::new());
                }
                Some(indirect_expand(&exact, self.flags.contains(QueryFlags::SOURCE_INDIRECT), &policy.types))
            }
            None => None,
        };
        let target_candidates = match &self.target {
            Some(name) => {
                let exact = type_candidates(name, self.flags, &policy.types)?;
                if exact.is_empty() {
                    return Ok(Vec::new());
                }
                Some(indirect_expand(&exact, self.flags.contains(QueryFlags::TARGET_INDIRECT), &policy.types))
            }
            None => None,
        };
        let default_id = match &self.default_type {
            Some(name) => {
                let id = policy.types.resolve(name);
                if id.is_none() {
                    return Ok(Vec::new());
                }
                id
            }
            None => None,
        };

        let mut class_ids: Vec<ClassId> = Vec::new();
        for name in &self.classes {
            let matched = class_candidates(name, self.flags.contains(QueryFlags::REGEX), policy)?;
            if matched.is_empty() {
                return Ok(Vec::new());
            }
            class_ids.extend(matched.iter());
        }

        let mut results = Vec::new();
        for (table_index, rule) in policy.te_rules().iter().enumerate() {
            if !self.kinds.is_empty() && !self.kinds.contains(&rule.kind) {
                continue;
            }
            if let Some(c) = &source_candidates {
                if !type_set_matches(&rule.source, c) {
                    continue;
                }
            }
            if let Some(c) = &target_candidates {
                if !type_set_matches(&rule.target, c) {
                    continue;
                }
            }
            if !class_ids.is_empty() && !rule.classes.iter().any(|c| class_ids.contains(&c)) {
                continue;
            }
            if let Some(default_id) = default_id {
                if rule.default_type != default_id {
                    continue;
                }
            }
            if let Some(id) = policy.rule_id_for_te(table_index) {
                results.push(id);
            }
        }
        Ok(results)
    }
}

/// Query builder over `role_allow` rules.
#[derive(Debug, Clone, Default)]
pub struct RoleAllowQuery {
    source: Option<String>,
    target: Option<String>,
    flags: QueryFlags,
}

impl RoleAllowQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_source(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.source = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn set_target(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.target = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn regex(&mut self, on: bool) -> &mut Self {
        self.flags.set(QueryFlags::REGEX, on);
        self
    }

    pub fn run(&self, policy: &Policy) -> Result<Vec<usize>, QueryError> {
        let source_ids = match &self.source {
            Some(name) => {
                let ids = resolve_role_candidates(name, self.flags.contains(QueryFlags::REGEX), policy)?;
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                Some(ids)
            }
            None => None,
        };
        let target_ids = match &self.target {
            Some(name) => {
                let ids = resolve_role_candidates(name, self.flags.contains(QueryFlags::REGEX), policy)?;
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                Some(ids)
            }
            None => None,
        };

        let mut results = Vec::new();
        for (idx, rule) in policy.role_allows.iter().enumerate() {
            if let Some(ids) = &source_ids {
                if !rule.source.iter().any(|r| ids.contains(&r)) {
                    continue;
                }
            }
            if let Some(ids) = &target_ids {
                if !rule.target.iter().any(|r| ids.contains(&r)) {
                    continue;
                }
            }
            results.push(idx);
        }
        Ok(results)
    }
}

fn resolve_role_candidates(name: &str, regex: bool, policy: &Policy) -> Result<Vec<RoleId>, QueryError> {
    if regex {
        let re = Regex::new(name).map_err(|e| QueryError::RegexCompile {
            pattern: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(policy.roles.iter().filter(|(_, r)| re.is_match(&r.name)).map(|(id, _)| id).collect())
    } else {
        Ok(policy.roles.id_of(name).into_iter().collect())
    }
}

/// Query builder over `range_transition` rules, the one rule kind with an
/// MLS-range comparison dimension (spec §4.5 step 3g).
#[derive(Debug, Clone, Default)]
pub struct RangeTransitionQuery {
    source: Option<String>,
    target: Option<String>,
    range: Option<(Range, CompareMode)>,
    flags: QueryFlags,
}

impl RangeTransitionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flags(&mut self, flags: QueryFlags) -> &mut Self {
        self.flags = flags;
        self
    }

    pub fn set_source(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.source = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn set_target(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.target = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn set_range(&mut self, range: Range, mode: CompareMode) -> &mut Self {
        self.range = Some((range, mode));
        self
    }

    pub fn run(&self, policy: &Policy) -> Result<Vec<usize>, QueryError> {
        let source_candidates = match &self.source {
            Some(name) => {
                let exact = type_candidates(name, self.flags, &policy.types)?;
                if exact.is_empty() {
                    return Ok(Vec::new());
                }
                Some(indirect_expand(&exact, self.flags.contains(QueryFlags::SOURCE_INDIRECT), &policy.types))
            }
            None => None,
        };
        let target_candidates = match &self.target {
            Some(name) => {
                let exact = type_candidates(name, self.flags, &policy.types)?;
                if exact.is_empty() {
                    return Ok(Vec::new());
                }
                Some(indirect_expand(&exact, self.flags.contains(QueryFlags::TARGET_INDIRECT), &policy.types))
            }
            None => None,
        };

        let mut results = Vec::new();
        for (idx, rule) in policy.range_transitions.iter().enumerate() {
            if let Some(c) = &source_candidates {
                if !type_set_matches(&rule.source, c) {
                    continue;
                }
            }
            if let Some(c) = &target_candidates {
                if !type_set_matches(&rule.target, c) {
                    continue;
                }
            }
            if let Some((range, mode)) = &self.range {
                if !range.compare(&rule.target_range, *mode, &policy.sens) {
                    continue;
                }
            }
            results.push(idx);
        }
        Ok(results)
    }
}

/// Role-transition query: source roles × target types → default role.
#[derive(Debug, Clone, Default)]
pub struct RoleTransitionQuery {
    source_role: Option<String>,
    target_type: Option<String>,
    flags: QueryFlags,
}

impl RoleTransitionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_flags(&mut self, flags: QueryFlags) -> &mut Self {
        self.flags = flags;
        self
    }

    pub fn set_source_role(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.source_role = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn set_target_type(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.target_type = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn run<'p>(&self, policy: &'p Policy) -> Result<Vec<&'p RoleTransition>, QueryError> {
        let source_ids = match &self.source_role {
            Some(name) => {
                let ids = resolve_role_candidates(name, self.flags.contains(QueryFlags::REGEX), policy)?;
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                Some(ids)
            }
            None => None,
        };
        let target_candidates = match &self.target_type {
            Some(name) => {
                let exact = type_candidates(name, self.flags, &policy.types)?;
                if exact.is_empty() {
                    return Ok(Vec::new());
                }
                Some(indirect_expand(&exact, self.flags.contains(QueryFlags::TARGET_INDIRECT), &policy.types))
            }
            None => None,
        };

        Ok(policy
            .role_transitions
            .iter()
            .filter(|rule| {
                let source_ok = source_ids.as_ref().map(|ids| rule.source_roles.iter().any(|r| ids.contains(&r))).unwrap_or(true);
                let target_ok = target_candidates.as_ref().map(|c| type_set_matches(&rule.target_types, c)).unwrap_or(true);
                source_ok && target_ok
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{ObjectClass, PermissionSet};
    use crate::conditional::{BoolStore, Boolean, BranchSide, CondExprNode, ConditionalExpr};
    use crate::config::PolicyEngineConfig;
    use crate::identity::{HandleId, PermId};
    use crate::rules::{AvRule, CondBinding, TypeSet};
    use crate::types::TypeKind;
    use std::collections::HashMap as StdHashMap;

    fn scenario_a_policy() -> (Policy, TypeId, TypeId, ClassId) {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let t_a = policy.types.declare("t_a", TypeKind::Concrete);
        let t_b = policy.types.declare("t_b", TypeKind::Concrete);
        let attr = policy.types.declare("a", TypeKind::Attribute);
        policy.types.add_member(attr, t_a);

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
        let mut perm_map = StdHashMap::new();
        perm_map.insert(file_id, perms);

        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(attr),
            target: TypeSet::single(t_b),
            perms: perm_map,
            conditional: None,
        });
        (policy, t_a, t_b, file_id)
    }

    #[test]
    fn scenario_a_query_by_concrete_source_finds_attribute_rule() {
        let (policy, t_a, t_b, file_id) = scenario_a_policy();
        let t_a_name = policy.types.get(t_a).unwrap().name.clone();
        let t_b_name = policy.types.get(t_b).unwrap().name.clone();
        let file_name = policy.classes.get(file_id).unwrap().name.clone();

        let mut query = AvQuery::new();
        query.set_source(t_a_name).set_target(t_b_name).add_class(file_name).source_indirect(true);
        let results = query.run(&policy).unwrap();
        assert_eq!(results.len(), 1);

        let rule = match policy.rule(results[0]).unwrap() {
            crate::policy::RuleView::Av(r) => r,
            _ => panic!("expected AV rule"),
        };
        assert_eq!(rule.perms.get(&file_id).unwrap().len(), 2);
    }

    #[test]
    fn scenario_b_exact_attribute_match_and_indirect_off_excludes_member() {
        let (policy, t_a, t_b, file_id) = scenario_a_policy();
        let t_b_name = policy.types.get(t_b).unwrap().name.clone();
        let file_name = policy.classes.get(file_id).unwrap().name.clone();

        let mut query_a = AvQuery::new();
        query_a.set_source("a").set_target(t_b_name.clone()).add_class(file_name.clone()).source_indirect(false);
        assert_eq!(query_a.run(&policy).unwrap().len(), 1);

        let t_a_name = policy.types.get(t_a).unwrap().name.clone();
        let mut query_ta = AvQuery::new();
        query_ta.set_source(t_a_name).set_target(t_b_name).add_class(file_name).source_indirect(false);
        assert_eq!(query_ta.run(&policy).unwrap().len(), 0);
    }

    #[test]
    fn scenario_c_only_enabled_follows_conditional_branch() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let t1 = policy.types.declare("t1", TypeKind::Concrete);
        let t2 = policy.types.declare("t2", TypeKind::Concrete);
        let file_id = policy.classes.insert("file", ObjectClass::new("file", None));
        let read_idx = {
            let file = policy.classes.get_mut(file_id).unwrap();
            file.add_perm(PermId::from_index(0), "read", file_id)
        };
        let write_idx = {
            let file = policy.classes.get_mut(file_id).unwrap();
            file.add_perm(PermId::from_index(1), "write", file_id)
        };

        policy.bools = BoolStore::default();
        let b = policy.bools.insert("b", Boolean::new("b", false));
        let cond_id = policy.add_conditional(ConditionalExpr::new(vec![CondExprNode::BoolRef(b)]));

        let mut read_perms = PermissionSet::new();
        read_perms.insert(read_idx);
        let mut read_map = StdHashMap::new();
        read_map.insert(file_id, read_perms);
        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t1),
            target: TypeSet::single(t2),
            perms: read_map,
            conditional: Some(CondBinding { cond: cond_id, branch: BranchSide::True }),
        });

        let mut write_perms = PermissionSet::new();
        write_perms.insert(write_idx);
        let mut write_map = StdHashMap::new();
        write_map.insert(file_id, write_perms);
        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t1),
            target: TypeSet::single(t2),
            perms: write_map,
            conditional: Some(CondBinding { cond: cond_id, branch: BranchSide::False }),
        });

        let t1_name = policy.types.get(t1).unwrap().name.clone();
        let mut query = AvQuery::new();
        query.set_source(t1_name.clone()).only_enabled(true);
        let results = query.run(&policy).unwrap();
        assert_eq!(results.len(), 1);
        let rule = match policy.rule(results[0]).unwrap() {
            crate::policy::RuleView::Av(r) => r,
            _ => panic!(),
        };
        assert!(rule.perms.get(&file_id).unwrap().contains(write_idx));

        policy.bools.get_mut(b).unwrap().current_value = true;
        let mut query2 = AvQuery::new();
        query2.set_source(t1_name).only_enabled(true);
        let results2 = query2.run(&policy).unwrap();
        assert_eq!(results2.len(), 1);
        let rule2 = match policy.rule(results2[0]).unwrap() {
            crate::policy::RuleView::Av(r) => r,
            _ => panic!(),
        };
        assert!(rule2.perms.get(&file_id).unwrap().contains(read_idx));
    }

    #[test]
    fn source_as_any_equals_union_of_source_and_target_queries() {
        let (policy, t_a, t_b, file_id) = scenario_a_policy();
        let _ = file_id;
        let t_b_name = policy.types.get(t_b).unwrap().name.clone();

        let mut any_query = AvQuery::new();
        any_query.set_source(t_b_name.clone()).source_as_any(true).source_indirect(true).target_indirect(true);
        let any_results: std::collections::BTreeSet<_> = any_query.run(&policy).unwrap().into_iter().collect();

        let mut source_query = AvQuery::new();
        source_query.set_source(t_b_name.clone()).source_indirect(true);
        let mut source_results: std::collections::BTreeSet<_> = source_query.run(&policy).unwrap().into_iter().collect();

        let mut target_query = AvQuery::new();
        target_query.set_target(t_b_name).target_indirect(true);
        let target_results: std::collections::BTreeSet<_> = target_query.run(&policy).unwrap().into_iter().collect();

        source_results.extend(target_results);
        assert_eq!(any_results, source_results);
        let _ = t_a;
    }

    #[test]
    fn unmatched_exact_filter_returns_empty_immediately() {
        let (policy, _t_a, _t_b, _file_id) = scenario_a_policy();
        let mut query = AvQuery::new();
        query.set_source("does_not_exist_t");
        assert_eq!(query.run(&policy).unwrap(), Vec::new());
    }
}
