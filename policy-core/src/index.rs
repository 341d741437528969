//! Rule hash / secondary index (spec §4.2).
//!
//! Accelerates "given a ground (source, target, class, kind) triple, find
//! matching rules" from a linear scan of every rule table to a hash lookup.
//! Built once, lazily, behind `Policy::rule_index()`'s `OnceLock` (spec §9's
//! redesign of `avh_build_hashtab`).

use crate::classes::PermissionSet;
use crate::identity::{ClassId, RuleId, TypeId};
use crate::policy::Policy;
use crate::rules::{AvRuleKind, TeRuleKind};
use std::collections::HashMap;

/// Which rule table a bucket's entries were expanded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKindKey {
    Av(AvRuleKind),
    Te(TeRuleKind),
}

/// `(source, target, class, kind)` — the index's key, always over concrete
/// type/class ids; attributes are expanded away at build time and aliases
/// never appear here (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleIndexKey {
    pub source: TypeId,
    pub target: TypeId,
    pub class: ClassId,
    pub kind: RuleKindKey,
}

/// One entry in a bucket: a rule id plus whether it is presently enabled
/// under the policy's current Boolean valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedRule {
    pub rule: RuleId,
    pub enabled: bool,
    pub perms: PermissionSet,
}

/// The built hash index: a `(src, tgt, class, kind)` → bucket map, plus
/// by-source and by-target secondary maps for the two single-type lookups
/// spec §4.2 names.
#[derive(Debug, Default)]
pub struct RuleIndex {
    by_triple: HashMap<RuleIndexKey, Vec<IndexedRule>>,
    by_source: HashMap<TypeId, Vec<RuleId>>,
    by_target: HashMap<TypeId, Vec<RuleId>>,
}

impl RuleIndex {
    /// Build the index over every AV and TE rule in `policy` (spec §4.2's
    /// build algorithm). Duplicate bucket entries for the same rule id are
    /// collapsed and their permission bitsets unioned — "multiple rules
    /// permitting overlapping perms for the same triple combine
    /// additively."
    pub fn build(policy: &Policy) -> Self {
        let mut index = RuleIndex::default();

        for (table_index, rule) in policy.av_rules().iter().enumerate() {
            let rule_id = policy
                .rule_id_for_av(table_index)
                .expect("av rule table index must have a RuleId");
            let enabled = match rule.conditional {
                None => true,
                Some(binding) => policy
                    .conditional(binding.cond)
                    .map(|expr| expr.enabled_on(binding.branch, &policy.bools))
                    .unwrap_or(true),
            };
            for src in rule.source.expand_literal(&policy.types).iter() {
                for tgt in rule.target.expand(src, &policy.types).iter() {
                    for class in rule.classes() {
                        let perms = rule.perms.get(&class).copied().unwrap_or_default();
                        let key = RuleIndexKey {
                            source: src,
                            target: tgt,
                            class,
                            kind: RuleKindKey::Av(rule.kind),
                        };
                        index.insert_triple(key, rule_id, enabled, perms);
                    }
                }
                index.by_source.entry(src).or_default().push(rule_id);
                for tgt in rule.target.expand(src, &policy.types).iter() {
                    index.by_target.entry(tgt).or_default().push(rule_id);
                }
            }
        }

        for (table_index, rule) in policy.te_rules().iter().enumerate() {
            let rule_id = policy
                .rule_id_for_te(table_index)
                .expect("te rule table index must have a RuleId");
            let enabled = match rule.conditional {
                None => true,
                Some(binding) => policy
                    .conditional(binding.cond)
                    .map(|expr| expr.enabled_on(binding.branch, &policy.bools))
                    .unwrap_or(true),
            };
            for src in rule.source.expand_literal(&policy.types).iter() {
                for tgt in rule.target.expand(src, &policy.types).iter() {
                    for class in rule.classes.iter() {
                        let key = RuleIndexKey {
                            source: src,
                            target: tgt,
                            class,
                            kind: RuleKindKey::Te(rule.kind),
                        };
                        index.insert_triple(key, rule_id, enabled, PermissionSet::new());
                    }
                }
                index.by_source.entry(src).or_default().push(rule_id);
                for tgt in rule.target.expand(src, &policy.types).iter() {
                    index.by_target.entry(tgt).or_default().push(rule_id);
                }
            }
        }

        for bucket in index.by_triple.values_mut() {
            bucket.sort_by_key(|entry| entry.rule);
        }
        for bucket in index.by_source.values_mut() {
            bucket.sort();
            bucket.dedup();
        }
        for bucket in index.by_target.values_mut() {
            bucket.sort();
            bucket.dedup();
        }

        index
    }

    fn insert_triple(&mut self, key: RuleIndexKey, rule: RuleId, enabled: bool, perms: PermissionSet) {
        let bucket = self.by_triple.entry(key).or_default();
        if let Some(existing) = bucket.iter_mut().find(|e| e.rule == rule) {
            existing.perms.union_with(&perms);
            existing.enabled = existing.enabled || enabled;
        } else {
            bucket.push(IndexedRule { rule, enabled, perms });
        }
    }

    /// Rules matching a fully specified `(source, target, class, kind)`
    /// triple, in stable order (lowest rule id first).
    pub fn lookup_triple(&self, key: &RuleIndexKey) -> &[IndexedRule] {
        self.by_triple.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rules whose (expanded) source-type set contains `source`.
    pub fn lookup_source(&self, source: TypeId) -> &[RuleId] {
        self.by_source.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rules whose (expanded) target-type set contains `target`.
    pub fn lookup_target(&self, target: TypeId) -> &[RuleId] {
        self.by_target.get(&target).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{ClassStore, ObjectClass, PermissionSet};
    use crate::config::PolicyEngineConfig;
    use crate::identity::PermId;
    use crate::rules::{AvRule, AvRuleKind, TypeSet};
    use crate::types::TypeKind;
    use std::collections::HashMap as StdHashMap;

    #[test]
    fn index_collapses_duplicate_triples_and_unions_perms() {
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

        let mut read_perms = PermissionSet::new();
        read_perms.insert(read_idx);
        let mut perms1 = StdHashMap::new();
        perms1.insert(file_id, read_perms);
        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t_a),
            target: TypeSet::single(t_b),
            perms: perms1,
            conditional: None,
        });

        let mut write_perms = PermissionSet::new();
        write_perms.insert(write_idx);
        let mut perms2 = StdHashMap::new();
        perms2.insert(file_id, write_perms);
        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t_a),
            target: TypeSet::single(t_b),
            perms: perms2,
            conditional: None,
        });

        let index = policy.rule_index();
        let key = RuleIndexKey {
            source: t_a,
            target: t_b,
            class: file_id,
            kind: RuleKindKey::Av(AvRuleKind::Allow),
        };
        let bucket = index.lookup_triple(&key);
        assert_eq!(bucket.len(), 2, "two distinct rules should not collapse into one");
        let source_hits = index.lookup_source(t_a);
        assert_eq!(source_hits.len(), 2);
    }

    #[test]
    fn attribute_expansion_reaches_index_buckets() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let t_a = policy.types.declare("t_a", TypeKind::Concrete);
        let attr = policy.types.declare("an_attr", TypeKind::Attribute);
        policy.types.add_member(attr, t_a);
        let t_b = policy.types.declare("t_b", TypeKind::Concrete);
        let file_id = policy.classes.insert("file", ObjectClass::new("file", None));
        let read_idx = policy.classes.get_mut(file_id).unwrap().add_perm(PermId::from_index(0), "read", file_id);

        let mut perms = PermissionSet::new();
        perms.insert(read_idx);
        let mut perm_map = StdHashMap::new();
        perm_map.insert(file_id, perms);
        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(attr),
            target: TypeSet::single(t_b),
            perms: perm_map,
            conditional: None,
        });

        let index = policy.rule_index();
        let key = RuleIndexKey {
            source: t_a,
            target: t_b,
            class: file_id,
            kind: RuleKindKey::Av(AvRuleKind::Allow),
        };
        assert_eq!(index.lookup_triple(&key).len(), 1);
    }
}
