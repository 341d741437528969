//! Property tests for determinism and the source-as-any semantics (spec §8
//! invariants 1, 3, 9). Generators come from `policy_test_utils::generators`;
//! policies are assembled by hand here since these properties need control
//! over exact type/attribute/rule shape that a generic policy generator
//! would obscure.

use policy_core::*;
use policy_test_utils::generators::*;
use proptest::prelude::*;
use std::collections::HashMap;

fn build_policy(type_names: &[String], perm_names: &[String]) -> (Policy, Vec<TypeId>, ClassId) {
    let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
    let class_id = policy.classes.insert("file", ObjectClass::new("file", None));
    let mut perm_indices = Vec::new();
    for (i, name) in perm_names.iter().enumerate() {
        let idx = policy.classes.get_mut(class_id).unwrap().add_perm(PermId::from_index(i as u32), name, class_id);
        perm_indices.push(idx);
    }

    let type_ids: Vec<TypeId> = type_names.iter().map(|n| policy.types.declare(n.clone(), TypeKind::Concrete)).collect();

    // Every type allows the next type (wrapping) every permission, so the
    // generated policy always has at least one rule per type when there are
    // at least two types.
    for w in 0..type_ids.len() {
        let src = type_ids[w];
        let tgt = type_ids[(w + 1) % type_ids.len()];
        let mut perms = PermissionSet::new();
        for &idx in &perm_indices {
            perms.insert(idx);
        }
        let mut perm_map = HashMap::new();
        perm_map.insert(class_id, perms);
        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(src),
            target: TypeSet::single(tgt),
            perms: perm_map,
            conditional: None,
        });
    }

    (policy, type_ids, class_id)
}

proptest! {
    /// Invariant 3: `run(Q, P)` is deterministic across repeated executions
    /// against the same policy, with a stable element order.
    #[test]
    fn query_run_is_deterministic(type_names in arb_type_names(8), perm_names in arb_perm_names(4)) {
        let (policy, type_ids, _class_id) = build_policy(&type_names, &perm_names);
        let source_name = policy.types.get(type_ids[0]).unwrap().name.clone();

        let mut query = AvQuery::new();
        query.set_source(source_name);

        let first = query.run(&policy).unwrap();
        for _ in 0..5 {
            let again = query.run(&policy).unwrap();
            prop_assert_eq!(&first, &again);
        }
    }

    /// Invariant 9: a source-as-any query on X returns exactly the union of
    /// a source-only query on X and a target-only query on X.
    #[test]
    fn source_as_any_equals_union_of_source_and_target_queries(
        type_names in arb_type_names(8),
        perm_names in arb_perm_names(4),
    ) {
        let (policy, type_ids, _class_id) = build_policy(&type_names, &perm_names);
        let pick_name = policy.types.get(type_ids[0]).unwrap().name.clone();

        let mut any_query = AvQuery::new();
        any_query.set_source(pick_name.clone()).source_as_any(true);
        let any_ids = any_query.run(&policy).unwrap();

        let mut source_query = AvQuery::new();
        source_query.set_source(pick_name.clone());
        let source_ids = source_query.run(&policy).unwrap();

        let mut target_query = AvQuery::new();
        target_query.set_target(pick_name);
        let target_ids = target_query.run(&policy).unwrap();

        let mut expected: Vec<RuleId> = source_ids.into_iter().chain(target_ids).collect();
        expected.sort();
        expected.dedup();

        let mut actual = any_ids;
        actual.sort();
        actual.dedup();

        prop_assert_eq!(expected, actual);
    }

    /// Invariant 1: attribute-expansion commutes with alias resolution.
    #[test]
    fn expand_commutes_with_alias_resolution(type_names in arb_type_names(6)) {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let attr = policy.types.declare("dom", TypeKind::Attribute);
        let mut members = Vec::new();
        for name in &type_names {
            let t = policy.types.declare(name.clone(), TypeKind::Concrete);
            policy.types.add_member(attr, t);
            members.push(t);
        }
        let t0 = members[0];
        policy.types.declare_alias("t0_alias", t0);

        let via_primary = policy.types.expand(t0);
        let alias_id = policy.types.resolve("t0_alias").unwrap();
        let via_alias = policy.types.expand(alias_id);

        prop_assert_eq!(via_primary, via_alias);
    }
}
