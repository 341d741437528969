//! Property tests for the semantic diff engine (spec §8 invariants 4, 5):
//! `diff(P, P)` is always empty, and `diff(P1, P2)` / `diff(P2, P1)` swap
//! every add/remove (and added_type/removed_type) while leaving the
//! modified count unchanged.

use policy_core::*;
use policy_test_utils::generators::*;
use proptest::prelude::*;
use std::collections::HashMap;

/// Build a policy with one `file` class (random permission names) and one
/// `allow` rule per declared type, wired in a ring so every type is both a
/// source and a target somewhere.
fn ring_policy(type_names: &[String], perm_names: &[String]) -> Policy {
    let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
    let class_id = policy.classes.insert("file", ObjectClass::new("file", None));
    let mut perm_indices = Vec::new();
    for (i, name) in perm_names.iter().enumerate() {
        let idx = policy.classes.get_mut(class_id).unwrap().add_perm(PermId::from_index(i as u32), name, class_id);
        perm_indices.push(idx);
    }

    let type_ids: Vec<TypeId> = type_names.iter().map(|n| policy.types.declare(n.clone(), TypeKind::Concrete)).collect();
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
    policy
}

proptest! {
    /// Invariant 4: diffing a policy against itself is always empty.
    #[test]
    fn diff_against_self_is_always_empty(type_names in arb_type_names(8), perm_names in arb_perm_names(4)) {
        let policy = ring_policy(&type_names, &perm_names);
        let report = diff_policies(&policy, &policy);
        prop_assert!(report.is_empty(), "unexpected diffs: {:?}", report.diffs);
    }

    /// Invariant 5: diffing P1 against P2 (P2 = P1 plus one extra declared
    /// type) swaps add/remove and added_type/removed_type, across every
    /// requested kind, when the direction is reversed.
    #[test]
    fn diff_swaps_add_remove_in_reverse_direction(
        type_names in arb_type_names(8),
        perm_names in arb_perm_names(4),
        extra_name in arb_identifier(),
    ) {
        prop_assume!(!type_names.contains(&extra_name));
        let left = ring_policy(&type_names, &perm_names);
        let mut right = ring_policy(&type_names, &perm_names);
        right.types.declare(extra_name, TypeKind::Concrete);

        let forward = diff_policies(&left, &right);
        let backward = diff_policies(&right, &left);

        for kind in DiffKind::ALL {
            let fwd = forward.get_stats(*kind);
            let back = backward.get_stats(*kind);
            prop_assert_eq!(fwd.added, back.removed, "kind {:?} added/removed mismatch", kind);
            prop_assert_eq!(fwd.removed, back.added, "kind {:?} removed/added mismatch", kind);
            prop_assert_eq!(fwd.added_type, back.removed_type, "kind {:?} added_type/removed_type mismatch", kind);
            prop_assert_eq!(fwd.removed_type, back.added_type, "kind {:?} removed_type/added_type mismatch", kind);
            prop_assert_eq!(fwd.modified, back.modified, "kind {:?} modified count mismatch", kind);
        }
    }
}
