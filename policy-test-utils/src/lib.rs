//! Policy Test Utilities
//!
//! Centralized test infrastructure for the policy-analysis workspace:
//! - Proptest generators for policy-core's symbol and rule types
//! - Fixture builders for the end-to-end scenarios the model's invariants
//!   are checked against
//! - Custom assertions for query/diff/analysis results

pub use policy_core::*;

pub mod generators {
    //! Proptest strategies for policy-core's entity types. Each generator
    //! stays inside the conservative name charset reference policy sources
    //! use (`[a-z][a-z0-9_]*`) so generated identifiers never collide with a
    //! reserved keyword.

    use proptest::prelude::*;

    /// Generate a plausible SELinux-style identifier.
    pub fn arb_identifier() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{1,12}_t".prop_map(|s| s)
    }

    /// Generate a plausible permission name.
    pub fn arb_perm_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{2,10}"
    }

    /// Generate a small, duplicate-free set of permission names for one
    /// class declaration.
    pub fn arb_perm_names(max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::hash_set(arb_perm_name(), 1..max.max(2)).prop_map(|set| set.into_iter().collect())
    }

    /// Generate a small, duplicate-free set of type names.
    pub fn arb_type_names(max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::hash_set(arb_identifier(), 1..max.max(2)).prop_map(|set| set.into_iter().collect())
    }
}

pub mod fixtures {
    //! Builders for the end-to-end scenarios used to check the model's
    //! documented invariants. Each function returns a freshly built
    //! in-memory `Policy`; callers that want to inspect a specific id (the
    //! orphan role in `scenario_f`, say) get it back as a named field on a
    //! small struct rather than having to re-resolve it by name.

    use policy_core::*;
    use std::collections::HashMap;

    fn default_config() -> PolicyEngineConfig {
        PolicyEngineConfig::reference_policy_defaults()
    }

    fn declare_file_class(policy: &mut Policy) -> (ClassId, usize, usize) {
        let file_id = policy.classes.insert("file", ObjectClass::new("file", None));
        let read_idx = policy.classes.get_mut(file_id).unwrap().add_perm(PermId::from_index(0), "read", file_id);
        let write_idx = policy.classes.get_mut(file_id).unwrap().add_perm(PermId::from_index(1), "write", file_id);
        (file_id, read_idx, write_idx)
    }

    /// Scenario A: a concrete type `t_a` belonging to attribute `a`, an
    /// `allow a t_b : file { read write };` rule. Used to check that a
    /// source query on the concrete member with indirect expansion finds
    /// the rule written against the attribute.
    pub struct ScenarioA {
        pub policy: Policy,
        pub t_a: TypeId,
        pub t_b: TypeId,
        pub attr_a: TypeId,
    }

    pub fn scenario_a() -> ScenarioA {
        let mut policy = Policy::new(default_config());
        let t_a = policy.types.declare("t_a", TypeKind::Concrete);
        let t_b = policy.types.declare("t_b", TypeKind::Concrete);
        let attr_a = policy.types.declare("a", TypeKind::Attribute);
        policy.types.add_member(attr_a, t_a);

        let (file_id, read_idx, write_idx) = declare_file_class(&mut policy);
        let mut perms = PermissionSet::new();
        perms.insert(read_idx);
        perms.insert(write_idx);
        let mut perm_map = HashMap::new();
        perm_map.insert(file_id, perms);

        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(attr_a),
            target: TypeSet::single(t_b),
            perms: perm_map,
            conditional: None,
        });

        ScenarioA { policy, t_a, t_b, attr_a }
    }

    /// Scenario C: a Boolean-guarded pair of rules on the same (source,
    /// target, class) triple, one per branch. Used to check that
    /// only-enabled queries follow the Boolean's current value.
    pub struct ScenarioC {
        pub policy: Policy,
        pub t1: TypeId,
        pub t2: TypeId,
        pub b: BoolId,
    }

    pub fn scenario_c(bool_current_value: bool) -> ScenarioC {
        let mut policy = Policy::new(default_config());
        let t1 = policy.types.declare("t1", TypeKind::Concrete);
        let t2 = policy.types.declare("t2", TypeKind::Concrete);
        let (file_id, read_idx, write_idx) = declare_file_class(&mut policy);

        let b = policy.bools.insert(
            "b",
            Boolean {
                name: "b".to_string(),
                default_value: bool_current_value,
                current_value: bool_current_value,
            },
        );
        let cond = policy.add_conditional(ConditionalExpr {
            nodes: vec![CondExprNode::BoolRef(b)],
        });

        // spec.md Scenario C: `if (b) { allow t1 t2 : file read; } else {
        // allow t1 t2 : file write; }` — the if-block (read) is the True
        // branch, the else-block (write) is the False branch.
        let mut read_perms = PermissionSet::new();
        read_perms.insert(read_idx);
        let mut read_map = HashMap::new();
        read_map.insert(file_id, read_perms);
        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t1),
            target: TypeSet::single(t2),
            perms: read_map,
            conditional: Some(CondBinding { cond, branch: BranchSide::True }),
        });

        let mut write_perms = PermissionSet::new();
        write_perms.insert(write_idx);
        let mut write_map = HashMap::new();
        write_map.insert(file_id, write_perms);
        policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t1),
            target: TypeSet::single(t2),
            perms: write_map,
            conditional: Some(CondBinding { cond, branch: BranchSide::False }),
        });

        ScenarioC { policy, t1, t2, b }
    }

    /// Scenario D: a policy and a second revision of it where an `allow`
    /// rule's permission set has grown. Used to check the diff engine's
    /// Modified reporting.
    pub fn scenario_d_pair() -> (Policy, Policy) {
        let mut left = Policy::new(default_config());
        let t_a = left.types.declare("t_a", TypeKind::Concrete);
        let t_b = left.types.declare("t_b", TypeKind::Concrete);
        let (file_id, read_idx, _write_idx) = declare_file_class(&mut left);
        let mut read_only = PermissionSet::new();
        read_only.insert(read_idx);
        let mut perm_map = HashMap::new();
        perm_map.insert(file_id, read_only);
        left.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t_a),
            target: TypeSet::single(t_b),
            perms: perm_map,
            conditional: None,
        });

        let mut right = Policy::new(default_config());
        let t_a_r = right.types.declare("t_a", TypeKind::Concrete);
        let t_b_r = right.types.declare("t_b", TypeKind::Concrete);
        let (file_id_r, read_idx_r, write_idx_r) = declare_file_class(&mut right);
        let mut read_write = PermissionSet::new();
        read_write.insert(read_idx_r);
        read_write.insert(write_idx_r);
        let mut perm_map_r = HashMap::new();
        perm_map_r.insert(file_id_r, read_write);
        right.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t_a_r),
            target: TypeSet::single(t_b_r),
            perms: perm_map_r,
            conditional: None,
        });

        (left, right)
    }

    /// Scenario E: a `range_transition` from `sysadm_t` to `passwd_exec_t`
    /// with every supporting piece present *except* the `allow ... file
    /// execute;` rule, so `impossible_range_transition` reports exactly one
    /// missing clause.
    pub struct ScenarioE {
        pub policy: Policy,
        pub sysadm_t: TypeId,
        pub passwd_exec_t: TypeId,
    }

    pub fn scenario_e() -> ScenarioE {
        let mut policy = Policy::new(default_config());
        let sysadm_t = policy.types.declare("sysadm_t", TypeKind::Concrete);
        let passwd_exec_t = policy.types.declare("passwd_exec_t", TypeKind::Concrete);

        let s0 = policy.sens.insert(
            "s0",
            Sensitivity {
                name: "s0".to_string(),
                order: 0,
                legal_cats: IdSet::new(),
            },
        );
        let level = Level::new(s0, IdSet::new());

        let mut role = Role::new("sysadm_r");
        role.types.insert(sysadm_t);
        let role_id = policy.roles.insert("sysadm_r", role);
        let mut user = User::new("sysadm_u");
        user.roles.insert(role_id);
        user.range = Some(Range::single(level.clone()));
        policy.users.insert("sysadm_u", user);

        policy.range_transitions.push(RangeTransition {
            source: TypeSet::single(sysadm_t),
            target: TypeSet::single(passwd_exec_t),
            target_range: Range::single(level),
        });

        ScenarioE { policy, sysadm_t, passwd_exec_t }
    }

    /// Scenario F: an orphan role `r_orphan` assigned a type but never
    /// named by a `role_allow`, a `role_transition`, or a user.
    pub struct ScenarioF {
        pub policy: Policy,
        pub r_orphan: RoleId,
    }

    pub fn scenario_f() -> ScenarioF {
        let mut policy = Policy::new(default_config());
        let t = policy.types.declare("t_orphan", TypeKind::Concrete);
        let mut orphan = Role::new("r_orphan");
        orphan.types.insert(t);
        let r_orphan = policy.roles.insert("r_orphan", orphan);

        let staff_t = policy.types.declare("staff_t", TypeKind::Concrete);
        let mut staff = Role::new("staff_r");
        staff.types.insert(staff_t);
        let staff_id = policy.roles.insert("staff_r", staff);
        let mut user = User::new("staff_u");
        user.roles.insert(staff_id);
        policy.users.insert("staff_u", user);
        let mut source = IdSet::new();
        source.insert(staff_id);
        policy.role_allows.push(RoleAllow { source, target: IdSet::new() });

        ScenarioF { policy, r_orphan }
    }
}

pub mod assertions {
    //! Small assertion helpers that turn common query/diff/analysis checks
    //! into one call instead of a multi-line `assert!` at every call site.

    use policy_core::*;

    /// Panics unless `ids` names exactly the rules rendering to
    /// `expected_renders` (order-independent).
    pub fn assert_rules_render_to(policy: &Policy, ids: &[RuleId], expected_renders: &[&str]) {
        let mut actual: Vec<String> = ids
            .iter()
            .filter_map(|id| policy.rule(*id))
            .map(|view| match view {
                RuleView::Av(rule) => render_av_rule(rule, policy),
                RuleView::Te(rule) => render_te_rule(rule, policy),
            })
            .collect();
        actual.sort();
        let mut expected: Vec<String> = expected_renders.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(actual, expected, "rendered rule set did not match expectation");
    }

    /// Panics unless `report` contains a diff of `kind`/`form` named `name`.
    pub fn assert_diff_contains(report: &DiffReport, kind: DiffKind, form: DiffForm, name: &str) {
        let found = report
            .diffs
            .iter()
            .any(|d| d.kind == kind && d.form == form && d.name == name);
        assert!(found, "expected a {kind:?}/{form:?} diff named '{name}', found none in {:?}", report.diffs);
    }

    /// Panics unless `result` has exactly one item named `object` whose
    /// proofs include one with `text` equal to `expected_text`.
    pub fn assert_single_item_with_proof(result: &policy_core::analysis::AnalysisResult, object: &str, expected_text: &str) {
        assert_eq!(result.items.len(), 1, "expected exactly one item, got {:?}", result.items);
        assert_eq!(result.items[0].object, object);
        assert!(
            result.items[0].proofs.iter().any(|p| p.text == expected_text),
            "no proof with text '{expected_text}' among {:?}",
            result.items[0].proofs
        );
    }
}
