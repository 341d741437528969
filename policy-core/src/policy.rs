//! The central, immutable-after-load policy object (spec §3 "Lifecycle").

use crate::classes::ClassStore;
use crate::conditional::{BoolStore, ConditionalExpr};
use crate::config::PolicyEngineConfig;
use crate::context::{Context, InitialSid};
use crate::constraint::Constraint;
use crate::identity::{CondId, HandleId, RuleId};
use crate::index::RuleIndex;
use crate::mls::{CatStore, SensStore};
use crate::rbac::{RoleStore, UserStore};
use crate::rules::{AvRule, RangeTransition, RoleAllow, RoleTransition, TeRule};
use crate::types::TypeStore;
use std::collections::HashMap;
use std::sync::OnceLock;

/// What a loaded policy retains, per spec §6's capability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PolicyCapabilities {
    pub attribute_names: bool,
    pub syntactic_rules: bool,
    pub line_numbers: bool,
    pub conditionals: bool,
    pub mls: bool,
    pub policy_capabilities: bool,
    pub source_form: bool,
    pub is_module: bool,
}

/// Which table a `RuleId` was allocated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleRef {
    Av(usize),
    Te(usize),
}

/// A borrowed view of a rule addressed by `RuleId`, returned by queries.
#[derive(Debug, Clone, Copy)]
pub enum RuleView<'p> {
    Av(&'p AvRule),
    Te(&'p TeRule),
}

/// The fully loaded, read-only policy model (spec components 1-5).
///
/// Built incrementally by a loader through the `declare_*`/`add_*` methods,
/// then handed out by shared reference. The rule hash index is the one
/// piece of derived state and is built lazily behind a `OnceLock` the first
/// time `rule_index()` is called, or eagerly by `finish()` if
/// `config.eager_index_build` is set — either satisfies spec §5's
/// "one-shot initialization barrier" requirement.
pub struct Policy {
    pub types: TypeStore,
    pub classes: ClassStore,
    pub roles: RoleStore,
    pub users: UserStore,
    pub bools: BoolStore,
    pub sens: SensStore,
    pub cats: CatStore,

    conditionals: Vec<ConditionalExpr>,

    av_rules: Vec<AvRule>,
    te_rules: Vec<TeRule>,
    rule_refs: Vec<RuleRef>,
    /// Parallel to `av_rules`/`te_rules`: the `RuleId` each table index was
    /// allocated under, so `RuleIndex::build` can map a table entry back to
    /// its id in O(1) instead of scanning `rule_refs`.
    av_rule_ids: Vec<RuleId>,
    te_rule_ids: Vec<RuleId>,

    pub role_allows: Vec<RoleAllow>,
    pub role_transitions: Vec<RoleTransition>,
    pub range_transitions: Vec<RangeTransition>,
    pub constraints: Vec<Constraint>,

    pub initial_sids: HashMap<InitialSid, Context>,
    pub capabilities: PolicyCapabilities,
    pub config: PolicyEngineConfig,

    rule_index: OnceLock<RuleIndex>,
}

impl Policy {
    pub fn new(config: PolicyEngineConfig) -> Self {
        let hints = config.capacity_hints;
        Self {
            types: TypeStore::with_capacity(hints.types),
            classes: ClassStore::with_capacity(hints.classes),
            roles: RoleStore::with_capacity(hints.roles),
            users: UserStore::with_capacity(hints.users),
            bools: BoolStore::default(),
            sens: SensStore::default(),
            cats: CatStore::default(),
            conditionals: Vec::new(),
            av_rules: Vec::with_capacity(hints.av_rules),
            te_rules: Vec::with_capacity(hints.te_rules),
            rule_refs: Vec::new(),
            av_rule_ids: Vec::new(),
            te_rule_ids: Vec::new(),
            role_allows: Vec::new(),
            role_transitions: Vec::new(),
            range_transitions: Vec::new(),
            constraints: Vec::new(),
            initial_sids: HashMap::new(),
            capabilities: PolicyCapabilities::default(),
            config,
            rule_index: OnceLock::new(),
        }
    }

    pub fn add_conditional(&mut self, expr: ConditionalExpr) -> CondId {
        let id = CondId::from_index(self.conditionals.len() as u32);
        self.conditionals.push(expr);
        id
    }

    pub fn conditional(&self, id: CondId) -> Option<&ConditionalExpr> {
        self.conditionals.get(id.index() as usize)
    }

    pub fn add_av_rule(&mut self, rule: AvRule) -> RuleId {
        let table_index = self.av_rules.len();
        self.av_rules.push(rule);
        let id = RuleId::from_index(self.rule_refs.len() as u32);
        self.rule_refs.push(RuleRef::Av(table_index));
        self.av_rule_ids.push(id);
        id
    }

    pub fn add_te_rule(&mut self, rule: TeRule) -> RuleId {
        let table_index = self.te_rules.len();
        self.te_rules.push(rule);
        let id = RuleId::from_index(self.rule_refs.len() as u32);
        self.rule_refs.push(RuleRef::Te(table_index));
        self.te_rule_ids.push(id);
        id
    }

    pub fn av_rules(&self) -> &[AvRule] {
        &self.av_rules
    }

    pub fn te_rules(&self) -> &[TeRule] {
        &self.te_rules
    }

    /// The `RuleId` allocated for the AV rule stored at table index
    /// `table_index`, inverse of `add_av_rule`'s internal bookkeeping.
    /// Used by `RuleIndex::build`, which iterates `av_rules()` directly.
    pub fn rule_id_for_av(&self, table_index: usize) -> Option<RuleId> {
        self.av_rule_ids.get(table_index).copied()
    }

    /// The `RuleId` allocated for the TE rule stored at table index
    /// `table_index`. See `rule_id_for_av`.
    pub fn rule_id_for_te(&self, table_index: usize) -> Option<RuleId> {
        self.te_rule_ids.get(table_index).copied()
    }

    pub fn rule(&self, id: RuleId) -> Option<RuleView<'_>> {
        match self.rule_refs.get(id.index() as usize)? {
            RuleRef::Av(i) => self.av_rules.get(*i).map(RuleView::Av),
            RuleRef::Te(i) => self.te_rules.get(*i).map(RuleView::Te),
        }
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        (0..self.rule_refs.len() as u32).map(RuleId::from_index)
    }

    /// Eagerly build the rule hash index, or no-op if it has already been
    /// built. Loaders that prefer option (a) of spec §5 ("eagerly build all
    /// derived tables at load") call this once after the last rule is
    /// inserted.
    pub fn finish(&mut self) {
        if self.config.eager_index_build {
            let _ = self.rule_index();
        }
    }

    /// Lazily-built rule hash index (spec §4.2). Safe to call concurrently
    /// from multiple readers: `OnceLock` guarantees the build runs exactly
    /// once.
    pub fn rule_index(&self) -> &RuleIndex {
        self.rule_index.get_or_init(|| RuleIndex::build(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyEngineConfig;
    use crate::rules::{AvRuleKind, TypeSet};
    use crate::types::TypeKind;
    use std::collections::HashMap as StdHashMap;

    #[test]
    fn add_rules_assigns_distinct_monotonic_ids() {
        let mut policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let t = policy.types.declare("t", TypeKind::Concrete);
        let id1 = policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t),
            target: TypeSet::single(t),
            perms: StdHashMap::new(),
            conditional: None,
        });
        let id2 = policy.add_av_rule(AvRule {
            kind: AvRuleKind::Allow,
            source: TypeSet::single(t),
            target: TypeSet::single(t),
            perms: StdHashMap::new(),
            conditional: None,
        });
        assert_ne!(id1, id2);
        assert!(matches!(policy.rule(id1), Some(RuleView::Av(_))));
    }

    #[test]
    fn rule_index_builds_lazily_and_only_once() {
        let policy = Policy::new(PolicyEngineConfig::reference_policy_defaults());
        let index_a = policy.rule_index() as *const _;
        let index_b = policy.rule_index() as *const _;
        assert_eq!(index_a, index_b);
    }
}
