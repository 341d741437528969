//! Rule tables: access-vector, type-enforcement, RBAC, and MLS transition
//! rules (spec §3).

use crate::classes::PermissionSet;
use crate::conditional::BranchSide;
use crate::identity::{ClassId, CondId, RoleId, TypeId};
use crate::idset::IdSet;
use crate::mls::Range;
use crate::types::TypeStore;
use std::collections::HashMap;

/// A source or target operand of a rule: an explicit set of (possibly
/// attribute) type ids, optionally including the `self` keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TypeSet {
    pub types: IdSet<TypeId>,
    pub includes_self: bool,
}

impl TypeSet {
    pub fn of(types: IdSet<TypeId>) -> Self {
        Self {
            types,
            includes_self: false,
        }
    }

    pub fn single(id: TypeId) -> Self {
        let mut types = IdSet::new();
        types.insert(id);
        Self::of(types)
    }

    pub fn with_self(mut self) -> Self {
        self.includes_self = true;
        self
    }

    /// Expand every member (attributes as macros), without resolving
    /// `self`. Used for the source position, where the grammar never
    /// allows `self` (it only denotes "the rule's own source type" when
    /// written in the target position).
    pub fn expand_literal(&self, type_store: &TypeStore) -> IdSet<TypeId> {
        let mut result = IdSet::new();
        for id in self.types.iter() {
            result.union_with(&type_store.expand(id));
        }
        result
    }

    /// Expand every member (attributes as macros) into a concrete-type set,
    /// substituting `self` with `source` (spec §4.1, §4.2).
    pub fn expand(&self, source: TypeId, type_store: &TypeStore) -> IdSet<TypeId> {
        let mut result = self.expand_literal(type_store);
        if self.includes_self {
            result.insert(source);
        }
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AvRuleKind {
    Allow,
    Neverallow,
    Auditallow,
    Dontaudit,
}

impl AvRuleKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            AvRuleKind::Allow => "allow",
            AvRuleKind::Neverallow => "neverallow",
            AvRuleKind::Auditallow => "auditallow",
            AvRuleKind::Dontaudit => "dontaudit",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(AvRuleKind::Allow),
            "neverallow" => Some(AvRuleKind::Neverallow),
            "auditallow" => Some(AvRuleKind::Auditallow),
            "dontaudit" => Some(AvRuleKind::Dontaudit),
            _ => None,
        }
    }
}

/// A conditional binding: which `ConditionalExpr` guards this rule and on
/// which branch it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CondBinding {
    pub cond: CondId,
    pub branch: BranchSide,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AvRule {
    pub kind: AvRuleKind,
    pub source: TypeSet,
    pub target: TypeSet,
    /// Permission set per class this rule names (a rule with one class is
    /// the overwhelming common case; multi-class AV rules share the same
    /// source/target but index their bitset per-class since permission
    /// local indices are class-specific).
    pub perms: HashMap<ClassId, PermissionSet>,
    pub conditional: Option<CondBinding>,
}

impl AvRule {
    pub fn classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.perms.keys().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum TeRuleKind {
    TypeTransition,
    TypeChange,
    TypeMember,
}

impl TeRuleKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            TeRuleKind::TypeTransition => "type_transition",
            TeRuleKind::TypeChange => "type_change",
            TeRuleKind::TypeMember => "type_member",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "type_transition" => Some(TeRuleKind::TypeTransition),
            "type_change" => Some(TeRuleKind::TypeChange),
            "type_member" => Some(TeRuleKind::TypeMember),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TeRule {
    pub kind: TeRuleKind,
    pub source: TypeSet,
    pub target: TypeSet,
    pub classes: IdSet<ClassId>,
    /// The default is always a concrete type (spec §3).
    pub default_type: TypeId,
    pub conditional: Option<CondBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoleAllow {
    pub source: IdSet<RoleId>,
    pub target: IdSet<RoleId>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoleTransition {
    pub source_roles: IdSet<RoleId>,
    pub target_types: TypeSet,
    pub default_role: RoleId,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RangeTransition {
    pub source: TypeSet,
    pub target: TypeSet,
    pub target_range: Range,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::HandleId;
    use crate::types::TypeKind;

    #[test]
    fn type_set_expands_attributes_and_self() {
        let mut store = TypeStore::with_capacity(4);
        let src = store.declare("foo_t", TypeKind::Concrete);
        let attr_member = store.declare("bar_t", TypeKind::Concrete);
        let attr = store.declare("some_attr", TypeKind::Attribute);
        store.add_member(attr, attr_member);

        let mut types = IdSet::new();
        types.insert(attr);
        let set = TypeSet::of(types).with_self();

        let expanded = set.expand(src, &store);
        assert!(expanded.contains(attr_member));
        assert!(expanded.contains(src));
    }

    #[test]
    fn av_rule_kind_keyword_roundtrip() {
        for kind in [
            AvRuleKind::Allow,
            AvRuleKind::Neverallow,
            AvRuleKind::Auditallow,
            AvRuleKind::Dontaudit,
        ] {
            assert_eq!(AvRuleKind::from_keyword(kind.keyword()), Some(kind));
        }
    }

    #[test]
    fn te_rule_kind_keyword_roundtrip() {
        for kind in [
            TeRuleKind::TypeTransition,
            TeRuleKind::TypeChange,
            TeRuleKind::TypeMember,
        ] {
            assert_eq!(TeRuleKind::from_keyword(kind.keyword()), Some(kind));
        }
    }
}
