//! Types, type attributes, and aliases (spec §3, §4.1).

use crate::identity::TypeId;
use crate::idset::IdSet;
use crate::symbol::SymbolTable;
use std::collections::HashMap;

/// What kind of declaration a `TypeId` addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum TypeKind {
    Concrete,
    Attribute,
}

/// A declared type or attribute.
///
/// Aliases are not separate `Type` records: they are additional names in
/// `TypeStore`'s alias map pointing at a primary concrete type's id.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Type {
    pub name: String,
    pub kind: TypeKind,
}

/// Arena of types/attributes plus the bidirectional attribute-membership
/// relation required by §4.1's attribute-expansion rule.
#[derive(Debug, Clone, Default)]
pub struct TypeStore {
    table: SymbolTable<TypeId, Type>,
    /// alias name -> primary concrete type id. Kept separate from
    /// `table`'s own name index so `TypeStore::is_alias` can answer without
    /// walking every record.
    aliases: HashMap<String, TypeId>,
    /// concrete type -> attributes it belongs to.
    memberships: HashMap<TypeId, IdSet<TypeId>>,
    /// attribute -> member concrete types.
    members: HashMap<TypeId, IdSet<TypeId>>,
}

impl TypeStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: SymbolTable::with_capacity(capacity),
            aliases: HashMap::new(),
            memberships: HashMap::new(),
            members: HashMap::new(),
        }
    }

    pub fn declare(&mut self, name: impl Into<String>, kind: TypeKind) -> TypeId {
        let name = name.into();
        self.table.insert(name.clone(), Type { name, kind })
    }

    /// Register `alias` as resolving to the primary type `target`.
    pub fn declare_alias(&mut self, alias: impl Into<String>, target: TypeId) {
        let alias = alias.into();
        self.table.alias(alias.clone(), target);
        self.aliases.insert(alias, target);
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// Record that concrete type `member` belongs to `attribute`.
    pub fn add_member(&mut self, attribute: TypeId, member: TypeId) {
        self.members.entry(attribute).or_default().insert(member);
        self.memberships.entry(member).or_default().insert(attribute);
    }

    pub fn id_of(&self, name: &str) -> Option<TypeId> {
        self.table.id_of(name)
    }

    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.table.get(id)
    }

    pub fn kind_of(&self, id: TypeId) -> Option<TypeKind> {
        self.table.get(id).map(|t| t.kind)
    }

    /// Attributes `member` belongs to, empty for attributes themselves.
    pub fn attributes_of(&self, member: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        self.memberships
            .get(&member)
            .into_iter()
            .flat_map(|set| set.iter())
    }

    /// Concrete member types of `attribute`, empty for concrete types.
    pub fn members_of(&self, attribute: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        self.members
            .get(&attribute)
            .into_iter()
            .flat_map(|set| set.iter())
    }

    /// Attribute expansion (§4.1, invariant 1): the set of concrete types a
    /// symbolic id denotes. A concrete type expands to itself; an attribute
    /// expands to its members. Idempotent by construction (expanding a
    /// concrete type twice yields the same singleton).
    pub fn expand(&self, id: TypeId) -> IdSet<TypeId> {
        match self.kind_of(id) {
            Some(TypeKind::Attribute) => self.members.get(&id).cloned().unwrap_or_default(),
            _ => {
                let mut set = IdSet::new();
                set.insert(id);
                set
            }
        }
    }

    /// Resolve `name` to a `TypeId`, transparently following aliases.
    pub fn resolve(&self, name: &str) -> Option<TypeId> {
        self.table.id_of(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &Type)> {
        self.table.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_resolves_and_expands_like_its_primary() {
        let mut store = TypeStore::with_capacity(4);
        let t_a = store.declare("t_a", TypeKind::Concrete);
        store.declare_alias("t_a_alias", t_a);

        assert_eq!(store.resolve("t_a_alias"), Some(t_a));
        assert!(store.is_alias("t_a_alias"));
        assert_eq!(store.expand(t_a), store.expand(store.resolve("t_a_alias").unwrap()));
    }

    #[test]
    fn attribute_expansion_is_bidirectional() {
        let mut store = TypeStore::with_capacity(4);
        let t_a = store.declare("t_a", TypeKind::Concrete);
        let attr = store.declare("a", TypeKind::Attribute);
        store.add_member(attr, t_a);

        let members: Vec<_> = store.members_of(attr).collect();
        assert_eq!(members, vec![t_a]);
        let attrs: Vec<_> = store.attributes_of(t_a).collect();
        assert_eq!(attrs, vec![attr]);

        let expanded = store.expand(attr);
        assert!(expanded.contains(t_a));
    }

    #[test]
    fn concrete_type_expands_to_itself() {
        let mut store = TypeStore::with_capacity(4);
        let t_a = store.declare("t_a", TypeKind::Concrete);
        let expanded = store.expand(t_a);
        assert_eq!(expanded.len(), 1);
        assert!(expanded.contains(t_a));
    }
}
