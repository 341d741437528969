//! Generic interned-string symbol arena.
//!
//! One `SymbolTable<Id, Record>` implementation backs every symbol kind in
//! the model (types, classes, roles, users, Booleans, sensitivities,
//! categories) instead of a hand-rolled arena per kind. Name lookup is a
//! hash map; id lookup is an indexed `Vec`. Iteration order is insertion
//! order and is therefore stable across runs for a given input, as required
//! by spec §4.1.

use crate::identity::HandleId;
use std::collections::HashMap;

/// Dense arena mapping `Id` handles to `Record`s, with a name index.
#[derive(Debug, Clone)]
pub struct SymbolTable<Id, Record> {
    records: Vec<Record>,
    by_name: HashMap<String, Id>,
}

impl<Id: HandleId, Record> Default for SymbolTable<Id, Record> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<Id: HandleId, Record> SymbolTable<Id, Record> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            by_name: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a new record under `name`, returning its freshly allocated id.
    ///
    /// Does not check for duplicate names — callers that require unique
    /// primary names (all of them, in this model) must check
    /// `name_to_id` first.
    pub fn insert(&mut self, name: impl Into<String>, record: Record) -> Id {
        let id = Id::from_index(self.records.len() as u32);
        self.records.push(record);
        self.by_name.insert(name.into(), id);
        id
    }

    /// Register `alias` as an additional name resolving to `id`, without
    /// allocating a new record or appearing in `iter()`.
    pub fn alias(&mut self, alias: impl Into<String>, id: Id) {
        self.by_name.insert(alias.into(), id);
    }

    pub fn get(&self, id: Id) -> Option<&Record> {
        self.records.get(id.index() as usize)
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut Record> {
        self.records.get_mut(id.index() as usize)
    }

    pub fn id_of(&self, name: &str) -> Option<Id> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate primaries only, in insertion order. Aliases never appear
    /// here even though `id_of` resolves them.
    pub fn iter(&self) -> impl Iterator<Item = (Id, &Record)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (Id::from_index(i as u32), r))
    }

    pub fn ids(&self) -> impl Iterator<Item = Id> {
        (0..self.records.len() as u32).map(Id::from_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::TypeId;

    #[test]
    fn insert_and_lookup_roundtrip() {
        let mut table: SymbolTable<TypeId, String> = SymbolTable::default();
        let id = table.insert("foo_t", "foo_t".to_string());
        assert_eq!(table.id_of("foo_t"), Some(id));
        assert_eq!(table.get(id).map(String::as_str), Some("foo_t"));
    }

    #[test]
    fn alias_resolves_but_does_not_iterate() {
        let mut table: SymbolTable<TypeId, String> = SymbolTable::default();
        let id = table.insert("foo_t", "foo_t".to_string());
        table.alias("foo_alias_t", id);
        assert_eq!(table.id_of("foo_alias_t"), Some(id));
        let names: Vec<_> = table.iter().map(|(_, r)| r.clone()).collect();
        assert_eq!(names, vec!["foo_t".to_string()]);
    }

    #[test]
    fn iteration_order_is_insertion_order() {
        let mut table: SymbolTable<TypeId, &'static str> = SymbolTable::default();
        table.insert("a", "a");
        table.insert("b", "b");
        table.insert("c", "c");
        let names: Vec<_> = table.iter().map(|(_, r)| *r).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
