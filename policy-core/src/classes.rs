//! Object classes and permissions (spec §3).

use crate::identity::{ClassId, PermId};
use crate::symbol::SymbolTable;
use std::collections::HashMap;

/// A permission declared within a class.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Permission {
    pub id: PermId,
    pub name: String,
    pub class: ClassId,
}

/// A declared object class (`file`, `dir`, `tcp_socket`, ...).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ObjectClass {
    pub name: String,
    pub common: Option<ClassId>,
    perms: Vec<Permission>,
    perm_index: HashMap<String, usize>,
}

impl ObjectClass {
    pub fn new(name: impl Into<String>, common: Option<ClassId>) -> Self {
        Self {
            name: name.into(),
            common,
            perms: Vec::new(),
            perm_index: HashMap::new(),
        }
    }

    /// Declare `name` as a permission of this class at the next local index.
    /// `id` is the globally allocated `PermId` for this (class, name) pair.
    pub fn add_perm(&mut self, id: PermId, name: impl Into<String>, class: ClassId) -> usize {
        let name = name.into();
        let local_index = self.perms.len();
        self.perm_index.insert(name.clone(), local_index);
        self.perms.push(Permission { id, name, class });
        local_index
    }

    /// Permissions declared directly on this class (not including a
    /// common's), in declaration order; index into this slice is the
    /// class-local permission-bitset index.
    pub fn own_perms(&self) -> &[Permission] {
        &self.perms
    }

    pub fn local_index_of(&self, name: &str) -> Option<usize> {
        self.perm_index.get(name).copied()
    }

    /// Position of `name` within this class's *effective* permission list
    /// (own perms first, then the common parent's), the indexing
    /// `PermissionSet` bits actually use. Unlike `local_index_of`, this
    /// resolves permissions inherited from a common parent too.
    pub fn effective_index_of(&self, name: &str, classes: &ClassStore) -> Option<usize> {
        self.effective_perms(classes).iter().position(|p| p.name == name)
    }

    /// Effective permission list: this class's own permissions followed by
    /// its common parent's, if any (spec §3: "effective permissions = its
    /// own ∪ parent's"). Local indices for the combined set are this
    /// method's return index, not `local_index_of`'s — callers building a
    /// `PermissionSet` over the *effective* list should index from here.
    pub fn effective_perms<'a>(&'a self, classes: &'a ClassStore) -> Vec<&'a Permission> {
        let mut result: Vec<&Permission> = self.perms.iter().collect();
        if let Some(common_id) = self.common {
            if let Some(common) = classes.get(common_id) {
                result.extend(common.perms.iter());
            }
        }
        result
    }
}

pub type ClassStore = SymbolTable<ClassId, ObjectClass>;

/// Fixed-word bitset over class-local permission indices. SELinux classes
/// rarely declare more than a few dozen permissions; two `u64` words give
/// headroom to 128 without a heap allocation per rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PermissionSet {
    words: [u64; 2],
}

impl PermissionSet {
    pub const CAPACITY: usize = 128;

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bit for `local_index`. Panics if `local_index >= CAPACITY`
    /// (a class declaring more than 128 effective permissions is not a
    /// representable SELinux policy).
    pub fn insert(&mut self, local_index: usize) {
        assert!(
            local_index < Self::CAPACITY,
            "permission local index {local_index} exceeds PermissionSet capacity"
        );
        self.words[local_index / 64] |= 1u64 << (local_index % 64);
    }

    pub fn contains(&self, local_index: usize) -> bool {
        if local_index >= Self::CAPACITY {
            return false;
        }
        (self.words[local_index / 64] >> (local_index % 64)) & 1 == 1
    }

    pub fn union(&self, other: &PermissionSet) -> PermissionSet {
        PermissionSet {
            words: [self.words[0] | other.words[0], self.words[1] | other.words[1]],
        }
    }

    pub fn union_with(&mut self, other: &PermissionSet) {
        self.words[0] |= other.words[0];
        self.words[1] |= other.words[1];
    }

    pub fn intersects(&self, other: &PermissionSet) -> bool {
        (self.words[0] & other.words[0]) != 0 || (self.words[1] & other.words[1]) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.words[0] == 0 && self.words[1] == 0
    }

    pub fn len(&self) -> usize {
        self.words[0].count_ones() as usize + self.words[1].count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..Self::CAPACITY).filter(move |i| self.contains(*i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::HandleId;

    #[test]
    fn effective_perms_includes_common_parent() {
        let mut classes: ClassStore = ClassStore::default();
        let common_id = classes.insert("file_common", ObjectClass::new("file_common", None));
        {
            let common = classes.get_mut(common_id).unwrap();
            common.add_perm(PermId::from_index(0), "ioctl", common_id);
        }
        let file_id = classes.insert("file", ObjectClass::new("file", Some(common_id)));
        {
            let file = classes.get_mut(file_id).unwrap();
            file.add_perm(PermId::from_index(1), "read", file_id);
            file.add_perm(PermId::from_index(2), "write", file_id);
        }

        let file = classes.get(file_id).unwrap();
        let effective = file.effective_perms(&classes);
        let names: Vec<_> = effective.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["read", "write", "ioctl"]);
    }

    #[test]
    fn permission_set_insert_and_union() {
        let mut a = PermissionSet::new();
        a.insert(0);
        a.insert(70);
        let mut b = PermissionSet::new();
        b.insert(1);
        let union = a.union(&b);
        assert!(union.contains(0));
        assert!(union.contains(1));
        assert!(union.contains(70));
        assert_eq!(union.len(), 3);
    }

    #[test]
    fn permission_set_intersects() {
        let mut a = PermissionSet::new();
        a.insert(5);
        let mut b = PermissionSet::new();
        b.insert(5);
        b.insert(9);
        assert!(a.intersects(&b));
        let c = PermissionSet::new();
        assert!(!a.intersects(&c));
    }

    #[test]
    #[should_panic]
    fn permission_set_insert_out_of_capacity_panics() {
        let mut a = PermissionSet::new();
        a.insert(128);
    }
}
