//! Roles and users (spec §3).

use crate::identity::{RoleId, TypeId, UserId};
use crate::idset::IdSet;
use crate::mls::{Level, Range};
use crate::symbol::SymbolTable;

/// The wired role name every RBAC-using policy assigns to object contexts.
pub const OBJECT_R: &str = "object_r";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Role {
    pub name: String,
    pub types: IdSet<TypeId>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: IdSet::new(),
        }
    }
}

pub type RoleStore = SymbolTable<RoleId, Role>;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    pub name: String,
    pub roles: IdSet<RoleId>,
    /// Non-MLS policies omit both fields (spec §3).
    pub default_level: Option<Level>,
    pub range: Option<Range>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: IdSet::new(),
            default_level: None,
            range: None,
        }
    }
}

pub type UserStore = SymbolTable<UserId, User>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::HandleId;

    #[test]
    fn role_tracks_assigned_types() {
        let mut role = Role::new("sysadm_r");
        role.types.insert(TypeId::from_index(1));
        assert!(role.types.contains(TypeId::from_index(1)));
        assert!(!role.types.contains(TypeId::from_index(2)));
    }

    #[test]
    fn non_mls_user_omits_level_and_range() {
        let user = User::new("system_u");
        assert!(user.default_level.is_none());
        assert!(user.range.is_none());
    }
}
