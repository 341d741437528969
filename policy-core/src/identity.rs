//! Dense integer handles for policy symbols.
//!
//! Every declarable entity in a loaded policy (type, class, permission,
//! role, user, Boolean, sensitivity, category, rule, conditional) is
//! addressed by a small `u32`-backed newtype. A handle is an index into the
//! arena `Vec` it was allocated from and is valid only for the lifetime of
//! the `Policy` that produced it.

use std::fmt;

/// Trait implemented by every dense-integer symbol handle.
///
/// Mirrors a strongly-typed-id pattern so a `TypeId` can never be passed
/// where a `RoleId` is expected, while every handle kind shares the same
/// small vocabulary of operations.
pub trait HandleId: Copy + Clone + Eq + PartialEq + std::hash::Hash + fmt::Debug + Ord {
    /// Name of the entity kind this handle addresses, for diagnostics.
    const ENTITY_NAME: &'static str;

    /// Construct a handle from a raw arena index.
    fn from_index(index: u32) -> Self;

    /// The raw arena index this handle addresses.
    fn index(&self) -> u32;
}

/// Defines a `u32`-backed symbol handle with the common trait impls.
macro_rules! define_handle {
    ($name:ident, $entity:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub struct $name(u32);

        impl HandleId for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn from_index(index: u32) -> Self {
                Self(index)
            }

            fn index(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_handle!(TypeId, "type", "Handle for a type or type attribute.");
define_handle!(ClassId, "class", "Handle for an object class.");
define_handle!(PermId, "permission", "Handle for a permission within a class.");
define_handle!(RoleId, "role", "Handle for an RBAC role.");
define_handle!(UserId, "user", "Handle for an MLS/RBAC user.");
define_handle!(BoolId, "boolean", "Handle for a conditional Boolean.");
define_handle!(SensId, "sensitivity", "Handle for an MLS sensitivity.");
define_handle!(CatId, "category", "Handle for an MLS category.");
define_handle!(RuleId, "rule", "Handle for a rule in any rule table.");
define_handle!(CondId, "conditional", "Handle for a conditional expression.");
