//! Security contexts and initial SIDs (spec §3).

use crate::identity::{RoleId, TypeId, UserId};
use crate::mls::Range;

/// A `(user, role, type, optional range)` security context. Every field is
/// expected to refer to an existing symbol in the owning policy; this
/// struct itself does not validate that (the loader does, at construction).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Context {
    pub user: UserId,
    pub role: RoleId,
    pub type_: TypeId,
    pub range: Option<Range>,
}

/// The kernel's fixed enumeration of hard-coded initial SIDs
/// (`libqpol`'s `qpol_policy.h` constants), each bound to a `Context` by
/// the loaded policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum InitialSid {
    Kernel,
    Security,
    Unlabeled,
    File,
    Fs,
    AnyFsObj,
    Port,
    Netif,
    Netmsg,
    Node,
    Devnull,
    Any,
    FileLabels,
    IgnoreMigratedFiles,
}

impl InitialSid {
    pub const ALL: &'static [InitialSid] = &[
        InitialSid::Kernel,
        InitialSid::Security,
        InitialSid::Unlabeled,
        InitialSid::File,
        InitialSid::Fs,
        InitialSid::AnyFsObj,
        InitialSid::Port,
        InitialSid::Netif,
        InitialSid::Netmsg,
        InitialSid::Node,
        InitialSid::Devnull,
        InitialSid::Any,
        InitialSid::FileLabels,
        InitialSid::IgnoreMigratedFiles,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InitialSid::Kernel => "kernel",
            InitialSid::Security => "security",
            InitialSid::Unlabeled => "unlabeled",
            InitialSid::File => "file",
            InitialSid::Fs => "fs",
            InitialSid::AnyFsObj => "any_fs_obj",
            InitialSid::Port => "port",
            InitialSid::Netif => "netif",
            InitialSid::Netmsg => "netmsg",
            InitialSid::Node => "node",
            InitialSid::Devnull => "devnull",
            InitialSid::Any => "any",
            InitialSid::FileLabels => "file_labels",
            InitialSid::IgnoreMigratedFiles => "ignore_migrated_files",
        }
    }

    pub fn from_name(name: &str) -> Option<InitialSid> {
        Self::ALL.iter().find(|sid| sid.name() == name).copied()
    }
}
