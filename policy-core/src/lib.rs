//! Policy model, query layer, semantic diff, and structural analyses for
//! SELinux-family mandatory access control policies.
//!
//! This crate holds no I/O: a `policy-loader` (or any other collaborator)
//! builds a `Policy` and hands it here; everything from that point is pure
//! data plus query/diff/analysis logic over it.

mod identity;
mod idset;
mod symbol;
mod error;
mod config;
mod reporter;
mod types;
mod classes;
mod rbac;
mod mls;
mod conditional;
mod context;
mod rules;
mod constraint;
mod policy;
mod index;
mod query;
mod diff;
mod render;
mod netaddr;
mod fcontext;
pub mod analysis;

pub use identity::*;
pub use idset::IdSet;
pub use symbol::SymbolTable;
pub use error::*;
pub use config::*;
pub use reporter::*;
pub use types::*;
pub use classes::*;
pub use rbac::*;
pub use mls::*;
pub use conditional::*;
pub use context::*;
pub use rules::*;
pub use constraint::*;
pub use policy::*;
pub use index::*;
pub use query::*;
pub use diff::*;
pub use render::*;
pub use netaddr::*;
pub use fcontext::*;
