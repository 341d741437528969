//! Shared wiring for the `secli` and `polidiff` binaries.
//!
//! Argument-parsing depth itself stays out of scope (spec.md §1); this
//! crate only loads a policy file through `policy-loader` and initializes
//! `tracing` the same way both binaries need it.

use policy_core::{Policy, PolicyEngineConfig};
use std::fs;
use std::path::Path;

/// Read a policy file from disk and compile it via `policy-loader`.
///
/// A `.conf`/`.te` source and a compiled `policydb` are both accepted;
/// dispatch between them follows `policy_loader::load_policy_bytes`.
pub fn load_policy_file(path: &Path, config: PolicyEngineConfig) -> anyhow::Result<Policy> {
    let bytes = fs::read(path).map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
    let policy = policy_loader::load_policy_bytes(&bytes, config)?;
    Ok(policy)
}

/// Install a `tracing-subscriber` formatter honoring `RUST_LOG`, falling
/// back to `info` level. Both binaries call this once at startup.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
