//! Lexer, parser, compiler, and renderer for the SELinux-family policy
//! text language.
//!
//! ```text
//! policy source (.te / .conf text)
//!     |
//! lexer (tokenize)
//!     |
//! parser (build PolicyAst)
//!     |
//! compiler (resolve names, build policy_core::Policy)
//!     |
//! printer (render back to text, for round-trip testing)
//! ```
//!
//! A compiled binary `policydb` is recognized (see `binary`) but not
//! decoded past its header — spec §9's open question on module-linking
//! semantics resolves that as out of scope for this crate.

pub mod binary;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod printer;

pub use binary::{is_binary_policy, sniff_header, BinaryHeader};
pub use compiler::compile;
pub use lexer::*;
pub use parser::{parse, ParseError};
pub use printer::print_policy;

use policy_core::{LoadError, Policy, PolicyEngineConfig};

/// Load a textual policy source into a fully-compiled [`Policy`].
pub fn load_policy(source: &str, config: PolicyEngineConfig) -> Result<Policy, LoadError> {
    let ast = parse(source).map_err(|e| LoadError::MalformedPolicy { line: e.line as u32, reason: e.message })?;
    compile(&ast, config)
}

/// Load a policy from raw bytes, dispatching on whether they carry the
/// compiled-`policydb` magic number (`binary::is_binary_policy`) or are
/// text source. Binary input is recognized but not decoded past its
/// header — see `binary` module docs.
pub fn load_policy_bytes(bytes: &[u8], config: PolicyEngineConfig) -> Result<Policy, LoadError> {
    if is_binary_policy(bytes) {
        let header = sniff_header(bytes)?;
        return Err(LoadError::UnsupportedVersion { version: header.policy_version });
    }
    let source = std::str::from_utf8(bytes)
        .map_err(|_| LoadError::MalformedPolicy { line: 0, reason: "input is neither a recognized binary policy nor valid UTF-8 text".into() })?;
    load_policy(source, config)
}
