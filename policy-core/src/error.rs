//! Error types for policy loading, querying, diffing, and analysis.

use thiserror::Error;

/// Errors surfaced while a loader is building a `Policy`.
///
/// The lexer/parser/binary-reader themselves are treated as external
/// collaborators (see the crate-level docs); this enum is what they report
/// upward when construction cannot proceed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("malformed policy at line {line}: {reason}")]
    MalformedPolicy { line: usize, reason: String },

    #[error("unrecognized policy_version {version}")]
    UnsupportedVersion { version: u32 },

    #[error("not a binary policy: expected magic {expected:?}, found {found:?}")]
    NotBinaryPolicy { expected: [u8; 4], found: [u8; 4] },

    #[error("truncated input: expected at least {needed} bytes, found {available}")]
    Truncated { needed: usize, available: usize },
}

/// Errors surfaced by the query layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("no such symbol: {kind} named '{name}'")]
    NoSuchSymbol { kind: &'static str, name: String },

    #[error("out of memory growing {table}")]
    OutOfMemory { table: &'static str },

    #[error("regex compile failure for pattern '{pattern}': {reason}")]
    RegexCompile { pattern: String, reason: String },

    #[error("unsatisfied capability: {capability}")]
    UnsatisfiedCapability { capability: &'static str },

    #[error("mutually exclusive flags: {a} and {b}")]
    MutuallyExclusiveFlags { a: &'static str, b: &'static str },
}

/// Errors surfaced by a structural analysis module.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("module '{module}' skipped: unmet requirement '{requirement}'")]
    UnmetRequirement {
        module: &'static str,
        requirement: &'static str,
    },

    #[error("module '{module}' depends on unregistered module '{dependency}'")]
    UnknownDependency {
        module: &'static str,
        dependency: &'static str,
    },

    #[error("dependency cycle detected among analysis modules: {cycle:?}")]
    DependencyCycle { cycle: Vec<&'static str> },
}

/// Top-level error type for all `policy-core` operations.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),
}

/// Result type alias for `policy-core` operations.
pub type PolicyResult<T> = Result<T, Error>;
