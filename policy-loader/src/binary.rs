//! Binary policy header recognition.
//!
//! Decoding a compiled `policydb` fully is out of scope (spec §6, §9's
//! "binary module-linking semantics" open question resolves to: the loader
//! only needs to tell a binary policy apart from text and report its
//! version, not relink modules). This module sniffs the fixed-format
//! header `libsepol`'s `policydb_write` emits — a little-endian magic
//! number followed by a `u32` policy version — and nothing past it.

use policy_core::LoadError;

/// `SELINUX_MAGIC` from `libsepol/include/sepol/policydb/policydb.h`,
/// stored little-endian in the first four bytes of a compiled policy.
pub const MAGIC: [u8; 4] = 0x8c_ff_7c_f9u32.to_le_bytes();

const HEADER_LEN: usize = 8;

/// The two fields a compiled policy's header exposes before the caller
/// has to start interpreting version-specific section layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryHeader {
    pub policy_version: u32,
}

/// True iff `source` begins with the compiled-policy magic number. Callers
/// use this to route input to [`sniff_header`] vs. the text `parser`
/// without needing to know the rest of the format.
pub fn is_binary_policy(source: &[u8]) -> bool {
    source.len() >= 4 && source[..4] == MAGIC
}

/// Read and validate a compiled policy's header, without interpreting any
/// section past it.
pub fn sniff_header(source: &[u8]) -> Result<BinaryHeader, LoadError> {
    if source.len() < 4 {
        return Err(LoadError::Truncated { needed: 4, available: source.len() });
    }
    let mut found = [0u8; 4];
    found.copy_from_slice(&source[..4]);
    if found != MAGIC {
        return Err(LoadError::NotBinaryPolicy { expected: MAGIC, found });
    }
    if source.len() < HEADER_LEN {
        return Err(LoadError::Truncated { needed: HEADER_LEN, available: source.len() });
    }
    let mut version_bytes = [0u8; 4];
    version_bytes.copy_from_slice(&source[4..HEADER_LEN]);
    let policy_version = u32::from_le_bytes(version_bytes);
    Ok(BinaryHeader { policy_version })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(version: u32) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&version.to_le_bytes());
        bytes
    }

    #[test]
    fn recognizes_magic() {
        let bytes = header_bytes(30);
        assert!(is_binary_policy(&bytes));
        assert!(!is_binary_policy(b"type foo_t;"));
    }

    #[test]
    fn reads_policy_version() {
        let bytes = header_bytes(33);
        let header = sniff_header(&bytes).unwrap();
        assert_eq!(header.policy_version, 33);
    }

    #[test]
    fn rejects_wrong_magic() {
        let err = sniff_header(b"nope0000").unwrap_err();
        assert!(matches!(err, LoadError::NotBinaryPolicy { .. }));
    }

    #[test]
    fn rejects_truncated_header() {
        let err = sniff_header(&MAGIC[..2]).unwrap_err();
        assert!(matches!(err, LoadError::Truncated { .. }));
    }
}
