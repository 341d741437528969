//! File-context database collaborator (spec §6): a path → context mapping
//! kept external to the policy model proper, received by analyses that need
//! it (find file types, find association types) as plain data.

use crate::context::Context;
use crate::netaddr::FileType;

/// One `path filetype context` triple from a `file_contexts`-style database.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FileContextEntry {
    pub path: String,
    pub file_type: FileType,
    pub context: Context,
}

/// A file-context database: an ordered collection of entries, matching
/// spec §6's "a vector of (path, filetype, context)".
#[derive(Debug, Clone, Default)]
pub struct FileContextDb {
    entries: Vec<FileContextEntry>,
}

impl FileContextDb {
    pub fn new(entries: Vec<FileContextEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FileContextEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, entry: FileContextEntry) {
        self.entries.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{HandleId, RoleId, TypeId, UserId};

    #[test]
    fn db_preserves_insertion_order() {
        let mut db = FileContextDb::default();
        db.push(FileContextEntry {
            path: "/etc/passwd".to_string(),
            file_type: FileType::File,
            context: Context {
                user: UserId::from_index(0),
                role: RoleId::from_index(0),
                type_: TypeId::from_index(0),
                range: None,
            },
        });
        assert_eq!(db.len(), 1);
        assert_eq!(db.entries()[0].path, "/etc/passwd");
    }
}
