//! The in-memory symbol database: five tables addressed by dense indices.
//!
//! Every cross-table relation is an index newtype.  In memory an absent
//! relation is `None`; on disk it is `-1`.

use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

pub mod compact;
pub mod dedup;
pub mod diagnostics;
pub mod nodes;
pub mod source_files;
pub mod tokens;
pub mod types;
pub mod validate;

pub use self::diagnostics::Diagnostic;
pub use self::nodes::Node;
pub use self::source_files::SourceFileTable;
pub use self::tokens::TokenTable;
pub use self::types::{TypeDescriptor, TypeNode, TypeTable};

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Panics if `idx` does not fit in 32 bits; no table gets that big.
            #[inline]
            pub fn from_usize(idx: usize) -> $name {
                match u32::try_from(idx) {
                    Ok(v) => $name(v),
                    Err(_) => panic!("{} {} overflows u32", stringify!($name), idx),
                }
            }

            /// On-disk form: the index, or -1 for `None`.
            #[inline]
            pub fn to_disk(idx: Option<$name>) -> i64 {
                idx.map_or(-1, |i| i64::from(i.0))
            }

            /// Inverse of `to_disk` for a table of `limit` entries.  `Err` carries
            /// the rejected raw value.
            #[inline]
            pub fn from_disk(raw: i64, limit: usize) -> Result<Option<$name>, i64> {
                if raw == -1 {
                    return Ok(None);
                }
                if raw < 0 || raw as u64 >= limit as u64 {
                    return Err(raw);
                }
                Ok(Some($name(raw as u32)))
            }
        }
    };
}

index_type!(
    /// Position in the node table.
    NodeIdx
);
index_type!(TokenIdx);
index_type!(TypeIdx);
index_type!(
    /// Position in the source file table (0-based).
    FileIdx
);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SymbolDb {
    pub files: SourceFileTable,
    pub tokens: TokenTable,
    pub types: TypeTable,
    pub nodes: Vec<Node>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Table sizes, mostly for progress output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DbCounts {
    pub files: usize,
    pub tokens: usize,
    pub types: usize,
    pub nodes: usize,
    pub diagnostics: usize,
}

impl std::fmt::Display for DbCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} files, {} tokens, {} types, {} nodes, {} diagnostics",
            self.files, self.tokens, self.types, self.nodes, self.diagnostics
        )
    }
}

impl SymbolDb {
    pub fn new() -> SymbolDb {
        SymbolDb::default()
    }

    pub fn counts(&self) -> DbCounts {
        DbCounts {
            files: self.files.len(),
            tokens: self.tokens.len(),
            types: self.types.len(),
            nodes: self.nodes.len(),
            diagnostics: self.diagnostics.len(),
        }
    }

    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.index()]
    }

    pub fn token_text(&self, idx: Option<TokenIdx>) -> Option<&str> {
        idx.map(|i| self.tokens.get(i))
    }

    pub fn file_path(&self, idx: Option<FileIdx>) -> Option<&str> {
        idx.map(|i| self.files.get(i))
    }

    /// Run the consistency pass and turn any violation into an error.  Writers
    /// call this before publishing a database.
    pub fn ensure_consistent(&self) -> crate::Result<()> {
        let violations = validate::check_consistency(self);
        match violations.first() {
            None => Ok(()),
            Some(first) => Err(crate::OsyError::Inconsistent {
                count: violations.len(),
                first: first.to_string(),
            }),
        }
    }
}
