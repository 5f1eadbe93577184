//! Turning one translation unit's producer records into a `SymbolDb`.
//!
//! A `BuildContext` collects raw nodes as they stream in and does all of the
//! real work in `finish`: pruning nodes we cannot place in a file, interning
//! tokens and types for the survivors, collapsing reference occurrences into
//! their declarations and finally deduplicating the tree.

use thiserror::Error;

use crate::config::OsyConfig;
use crate::db::dedup::DedupStats;
use crate::db::types::SpellingIndex;
use crate::db::{Diagnostic, FileIdx, Node, NodeIdx, SourceFileTable, SymbolDb};
use crate::file_format::producer::{RawDiagnostic, RawNode};
use crate::kinds::NodeFlags;

pub mod collapse;
pub mod prune;
pub mod template_spelling;

use self::collapse::{collapse_references, CollapseStats, RefInfo};
use self::prune::prune_unlocated;
use self::template_spelling::expand_template_types;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    pub prune_unlocated: bool,
    pub collapse_references: bool,
    pub persist_nodes_with_diagnostics: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            prune_unlocated: true,
            collapse_references: true,
            persist_nodes_with_diagnostics: false,
        }
    }
}

impl From<&OsyConfig> for BuildOptions {
    fn from(config: &OsyConfig) -> Self {
        BuildOptions {
            prune_unlocated: config.prune_unlocated,
            collapse_references: config.collapse_references,
            persist_nodes_with_diagnostics: config.persist_nodes_with_diagnostics,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RawNodeError {
    #[error("node {index} names parent {parent}, which has not been seen yet")]
    ParentNotSeen { index: usize, parent: u32 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub raw_nodes: usize,
    pub pruned: usize,
    pub dangling_references: usize,
    pub collapse: CollapseStats,
    pub dedup: DedupStats,
    /// Nodes dropped because the unit reported diagnostics.
    pub withheld: usize,
}

struct PendingNode {
    node: Node,
    token: String,
    raw_type: Option<crate::db::TypeDescriptor>,
    refs: RefInfo,
}

pub struct BuildContext {
    options: BuildOptions,
    files: SourceFileTable,
    compiling_file: Option<FileIdx>,
    pending: Vec<PendingNode>,
    diagnostics: Vec<Diagnostic>,
}

impl BuildContext {
    pub fn new(options: BuildOptions) -> BuildContext {
        BuildContext {
            options,
            files: SourceFileTable::new(),
            compiling_file: None,
            pending: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Record the translation unit that subsequent nodes and diagnostics came
    /// from.
    pub fn set_compiling_file(&mut self, path: &str) {
        self.compiling_file = self.files.intern(path);
    }

    pub fn pending_nodes(&self) -> usize {
        self.pending.len()
    }

    pub fn add_node(&mut self, raw: RawNode) -> Result<NodeIdx, RawNodeError> {
        let index = self.pending.len();
        if let Some(parent) = raw.parent {
            if parent as usize >= index {
                return Err(RawNodeError::ParentNotSeen { index, parent });
            }
        }
        let source_file = raw.file.as_deref().and_then(|path| self.files.intern(path));
        let node = Node {
            compiling_file: self.compiling_file,
            parent: raw.parent.map(NodeIdx),
            referenced: raw.referenced.map(NodeIdx),
            kind: raw.kind,
            flags: NodeFlags::pack(raw.access, raw.is_abstract, raw.storage_class, raw.is_deleted),
            type_idx: None,
            token: None,
            line: raw.line,
            column: raw.column,
            start_offset: raw.start_offset,
            end_offset: raw.end_offset,
            source_file,
        };
        self.pending.push(PendingNode {
            node,
            token: raw.token,
            raw_type: raw.type_desc,
            refs: RefInfo {
                external_hash: raw.external_hash,
                is_ref: raw.is_ref,
            },
        });
        Ok(NodeIdx::from_usize(index))
    }

    pub fn add_diagnostic(&mut self, raw: RawDiagnostic) {
        let file = raw.file.as_deref().and_then(|path| self.files.intern(path));
        self.diagnostics.push(Diagnostic {
            line: raw.line,
            column: raw.column,
            category: raw.category,
            description: raw.text,
            file,
            compiled_file: self.compiling_file,
        });
    }

    pub fn finish(self) -> (SymbolDb, BuildStats) {
        let BuildContext {
            options,
            files,
            pending,
            diagnostics,
            ..
        } = self;

        let mut stats = BuildStats {
            raw_nodes: pending.len(),
            ..BuildStats::default()
        };
        let mut db = SymbolDb {
            files,
            diagnostics,
            ..SymbolDb::default()
        };

        if !db.diagnostics.is_empty() && !options.persist_nodes_with_diagnostics {
            warn!(
                diagnostics = db.diagnostics.len(),
                nodes = pending.len(),
                "unit reported diagnostics, withholding its nodes"
            );
            stats.withheld = pending.len();
            return (db, stats);
        }

        let count = pending.len();
        let mut nodes = Vec::with_capacity(count);
        let mut extras = Vec::with_capacity(count);
        for (idx, mut p) in pending.into_iter().enumerate() {
            if let Some(r) = p.node.referenced {
                if r.index() >= count || r.index() == idx {
                    trace!(node = idx, target = r.0, "dropping dangling reference");
                    p.node.referenced = None;
                    stats.dangling_references += 1;
                }
            }
            nodes.push(p.node);
            extras.push((p.token, p.raw_type, p.refs));
        }

        if options.prune_unlocated {
            let (kept_nodes, kept_extras) = prune_unlocated(nodes, extras);
            stats.pruned = count - kept_nodes.len();
            nodes = kept_nodes;
            extras = kept_extras;
        }

        let mut spellings = SpellingIndex::new();
        let mut refs = Vec::with_capacity(extras.len());
        for (node, (token, raw_type, ref_info)) in nodes.iter_mut().zip(extras) {
            if !token.is_empty() {
                node.token = Some(db.tokens.intern(&token));
            }
            if let Some(raw_type) = raw_type {
                let expanded = expand_template_types(&raw_type);
                node.type_idx = Some(db.types.intern(&mut db.tokens, &mut spellings, &expanded));
            }
            refs.push(ref_info);
        }

        if options.collapse_references {
            let (collapsed, collapse_stats) = collapse_references(nodes, &refs);
            nodes = collapsed;
            stats.collapse = collapse_stats;
        }

        db.nodes = nodes;
        stats.dedup = db.dedup();
        info!(
            raw = stats.raw_nodes,
            pruned = stats.pruned,
            collapsed = stats.collapse.collapsed,
            nodes = db.nodes.len(),
            "built unit"
        );
        (db, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::validate::check_consistency;
    use crate::db::TypeDescriptor;
    use crate::kinds::{CursorKind, TypeKind};

    fn raw(kind: CursorKind, file: Option<&str>, line: u32, token: &str) -> RawNode {
        RawNode {
            kind,
            file: file.map(|f| f.to_string()),
            line,
            token: token.to_string(),
            ..RawNode::default()
        }
    }

    #[test]
    fn unlocated_nodes_are_pruned_and_indices_compacted() {
        let mut ctx = BuildContext::new(BuildOptions::default());
        ctx.set_compiling_file("/src/main.cpp");
        ctx.add_node(raw(CursorKind::NAMESPACE, Some("/src/a.h"), 1, "ns")).unwrap();
        let mut builtin = raw(CursorKind::TYPEDEF_DECL, None, 0, "__builtin");
        builtin.parent = Some(0);
        ctx.add_node(builtin).unwrap();
        let mut class = raw(CursorKind::CLASS_DECL, Some("/src/a.h"), 2, "Foo");
        class.parent = Some(1);
        ctx.add_node(class).unwrap();

        let (db, stats) = ctx.finish();
        assert_eq!(stats.pruned, 1);
        assert_eq!(db.nodes.len(), 2);
        assert_eq!(db.nodes[1].parent, None);
        assert_eq!(db.token_text(db.nodes[1].token), Some("Foo"));
        assert_eq!(db.file_path(db.nodes[1].compiling_file), Some("/src/main.cpp"));
        assert!(check_consistency(&db).is_empty());
    }

    #[test]
    fn references_collapse_into_their_declaration() {
        let mut ctx = BuildContext::new(BuildOptions::default());
        let mut decl = raw(CursorKind::CLASS_DECL, Some("a.h"), 1, "Foo");
        decl.external_hash = 42;
        ctx.add_node(decl).unwrap();
        let mut func = raw(CursorKind::FUNCTION_DECL, Some("a.h"), 5, "make");
        func.external_hash = 7;
        ctx.add_node(func).unwrap();
        let mut type_ref = raw(CursorKind::TYPE_REF, Some("a.h"), 5, "Foo");
        type_ref.parent = Some(1);
        type_ref.external_hash = 42;
        type_ref.is_ref = true;
        ctx.add_node(type_ref).unwrap();
        let mut user = raw(CursorKind::DECL_REF_EXPR, Some("a.h"), 6, "Foo");
        user.parent = Some(1);
        user.referenced = Some(2);
        ctx.add_node(user).unwrap();

        let (db, stats) = ctx.finish();
        assert_eq!(stats.collapse.collapsed, 1);
        assert_eq!(db.nodes.len(), 3);
        assert!(db.nodes.iter().all(|n| n.kind != CursorKind::TYPE_REF));
        assert_eq!(db.nodes[2].referenced, Some(NodeIdx(0)));
        assert_eq!(db.nodes[2].parent, Some(NodeIdx(1)));
    }

    #[test]
    fn nodes_of_the_same_builtin_type_share_one_entry() {
        let mut ctx = BuildContext::new(BuildOptions::default());
        for line in 1..4 {
            let mut var = raw(CursorKind::VAR_DECL, Some("a.cpp"), line, "v");
            var.type_desc = Some(TypeDescriptor {
                kind: TypeKind::INT,
                spelling: "int".to_string(),
                ..TypeDescriptor::default()
            });
            ctx.add_node(var).unwrap();
        }
        let (db, _) = ctx.finish();
        assert_eq!(db.types.len(), 1);
        assert!(db.nodes.iter().all(|n| n.type_idx == db.nodes[0].type_idx));
    }

    #[test]
    fn diagnostics_withhold_node_data() {
        let mut ctx = BuildContext::new(BuildOptions::default());
        ctx.set_compiling_file("main.cpp");
        ctx.add_node(raw(CursorKind::CLASS_DECL, Some("main.cpp"), 1, "Foo")).unwrap();
        ctx.add_diagnostic(RawDiagnostic {
            line: 3,
            column: 1,
            category: 3,
            text: "expected ';'".to_string(),
            file: Some("main.cpp".to_string()),
        });
        let (db, stats) = ctx.finish();
        assert_eq!(stats.withheld, 1);
        assert!(db.nodes.is_empty());
        assert!(db.tokens.is_empty());
        assert_eq!(db.files.len(), 1);
        assert_eq!(db.diagnostics[0].compiled_file, Some(FileIdx(0)));
    }

    #[test]
    fn diagnostics_can_be_kept_alongside_nodes() {
        let options = BuildOptions {
            persist_nodes_with_diagnostics: true,
            ..BuildOptions::default()
        };
        let mut ctx = BuildContext::new(options);
        ctx.add_node(raw(CursorKind::CLASS_DECL, Some("main.cpp"), 1, "Foo")).unwrap();
        ctx.add_diagnostic(RawDiagnostic::default());
        let (db, _) = ctx.finish();
        assert_eq!(db.nodes.len(), 1);
        assert_eq!(db.diagnostics.len(), 1);
    }
}
