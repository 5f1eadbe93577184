use thiserror::Error;

use super::SymbolDb;

/// One broken invariant found by [`check_consistency`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Violation {
    #[error("node {node}: parent {parent} does not precede it")]
    ParentNotBefore { node: usize, parent: usize },

    #[error("node {node}: references node {target} outside the table")]
    ReferenceOutOfRange { node: usize, target: usize },

    #[error("node {node}: references itself")]
    SelfReference { node: usize },

    #[error("node {node}: {field} {index} is outside the {table} table")]
    NodeField {
        node: usize,
        field: &'static str,
        table: &'static str,
        index: usize,
    },

    #[error("type {ty}: {field} {index} is outside the {table} table")]
    TypeField {
        ty: usize,
        field: &'static str,
        table: &'static str,
        index: usize,
    },

    #[error("type {ty} is part of a cycle")]
    TypeCycle { ty: usize },

    #[error("diagnostic {diagnostic}: {field} {index} is outside the file table")]
    DiagnosticFile {
        diagnostic: usize,
        field: &'static str,
        index: usize,
    },
}

/// Check every cross-table index and ordering invariant of `db`.  Returns all
/// violations found; an empty list means the database is safe to write.
pub fn check_consistency(db: &SymbolDb) -> Vec<Violation> {
    let mut out = Vec::new();
    let files = db.files.len();
    let tokens = db.tokens.len();
    let types = db.types.len();
    let nodes = db.nodes.len();

    for (idx, node) in db.nodes.iter().enumerate() {
        if let Some(parent) = node.parent {
            if parent.index() >= idx {
                out.push(Violation::ParentNotBefore {
                    node: idx,
                    parent: parent.index(),
                });
            }
        }
        if let Some(target) = node.referenced {
            if target.index() >= nodes {
                out.push(Violation::ReferenceOutOfRange {
                    node: idx,
                    target: target.index(),
                });
            } else if target.index() == idx {
                out.push(Violation::SelfReference { node: idx });
            }
        }
        let fields = [
            ("token", "token", node.token.map(|t| t.index()), tokens),
            ("type", "type", node.type_idx.map(|t| t.index()), types),
            ("source_file", "file", node.source_file.map(|f| f.index()), files),
            ("compiling_file", "file", node.compiling_file.map(|f| f.index()), files),
        ];
        for (field, table, index, limit) in fields.iter().copied() {
            if let Some(index) = index {
                if index >= limit {
                    out.push(Violation::NodeField {
                        node: idx,
                        field,
                        table,
                        index,
                    });
                }
            }
        }
    }

    let mut children_ok = true;
    for (idx, ty) in db.types.iter() {
        if let Some(token) = ty.token {
            if token.index() >= tokens {
                out.push(Violation::TypeField {
                    ty: idx.index(),
                    field: "token",
                    table: "token",
                    index: token.index(),
                });
            }
        }
        for child in &ty.children {
            if child.index() >= types {
                children_ok = false;
                out.push(Violation::TypeField {
                    ty: idx.index(),
                    field: "child",
                    table: "type",
                    index: child.index(),
                });
            }
        }
    }
    if children_ok {
        if let Err(ty) = db.types.topo_order() {
            out.push(Violation::TypeCycle { ty: ty.index() });
        }
    }

    for (idx, diag) in db.diagnostics.iter().enumerate() {
        let fields = [("file", diag.file), ("compiled_file", diag.compiled_file)];
        for (field, file) in fields.iter().copied() {
            if let Some(file) = file {
                if file.index() >= files {
                    out.push(Violation::DiagnosticFile {
                        diagnostic: idx,
                        field,
                        index: file.index(),
                    });
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Node, NodeIdx, TokenIdx, TypeIdx, TypeNode};

    #[test]
    fn empty_database_is_consistent() {
        assert!(check_consistency(&SymbolDb::new()).is_empty());
    }

    #[test]
    fn every_kind_of_breakage_is_reported() {
        let mut db = SymbolDb::new();
        db.nodes.push(Node {
            parent: Some(NodeIdx(1)),
            ..Node::default()
        });
        db.nodes.push(Node {
            referenced: Some(NodeIdx(1)),
            token: Some(TokenIdx(3)),
            ..Node::default()
        });
        db.types.push(TypeNode {
            children: vec![TypeIdx(0)],
            ..TypeNode::default()
        });

        let violations = check_consistency(&db);
        assert_eq!(
            violations,
            vec![
                Violation::ParentNotBefore { node: 0, parent: 1 },
                Violation::SelfReference { node: 1 },
                Violation::NodeField {
                    node: 1,
                    field: "token",
                    table: "token",
                    index: 3
                },
                Violation::TypeCycle { ty: 0 },
            ]
        );
        assert!(db.ensure_consistent().is_err());
    }
}
