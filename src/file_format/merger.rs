use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::osy::{load_file, save_file};
use crate::db::dedup::DedupStats;
use crate::db::validate::check_consistency;
use crate::db::{Diagnostic, FileIdx, Node, NodeIdx, SymbolDb, TokenIdx, TypeIdx, TypeNode};
use crate::errors::{OsyError, Result};
use crate::hashing::content_hashes;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub files_added: usize,
    pub tokens_added: usize,
    pub types_added: usize,
    pub nodes_added: usize,
    pub nodes_unified: usize,
    pub diagnostics_added: usize,
    pub dedup: DedupStats,
}

fn remap<T: Copy>(table: &[T], idx: usize, what: &str) -> T {
    match table.get(idx) {
        Some(v) => *v,
        None => panic!("no {} remap entry for foreign index {}", what, idx),
    }
}

fn remap_node(table: &[Option<NodeIdx>], idx: NodeIdx) -> NodeIdx {
    match remap(table, idx.index(), "node") {
        Some(v) => v,
        None => panic!("foreign node {} used before it was merged", idx.0),
    }
}

/// Fold `foreign` into `base`.
///
/// Files unify by normalized path, tokens by text, types by structural hash
/// and nodes by content hash; whatever has no counterpart in `base` is
/// appended with every index translated.  The node table is deduplicated
/// afterwards.  `foreign` must be consistent (see `check_consistency`); a
/// missing remap entry panics.
pub fn merge_into(base: &mut SymbolDb, foreign: &SymbolDb) -> MergeStats {
    let mut stats = MergeStats::default();
    let before = base.counts();

    let file_remap: Vec<FileIdx> = foreign
        .files
        .iter()
        .map(|(_, path)| match base.files.find(path) {
            Some(idx) => idx,
            None => base.files.push_raw(path.to_string()),
        })
        .collect();
    let map_file = |f: Option<FileIdx>| f.map(|f| remap(&file_remap, f.index(), "file"));

    let token_remap: Vec<TokenIdx> = foreign
        .tokens
        .iter()
        .map(|(_, text)| base.tokens.intern(text))
        .collect();
    let map_token = |t: Option<TokenIdx>| t.map(|t| remap(&token_remap, t.index(), "token"));

    let order = match foreign.types.topo_order() {
        Ok(order) => order,
        Err(ty) => panic!("foreign type {} is part of a cycle", ty.0),
    };
    let mut type_slots: Vec<Option<TypeIdx>> = vec![None; foreign.types.len()];
    for idx in order {
        let ty = foreign.types.get(idx);
        let mapped = match base.types.find_hash(ty.hash) {
            Some(existing) => existing,
            None => {
                let children = ty
                    .children
                    .iter()
                    .map(|c| match type_slots[c.index()] {
                        Some(mapped) => mapped,
                        None => panic!("type {} visited before its child {}", idx.0, c.0),
                    })
                    .collect();
                base.types.push(TypeNode {
                    kind: ty.kind,
                    is_const: ty.is_const,
                    token: map_token(ty.token),
                    children,
                    hash: ty.hash,
                })
            }
        };
        type_slots[idx.index()] = Some(mapped);
    }
    let type_remap: Vec<Option<TypeIdx>> = type_slots;
    let map_type = |t: Option<TypeIdx>| {
        t.map(|t| match remap(&type_remap, t.index(), "type") {
            Some(mapped) => mapped,
            None => panic!("type {} was never merged", t.0),
        })
    };

    // Translate everything except the node-to-node links, then hash in base's
    // index space so equal content compares equal.
    let translated: Vec<Node> = foreign
        .nodes
        .iter()
        .map(|node| Node {
            compiling_file: map_file(node.compiling_file),
            source_file: map_file(node.source_file),
            token: map_token(node.token),
            type_idx: map_type(node.type_idx),
            ..node.clone()
        })
        .collect();
    let foreign_hashes = content_hashes(&translated);

    let mut known: FxHashMap<u64, NodeIdx> = FxHashMap::default();
    for (idx, hash) in content_hashes(&base.nodes).into_iter().enumerate() {
        known.entry(hash).or_insert_with(|| NodeIdx::from_usize(idx));
    }

    let mut node_remap: Vec<Option<NodeIdx>> = vec![None; translated.len()];
    let mut appended: Vec<(usize, NodeIdx)> = Vec::new();
    for (idx, (mut node, hash)) in translated.into_iter().zip(foreign_hashes).enumerate() {
        if let Some(existing) = known.get(&hash) {
            node_remap[idx] = Some(*existing);
            stats.nodes_unified += 1;
            continue;
        }
        if let Some(parent) = node.parent {
            assert!(parent.index() < idx, "foreign node {} precedes its parent", idx);
        }
        node.parent = node.parent.map(|p| remap_node(&node_remap, p));
        node.referenced = None;
        let new_idx = NodeIdx::from_usize(base.nodes.len());
        base.nodes.push(node);
        known.insert(hash, new_idx);
        node_remap[idx] = Some(new_idx);
        appended.push((idx, new_idx));
    }
    for (foreign_idx, new_idx) in appended {
        if let Some(target) = foreign.nodes[foreign_idx].referenced {
            let target = remap_node(&node_remap, target);
            if target != new_idx {
                base.nodes[new_idx.index()].referenced = Some(target);
            }
        }
    }

    for diag in &foreign.diagnostics {
        base.diagnostics.push(Diagnostic {
            file: map_file(diag.file),
            compiled_file: map_file(diag.compiled_file),
            ..diag.clone()
        });
    }

    let after = base.counts();
    stats.files_added = after.files - before.files;
    stats.tokens_added = after.tokens - before.tokens;
    stats.types_added = after.types - before.types;
    stats.nodes_added = after.nodes - before.nodes;
    stats.diagnostics_added = after.diagnostics - before.diagnostics;
    stats.dedup = base.dedup();
    info!(
        files_added = stats.files_added,
        types_added = stats.types_added,
        nodes_added = stats.nodes_added,
        nodes_unified = stats.nodes_unified,
        "merged database"
    );
    stats
}

/// Merge every database into the first, in order.
pub fn merge_all<I: IntoIterator<Item = SymbolDb>>(dbs: I) -> SymbolDb {
    let mut iter = dbs.into_iter();
    let mut base = iter.next().unwrap_or_default();
    for foreign in iter {
        merge_into(&mut base, &foreign);
    }
    base
}

fn load_checked(path: &Path) -> Result<SymbolDb> {
    let db = load_file(path)?;
    let violations = check_consistency(&db);
    if let Some(first) = violations.first() {
        return Err(OsyError::Inconsistent {
            count: violations.len(),
            first: format!("{}: {}", path.display(), first),
        });
    }
    Ok(db)
}

/// Load, merge and save.  Inputs are checked before anything is merged so a
/// corrupt input is reported as an error instead of tripping an internal
/// assertion, and nothing is written unless every step succeeds.
pub fn merge_files(filenames: &[PathBuf], output: &Path, compression_level: u32) -> Result<SymbolDb> {
    let (first, rest) = match filenames.split_first() {
        Some(split) => split,
        None => return Err(OsyError::Usage("merge needs at least one input".to_string())),
    };
    let mut base = load_checked(first)?;
    for path in rest {
        let _span = info_span!("merge", input = %path.display()).entered();
        let foreign = load_checked(path)?;
        let stats = merge_into(&mut base, &foreign);
        println!(
            "Merged {}: +{} files, +{} nodes, {} unified",
            path.display(),
            stats.files_added,
            stats.nodes_added,
            stats.nodes_unified
        );
    }
    save_file(&base, output, compression_level)?;
    Ok(base)
}
