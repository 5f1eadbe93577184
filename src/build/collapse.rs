//! Folding reference occurrences into the declarations they name.
//!
//! The front-end emits a node for every use of a symbol (`TypeRef`,
//! `MemberRef`...).  When the same unit also contains the declaration, the
//! use carries no information beyond "points at that declaration", so we
//! drop it and redirect everything that pointed at it.

use rustc_hash::FxHashMap;

use crate::db::compact::compact_nodes;
use crate::db::{Node, NodeIdx};

/// Per-node facts that only matter for collapsing and are not persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefInfo {
    pub external_hash: u32,
    pub is_ref: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollapseStats {
    pub collapsed: usize,
    /// Pointers that resolved back to the node holding them.
    pub self_resolved: usize,
}

pub fn collapse_references(nodes: Vec<Node>, refs: &[RefInfo]) -> (Vec<Node>, CollapseStats) {
    assert_eq!(nodes.len(), refs.len());
    let count = nodes.len();

    let mut decls: FxHashMap<u32, Vec<usize>> = FxHashMap::default();
    for (idx, info) in refs.iter().enumerate() {
        if !info.is_ref && info.external_hash != 0 {
            decls.entry(info.external_hash).or_default().push(idx);
        }
    }

    let forward: Vec<Option<usize>> = refs
        .iter()
        .map(|info| {
            if info.is_ref {
                decls.get(&info.external_hash).and_then(|d| d.first().copied())
            } else {
                None
            }
        })
        .collect();

    let resolve = |start: usize| -> usize {
        let mut cur = start;
        let mut steps = 0;
        while let Some(next) = forward[cur] {
            cur = next;
            steps += 1;
            assert!(steps <= count, "reference forwarding loops at node {}", start);
        }
        cur
    };
    let is_dead = |idx: usize| forward[idx].is_some();

    let mut stats = CollapseStats::default();
    let mut nodes = nodes;
    for idx in 0..count {
        if is_dead(idx) {
            stats.collapsed += 1;
            continue;
        }
        if let Some(target) = nodes[idx].referenced {
            let resolved = resolve(target.index());
            if resolved == idx {
                trace!(node = idx, "reference resolves to itself, clearing");
                nodes[idx].referenced = None;
                stats.self_resolved += 1;
            } else {
                nodes[idx].referenced = Some(NodeIdx::from_usize(resolved));
            }
        }
        // Dead nodes keep their original parents, so walking up from one
        // finds the nearest live ancestor.
        let mut parent = nodes[idx].parent;
        while let Some(p) = parent {
            if !is_dead(p.index()) {
                break;
            }
            parent = nodes[p.index()].parent;
        }
        nodes[idx].parent = parent;
    }

    let targets: Vec<Option<usize>> = (0..count)
        .map(|idx| if is_dead(idx) { None } else { Some(idx) })
        .collect();
    let compacted = compact_nodes(nodes, &targets);
    stats.self_resolved += compacted.cleared_self_refs;
    debug!(
        collapsed = stats.collapsed,
        self_resolved = stats.self_resolved,
        "collapsed reference nodes"
    );
    (compacted.nodes, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(external_hash: u32, is_ref: bool) -> RefInfo {
        RefInfo { external_hash, is_ref }
    }

    #[test]
    fn children_of_a_dropped_reference_move_up() {
        let nodes = vec![
            Node::default(),
            Node { parent: Some(NodeIdx(0)), ..Node::default() },
            Node { parent: Some(NodeIdx(1)), ..Node::default() },
            Node { parent: Some(NodeIdx(2)), ..Node::default() },
        ];
        let refs = [info(5, false), info(9, false), info(5, true), info(0, false)];
        let (nodes, stats) = collapse_references(nodes, &refs);
        assert_eq!(stats.collapsed, 1);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[2].parent, Some(NodeIdx(1)));
    }

    #[test]
    fn declaration_pointing_at_its_own_reference_is_cleared() {
        let mut nodes = vec![Node::default(), Node::default()];
        nodes[0].referenced = Some(NodeIdx(1));
        let refs = [info(3, false), info(3, true)];
        let (nodes, stats) = collapse_references(nodes, &refs);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].referenced, None);
        assert_eq!(stats.self_resolved, 1);
    }

    #[test]
    fn references_without_a_declaration_survive() {
        let nodes = vec![Node::default(), Node::default()];
        let refs = [info(3, false), info(4, true)];
        let (nodes, stats) = collapse_references(nodes, &refs);
        assert_eq!(nodes.len(), 2);
        assert_eq!(stats.collapsed, 0);
    }
}
