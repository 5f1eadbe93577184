use rustc_hash::FxHashMap;

use super::compact::compact_nodes;
use super::nodes::Node;
use super::SymbolDb;
use crate::hashing::content_hashes;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub before: usize,
    pub after: usize,
    /// Canonical nodes that picked up a reference from one of their duplicates.
    pub backfilled: usize,
    pub cleared_self_refs: usize,
}

/// Collapse nodes with equal content hashes onto the first one.
///
/// A duplicate's `referenced` fills in a canonical node that has none; when
/// both have one, the canonical node's wins.
pub fn dedup_nodes(mut nodes: Vec<Node>) -> (Vec<Node>, DedupStats) {
    let before = nodes.len();
    let hashes = content_hashes(&nodes);

    let mut canonical: FxHashMap<u64, usize> = FxHashMap::default();
    let targets: Vec<Option<usize>> = hashes
        .iter()
        .enumerate()
        .map(|(idx, hash)| Some(*canonical.entry(*hash).or_insert(idx)))
        .collect();

    let mut backfilled = 0;
    for (idx, target) in targets.iter().enumerate() {
        let target = match target {
            Some(t) if *t != idx => *t,
            _ => continue,
        };
        if nodes[target].referenced.is_none() {
            if let Some(referenced) = nodes[idx].referenced {
                nodes[target].referenced = Some(referenced);
                backfilled += 1;
            }
        }
    }

    let compacted = compact_nodes(nodes, &targets);
    for (idx, node) in compacted.nodes.iter().enumerate() {
        if let Some(parent) = node.parent {
            assert!(
                parent.index() < idx,
                "dedup left node {} after its child {}",
                parent.0,
                idx
            );
        }
    }

    let stats = DedupStats {
        before,
        after: compacted.nodes.len(),
        backfilled,
        cleared_self_refs: compacted.cleared_self_refs,
    };
    (compacted.nodes, stats)
}

impl SymbolDb {
    pub fn dedup(&mut self) -> DedupStats {
        let nodes = std::mem::take(&mut self.nodes);
        let (nodes, stats) = dedup_nodes(nodes);
        self.nodes = nodes;
        debug!(
            before = stats.before,
            after = stats.after,
            backfilled = stats.backfilled,
            "deduplicated nodes"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FileIdx, NodeIdx, TokenIdx};
    use crate::kinds::CursorKind;

    fn node(kind: CursorKind, parent: Option<u32>, line: u32) -> Node {
        Node {
            kind,
            parent: parent.map(NodeIdx),
            token: Some(TokenIdx(0)),
            source_file: Some(FileIdx(0)),
            line,
            ..Node::default()
        }
    }

    fn duplicated_subtrees() -> Vec<Node> {
        vec![
            node(CursorKind::NAMESPACE, None, 1),
            node(CursorKind::CLASS_DECL, Some(0), 2),
            node(CursorKind::FIELD_DECL, Some(1), 3),
            node(CursorKind::NAMESPACE, None, 1),
            node(CursorKind::CLASS_DECL, Some(3), 2),
            node(CursorKind::FIELD_DECL, Some(4), 3),
            node(CursorKind::FIELD_DECL, Some(4), 4),
        ]
    }

    #[test]
    fn identical_subtrees_collapse() {
        let (nodes, stats) = dedup_nodes(duplicated_subtrees());
        assert_eq!(stats.before, 7);
        assert_eq!(stats.after, 4);
        assert_eq!(nodes[3].line, 4);
        assert_eq!(nodes[3].parent, Some(NodeIdx(1)));
    }

    #[test]
    fn second_run_changes_nothing() {
        let (once, _) = dedup_nodes(duplicated_subtrees());
        let (twice, stats) = dedup_nodes(once.clone());
        assert_eq!(stats.before, stats.after);
        assert_eq!(once, twice);
    }

    #[test]
    fn parents_stay_before_children() {
        let (nodes, _) = dedup_nodes(duplicated_subtrees());
        for (idx, n) in nodes.iter().enumerate() {
            if let Some(p) = n.parent {
                assert!(p.index() < idx);
            }
        }
    }

    #[test]
    fn references_survive_remapping() {
        let mut nodes = duplicated_subtrees();
        let mut user = node(CursorKind::TYPE_REF, Some(4), 9);
        user.referenced = Some(NodeIdx(4));
        nodes.push(user);
        let (nodes, _) = dedup_nodes(nodes);
        let user = nodes.last().unwrap();
        assert_eq!(user.referenced, Some(NodeIdx(1)));
        assert_eq!(user.parent, Some(NodeIdx(1)));
    }
}
