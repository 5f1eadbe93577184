use super::nodes::Node;
use super::NodeIdx;

/// Result of renumbering a node table.
#[derive(Debug)]
pub struct Compacted {
    pub nodes: Vec<Node>,
    /// New position of every old node (or of the node it was forwarded to).
    pub old_to_new: Vec<Option<NodeIdx>>,
    /// References that ended up pointing at their own node and were cleared.
    pub cleared_self_refs: usize,
}

/// Drop and renumber nodes.
///
/// `targets[i]` says what becomes of old node `i`: `Some(i)` keeps it,
/// `Some(j)` forwards it to the kept node `j`, `None` drops it.  Survivors
/// keep their relative order and every `parent`/`referenced` is rewritten
/// through the resulting map; pointers into dropped nodes become `None`.
pub fn compact_nodes(nodes: Vec<Node>, targets: &[Option<usize>]) -> Compacted {
    assert_eq!(nodes.len(), targets.len());

    let mut new_pos: Vec<Option<NodeIdx>> = vec![None; nodes.len()];
    let mut next = 0;
    for (idx, target) in targets.iter().enumerate() {
        if *target == Some(idx) {
            new_pos[idx] = Some(NodeIdx::from_usize(next));
            next += 1;
        }
    }
    let old_to_new: Vec<Option<NodeIdx>> = targets
        .iter()
        .map(|target| target.and_then(|t| new_pos[t]))
        .collect();

    let mut cleared_self_refs = 0;
    let mut survivors = Vec::with_capacity(next);
    for (idx, mut node) in nodes.into_iter().enumerate() {
        let me = match new_pos[idx] {
            Some(me) => me,
            None => continue,
        };
        node.parent = node.parent.and_then(|p| old_to_new[p.index()]);
        node.referenced = node.referenced.and_then(|r| old_to_new[r.index()]);
        if node.referenced == Some(me) {
            trace!(node = me.0, "clearing self reference");
            node.referenced = None;
            cleared_self_refs += 1;
        }
        survivors.push(node);
    }

    Compacted {
        nodes: survivors,
        old_to_new,
        cleared_self_refs,
    }
}
