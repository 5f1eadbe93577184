use crate::db::compact::compact_nodes;
use crate::db::Node;

/// Drop nodes that have no source file (builtins, compiler-synthesized
/// declarations).  `extras` runs parallel to `nodes` and is filtered the same
/// way.
pub fn prune_unlocated<T>(nodes: Vec<Node>, extras: Vec<T>) -> (Vec<Node>, Vec<T>) {
    assert_eq!(nodes.len(), extras.len());
    let targets: Vec<Option<usize>> = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| node.source_file.map(|_| idx))
        .collect();

    let kept_extras = extras
        .into_iter()
        .zip(targets.iter())
        .filter_map(|(extra, target)| target.map(|_| extra))
        .collect();
    let compacted = compact_nodes(nodes, &targets);
    debug!(
        kept = compacted.nodes.len(),
        pruned = targets.len() - compacted.nodes.len(),
        "pruned unlocated nodes"
    );
    (compacted.nodes, kept_extras)
}
