//! The hash functions that decide identity.
//!
//! Type hashes are persisted in OSY files and compared across builds, and
//! node content hashes are compared across databases during a merge, so both
//! have to be stable from one run (and one machine) to the next.  That rules
//! out `RandomState`; we mix with a fixed multiplicative step and hash strings
//! with `FxHasher`, which has no per-process keys.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::db::nodes::Node;

/// Initial value for every mix chain.
pub const SEED: u64 = 1035752329;

/// Seed for nodes without a parent.
pub const ROOT_SEED: u64 = 0x5f3d_7a11_c0de_0b5e;

/// Seed for the spelling-only key of template placeholder types.
pub const PLACEHOLDER_SEED: u64 = 0x7e3a_91c2_44d0_1f87;

const FACTOR: u64 = (-1521134295i64) as u64;

/// Fold `value` into `hash`.  Order matters: `mix(mix(h, a), b)` and
/// `mix(mix(h, b), a)` differ.
#[inline]
pub fn mix(hash: u64, value: u64) -> u64 {
    hash.wrapping_mul(FACTOR).wrapping_add(value)
}

pub fn str_hash(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    text.hash(&mut hasher);
    hasher.finish()
}

#[inline]
fn opt_index(idx: Option<u32>) -> u64 {
    idx.map_or(u64::MAX, u64::from)
}

/// Hash of the fixed-size identity fields of a node.  This does not depend on
/// where the node sits in the tree.
pub fn node_identity_hash(node: &Node) -> u64 {
    let mut h = SEED;
    h = mix(h, node.kind.0 as u32 as u64);
    h = mix(h, opt_index(node.type_idx.map(|t| t.0)));
    h = mix(h, opt_index(node.token.map(|t| t.0)));
    h = mix(h, node.line as u64);
    h = mix(h, node.column as u64);
    h = mix(h, node.start_offset as u64);
    h = mix(h, node.end_offset as u64);
    h = mix(h, node.flags.bits() as u64);
    mix(h, opt_index(node.source_file.map(|f| f.0)))
}

/// Content hash of one node given its parent's content hash.
pub fn node_content_hash(node: &Node, parent_hash: Option<u64>, referenced_identity: Option<u64>) -> u64 {
    let mut h = mix(parent_hash.unwrap_or(ROOT_SEED), node_identity_hash(node));
    if let Some(ref_hash) = referenced_identity {
        h = mix(h, ref_hash);
    }
    h
}

/// Compute every node's content hash in a single forward pass.
///
/// Panics if a node's parent does not precede it or a reference points outside
/// the table; both are internal invariants of a node table.
pub fn content_hashes(nodes: &[Node]) -> Vec<u64> {
    let identities: Vec<u64> = nodes.iter().map(node_identity_hash).collect();
    let mut hashes: Vec<u64> = Vec::with_capacity(nodes.len());
    for (idx, node) in nodes.iter().enumerate() {
        let parent_hash = node.parent.map(|p| {
            assert!(
                p.index() < idx,
                "node {} has parent {} which does not precede it",
                idx,
                p.0
            );
            hashes[p.index()]
        });
        let referenced_identity = node.referenced.map(|r| {
            assert!(
                r.index() < nodes.len(),
                "node {} references {} outside the table",
                idx,
                r.0
            );
            identities[r.index()]
        });
        hashes.push(node_content_hash(node, parent_hash, referenced_identity));
    }
    hashes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FileIdx, NodeIdx, TokenIdx};
    use crate::kinds::CursorKind;

    fn node(parent: Option<u32>, line: u32) -> Node {
        Node {
            kind: CursorKind::CLASS_DECL,
            token: Some(TokenIdx(0)),
            source_file: Some(FileIdx(0)),
            parent: parent.map(NodeIdx),
            line,
            ..Node::default()
        }
    }

    #[test]
    fn mix_is_order_sensitive() {
        assert_ne!(mix(mix(SEED, 1), 2), mix(mix(SEED, 2), 1));
    }

    #[test]
    fn str_hash_is_deterministic() {
        assert_eq!(str_hash("int"), str_hash("int"));
        assert_ne!(str_hash("int"), str_hash("long"));
    }

    #[test]
    fn same_fields_under_different_parents_hash_differently() {
        let nodes = vec![node(None, 1), node(None, 2), node(Some(0), 5), node(Some(1), 5)];
        let hashes = content_hashes(&nodes);
        assert_eq!(node_identity_hash(&nodes[2]), node_identity_hash(&nodes[3]));
        assert_ne!(hashes[2], hashes[3]);
    }

    #[test]
    fn identical_chains_hash_identically() {
        let nodes = vec![node(None, 1), node(Some(0), 5), node(None, 1), node(Some(2), 5)];
        let hashes = content_hashes(&nodes);
        assert_eq!(hashes[0], hashes[2]);
        assert_eq!(hashes[1], hashes[3]);
    }

    #[test]
    fn references_contribute_the_target_identity() {
        let mut nodes = vec![node(None, 1), node(None, 2), node(None, 9), node(None, 9)];
        nodes[2].referenced = Some(NodeIdx(0));
        nodes[3].referenced = Some(NodeIdx(1));
        let hashes = content_hashes(&nodes);
        assert_ne!(hashes[2], hashes[3]);
    }

    #[test]
    #[should_panic(expected = "does not precede")]
    fn forward_parent_panics() {
        let nodes = vec![node(Some(1), 1), node(None, 2)];
        content_hashes(&nodes);
    }
}
