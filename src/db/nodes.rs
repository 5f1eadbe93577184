use super::{FileIdx, NodeIdx, TokenIdx, TypeIdx};
use crate::kinds::{CursorKind, NodeFlags};

/// One AST node.  Its key is its position in `SymbolDb::nodes`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
    /// The translation unit whose parse produced this node.
    pub compiling_file: Option<FileIdx>,
    /// Always smaller than this node's own index.
    pub parent: Option<NodeIdx>,
    /// The declaration this node uses, if any.  Never the node itself.
    pub referenced: Option<NodeIdx>,
    pub kind: CursorKind,
    pub flags: NodeFlags,
    pub type_idx: Option<TypeIdx>,
    pub token: Option<TokenIdx>,
    pub line: u32,
    pub column: u32,
    pub start_offset: u32,
    pub end_offset: u32,
    pub source_file: Option<FileIdx>,
}

/// Depth of every node in the forest, computed in one forward pass.
pub fn depths(nodes: &[Node]) -> Vec<usize> {
    let mut depths: Vec<usize> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let depth = match node.parent {
            Some(p) if p.index() < depths.len() => depths[p.index()] + 1,
            _ => 0,
        };
        depths.push(depth);
    }
    depths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_follows_parent_chain() {
        let nodes = vec![
            Node::default(),
            Node { parent: Some(NodeIdx(0)), ..Node::default() },
            Node { parent: Some(NodeIdx(1)), ..Node::default() },
            Node::default(),
        ];
        assert_eq!(depths(&nodes), vec![0, 1, 2, 0]);
    }
}
