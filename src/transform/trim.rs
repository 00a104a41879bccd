//! Depth and breadth limits for comment trees

/// A node in a recursive comment tree
pub trait TreeNode: Sized {
    /// Whether this node is a comment (anything else is pruned)
    fn is_comment(&self) -> bool;

    fn children_mut(&mut self) -> &mut Vec<Self>;
}

/// Maximum depth `D` and maximum nodes kept per level `K`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimLimits {
    pub max_depth: usize,
    pub max_per_level: usize,
}

/// Trims a comment list to the given limits
///
/// At every level the first `max_per_level` nodes are kept (input order is
/// ranking order), non-comment nodes among them are discarded, and the
/// survivors' children are trimmed one level deeper. A list at
/// `depth >= max_depth` comes back empty. Counts are never touched here.
pub fn trim_tree<N: TreeNode>(nodes: Vec<N>, limits: TrimLimits, depth: usize) -> Vec<N> {
    if depth >= limits.max_depth {
        return Vec::new();
    }

    nodes
        .into_iter()
        .take(limits.max_per_level)
        .filter(TreeNode::is_comment)
        .map(|mut node| {
            let children = std::mem::take(node.children_mut());
            *node.children_mut() = trim_tree(children, limits, depth + 1);
            node
        })
        .collect()
}
