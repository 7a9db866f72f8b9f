//! Bounding volume hierarchy over meshlet LOD spheres.
//!
//! Nodes are stored breadth-first with the root at index 0. Each node owns
//! a contiguous range of the leaf meshlet array and at most two children.
//! A node's sphere encloses the LOD spheres of every meshlet in its subtree,
//! so a traversal can reject whole subtrees with one error test.

pub mod builder;
pub mod node;

pub use builder::BvhBuilder;
pub use node::BvhNode;

/// Flattened BVH
#[derive(Clone, Debug, PartialEq)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    leaf_meshlets: Vec<u32>,
}

impl Default for Bvh {
    /// Single empty root
    fn default() -> Self {
        Self { nodes: vec![BvhNode::empty()], leaf_meshlets: Vec::new() }
    }
}

impl Bvh {
    pub(crate) fn from_parts(nodes: Vec<BvhNode>, leaf_meshlets: Vec<u32>) -> Self {
        debug_assert!(!nodes.is_empty());
        Self { nodes, leaf_meshlets }
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Meshlet indices referenced by node leaf ranges
    pub fn leaf_meshlets(&self) -> &[u32] {
        &self.leaf_meshlets
    }

    pub fn root(&self) -> &BvhNode {
        &self.nodes[0]
    }

    pub fn node(&self, index: u32) -> &BvhNode {
        &self.nodes[index as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Meshlets attached directly to node `index`
    pub fn node_meshlets(&self, index: u32) -> &[u32] {
        let node = self.node(index);
        let start = node.leaf_offset as usize;
        &self.leaf_meshlets[start..start + node.leaf_count as usize]
    }

    /// Meshlets anywhere in the subtree rooted at `index`
    pub fn subtree_meshlets(&self, index: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            out.extend_from_slice(self.node_meshlets(i));
            let node = self.node(i);
            stack.extend(node.left_child());
            stack.extend(node.right_child());
        }
        out
    }

    /// Levels from the root to the deepest node, 1 for a lone root
    pub fn depth(&self) -> u32 {
        let mut depth = vec![0u32; self.nodes.len()];
        let mut max_depth = 0;
        // BFS order: parents precede children
        for (i, node) in self.nodes.iter().enumerate() {
            let d = if i == 0 { 1 } else { depth[i] };
            max_depth = max_depth.max(d);
            for child in [node.left_child(), node.right_child()].into_iter().flatten() {
                depth[child as usize] = d + 1;
            }
        }
        max_depth
    }

    /// Raw node bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }
}
