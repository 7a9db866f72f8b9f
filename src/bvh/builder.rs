//! BVH construction over the parent error spheres of a finished hierarchy.
//!
//! Meshlets produced by the same accepted group share one error sphere and
//! form one leaf bundle. Bundles are split recursively along the longest
//! axis of their combined bounds; meshlets without a parent hang directly
//! off the root. The build tree lives in an arena and is flattened
//! breadth-first.

use std::collections::HashMap;
use std::collections::VecDeque;

use super::node::BvhNode;
use super::Bvh;
use crate::core::types::INVALID_INDEX;
use crate::math::{Aabb, BoundingSphere};
use crate::meshlet::MeshletContainer;

/// Meshlets sharing one parent error sphere
struct LeafBundle {
    meshlets: Vec<u32>,
    sphere: BoundingSphere,
    bounds: Aabb,
}

/// Arena node used during the recursive split
#[derive(Default)]
struct BuildNode {
    meshlets: Vec<u32>,
    left: Option<usize>,
    right: Option<usize>,
}

pub struct BvhBuilder {
    arena: Vec<BuildNode>,
}

impl BvhBuilder {
    /// Build the BVH for every meshlet in `container`
    pub fn build(container: &MeshletContainer) -> Bvh {
        let (terminal, bundles) = collect_bundles(container);

        let mut builder = Self { arena: Vec::with_capacity(bundles.len() * 2 + 1) };
        let root = builder.push(BuildNode { meshlets: terminal, ..Default::default() });
        let (left, right) = builder.split_children(bundles);
        builder.arena[root].left = left;
        builder.arena[root].right = right;

        let bvh = builder.flatten(root, container);
        log::debug!(
            "BVH: {} nodes, {} leaf meshlets, depth {}",
            bvh.node_count(),
            bvh.leaf_meshlets().len(),
            bvh.depth()
        );
        bvh
    }

    fn push(&mut self, node: BuildNode) -> usize {
        self.arena.push(node);
        self.arena.len() - 1
    }

    /// Subtree for `bundles`; `None` if there are none
    fn split(&mut self, mut bundles: Vec<LeafBundle>) -> Option<usize> {
        match bundles.len() {
            0 => None,
            1 => {
                let bundle = bundles.pop()?;
                Some(self.push(BuildNode { meshlets: bundle.meshlets, ..Default::default() }))
            }
            _ => {
                let (left, right) = self.split_children(bundles);
                Some(self.push(BuildNode { meshlets: Vec::new(), left, right }))
            }
        }
    }

    /// Bisect `bundles` along the longest axis of their combined bounds.
    /// A single bundle becomes the left child only.
    fn split_children(&mut self, mut bundles: Vec<LeafBundle>) -> (Option<usize>, Option<usize>) {
        if bundles.len() <= 1 {
            return (self.split(bundles), None);
        }

        let bounds = bundles.iter().fold(Aabb::EMPTY, |acc, b| acc.merged(&b.bounds));
        let axis = bounds.longest_axis();
        bundles.sort_by(|a, b| a.sphere.center[axis].total_cmp(&b.sphere.center[axis]));

        let upper = bundles.split_off(bundles.len() / 2);
        let left = self.split(bundles);
        let right = self.split(upper);
        (left, right)
    }

    /// Breadth-first flatten, then aggregate spheres and subtree counts
    /// bottom-up
    fn flatten(self, root: usize, container: &MeshletContainer) -> Bvh {
        let mut order = Vec::with_capacity(self.arena.len());
        let mut flat_index = vec![INVALID_INDEX; self.arena.len()];
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            flat_index[id] = order.len() as u32;
            order.push(id);
            let node = &self.arena[id];
            queue.extend(node.left);
            queue.extend(node.right);
        }

        let mut nodes = Vec::with_capacity(order.len());
        let mut leaf_meshlets = Vec::new();
        for &id in &order {
            let node = &self.arena[id];
            nodes.push(BvhNode {
                leaf_offset: leaf_meshlets.len() as u32,
                leaf_count: node.meshlets.len() as u32,
                left: node.left.map_or(INVALID_INDEX, |c| flat_index[c]),
                right: node.right.map_or(INVALID_INDEX, |c| flat_index[c]),
                ..BvhNode::empty()
            });
            leaf_meshlets.extend_from_slice(&node.meshlets);
        }

        // Children always come after their parent in BFS order
        for i in (0..nodes.len()).rev() {
            let node = nodes[i];
            let start = node.leaf_offset as usize;
            let leaf_spheres = leaf_meshlets[start..start + node.leaf_count as usize]
                .iter()
                .map(|&m| container.meshlet(m).lod_sphere());
            let child_spheres = [node.left_child(), node.right_child()]
                .into_iter()
                .flatten()
                .map(|c| nodes[c as usize].sphere());

            let sphere = leaf_spheres
                .chain(child_spheres)
                .reduce(|acc, s| acc.merged(&s))
                .unwrap_or_default();

            let count = |child: Option<u32>| child.map_or(0, |c| nodes[c as usize].subtree_count);
            let subtree_count = 1 + count(node.left_child()) + count(node.right_child());

            nodes[i].set_sphere(sphere);
            nodes[i].subtree_count = subtree_count;
        }

        Bvh::from_parts(nodes, leaf_meshlets)
    }
}

/// Split meshlets into parentless ones and bundles keyed by their exact
/// parent error sphere, in first-seen order.
fn collect_bundles(container: &MeshletContainer) -> (Vec<u32>, Vec<LeafBundle>) {
    let mut terminal = Vec::new();
    let mut bundles: Vec<LeafBundle> = Vec::new();
    let mut bundle_of: HashMap<[u32; 4], usize> = HashMap::new();

    for (i, meshlet) in container.meshlets().iter().enumerate() {
        let i = i as u32;
        if !meshlet.has_parent() {
            terminal.push(i);
            continue;
        }

        let sphere = meshlet.lod_sphere();
        let key = [
            sphere.center.x.to_bits(),
            sphere.center.y.to_bits(),
            sphere.center.z.to_bits(),
            sphere.radius.to_bits(),
        ];
        let index = *bundle_of.entry(key).or_insert_with(|| {
            bundles.push(LeafBundle { meshlets: Vec::new(), sphere, bounds: Aabb::EMPTY });
            bundles.len() - 1
        });
        let bundle = &mut bundles[index];
        bundle.meshlets.push(i);
        bundle.bounds = bundle.bounds.merged(&meshlet.aabb());
    }

    (terminal, bundles)
}
