//! Flattened BVH node

use bytemuck::{Pod, Zeroable};

use crate::core::types::{Vec3, INVALID_INDEX};
use crate::math::BoundingSphere;

/// BVH node - exactly 48 bytes
///
/// Layout:
/// - center + radius (16 bytes): aggregate sphere over the subtree
/// - leaf_offset, leaf_count (8 bytes): range in the leaf meshlet array
/// - left, right (8 bytes): child node indices, `INVALID_INDEX` if absent
/// - subtree_count (4 bytes): nodes in this subtree, including itself
/// - padding (12 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BvhNode {
    pub center: [f32; 3],
    pub radius: f32,
    pub leaf_offset: u32,
    pub leaf_count: u32,
    pub left: u32,
    pub right: u32,
    pub subtree_count: u32,
    pub(crate) _padding: [u32; 3],
}

const _: () = assert!(std::mem::size_of::<BvhNode>() == 48);

impl Default for BvhNode {
    fn default() -> Self {
        Self::empty()
    }
}

impl BvhNode {
    /// Node without children, leaves or volume
    pub const fn empty() -> Self {
        Self {
            center: [0.0; 3],
            radius: 0.0,
            leaf_offset: 0,
            leaf_count: 0,
            left: INVALID_INDEX,
            right: INVALID_INDEX,
            subtree_count: 1,
            _padding: [0; 3],
        }
    }

    pub fn sphere(&self) -> BoundingSphere {
        BoundingSphere::new(Vec3::from_array(self.center), self.radius)
    }

    pub fn set_sphere(&mut self, sphere: BoundingSphere) {
        self.center = sphere.center.to_array();
        self.radius = sphere.radius;
    }

    pub fn left_child(&self) -> Option<u32> {
        (self.left != INVALID_INDEX).then_some(self.left)
    }

    pub fn right_child(&self) -> Option<u32> {
        (self.right != INVALID_INDEX).then_some(self.right)
    }

    /// True if the node has no children
    pub fn is_leaf(&self) -> bool {
        self.left == INVALID_INDEX && self.right == INVALID_INDEX
    }
}
