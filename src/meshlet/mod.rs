//! Meshlets and the flat container that owns their index data.
//!
//! A [`MeshletContainer`] is an append-only arena: meshlets reference ranges
//! of its vertex-index and triangle arrays by offset. Containers from
//! different LOD levels are combined with [`MeshletContainer::merge`], which
//! rebases the incoming offsets.

pub mod builder;
pub mod gpu;

pub use builder::MeshletBuilder;
pub use gpu::{GpuMeshlet, GpuMeshletData};

use crate::core::types::{Vec3, UNINITIALIZED_ERROR};
use crate::math::{Aabb, BoundingSphere};

/// Normal cone for cluster backface culling.
///
/// A cluster seen from `camera` is entirely backfacing when
/// `dot(normalize(apex - camera), axis) >= cutoff`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingCone {
    pub apex: Vec3,
    pub axis: Vec3,
    pub cutoff: f32,
}

impl Default for BoundingCone {
    fn default() -> Self {
        Self::DEGENERATE
    }
}

impl BoundingCone {
    /// Cone that never culls
    pub const DEGENERATE: BoundingCone = BoundingCone {
        apex: Vec3::ZERO,
        axis: Vec3::ZERO,
        cutoff: 1.0,
    };

    pub fn is_degenerate(&self) -> bool {
        self.axis == Vec3::ZERO
    }
}

/// Small triangle cluster, the atomic unit of the LOD hierarchy
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Meshlet {
    /// First entry in the container's vertex-index array
    pub vertex_offset: u32,
    pub vertex_count: u32,
    /// First entry in the container's triangle array (3 entries per triangle)
    pub triangle_offset: u32,
    pub triangle_count: u32,
    pub pos_min: Vec3,
    pub pos_max: Vec3,
    /// Backface culling cone
    pub cone: BoundingCone,
    /// LOD level, 0 = finest
    pub lod: u32,
    /// Accumulated simplification error of this meshlet's geometry
    pub error: f32,
    /// Error of the coarser cluster replacing this one, or
    /// [`UNINITIALIZED_ERROR`] while it has none
    pub parent_error: f32,
    /// Bounding-sphere center of the coarser cluster
    pub parent_pos_center: Vec3,
    /// Bounding-sphere center of the group this meshlet was built from
    pub cluster_pos_center: Vec3,
}

impl Meshlet {
    /// True once the owning group has been simplified into a parent
    pub fn has_parent(&self) -> bool {
        self.parent_error != UNINITIALIZED_ERROR
    }

    /// Record the parent link. Each meshlet receives it at most once.
    pub fn set_parent(&mut self, error: f32, center: Vec3) {
        debug_assert!(!self.has_parent(), "meshlet parent link written twice");
        debug_assert!(error >= self.error);
        self.parent_error = error;
        self.parent_pos_center = center;
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos_min, self.pos_max)
    }

    /// Sphere used for LOD cut selection.
    ///
    /// Linked meshlets use their parent error sphere. Terminal meshlets have
    /// no parent and fall back to the sphere around their geometry.
    pub fn lod_sphere(&self) -> BoundingSphere {
        if self.has_parent() {
            BoundingSphere::new(self.parent_pos_center, self.parent_error)
        } else {
            let aabb = self.aabb();
            BoundingSphere::new(aabb.center(), aabb.half_extent().length())
        }
    }
}

/// Flat arrays of meshlets and their index data
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshletContainer {
    meshlets: Vec<Meshlet>,
    /// Global vertex indices, `vertex_count` per meshlet
    vertices: Vec<u32>,
    /// Local triangle indices into each meshlet's vertex range
    triangles: Vec<u8>,
}

impl MeshletContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a meshlet together with its index data. Offsets on `meshlet`
    /// are overwritten to point at the appended ranges.
    pub fn push(&mut self, mut meshlet: Meshlet, vertices: &[u32], triangles: &[u8]) -> u32 {
        debug_assert_eq!(triangles.len() % 3, 0);
        meshlet.vertex_offset = self.vertices.len() as u32;
        meshlet.vertex_count = vertices.len() as u32;
        meshlet.triangle_offset = self.triangles.len() as u32;
        meshlet.triangle_count = (triangles.len() / 3) as u32;

        self.vertices.extend_from_slice(vertices);
        self.triangles.extend_from_slice(triangles);

        let index = self.meshlets.len() as u32;
        self.meshlets.push(meshlet);
        index
    }

    /// Append all of `other`, rebasing its offsets by this container's
    /// current array lengths. Existing meshlets are untouched.
    pub fn merge(&mut self, other: MeshletContainer) {
        let vertex_base = self.vertices.len() as u32;
        let triangle_base = self.triangles.len() as u32;

        self.vertices.extend(other.vertices);
        self.triangles.extend(other.triangles);
        self.meshlets.extend(other.meshlets.into_iter().map(|mut m| {
            m.vertex_offset += vertex_base;
            m.triangle_offset += triangle_base;
            m
        }));
    }

    pub fn len(&self) -> usize {
        self.meshlets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshlets.is_empty()
    }

    pub fn meshlet(&self, index: u32) -> &Meshlet {
        &self.meshlets[index as usize]
    }

    pub fn meshlet_mut(&mut self, index: u32) -> &mut Meshlet {
        &mut self.meshlets[index as usize]
    }

    pub fn meshlets(&self) -> &[Meshlet] {
        &self.meshlets
    }

    /// All vertex indices (for GPU upload)
    pub fn vertex_indices(&self) -> &[u32] {
        &self.vertices
    }

    /// All local triangle indices (for GPU upload)
    pub fn triangle_indices(&self) -> &[u8] {
        &self.triangles
    }

    /// Global vertex indices referenced by one meshlet
    pub fn meshlet_vertices(&self, index: u32) -> &[u32] {
        let m = &self.meshlets[index as usize];
        let start = m.vertex_offset as usize;
        &self.vertices[start..start + m.vertex_count as usize]
    }

    /// Local triangle indices of one meshlet
    pub fn meshlet_triangles(&self, index: u32) -> &[u8] {
        let m = &self.meshlets[index as usize];
        let start = m.triangle_offset as usize;
        &self.triangles[start..start + m.triangle_count as usize * 3]
    }

    /// Triangles of one meshlet resolved to global vertex indices
    pub fn triangle_vertices(&self, index: u32) -> impl Iterator<Item = [u32; 3]> + '_ {
        let verts = self.meshlet_vertices(index);
        self.meshlet_triangles(index)
            .chunks_exact(3)
            .map(move |t| [verts[t[0] as usize], verts[t[1] as usize], verts[t[2] as usize]])
    }

    /// Triangle count summed over all meshlets
    pub fn total_triangles(&self) -> usize {
        self.meshlets.iter().map(|m| m.triangle_count as usize).sum()
    }

    /// Meshlets at a given LOD level
    pub fn iter_lod(&self, lod: u32) -> impl Iterator<Item = (u32, &Meshlet)> + '_ {
        self.meshlets
            .iter()
            .enumerate()
            .filter(move |(_, m)| m.lod == lod)
            .map(|(i, m)| (i as u32, m))
    }
}

#[cfg(test)]
pub(crate) fn test_meshlet(lod: u32, error: f32) -> Meshlet {
    Meshlet {
        vertex_offset: 0,
        vertex_count: 0,
        triangle_offset: 0,
        triangle_count: 0,
        pos_min: Vec3::ZERO,
        pos_max: Vec3::ONE,
        cone: BoundingCone::DEGENERATE,
        lod,
        error,
        parent_error: UNINITIALIZED_ERROR,
        parent_pos_center: Vec3::ZERO,
        cluster_pos_center: Vec3::ZERO,
    }
}
