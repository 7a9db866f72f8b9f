//! Meshlet construction from a triangle list

use super::{Meshlet, MeshletContainer};
use crate::backend::{Clusterizer, MeshletLimits};
use crate::core::types::{Result, Vec3, UNINITIALIZED_ERROR};
use crate::math::Aabb;
use crate::mesh::Vertex;

/// Splits triangle lists into meshlets and computes their culling data
pub struct MeshletBuilder<'a, C: Clusterizer + ?Sized> {
    clusterizer: &'a C,
    limits: MeshletLimits,
    cone_weight: f32,
}

impl<'a, C: Clusterizer + ?Sized> MeshletBuilder<'a, C> {
    pub fn new(clusterizer: &'a C, limits: MeshletLimits, cone_weight: f32) -> Self {
        Self { clusterizer, limits, cone_weight }
    }

    /// Cluster `indices` into meshlets tagged with `lod`, `error` and the
    /// bounding center of the group they were built from.
    ///
    /// Parent links start out uninitialized. Empty input gives an empty
    /// container.
    pub fn build(
        &self,
        vertices: &[Vertex],
        indices: &[u32],
        lod: u32,
        error: f32,
        center: Vec3,
    ) -> Result<MeshletContainer> {
        let mut container = MeshletContainer::new();
        if indices.is_empty() {
            return Ok(container);
        }

        let clusters = self.clusterizer.clusterize(vertices, indices, self.limits, self.cone_weight)?;

        for cluster in &clusters {
            if cluster.triangles.is_empty() {
                continue;
            }

            let aabb = Aabb::from_points(
                cluster
                    .triangles
                    .iter()
                    .map(|&t| vertices[cluster.vertices[t as usize] as usize].pos()),
            );

            let meshlet = Meshlet {
                vertex_offset: 0,
                vertex_count: 0,
                triangle_offset: 0,
                triangle_count: 0,
                pos_min: aabb.min,
                pos_max: aabb.max,
                cone: cluster.cone,
                lod,
                error,
                parent_error: UNINITIALIZED_ERROR,
                parent_pos_center: center,
                cluster_pos_center: center,
            };
            container.push(meshlet, &cluster.vertices, &cluster.triangles);
        }

        log::trace!(
            "built {} meshlets at lod {} from {} triangles",
            container.len(),
            lod,
            indices.len() / 3
        );

        Ok(container)
    }
}
