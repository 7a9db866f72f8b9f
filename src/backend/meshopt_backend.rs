//! `meshopt`-backed clustering and simplification

use meshopt::{
    build_meshlets, compute_cluster_bounds, compute_meshlet_bounds, simplify_with_attributes_and_locks, Bounds,
    SimplifyOptions, VertexDataAdapter,
};

use super::{Clusterizer, MeshletLimits, RawCluster, Simplified, Simplifier};
use crate::core::{Error, Result, Vec3};
use crate::math::BoundingSphere;
use crate::mesh::Vertex;
use crate::meshlet::BoundingCone;

fn vertex_adapter(vertices: &[Vertex]) -> Result<VertexDataAdapter<'_>> {
    VertexDataAdapter::new(bytemuck::cast_slice(vertices), std::mem::size_of::<Vertex>(), 0)
        .map_err(|e| Error::Backend(format!("meshopt vertex adapter: {e:?}")))
}

/// meshoptimizer bounds a single meshlet's worth of triangles per call
const MAX_BOUNDS_TRIANGLES: usize = 256;

fn convert_cone(bounds: &Bounds) -> BoundingCone {
    BoundingCone {
        apex: Vec3::from_array(bounds.cone_apex),
        axis: Vec3::from_array(bounds.cone_axis),
        cutoff: bounds.cone_cutoff,
    }
}

fn convert_sphere(bounds: &Bounds) -> BoundingSphere {
    BoundingSphere::new(Vec3::from_array(bounds.center), bounds.radius)
}

/// Greedy meshlet builder from meshoptimizer
#[derive(Clone, Copy, Debug, Default)]
pub struct MeshoptClusterizer;

impl Clusterizer for MeshoptClusterizer {
    fn clusterize(
        &self,
        vertices: &[Vertex],
        indices: &[u32],
        limits: MeshletLimits,
        cone_weight: f32,
    ) -> Result<Vec<RawCluster>> {
        if indices.is_empty() {
            return Ok(Vec::new());
        }

        let adapter = vertex_adapter(vertices)?;
        let meshlets = build_meshlets(
            indices,
            &adapter,
            limits.max_vertices,
            limits.max_triangles,
            cone_weight,
        );

        Ok(meshlets
            .iter()
            .map(|m| RawCluster {
                vertices: m.vertices.to_vec(),
                triangles: m.triangles.to_vec(),
                cone: convert_cone(&compute_meshlet_bounds(m, &adapter)),
            })
            .collect())
    }

    fn bounds(&self, vertices: &[Vertex], indices: &[u32]) -> Result<BoundingSphere> {
        if indices.is_empty() {
            return Ok(BoundingSphere::default());
        }
        let adapter = vertex_adapter(vertices)?;
        Ok(indices
            .chunks(MAX_BOUNDS_TRIANGLES * 3)
            .map(|chunk| convert_sphere(&compute_cluster_bounds(chunk, &adapter)))
            .reduce(|acc, s| acc.merged(&s))
            .unwrap_or_default())
    }
}

/// Attribute-aware edge-collapse simplifier from meshoptimizer.
///
/// Normals take part in the quadric so shading seams survive reduction.
#[derive(Clone, Copy, Debug)]
pub struct MeshoptSimplifier {
    pub normal_weight: f32,
}

impl Default for MeshoptSimplifier {
    fn default() -> Self {
        Self { normal_weight: 0.5 }
    }
}

impl Simplifier for MeshoptSimplifier {
    fn simplify(
        &self,
        vertices: &[Vertex],
        indices: &[u32],
        locks: &[bool],
        target_index_count: usize,
        target_error: f32,
    ) -> Result<Simplified> {
        if indices.is_empty() {
            return Ok(Simplified::default());
        }
        if locks.len() != vertices.len() {
            return Err(Error::Backend(format!(
                "lock table has {} entries for {} vertices",
                locks.len(),
                vertices.len()
            )));
        }

        let adapter = vertex_adapter(vertices)?;
        // Strided view starting at the first normal; stride is the full vertex
        let floats: &[f32] = bytemuck::cast_slice(vertices);
        let normals = &floats[Vertex::NORMAL_FLOAT_OFFSET..];

        let mut error = 0.0;
        let indices = simplify_with_attributes_and_locks(
            indices,
            &adapter,
            normals,
            &[self.normal_weight; 3],
            std::mem::size_of::<Vertex>(),
            locks,
            target_index_count,
            target_error,
            SimplifyOptions::Sparse | SimplifyOptions::ErrorAbsolute,
            Some(&mut error),
        );

        Ok(Simplified { indices, error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::create_test_grid;

    #[test]
    fn test_clusterize_respects_limits() {
        let grid = create_test_grid(16);
        let limits = MeshletLimits { max_vertices: 64, max_triangles: 64 };
        let clusters = MeshoptClusterizer
            .clusterize(grid.vertices(), grid.indices(), limits, 0.0)
            .unwrap();

        assert!(clusters.len() > 1);
        let mut triangles = 0;
        for c in &clusters {
            assert!(c.vertices.len() <= 64);
            assert!(c.triangles.len() / 3 <= 64);
            assert!(c.triangles.iter().all(|&t| (t as usize) < c.vertices.len()));
            triangles += c.triangles.len() / 3;
        }
        assert_eq!(triangles, grid.triangle_count());
    }

    #[test]
    fn test_cone_faces_up_on_flat_grid() {
        let grid = create_test_grid(4);
        let limits = MeshletLimits { max_vertices: 255, max_triangles: 256 };
        let clusters = MeshoptClusterizer
            .clusterize(grid.vertices(), grid.indices(), limits, 0.0)
            .unwrap();

        assert_eq!(clusters.len(), 1);
        let cone = clusters[0].cone;
        assert!(!cone.is_degenerate());
        assert!((cone.axis - Vec3::Y).length() < 1e-2);
    }

    #[test]
    fn test_cluster_bounds_enclose_triangles() {
        let grid = create_test_grid(6);
        let sphere = MeshoptClusterizer.bounds(grid.vertices(), grid.indices()).unwrap();
        for &i in grid.indices() {
            assert!(sphere.center.distance(grid.position(i)) <= sphere.radius + 1e-3);
        }
        assert!((sphere.center - Vec3::new(3.0, 0.0, 3.0)).length() < 0.5);

        let empty = MeshoptClusterizer.bounds(grid.vertices(), &[]).unwrap();
        assert_eq!(empty, BoundingSphere::default());
    }

    #[test]
    fn test_cluster_bounds_over_many_triangles() {
        // 1152 triangles, bounded in several calls
        let grid = create_test_grid(24);
        let sphere = MeshoptClusterizer.bounds(grid.vertices(), grid.indices()).unwrap();
        for &i in grid.indices() {
            assert!(sphere.center.distance(grid.position(i)) <= sphere.radius + 1e-3);
        }
    }

    #[test]
    fn test_simplify_flat_grid() {
        let grid = create_test_grid(8);
        let locks = vec![false; grid.vertex_count()];
        let target = grid.indices().len() / 2;
        let out = MeshoptSimplifier::default()
            .simplify(grid.vertices(), grid.indices(), &locks, target, 1.0)
            .unwrap();

        assert!(out.indices.len() < grid.indices().len());
        assert_eq!(out.indices.len() % 3, 0);
        assert!(out.error >= 0.0);
    }

    #[test]
    fn test_simplify_rejects_bad_locks() {
        let grid = create_test_grid(2);
        let result = MeshoptSimplifier::default().simplify(grid.vertices(), grid.indices(), &[], 3, 1.0);
        assert!(matches!(result, Err(Error::Backend(_))));
    }
}
