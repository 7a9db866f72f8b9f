//! Seams to the external geometry primitives.
//!
//! The hierarchy build only needs three operations from the outside world:
//! greedy clustering with cluster bounds, locked-border simplification and k-way graph
//! partitioning. Each sits behind a small trait so the core stays testable
//! with fakes; the production implementations wrap `meshopt` and `metis`.

pub mod meshopt_backend;
pub mod metis_backend;

pub use meshopt_backend::{MeshoptClusterizer, MeshoptSimplifier};
pub use metis_backend::MetisPartitioner;

use crate::cluster::ClusterGraph;
use crate::core::Result;
use crate::math::BoundingSphere;
use crate::mesh::Vertex;
use crate::meshlet::BoundingCone;

/// Per-meshlet size bounds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshletLimits {
    pub max_vertices: usize,
    pub max_triangles: usize,
}

/// One cluster as produced by a [`Clusterizer`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawCluster {
    /// Global vertex indices used by the cluster
    pub vertices: Vec<u32>,
    /// Triangles as local indices into `vertices`
    pub triangles: Vec<u8>,
    /// Backface culling cone over the cluster's triangles
    pub cone: BoundingCone,
}

/// Greedy triangle clustering and cluster bounds
pub trait Clusterizer: Sync {
    fn clusterize(
        &self,
        vertices: &[Vertex],
        indices: &[u32],
        limits: MeshletLimits,
        cone_weight: f32,
    ) -> Result<Vec<RawCluster>>;

    /// Bounding sphere of the triangles in `indices`
    fn bounds(&self, vertices: &[Vertex], indices: &[u32]) -> Result<BoundingSphere>;
}

/// Output of a [`Simplifier`] call
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Simplified {
    pub indices: Vec<u32>,
    /// Absolute geometric error introduced by the reduction
    pub error: f32,
}

/// Edge-collapse simplification with per-vertex locks
pub trait Simplifier: Sync {
    /// Reduce `indices` towards `target_index_count` without exceeding
    /// `target_error` (absolute units). Vertices with `locks[v]` set must
    /// not move or be collapsed.
    fn simplify(
        &self,
        vertices: &[Vertex],
        indices: &[u32],
        locks: &[bool],
        target_index_count: usize,
        target_error: f32,
    ) -> Result<Simplified>;
}

/// Balanced k-way min-edge-cut partitioning
pub trait GraphPartitioner: Sync {
    /// Assign every graph node a part id in `0..parts`
    fn partition(&self, graph: &ClusterGraph, parts: usize) -> Result<Vec<u32>>;
}
