//! Level-by-level hierarchy driver

use super::config::LodConfig;
use super::gmss::GmssPass;
use super::{BuildStats, LevelStats, LodMesh};
use crate::backend::{
    Clusterizer, GraphPartitioner, MeshoptClusterizer, MeshoptSimplifier, MetisPartitioner, Simplifier,
};
use crate::bvh::BvhBuilder;
use crate::cluster::{group_meshlets, ClusterGraph};
use crate::core::types::{Result, Vec3};
use crate::math::{Aabb, PositionQuantizer};
use crate::mesh::{MeshData, Vertex};
use crate::meshlet::{MeshletBuilder, MeshletContainer};

/// Builds LOD hierarchies with a fixed configuration and set of backends
pub struct LodBuilder<C = MeshoptClusterizer, S = MeshoptSimplifier, P = MetisPartitioner> {
    config: LodConfig,
    clusterizer: C,
    simplifier: S,
    partitioner: P,
}

impl LodBuilder {
    /// Builder using the meshoptimizer and METIS backends
    pub fn new(config: LodConfig) -> Self {
        Self::with_backends(config, MeshoptClusterizer, MeshoptSimplifier::default(), MetisPartitioner)
    }
}

impl Default for LodBuilder {
    fn default() -> Self {
        Self::new(LodConfig::default())
    }
}

impl<C: Clusterizer, S: Simplifier, P: GraphPartitioner> LodBuilder<C, S, P> {
    pub fn with_backends(config: LodConfig, clusterizer: C, simplifier: S, partitioner: P) -> Self {
        Self { config, clusterizer, simplifier, partitioner }
    }

    pub fn config(&self) -> &LodConfig {
        &self.config
    }

    /// Build the full hierarchy and its BVH.
    ///
    /// Fails only on invalid input or configuration; backend trouble during
    /// simplification just ends the hierarchy early for the affected groups.
    pub fn build(&self, mesh: &MeshData) -> Result<LodMesh> {
        self.config.validate()?;
        mesh.validate()?;

        let start = std::time::Instant::now();
        let vertices = mesh.vertices();
        let extent = Aabb::from_points(vertices.iter().map(Vertex::pos)).max_extent();

        let lod0 = MeshletBuilder::new(&self.clusterizer, self.config.meshlet_limits(), self.config.cone_weight)
            .build(vertices, mesh.indices(), 0, 0.0, Vec3::ZERO)?;
        log::info!(
            "LOD 0: {} meshlets from {} triangles ({} vertices)",
            lod0.len(),
            mesh.triangle_count(),
            mesh.vertex_count()
        );

        let mut stats = BuildStats::default();
        let mut hierarchy = MeshletContainer::new();
        let mut current = lod0;
        let gmss = GmssPass::new(&self.config, &self.clusterizer, &self.simplifier);

        for level in 0..self.config.max_lod_count.saturating_sub(1) {
            if current.is_empty() {
                break;
            }

            let target_error = self.config.level_target_error(level, extent);
            let quantizer = PositionQuantizer::new(target_error * self.config.fuse_distance_scale);

            let graph = ClusterGraph::build(&current, vertices, &quantizer);
            let groups = group_meshlets(
                &graph,
                self.config.min_meshlets_per_group as usize,
                self.config.max_meshlets_per_group as usize,
                &self.partitioner,
            );
            let outcome = gmss.run(vertices, &mut current, &groups, level, target_error, &quantizer);

            log::info!(
                "LOD {}: {} meshlets, {} groups ({} accepted, {} rejected), target error {:.5} -> {} meshlets",
                level,
                current.len(),
                groups.len(),
                outcome.accepted,
                outcome.rejected,
                target_error,
                outcome.next.len()
            );
            stats.levels.push(LevelStats {
                lod: level,
                meshlets: current.len(),
                groups: groups.len(),
                accepted_groups: outcome.accepted,
                rejected_groups: outcome.rejected,
                target_error,
            });

            hierarchy.merge(std::mem::take(&mut current));
            if outcome.next.is_empty() {
                log::debug!("hierarchy converged after LOD {}", level);
                break;
            }
            current = outcome.next;
        }

        // Last level, left over when the cap was reached
        hierarchy.merge(current);

        let bvh = BvhBuilder::build(&hierarchy);
        stats.total_meshlets = hierarchy.len();
        stats.bvh_nodes = bvh.node_count();

        log::info!(
            "Built {} meshlets, {} BVH nodes (depth {}) in {:.1}ms",
            hierarchy.len(),
            bvh.node_count(),
            bvh.depth(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(LodMesh { meshlets: hierarchy, bvh, stats })
    }
}

/// Build with the default backends
pub fn build(mesh: &MeshData, config: &LodConfig) -> Result<LodMesh> {
    LodBuilder::new(config.clone()).build(mesh)
}
