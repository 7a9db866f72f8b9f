//! Group-merge-simplify-split: one LOD transition.
//!
//! Each cluster group is merged into a single index buffer, simplified with
//! the vertices it shares with other groups locked, and split back into
//! meshlets one level coarser. Accepted groups write their parent link onto
//! every member meshlet; rejected groups leave their members terminal.

use std::collections::HashMap;

use rayon::prelude::*;

use super::config::LodConfig;
use crate::backend::{Clusterizer, Simplifier};
use crate::cluster::ClusterGroup;
use crate::core::types::Vec3;
use crate::math::{PositionKey, PositionQuantizer};
use crate::mesh::Vertex;
use crate::meshlet::{MeshletBuilder, MeshletContainer};

/// Result of one GMSS pass over a level
#[derive(Debug, Default)]
pub struct LevelOutcome {
    /// Candidate meshlets for the next level
    pub next: MeshletContainer,
    pub accepted: usize,
    pub rejected: usize,
}

/// Simplified geometry of one accepted group
struct GroupParent {
    error: f32,
    center: Vec3,
    meshlets: MeshletContainer,
}

/// Runs GMSS for the groups of one level
pub struct GmssPass<'a, C: Clusterizer + ?Sized, S: Simplifier + ?Sized> {
    config: &'a LodConfig,
    builder: MeshletBuilder<'a, C>,
    clusterizer: &'a C,
    simplifier: &'a S,
}

impl<'a, C: Clusterizer + ?Sized, S: Simplifier + ?Sized> GmssPass<'a, C, S> {
    pub fn new(config: &'a LodConfig, clusterizer: &'a C, simplifier: &'a S) -> Self {
        Self {
            config,
            builder: MeshletBuilder::new(clusterizer, config.meshlet_limits(), config.cone_weight),
            clusterizer,
            simplifier,
        }
    }

    /// Simplify every group of `level` (LOD `lod`) within `target_error`.
    ///
    /// Parent links are written onto `level` for accepted groups. Groups are
    /// independent, so they run on rayon when enabled; results are applied
    /// in group order to keep the output deterministic.
    pub fn run(
        &self,
        vertices: &[Vertex],
        level: &mut MeshletContainer,
        groups: &[ClusterGroup],
        lod: u32,
        target_error: f32,
        quantizer: &PositionQuantizer,
    ) -> LevelOutcome {
        let locks = group_border_locks(vertices, level, groups, quantizer);

        let shared: &MeshletContainer = level;
        let parents: Vec<Option<GroupParent>> = if self.config.parallel {
            groups
                .par_iter()
                .map(|g| self.simplify_group(vertices, shared, g, &locks, lod, target_error))
                .collect()
        } else {
            groups
                .iter()
                .map(|g| self.simplify_group(vertices, shared, g, &locks, lod, target_error))
                .collect()
        };

        let mut outcome = LevelOutcome::default();
        for (group, parent) in groups.iter().zip(parents) {
            let Some(parent) = parent else {
                outcome.rejected += 1;
                continue;
            };
            for &m in &group.meshlets {
                level.meshlet_mut(m).set_parent(parent.error, parent.center);
            }
            outcome.next.merge(parent.meshlets);
            outcome.accepted += 1;
        }
        outcome
    }

    /// Merge, simplify and re-split one group. `None` means the group is
    /// terminal at this level.
    fn simplify_group(
        &self,
        vertices: &[Vertex],
        level: &MeshletContainer,
        group: &ClusterGroup,
        locks: &[bool],
        lod: u32,
        target_error: f32,
    ) -> Option<GroupParent> {
        let merged: Vec<u32> = group
            .meshlets
            .iter()
            .flat_map(|&m| level.triangle_vertices(m))
            .flatten()
            .collect();
        let merged_triangles = merged.len() / 3;
        if merged_triangles == 0 {
            return None;
        }

        let target_triangles = (merged_triangles as f32 * self.config.simplify_threshold()) as usize;
        let simplified = match self.simplifier.simplify(
            vertices,
            &merged,
            locks,
            target_triangles * 3,
            target_error,
        ) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("lod {}: simplifying group of {} meshlets failed: {}", lod, group.len(), e);
                return None;
            }
        };

        let reduced_triangles = simplified.indices.len() / 3;
        if reduced_triangles == 0
            || reduced_triangles as f32 >= self.config.min_reduce * merged_triangles as f32
        {
            log::trace!(
                "lod {}: group rejected ({} -> {} triangles)",
                lod,
                merged_triangles,
                reduced_triangles
            );
            return None;
        }

        let center = match self.clusterizer.bounds(vertices, &simplified.indices) {
            Ok(sphere) => sphere.center,
            Err(e) => {
                log::warn!("lod {}: bounding simplified group failed: {}", lod, e);
                return None;
            }
        };

        let child_error = group
            .meshlets
            .iter()
            .map(|&m| level.meshlet(m).error)
            .fold(0.0f32, f32::max);
        let error = simplified.error.max(0.0) + child_error;

        let meshlets = match self.builder.build(vertices, &simplified.indices, lod + 1, error, center) {
            Ok(m) if !m.is_empty() => m,
            Ok(_) => return None,
            Err(e) => {
                log::warn!("lod {}: re-clustering simplified group failed: {}", lod, e);
                return None;
            }
        };

        Some(GroupParent { error, center, meshlets })
    }
}

/// Lock every vertex that another group also uses, so neighbouring groups
/// keep matching borders.
///
/// Vertices match by fused position. A vertex also locks when another
/// group owns a cell within half a cell of it, so near-coincident seam
/// vertices split by a cell boundary still lock together.
pub fn group_border_locks(
    vertices: &[Vertex],
    level: &MeshletContainer,
    groups: &[ClusterGroup],
    quantizer: &PositionQuantizer,
) -> Vec<bool> {
    const SHARED: u32 = u32::MAX;

    let mut owner: HashMap<PositionKey, u32> = HashMap::new();
    for (group_id, group) in groups.iter().enumerate() {
        let group_id = group_id as u32;
        for &m in &group.meshlets {
            for &v in level.meshlet_vertices(m) {
                let key = quantizer.key(vertices[v as usize].pos());
                owner
                    .entry(key)
                    .and_modify(|o| {
                        if *o != group_id {
                            *o = SHARED;
                        }
                    })
                    .or_insert(group_id);
            }
        }
    }

    let mut locks = vec![false; vertices.len()];
    for (group_id, group) in groups.iter().enumerate() {
        let group_id = group_id as u32;
        for &m in &group.meshlets {
            for &v in level.meshlet_vertices(m) {
                if locks[v as usize] {
                    continue;
                }
                locks[v as usize] = quantizer
                    .neighborhood_keys(vertices[v as usize].pos())
                    .iter()
                    .any(|key| owner.get(key).is_some_and(|&o| o != group_id));
            }
        }
    }
    locks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MeshletLimits, MeshoptClusterizer, MeshoptSimplifier, Simplified};
    use crate::core::{Error, Result};
    use crate::core::types::UNINITIALIZED_ERROR;
    use crate::mesh::create_test_grid;
    use crate::meshlet::test_meshlet;

    const LIMITS: MeshletLimits = MeshletLimits { max_vertices: 255, max_triangles: 256 };

    fn grid_level(size: u32) -> (Vec<Vertex>, MeshletContainer) {
        let grid = create_test_grid(size);
        let level = MeshletBuilder::new(&MeshoptClusterizer, LIMITS, 0.0)
            .build(grid.vertices(), grid.indices(), 0, 0.0, Vec3::ZERO)
            .unwrap();
        (grid.vertices().to_vec(), level)
    }

    fn halves(level: &MeshletContainer) -> Vec<ClusterGroup> {
        let n = level.len() as u32;
        vec![
            ClusterGroup { meshlets: (0..n / 2).collect() },
            ClusterGroup { meshlets: (n / 2..n).collect() },
        ]
    }

    struct FailingSimplifier;

    impl Simplifier for FailingSimplifier {
        fn simplify(&self, _: &[Vertex], _: &[u32], _: &[bool], _: usize, _: f32) -> Result<Simplified> {
            Err(Error::Backend("simplifier offline".into()))
        }
    }

    /// Returns the input untouched
    struct IdentitySimplifier;

    impl Simplifier for IdentitySimplifier {
        fn simplify(&self, _: &[Vertex], indices: &[u32], _: &[bool], _: usize, _: f32) -> Result<Simplified> {
            Ok(Simplified { indices: indices.to_vec(), error: 0.0 })
        }
    }

    /// Keeps the first half of the triangles of inputs with at least
    /// `min_indices` indices, returns smaller inputs untouched
    struct ThresholdSimplifier {
        min_indices: usize,
    }

    impl Simplifier for ThresholdSimplifier {
        fn simplify(&self, _: &[Vertex], indices: &[u32], _: &[bool], _: usize, _: f32) -> Result<Simplified> {
            let keep = if indices.len() >= self.min_indices { indices.len() / 6 * 3 } else { indices.len() };
            Ok(Simplified { indices: indices[..keep].to_vec(), error: 0.25 })
        }
    }

    #[test]
    fn test_locks_only_on_group_borders() {
        let (vertices, level) = grid_level(32);
        let groups = halves(&level);
        let locks = group_border_locks(&vertices, &level, &groups, &PositionQuantizer::new(0.01));

        let locked = locks.iter().filter(|&&l| l).count();
        assert!(locked > 0);
        assert!(locked < vertices.len() / 2);

        let single = vec![ClusterGroup { meshlets: (0..level.len() as u32).collect() }];
        let locks = group_border_locks(&vertices, &level, &single, &PositionQuantizer::new(0.01));
        assert!(locks.iter().all(|&l| !l));
    }

    #[test]
    fn test_accepted_groups_link_parents() {
        let (vertices, mut level) = grid_level(32);
        let groups = halves(&level);
        let config = LodConfig { parallel: false, ..Default::default() };
        let simplifier = MeshoptSimplifier::default();
        let pass = GmssPass::new(&config, &MeshoptClusterizer, &simplifier);

        let outcome = pass.run(&vertices, &mut level, &groups, 0, 0.5, &PositionQuantizer::new(0.05));

        assert!(outcome.accepted > 0);
        assert_eq!(outcome.accepted + outcome.rejected, groups.len());
        assert!(!outcome.next.is_empty());
        assert!(outcome.next.total_triangles() < level.total_triangles());

        for m in outcome.next.meshlets() {
            assert_eq!(m.lod, 1);
            assert!(!m.has_parent());
        }
        for m in level.meshlets() {
            if m.has_parent() {
                assert!(m.parent_error >= m.error);
            }
        }
    }

    #[test]
    fn test_parallel_matches_serial() {
        let (vertices, level) = grid_level(32);
        let groups = halves(&level);
        let quantizer = PositionQuantizer::new(0.05);

        let run = |parallel: bool| {
            let config = LodConfig { parallel, ..Default::default() };
            let simplifier = MeshoptSimplifier::default();
            let pass = GmssPass::new(&config, &MeshoptClusterizer, &simplifier);
            let mut level = level.clone();
            let outcome = pass.run(&vertices, &mut level, &groups, 0, 0.5, &quantizer);
            (level, outcome.next)
        };

        assert_eq!(run(true), run(false));
    }

    #[test]
    fn test_insufficient_reduction_rejected() {
        let (vertices, mut level) = grid_level(16);
        let groups = vec![ClusterGroup { meshlets: (0..level.len() as u32).collect() }];
        let config = LodConfig::default();
        let pass = GmssPass::new(&config, &MeshoptClusterizer, &IdentitySimplifier);

        let outcome = pass.run(&vertices, &mut level, &groups, 0, 0.5, &PositionQuantizer::new(0.05));
        assert_eq!(outcome.accepted, 0);
        assert_eq!(outcome.rejected, 1);
        assert!(outcome.next.is_empty());
        assert!(level.meshlets().iter().all(|m| !m.has_parent()));
    }

    #[test]
    fn test_simplifier_failure_rejects() {
        let (vertices, mut level) = grid_level(16);
        let groups = vec![ClusterGroup { meshlets: (0..level.len() as u32).collect() }];
        let config = LodConfig::default();
        let pass = GmssPass::new(&config, &MeshoptClusterizer, &FailingSimplifier);

        let outcome = pass.run(&vertices, &mut level, &groups, 0, 0.5, &PositionQuantizer::new(0.05));
        assert_eq!(outcome.rejected, 1);
        assert!(outcome.next.is_empty());
    }

    #[test]
    fn test_locks_across_cell_boundary() {
        let positions = [
            Vec3::new(0.999, 0.0, 0.0),
            Vec3::new(-5.0, 0.0, 0.0),
            Vec3::new(-5.0, 0.0, -5.0),
            Vec3::new(1.001, 0.0, 0.0),
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(6.0, 0.0, 5.0),
        ];
        let vertices: Vec<Vertex> = positions.iter().map(|&p| Vertex::from_position(p)).collect();
        let mut level = MeshletContainer::new();
        level.push(test_meshlet(0, 0.0), &[0, 1, 2], &[0, 1, 2]);
        level.push(test_meshlet(0, 0.0), &[3, 4, 5], &[0, 1, 2]);
        let groups = vec![ClusterGroup { meshlets: vec![0] }, ClusterGroup { meshlets: vec![1] }];

        let locks = group_border_locks(&vertices, &level, &groups, &PositionQuantizer::new(1.0));
        assert_eq!(locks, vec![true, false, false, true, false, false]);
    }

    #[test]
    fn test_mixed_accept_and_reject() {
        let (vertices, mut level) = grid_level(32);
        let n = level.len() as u32;
        assert!(n >= 2);
        let groups = vec![
            ClusterGroup { meshlets: (0..n - 1).collect() },
            ClusterGroup { meshlets: vec![n - 1] },
        ];
        let small = level.meshlet(n - 1).triangle_count as usize * 3;
        let config = LodConfig { parallel: false, ..Default::default() };
        let simplifier = ThresholdSimplifier { min_indices: small + 1 };
        let pass = GmssPass::new(&config, &MeshoptClusterizer, &simplifier);

        let outcome = pass.run(&vertices, &mut level, &groups, 0, 0.5, &PositionQuantizer::new(0.05));

        assert_eq!(outcome.accepted, 1);
        assert_eq!(outcome.rejected, 1);
        assert!(outcome.next.meshlets().iter().all(|m| m.lod == 1 && m.error == 0.25));

        let linked = level.meshlet(0);
        assert!(linked.has_parent());
        assert_eq!(linked.parent_error, 0.25);
        for m in 0..n - 1 {
            let meshlet = level.meshlet(m);
            assert_eq!(meshlet.parent_error, linked.parent_error);
            assert_eq!(meshlet.parent_pos_center, linked.parent_pos_center);
        }
        assert_eq!(level.meshlet(n - 1).parent_error, UNINITIALIZED_ERROR);
    }
}
