//! Grouping meshlets for joint simplification

use super::graph::ClusterGraph;
use crate::backend::GraphPartitioner;

/// Meshlets (container indices) simplified together in one LOD step
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterGroup {
    pub meshlets: Vec<u32>,
}

impl ClusterGroup {
    pub fn len(&self) -> usize {
        self.meshlets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshlets.is_empty()
    }
}

/// Number of parts to request for `node_count` meshlets
pub fn target_group_count(node_count: usize, min_per_group: usize, max_per_group: usize) -> usize {
    let per_group = (node_count / min_per_group.max(1)).clamp(1, max_per_group.max(1));
    (node_count / per_group).max(1)
}

/// Everything in one group; used whenever partitioning does not apply
fn single_group(node_count: usize) -> Vec<ClusterGroup> {
    vec![ClusterGroup { meshlets: (0..node_count as u32).collect() }]
}

/// Split the meshlets of a level into balanced groups.
///
/// Falls back to a single group holding every meshlet when there are fewer
/// than `min_per_group` meshlets, when no meshlets are connected, or when
/// the partitioner fails. Empty parts are dropped.
pub fn group_meshlets<P: GraphPartitioner + ?Sized>(
    graph: &ClusterGraph,
    min_per_group: usize,
    max_per_group: usize,
    partitioner: &P,
) -> Vec<ClusterGroup> {
    let node_count = graph.node_count();
    if node_count == 0 {
        return Vec::new();
    }
    if node_count < min_per_group || graph.has_no_edges() {
        return single_group(node_count);
    }

    let parts = target_group_count(node_count, min_per_group, max_per_group);
    if parts == 1 {
        return single_group(node_count);
    }

    let assignment = match partitioner.partition(graph, parts) {
        Ok(a) if a.len() == node_count && a.iter().all(|&p| (p as usize) < parts) => a,
        Ok(a) => {
            log::warn!(
                "partitioner returned {} assignments for {} meshlets / {} parts, using one group",
                a.len(),
                node_count,
                parts
            );
            return single_group(node_count);
        }
        Err(e) => {
            log::warn!("partitioning {} meshlets failed ({}), using one group", node_count, e);
            return single_group(node_count);
        }
    };

    let mut groups = vec![ClusterGroup::default(); parts];
    for (meshlet, &part) in assignment.iter().enumerate() {
        groups[part as usize].meshlets.push(meshlet as u32);
    }
    groups.retain(|g| !g.is_empty());
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Error, Result, Vec3};
    use crate::math::PositionQuantizer;
    use crate::mesh::Vertex;
    use crate::meshlet::{test_meshlet, MeshletContainer};

    /// Assigns contiguous index ranges to parts
    struct RangePartitioner;

    impl GraphPartitioner for RangePartitioner {
        fn partition(&self, graph: &ClusterGraph, parts: usize) -> Result<Vec<u32>> {
            let n = graph.node_count();
            Ok((0..n).map(|i| (i * parts / n) as u32).collect())
        }
    }

    struct FailingPartitioner;

    impl GraphPartitioner for FailingPartitioner {
        fn partition(&self, _graph: &ClusterGraph, _parts: usize) -> Result<Vec<u32>> {
            Err(Error::Backend("no partition".into()))
        }
    }

    /// A strip of `count` unit quads, one meshlet per quad
    fn strip(count: u32) -> (Vec<Vertex>, MeshletContainer) {
        let mut vertices = Vec::new();
        for x in 0..=count {
            vertices.push(Vertex::from_position(Vec3::new(x as f32, 0.0, 0.0)));
            vertices.push(Vertex::from_position(Vec3::new(x as f32, 0.0, 1.0)));
        }
        let mut c = MeshletContainer::new();
        for q in 0..count {
            let base = q * 2;
            c.push(test_meshlet(0, 0.0), &[base, base + 1, base + 2, base + 3], &[0, 1, 2, 2, 1, 3]);
        }
        (vertices, c)
    }

    #[test]
    fn test_target_group_count() {
        assert_eq!(target_group_count(1, 2, 8), 1);
        assert_eq!(target_group_count(4, 2, 8), 2);
        assert_eq!(target_group_count(16, 2, 8), 2);
        assert_eq!(target_group_count(128, 2, 8), 16);
    }

    #[test]
    fn test_partitioned_groups_cover_all() {
        let (vertices, c) = strip(16);
        let graph = ClusterGraph::build(&c, &vertices, &PositionQuantizer::new(0.01));
        let groups = group_meshlets(&graph, 2, 8, &RangePartitioner);

        assert_eq!(groups.len(), 2);
        let mut all: Vec<u32> = groups.iter().flat_map(|g| g.meshlets.clone()).collect();
        all.sort_unstable();
        assert_eq!(all, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_disconnected_single_group() {
        let positions = [
            Vec3::ZERO, Vec3::X, Vec3::Z,
            Vec3::splat(5.0), Vec3::new(6.0, 5.0, 5.0), Vec3::new(5.0, 5.0, 6.0),
        ];
        let vertices: Vec<Vertex> = positions.iter().map(|&p| Vertex::from_position(p)).collect();
        let mut c = MeshletContainer::new();
        c.push(test_meshlet(0, 0.0), &[0, 1, 2], &[0, 1, 2]);
        c.push(test_meshlet(0, 0.0), &[3, 4, 5], &[0, 1, 2]);

        let graph = ClusterGraph::build(&c, &vertices, &PositionQuantizer::new(0.01));
        let groups = group_meshlets(&graph, 2, 8, &RangePartitioner);
        assert_eq!(groups, vec![ClusterGroup { meshlets: vec![0, 1] }]);
    }

    #[test]
    fn test_too_few_meshlets() {
        let (vertices, c) = strip(1);
        let graph = ClusterGraph::build(&c, &vertices, &PositionQuantizer::new(0.01));
        let groups = group_meshlets(&graph, 2, 8, &RangePartitioner);
        assert_eq!(groups, vec![ClusterGroup { meshlets: vec![0] }]);
    }

    #[test]
    fn test_partitioner_failure_degrades() {
        let (vertices, c) = strip(8);
        let graph = ClusterGraph::build(&c, &vertices, &PositionQuantizer::new(0.01));
        let groups = group_meshlets(&graph, 2, 8, &FailingPartitioner);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 8);
    }

    #[test]
    fn test_empty_graph() {
        let graph = ClusterGraph::default();
        assert!(group_meshlets(&graph, 2, 8, &RangePartitioner).is_empty());
    }
}
