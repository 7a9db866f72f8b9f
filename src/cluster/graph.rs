//! Meshlet adjacency graph for one LOD level.
//!
//! Two meshlets are connected when they share triangle edges. Edges are
//! identified by quantized endpoint positions so duplicated vertices along
//! seams still connect their meshlets.

use std::collections::{BTreeMap, HashMap};

use crate::math::{EdgeKey, PositionQuantizer};
use crate::mesh::Vertex;
use crate::meshlet::MeshletContainer;

/// Compressed sparse row form of the graph (METIS layout)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CsrGraph {
    pub xadj: Vec<u32>,
    pub adjncy: Vec<u32>,
    pub adjwgt: Vec<u32>,
}

/// Weighted undirected adjacency between the meshlets of a container
#[derive(Clone, Debug, Default)]
pub struct ClusterGraph {
    /// Neighbors of each meshlet with shared edge counts, sorted by neighbor
    adjacency: Vec<Vec<(u32, u32)>>,
    /// Quantized edges each meshlet shares with at least one other meshlet
    shared_edges: Vec<Vec<EdgeKey>>,
    /// Number of connected meshlet pairs
    edge_count: usize,
}

impl ClusterGraph {
    /// Build the graph for every meshlet in `container`
    pub fn build(container: &MeshletContainer, vertices: &[Vertex], quantizer: &PositionQuantizer) -> Self {
        let node_count = container.len();

        // Which meshlets touch each quantized edge
        let mut edge_owners: HashMap<EdgeKey, Vec<u32>> = HashMap::new();
        for meshlet in 0..node_count as u32 {
            for tri in container.triangle_vertices(meshlet) {
                for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                    let pa = vertices[a as usize].pos();
                    let pb = vertices[b as usize].pos();
                    let Some(key) = quantizer.edge_key(pa, pb) else {
                        continue;
                    };
                    let owners = edge_owners.entry(key).or_default();
                    // Meshlets are visited in order, so duplicates are adjacent
                    if owners.last() != Some(&meshlet) {
                        owners.push(meshlet);
                    }
                }
            }
        }

        let mut weights: Vec<BTreeMap<u32, u32>> = vec![BTreeMap::new(); node_count];
        let mut shared_edges: Vec<Vec<EdgeKey>> = vec![Vec::new(); node_count];

        for (key, owners) in &edge_owners {
            // Interior edges touched by a single meshlet carry no adjacency
            if owners.len() < 2 {
                continue;
            }
            for (i, &a) in owners.iter().enumerate() {
                shared_edges[a as usize].push(*key);
                for &b in &owners[i + 1..] {
                    *weights[a as usize].entry(b).or_insert(0) += 1;
                    *weights[b as usize].entry(a).or_insert(0) += 1;
                }
            }
        }

        // HashMap iteration order is arbitrary
        for edges in &mut shared_edges {
            edges.sort_unstable();
        }

        let adjacency: Vec<Vec<(u32, u32)>> = weights
            .into_iter()
            .map(|w| w.into_iter().collect())
            .collect();
        let edge_count = adjacency.iter().map(Vec::len).sum::<usize>() / 2;

        Self { adjacency, shared_edges, edge_count }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of connected meshlet pairs
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// True if no two meshlets share an edge
    pub fn has_no_edges(&self) -> bool {
        self.edge_count == 0
    }

    /// `(neighbor, shared edge count)` pairs of one meshlet
    pub fn neighbors(&self, meshlet: u32) -> &[(u32, u32)] {
        &self.adjacency[meshlet as usize]
    }

    /// Quantized edges one meshlet shares with others
    pub fn shared_edges(&self, meshlet: u32) -> &[EdgeKey] {
        &self.shared_edges[meshlet as usize]
    }

    /// Shared edge count between two meshlets (0 if unconnected)
    pub fn weight(&self, a: u32, b: u32) -> u32 {
        let neighbors = self.neighbors(a);
        neighbors
            .binary_search_by_key(&b, |&(n, _)| n)
            .map(|i| neighbors[i].1)
            .unwrap_or(0)
    }

    /// Convert to compressed sparse rows
    pub fn to_csr(&self) -> CsrGraph {
        let mut csr = CsrGraph {
            xadj: Vec::with_capacity(self.adjacency.len() + 1),
            adjncy: Vec::with_capacity(self.edge_count * 2),
            adjwgt: Vec::with_capacity(self.edge_count * 2),
        };
        for neighbors in &self.adjacency {
            csr.xadj.push(csr.adjncy.len() as u32);
            for &(n, w) in neighbors {
                csr.adjncy.push(n);
                csr.adjwgt.push(w);
            }
        }
        csr.xadj.push(csr.adjncy.len() as u32);
        csr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Vec3;
    use crate::meshlet::test_meshlet;

    /// Unit quad split into two triangles, each its own meshlet. The shared
    /// diagonal uses duplicated vertices (4, 5) to exercise fusion.
    fn split_quad() -> (Vec<Vertex>, MeshletContainer) {
        let positions = [
            Vec3::ZERO,
            Vec3::X,
            Vec3::Z,
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::X,
            Vec3::Z,
        ];
        let vertices: Vec<Vertex> = positions.iter().map(|&p| Vertex::from_position(p)).collect();
        let mut c = MeshletContainer::new();
        c.push(test_meshlet(0, 0.0), &[0, 2, 1], &[0, 1, 2]);
        c.push(test_meshlet(0, 0.0), &[4, 5, 3], &[0, 1, 2]);
        (vertices, c)
    }

    #[test]
    fn test_shared_edge_via_fusion() {
        let (vertices, c) = split_quad();
        let graph = ClusterGraph::build(&c, &vertices, &PositionQuantizer::new(0.01));

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.weight(0, 1), 1);
        assert_eq!(graph.weight(1, 0), 1);
        assert_eq!(graph.shared_edges(0).len(), 1);
        assert_eq!(graph.shared_edges(0), graph.shared_edges(1));
    }

    #[test]
    fn test_disjoint_meshlets_have_no_edges() {
        let positions = [
            Vec3::ZERO, Vec3::X, Vec3::Z,
            Vec3::splat(10.0), Vec3::new(11.0, 10.0, 10.0), Vec3::new(10.0, 10.0, 11.0),
        ];
        let vertices: Vec<Vertex> = positions.iter().map(|&p| Vertex::from_position(p)).collect();
        let mut c = MeshletContainer::new();
        c.push(test_meshlet(0, 0.0), &[0, 1, 2], &[0, 1, 2]);
        c.push(test_meshlet(0, 0.0), &[3, 4, 5], &[0, 1, 2]);

        let graph = ClusterGraph::build(&c, &vertices, &PositionQuantizer::new(0.01));
        assert!(graph.has_no_edges());
        assert!(graph.neighbors(0).is_empty());
    }

    #[test]
    fn test_csr_layout() {
        let (vertices, c) = split_quad();
        let graph = ClusterGraph::build(&c, &vertices, &PositionQuantizer::new(0.01));
        let csr = graph.to_csr();
        assert_eq!(csr.xadj, vec![0, 1, 2]);
        assert_eq!(csr.adjncy, vec![1, 0]);
        assert_eq!(csr.adjwgt, vec![1, 1]);
    }

    /// 2x2 quad grid split into two columns, each column one meshlet.
    /// The columns share two edges along x = 1.
    fn two_columns() -> (Vec<Vertex>, MeshletContainer) {
        let vertices: Vec<Vertex> = (0..3)
            .flat_map(|z| (0..3).map(move |x| Vertex::from_position(Vec3::new(x as f32, 0.0, z as f32))))
            .collect();
        let quad = |x: u32, z: u32| {
            let i0 = z * 3 + x;
            let (i1, i2) = (i0 + 1, i0 + 3);
            [i0, i2, i1, i1, i2, i2 + 1]
        };

        let mut c = MeshletContainer::new();
        for x in 0..2 {
            let corners: Vec<u32> = quad(x, 0).into_iter().chain(quad(x, 1)).collect();
            let local: Vec<u8> = (0..corners.len() as u8).collect();
            c.push(test_meshlet(0, 0.0), &corners, &local);
        }
        (vertices, c)
    }

    #[test]
    fn test_weight_counts_shared_edges() {
        let (vertices, c) = two_columns();
        let q = PositionQuantizer::new(0.01);
        let graph = ClusterGraph::build(&c, &vertices, &q);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.weight(0, 1), 2);
        assert_eq!(graph.to_csr().adjwgt, vec![2, 2]);

        // Diagonals and the edge between the two quads of a column are interior
        let mut expected = vec![
            q.edge_key(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 1.0)).unwrap(),
            q.edge_key(Vec3::new(1.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 2.0)).unwrap(),
        ];
        expected.sort_unstable();
        assert_eq!(graph.shared_edges(0), expected.as_slice());
        assert_eq!(graph.shared_edges(1), expected.as_slice());
    }
}
