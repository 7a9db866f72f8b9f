//! METIS k-way partitioning of the meshlet adjacency graph

use metis::{Graph, Idx};

use super::GraphPartitioner;
use crate::cluster::ClusterGraph;
use crate::core::{Error, Result};

/// Multilevel k-way partitioner weighted by shared edge counts
#[derive(Clone, Copy, Debug, Default)]
pub struct MetisPartitioner;

impl GraphPartitioner for MetisPartitioner {
    fn partition(&self, graph: &ClusterGraph, parts: usize) -> Result<Vec<u32>> {
        let node_count = graph.node_count();
        if parts <= 1 || node_count <= 1 {
            return Ok(vec![0; node_count]);
        }

        let csr = graph.to_csr();
        let xadj: Vec<Idx> = csr.xadj.iter().map(|&v| v as Idx).collect();
        let adjncy: Vec<Idx> = csr.adjncy.iter().map(|&v| v as Idx).collect();
        let adjwgt: Vec<Idx> = csr.adjwgt.iter().map(|&v| v as Idx).collect();

        let mut part = vec![0 as Idx; node_count];
        Graph::new(1, parts as Idx, &xadj, &adjncy)
            .map_err(|e| Error::Backend(format!("metis graph: {e:?}")))?
            .set_adjwgt(&adjwgt)
            .part_kway(&mut part)
            .map_err(|e| Error::Backend(format!("metis part_kway: {e:?}")))?;

        Ok(part.into_iter().map(|p| p as u32).collect())
    }
}
