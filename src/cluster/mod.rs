//! Meshlet adjacency and grouping for one LOD level

pub mod graph;
pub mod group;

pub use graph::{ClusterGraph, CsrGraph};
pub use group::{group_meshlets, target_group_count, ClusterGroup};
