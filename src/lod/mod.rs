//! LOD hierarchy construction.
//!
//! LOD 0 meshlets are grouped, simplified and re-split level by level until
//! nothing reduces further or the level cap is hit. Every level ends up in
//! one flat [`MeshletContainer`] with a [`Bvh`] over the parent error spheres.

pub mod config;
pub mod gmss;
pub mod hierarchy;

pub use config::LodConfig;
pub use gmss::{GmssPass, LevelOutcome};
pub use hierarchy::{build, LodBuilder};

use serde::Serialize;

use crate::bvh::Bvh;
use crate::meshlet::{GpuMeshletData, MeshletContainer};

/// Counters for one simplified level
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LevelStats {
    pub lod: u32,
    pub meshlets: usize,
    pub groups: usize,
    pub accepted_groups: usize,
    pub rejected_groups: usize,
    pub target_error: f32,
}

/// Summary of a hierarchy build
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BuildStats {
    pub levels: Vec<LevelStats>,
    pub total_meshlets: usize,
    pub bvh_nodes: usize,
}

/// Finished cluster hierarchy of one mesh
#[derive(Clone, Debug, Default)]
pub struct LodMesh {
    pub meshlets: MeshletContainer,
    pub bvh: Bvh,
    pub stats: BuildStats,
}

impl LodMesh {
    /// Number of distinct LOD levels present
    pub fn lod_count(&self) -> u32 {
        self.meshlets
            .meshlets()
            .iter()
            .map(|m| m.lod + 1)
            .max()
            .unwrap_or(0)
    }

    /// Pack meshlets for GPU upload
    pub fn to_gpu(&self) -> GpuMeshletData {
        self.meshlets.to_gpu()
    }
}
