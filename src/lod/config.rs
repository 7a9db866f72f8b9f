//! LOD hierarchy build configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::MeshletLimits;
use crate::core::{Error, Result};

/// Tunables for the hierarchy build.
///
/// The grouping, split and rejection factors have no derivation behind
/// them; they are exposed as-is rather than baked in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    /// Vertex cap per meshlet (at most 255)
    pub max_meshlet_vertices: u32,
    /// Triangle cap per meshlet (at most 512, multiple of 4)
    pub max_meshlet_triangles: u32,
    /// Clusterizer bias towards tight normal cones (0.0-1.0)
    pub cone_weight: f32,
    /// Groups smaller than this are never requested from the partitioner
    pub min_meshlets_per_group: u32,
    /// Upper bound on meshlets per requested group
    pub max_meshlets_per_group: u32,
    /// Meshlets a simplified group is expected to split back into; the
    /// simplifier targets `1 / split_factor` of the merged triangles
    pub split_factor: u32,
    /// A group is kept only if simplification goes below this fraction of
    /// its merged triangle count
    pub min_reduce: f32,
    /// Level cap, including LOD 0
    pub max_lod_count: u32,
    /// Error budget at LOD 0, as a fraction of the mesh extent
    pub min_relative_error: f32,
    /// Error budget at the last level, as a fraction of the mesh extent
    pub max_relative_error: f32,
    /// Vertex fusion cell size as a fraction of the level's target error
    pub fuse_distance_scale: f32,
    /// Simplify groups of a level in parallel
    pub parallel: bool,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            max_meshlet_vertices: 255,
            max_meshlet_triangles: 256,
            cone_weight: 0.25,
            min_meshlets_per_group: 2,
            max_meshlets_per_group: 8,
            split_factor: 2,
            min_reduce: 0.8,
            max_lod_count: 16,
            min_relative_error: 0.01,
            max_relative_error: 0.1,
            fuse_distance_scale: 0.1,
            parallel: true,
        }
    }
}

impl LodConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject values the build or the meshlet backend cannot work with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        if !(3..=255).contains(&self.max_meshlet_vertices) {
            return invalid(format!("max_meshlet_vertices {} not in 3..=255", self.max_meshlet_vertices));
        }
        if self.max_meshlet_triangles == 0
            || self.max_meshlet_triangles > 512
            || self.max_meshlet_triangles % 4 != 0
        {
            return invalid(format!(
                "max_meshlet_triangles {} must be a multiple of 4 in 4..=512",
                self.max_meshlet_triangles
            ));
        }
        if self.min_meshlets_per_group == 0 || self.min_meshlets_per_group > self.max_meshlets_per_group {
            return invalid(format!(
                "meshlets per group range {}..={} is empty",
                self.min_meshlets_per_group, self.max_meshlets_per_group
            ));
        }
        if self.split_factor == 0 {
            return invalid("split_factor must be at least 1".into());
        }
        if !(self.min_reduce > 0.0 && self.min_reduce <= 1.0) {
            return invalid(format!("min_reduce {} not in (0, 1]", self.min_reduce));
        }
        if self.max_lod_count == 0 {
            return invalid("max_lod_count must be at least 1".into());
        }
        if !(self.min_relative_error >= 0.0 && self.min_relative_error <= self.max_relative_error) {
            return invalid(format!(
                "relative error range {}..{} is invalid",
                self.min_relative_error, self.max_relative_error
            ));
        }
        if !(self.fuse_distance_scale > 0.0) {
            return invalid("fuse_distance_scale must be positive".into());
        }
        Ok(())
    }

    pub fn meshlet_limits(&self) -> MeshletLimits {
        MeshletLimits {
            max_vertices: self.max_meshlet_vertices as usize,
            max_triangles: self.max_meshlet_triangles as usize,
        }
    }

    /// Fraction of the merged triangle count the simplifier aims for
    pub fn simplify_threshold(&self) -> f32 {
        1.0 / self.split_factor as f32
    }

    /// Absolute error budget for simplifying `level` into `level + 1`.
    ///
    /// Interpolates linearly from `min_relative_error` at LOD 0 to
    /// `max_relative_error` at the last simplified level, scaled by the
    /// mesh extent.
    pub fn level_target_error(&self, level: u32, mesh_extent: f32) -> f32 {
        let last = self.max_lod_count.saturating_sub(2);
        let t = if last == 0 { 0.0 } else { (level as f32 / last as f32).min(1.0) };
        let relative = self.min_relative_error + (self.max_relative_error - self.min_relative_error) * t;
        relative * mesh_extent
    }
}
