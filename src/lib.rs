//! Meshlod - hierarchical meshlet LOD builder
//!
//! Turns a triangle mesh into small fixed-capacity clusters organized into
//! an error-bounded LOD hierarchy, plus a BVH over the hierarchy for
//! runtime cut selection.

pub mod core;
pub mod math;
pub mod mesh;
pub mod meshlet;
pub mod cluster;
pub mod lod;
pub mod bvh;
pub mod backend;

pub use crate::core::{Error, Result};
pub use lod::{build, LodBuilder, LodConfig, LodMesh};
pub use mesh::{MeshData, Vertex};
