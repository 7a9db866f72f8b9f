//! Core type aliases and re-exports

pub use glam::Vec3;

/// Standard Result type for the builder
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// Sentinel for "no parent yet" on meshlet parent errors
pub const UNINITIALIZED_ERROR: f32 = -1.0;

/// Sentinel for absent indices (BVH children, offsets)
pub const INVALID_INDEX: u32 = u32::MAX;
