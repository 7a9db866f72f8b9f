//! Mathematical utilities and data structures

pub mod aabb;
pub mod sphere;
pub mod quantize;

pub use aabb::Aabb;
pub use sphere::BoundingSphere;
pub use quantize::{EdgeKey, PositionKey, PositionQuantizer};
