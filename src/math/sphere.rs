//! Bounding spheres used for LOD error bounds and BVH aggregation

use crate::core::types::Vec3;

/// Sphere defined by center and radius
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Smallest sphere enclosing both spheres
    pub fn merged(&self, other: &BoundingSphere) -> BoundingSphere {
        let offset = other.center - self.center;
        let dist = offset.length();

        if dist + other.radius <= self.radius {
            return *self;
        }
        if dist + self.radius <= other.radius {
            return *other;
        }

        let radius = (dist + self.radius + other.radius) * 0.5;
        // dist > 0 here, otherwise one sphere contains the other
        let center = self.center + offset * ((radius - self.radius) / dist);
        // Pad for float drift so containment checks stay conservative
        Self { center, radius: radius * (1.0 + 1e-6) }
    }

    /// Check if `other` lies entirely inside this sphere (with tolerance)
    pub fn contains_sphere(&self, other: &BoundingSphere, epsilon: f32) -> bool {
        self.center.distance(other.center) + other.radius <= self.radius + epsilon
    }
}
