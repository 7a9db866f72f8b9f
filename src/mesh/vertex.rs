//! Interleaved vertex layout consumed by the builder

use bytemuck::{Pod, Zeroable};

use crate::core::types::Vec3;

/// Imported vertex - 48 bytes, position first so it can be read as a
/// strided position stream.
///
/// Layout:
/// - position (12 bytes)
/// - normal (12 bytes)
/// - uv0 (8 bytes)
/// - tangent (16 bytes): xyz + handedness in w
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv0: [f32; 2],
    pub tangent: [f32; 4],
}

const _: () = assert!(std::mem::size_of::<Vertex>() == 48);

impl Vertex {
    /// Float offset of the normal inside the interleaved layout
    pub const NORMAL_FLOAT_OFFSET: usize = 3;

    /// Vertex with only a position, facing +Y
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: [0.0, 1.0, 0.0],
            uv0: [0.0; 2],
            tangent: [1.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn pos(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_is_first() {
        let v = Vertex::from_position(Vec3::new(1.0, 2.0, 3.0));
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&v));
        assert_eq!(&floats[..3], &[1.0, 2.0, 3.0]);
        assert_eq!(&floats[Vertex::NORMAL_FLOAT_OFFSET..Vertex::NORMAL_FLOAT_OFFSET + 3], &[0.0, 1.0, 0.0]);
    }
}
