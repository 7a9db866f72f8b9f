//! Packed meshlet records for GPU upload

use bytemuck::{Pod, Zeroable};

use super::{Meshlet, MeshletContainer};

/// Bits holding the vertex count in [`GpuMeshlet::counts`]
const VERTEX_COUNT_BITS: u32 = 16;
const VERTEX_COUNT_MASK: u32 = (1 << VERTEX_COUNT_BITS) - 1;

/// GPU meshlet record - exactly 112 bytes, 16-byte rows
///
/// Layout:
/// - counts (4 bytes): bits 0-15 vertex count, 16-31 triangle count
/// - data_offset (4 bytes): first word of this meshlet in the data blob
/// - lod, error (8 bytes)
/// - pos_min + parent_error (16 bytes)
/// - pos_max + cone_cutoff (16 bytes)
/// - cone_axis, cone_apex, parent_pos_center, cluster_pos_center
///   (16 bytes each, last word padding)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuMeshlet {
    pub counts: u32,
    pub data_offset: u32,
    pub lod: u32,
    pub error: f32,
    pub pos_min: [f32; 3],
    pub parent_error: f32,
    pub pos_max: [f32; 3],
    pub cone_cutoff: f32,
    pub cone_axis: [f32; 3],
    _pad0: u32,
    pub cone_apex: [f32; 3],
    _pad1: u32,
    pub parent_pos_center: [f32; 3],
    _pad2: u32,
    pub cluster_pos_center: [f32; 3],
    _pad3: u32,
}

const _: () = assert!(std::mem::size_of::<GpuMeshlet>() == 112);

impl GpuMeshlet {
    pub fn new(meshlet: &Meshlet, data_offset: u32) -> Self {
        Self {
            counts: pack_counts(meshlet.vertex_count, meshlet.triangle_count),
            data_offset,
            lod: meshlet.lod,
            error: meshlet.error,
            pos_min: meshlet.pos_min.to_array(),
            parent_error: meshlet.parent_error,
            pos_max: meshlet.pos_max.to_array(),
            cone_cutoff: meshlet.cone.cutoff,
            cone_axis: meshlet.cone.axis.to_array(),
            cone_apex: meshlet.cone.apex.to_array(),
            parent_pos_center: meshlet.parent_pos_center.to_array(),
            cluster_pos_center: meshlet.cluster_pos_center.to_array(),
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.counts & VERTEX_COUNT_MASK
    }

    pub fn triangle_count(&self) -> u32 {
        self.counts >> VERTEX_COUNT_BITS
    }
}

/// Pack vertex and triangle counts into one word
pub fn pack_counts(vertex_count: u32, triangle_count: u32) -> u32 {
    debug_assert!(vertex_count <= VERTEX_COUNT_MASK && triangle_count <= VERTEX_COUNT_MASK);
    (vertex_count & VERTEX_COUNT_MASK) | (triangle_count << VERTEX_COUNT_BITS)
}

/// Meshlet records plus the shared data blob they point into.
///
/// Per meshlet the blob holds `vertex_count` global vertex indices followed
/// by the local triangle indices packed four bytes per word.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpuMeshletData {
    pub meshlets: Vec<GpuMeshlet>,
    pub data: Vec<u32>,
}

impl GpuMeshletData {
    pub fn meshlet_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.meshlets)
    }

    pub fn data_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

impl MeshletContainer {
    /// Pack every meshlet for upload
    pub fn to_gpu(&self) -> GpuMeshletData {
        let mut out = GpuMeshletData {
            meshlets: Vec::with_capacity(self.len()),
            data: Vec::with_capacity(self.vertex_indices().len() + self.triangle_indices().len() / 4 + self.len()),
        };

        for (i, meshlet) in self.meshlets().iter().enumerate() {
            let data_offset = out.data.len() as u32;
            out.data.extend_from_slice(self.meshlet_vertices(i as u32));
            out.data.extend(self.meshlet_triangles(i as u32).chunks(4).map(|bytes| {
                let mut word = [0u8; 4];
                word[..bytes.len()].copy_from_slice(bytes);
                u32::from_le_bytes(word)
            }));
            out.meshlets.push(GpuMeshlet::new(meshlet, data_offset));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Vec3;
    use crate::meshlet::test_meshlet;

    #[test]
    fn test_pack_counts() {
        let packed = pack_counts(255, 256);
        let record = GpuMeshlet { counts: packed, ..Default::default() };
        assert_eq!(record.vertex_count(), 255);
        assert_eq!(record.triangle_count(), 256);
    }

    #[test]
    fn test_to_gpu_layout() {
        let mut c = MeshletContainer::new();
        let mut m = test_meshlet(1, 0.25);
        m.parent_error = 0.5;
        m.parent_pos_center = Vec3::Y;
        c.push(m, &[7, 8, 9, 10], &[0, 1, 2, 2, 1, 3]);
        c.push(test_meshlet(0, 0.0), &[1, 2, 3], &[0, 1, 2]);

        let gpu = c.to_gpu();
        assert_eq!(gpu.meshlets.len(), 2);

        let first = gpu.meshlets[0];
        assert_eq!(first.data_offset, 0);
        assert_eq!(first.vertex_count(), 4);
        assert_eq!(first.triangle_count(), 2);
        assert_eq!(first.lod, 1);
        assert_eq!(first.parent_error, 0.5);
        assert_eq!(first.parent_pos_center, [0.0, 1.0, 0.0]);
        assert_eq!(&gpu.data[..4], &[7, 8, 9, 10]);
        assert_eq!(gpu.data[4], u32::from_le_bytes([0, 1, 2, 2]));
        assert_eq!(gpu.data[5], u32::from_le_bytes([1, 3, 0, 0]));

        // 4 vertices + 2 words of triangles
        assert_eq!(gpu.meshlets[1].data_offset, 6);
        assert_eq!(gpu.meshlet_bytes().len(), 2 * 112);
    }
}
