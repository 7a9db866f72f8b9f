//! Optional pre-pass: vertex deduplication and cache-friendly reordering.
//!
//! The builder itself expects already-welded input; this is provided for
//! callers that import raw triangle soups.

use meshopt::{generate_vertex_remap, optimize_vertex_cache, remap_index_buffer, remap_vertex_buffer};

use super::{MeshData, VertexExtras};
use crate::core::Result;

/// Weld bitwise-identical vertices and reorder triangles for the
/// post-transform vertex cache.
///
/// Identity is decided on the interleaved [`super::Vertex`] only; extra
/// streams follow the first vertex of each welded set.
pub fn prepare(mesh: &MeshData) -> Result<MeshData> {
    if mesh.is_empty() {
        return Ok(mesh.clone());
    }

    let (unique_count, remap) = generate_vertex_remap(mesh.vertices(), Some(mesh.indices()));
    let vertices = remap_vertex_buffer(mesh.vertices(), unique_count, &remap);
    let indices = remap_index_buffer(Some(mesh.indices()), unique_count, &remap);
    let indices = optimize_vertex_cache(&indices, unique_count);

    let extras = mesh.extras();
    let extras = VertexExtras {
        smooth_normals: extras.smooth_normals.as_ref().map(|s| remap_vertex_buffer(s, unique_count, &remap)),
        uv1: extras.uv1.as_ref().map(|s| remap_vertex_buffer(s, unique_count, &remap)),
        color0: extras.color0.as_ref().map(|s| remap_vertex_buffer(s, unique_count, &remap)),
    };

    log::debug!(
        "prepare: welded {} -> {} vertices, {} triangles",
        mesh.vertex_count(),
        unique_count,
        indices.len() / 3
    );

    MeshData::with_extras(vertices, indices, extras)
}
