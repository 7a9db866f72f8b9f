//! Input mesh: an append-only vertex arena plus a triangle list.
//!
//! Vertices are never mutated once pushed; later stages only append and
//! refer to vertices by index.

pub mod vertex;
pub mod prepare;

pub use vertex::Vertex;
pub use prepare::prepare;

use crate::core::{Error, Result, Vec3};

/// Optional per-vertex streams carried alongside the interleaved layout
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexExtras {
    pub smooth_normals: Option<Vec<[f32; 3]>>,
    pub uv1: Option<Vec<[f32; 2]>>,
    pub color0: Option<Vec<[f32; 4]>>,
}

impl VertexExtras {
    fn push_default(&mut self) {
        if let Some(n) = &mut self.smooth_normals {
            n.push([0.0, 1.0, 0.0]);
        }
        if let Some(uv) = &mut self.uv1 {
            uv.push([0.0; 2]);
        }
        if let Some(c) = &mut self.color0 {
            c.push([1.0; 4]);
        }
    }
}

/// Triangle mesh handed to the LOD builder
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    extras: VertexExtras,
}

impl MeshData {
    /// Create a mesh, validating the triangle list.
    ///
    /// Fails if the index count is not a multiple of 3 or an index points
    /// past the vertex array.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self> {
        Self::with_extras(vertices, indices, VertexExtras::default())
    }

    /// Create a mesh with optional extra attribute streams
    pub fn with_extras(vertices: Vec<Vertex>, indices: Vec<u32>, extras: VertexExtras) -> Result<Self> {
        let mesh = Self { vertices, indices, extras };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Convenience constructor from bare positions
    pub fn from_positions(positions: &[Vec3], indices: Vec<u32>) -> Result<Self> {
        let vertices = positions.iter().map(|&p| Vertex::from_position(p)).collect();
        Self::new(vertices, indices)
    }

    /// Check the triangle list and extra streams
    pub fn validate(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(Error::InvalidIndexCount(self.indices.len()));
        }

        let vertex_count = self.vertices.len();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(Error::IndexOutOfRange { index, vertex_count });
        }

        check_stream("smooth_normal", self.extras.smooth_normals.as_ref().map(Vec::len), vertex_count)?;
        check_stream("uv1", self.extras.uv1.as_ref().map(Vec::len), vertex_count)?;
        check_stream("color0", self.extras.color0.as_ref().map(Vec::len), vertex_count)?;
        Ok(())
    }

    /// Append a vertex and return its index. Present extra streams get a
    /// default entry so they stay the same length.
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        self.extras.push_default();
        index
    }

    /// Append a triangle referencing existing vertices
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) -> Result<()> {
        let vertex_count = self.vertices.len();
        for index in [a, b, c] {
            if index as usize >= vertex_count {
                return Err(Error::IndexOutOfRange { index, vertex_count });
            }
        }
        self.indices.extend_from_slice(&[a, b, c]);
        Ok(())
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn extras(&self) -> &VertexExtras {
        &self.extras
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of vertex `index`
    pub fn position(&self, index: u32) -> Vec3 {
        self.vertices[index as usize].pos()
    }
}

fn check_stream(attribute: &'static str, len: Option<usize>, expected: usize) -> Result<()> {
    match len {
        Some(actual) if actual != expected => Err(Error::AttributeLengthMismatch {
            attribute,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

/// Build a flat `size` x `size` quad grid in the XZ plane with unit spacing.
///
/// Produces `2 * size * size` triangles over `(size + 1)^2` vertices.
pub fn create_test_grid(size: u32) -> MeshData {
    let row = size + 1;
    let mut vertices = Vec::with_capacity((row * row) as usize);
    for z in 0..row {
        for x in 0..row {
            let mut v = Vertex::from_position(Vec3::new(x as f32, 0.0, z as f32));
            v.uv0 = [x as f32 / size as f32, z as f32 / size as f32];
            vertices.push(v);
        }
    }

    let mut indices = Vec::with_capacity((size * size * 6) as usize);
    for z in 0..size {
        for x in 0..size {
            let i0 = z * row + x;
            let i1 = i0 + 1;
            let i2 = i0 + row;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    MeshData { vertices, indices, extras: VertexExtras::default() }
}
