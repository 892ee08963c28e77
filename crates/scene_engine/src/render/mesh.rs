//! Vertex records and primitive mesh generation
//!
//! The core treats vertex data as opaque immutable input supplied at
//! node-construction time; this module provides the record layout plus a
//! unit-cube generator for demos and tests. Real applications feed vertex
//! sequences from their asset pipeline instead.

use bytemuck::{Pod, Zeroable};

/// One vertex as uploaded to the GPU
///
/// `#[repr(C)]` ensures a consistent 32-byte layout: position, normal,
/// texture coordinates, tightly packed.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Normal vector
    pub normal: [f32; 3],
    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a vertex from its components
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// An ordered triangle-list vertex sequence
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertices, three per triangle
    pub vertices: Vec<Vertex>,
}

impl Mesh {
    /// Wrap an existing vertex sequence
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// Number of vertices to draw
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Raw bytes for vertex buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Generate an axis-aligned cube centered at the origin
    pub fn cube(half_extent: f32) -> Self {
        let h = half_extent;
        let mut vertices = Vec::with_capacity(36);

        // (normal, four corners in fan order) per face
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            // +X
            (
                [1.0, 0.0, 0.0],
                [[h, -h, -h], [h, h, -h], [h, h, h], [h, -h, h]],
            ),
            // -X
            (
                [-1.0, 0.0, 0.0],
                [[-h, -h, h], [-h, h, h], [-h, h, -h], [-h, -h, -h]],
            ),
            // +Y
            (
                [0.0, 1.0, 0.0],
                [[-h, h, -h], [-h, h, h], [h, h, h], [h, h, -h]],
            ),
            // -Y
            (
                [0.0, -1.0, 0.0],
                [[-h, -h, h], [-h, -h, -h], [h, -h, -h], [h, -h, h]],
            ),
            // +Z
            (
                [0.0, 0.0, 1.0],
                [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]],
            ),
            // -Z
            (
                [0.0, 0.0, -1.0],
                [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]],
            ),
        ];

        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        for (normal, corners) in faces {
            for &[a, b, c] in &[[0usize, 1, 2], [0, 2, 3]] {
                vertices.push(Vertex::new(corners[a], normal, uvs[a]));
                vertices.push(Vertex::new(corners[b], normal, uvs[b]));
                vertices.push(Vertex::new(corners[c], normal, uvs[c]));
            }
        }

        Self::new(vertices)
    }
}
