//! Vertex layout and CPU-side mesh data

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Vertex data structure for GPU rendering
///
/// Tightly packed for direct upload with bytemuck.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Surface normal vector (normalized)
    pub normal: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    /// Get the vertex attribute layout for wgpu
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Indexed triangle list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Vertex positions in model space
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices.iter().map(|vertex| Vec3::from(vertex.position))
    }

    /// Axis-aligned cube centered at the origin with side length `size`
    ///
    /// Each face has its own four vertices so normals stay flat.
    pub fn cube(size: f32) -> Self {
        let half = size * 0.5;
        let axes = [Vec3::X, Vec3::Y, Vec3::Z];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (axis_index, &axis) in axes.iter().enumerate() {
            let u_axis = axes[(axis_index + 1) % 3];
            let v_axis = axes[(axis_index + 2) % 3];

            for sign in [1.0_f32, -1.0] {
                let normal = axis * sign;
                let center = normal * half;
                // Flip one tangent on the negative face to keep CCW winding outward
                let u = u_axis * half * sign;
                let v = v_axis * half;

                let base = vertices.len() as u32;
                for (corner, uv) in [
                    (-u - v, [0.0, 1.0]),
                    (u - v, [1.0, 1.0]),
                    (u + v, [1.0, 0.0]),
                    (-u + v, [0.0, 0.0]),
                ] {
                    vertices.push(Vertex::new(
                        (center + corner).to_array(),
                        normal.to_array(),
                        uv,
                    ));
                }
                indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            }
        }

        Self { vertices, indices }
    }
}
